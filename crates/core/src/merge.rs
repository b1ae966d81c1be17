//! Client-side merge of polled scan results.
//!
//! Each poll returns the whole results document. Records are folded into a
//! map keyed by [`normalize_site_key`], with an alarm-biased rule: a `Fake`
//! verdict already held for a key is never replaced by a non-`Fake` one.
//! Otherwise the most recent record wins.

use std::collections::HashMap;

use serde::Serialize;

use crate::results::ScanResultRecord;
use crate::site_key::normalize_site_key;

/// Render state of one listed site, derived from the merged map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    /// No result has arrived for the site yet.
    Scanning,
    /// A result exists and it is not `Fake`.
    Safe,
    /// The merged result for the site is `Fake`.
    Threat,
}

/// Results merged across polls, keyed by normalized site identifier.
#[derive(Debug, Clone, Default)]
pub struct MergedResults {
    by_key: HashMap<String, ScanResultRecord>,
}

impl MergedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the map.
    pub fn merge_record(&mut self, record: ScanResultRecord) {
        let key = normalize_site_key(&record.source_url);
        match self.by_key.get(&key) {
            Some(existing) if existing.prediction.is_fake() && !record.prediction.is_fake() => {}
            _ => {
                self.by_key.insert(key, record);
            }
        }
    }

    /// Fold a batch of records in order.
    pub fn merge_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ScanResultRecord>,
    {
        for record in records {
            self.merge_record(record);
        }
    }

    /// Look up the merged record for any spelling of a site identifier.
    pub fn get(&self, identifier: &str) -> Option<&ScanResultRecord> {
        self.by_key.get(&normalize_site_key(identifier))
    }

    pub fn status_of(&self, identifier: &str) -> SiteStatus {
        match self.get(identifier) {
            None => SiteStatus::Scanning,
            Some(record) if record.prediction.is_fake() => SiteStatus::Threat,
            Some(_) => SiteStatus::Safe,
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Number of distinct sites currently merged as `Fake`.
    pub fn threat_count(&self) -> usize {
        self.by_key
            .values()
            .filter(|record| record.prediction.is_fake())
            .count()
    }
}

/// Scan progress in percent.
///
/// Not clamped: the scanner counts images, not sites, so values above 100
/// are expected and must be tolerated. An empty website list reports 0.
pub fn progress_percent(total_scanned: u64, website_count: usize) -> f64 {
    if website_count == 0 {
        return 0.0;
    }
    total_scanned as f64 / website_count as f64 * 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
