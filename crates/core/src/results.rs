//! The scan results document.
//!
//! The external scanner rewrites this JSON file after every site it
//! visits. Nothing coordinates that writer with our readers, so a read can
//! observe a truncated or half-written document. Readers therefore never
//! fail on bad content: a missing, empty or unparseable document is the
//! same as "no scan has run yet".

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Label the scanner's classifier emits for authentic media.
pub const PREDICTION_REAL: &str = "Real";

/// Label the scanner's classifier emits for manipulated media.
pub const PREDICTION_FAKE: &str = "Fake";

/// Classifier verdict attached to a scanned image.
///
/// Labels other than `Real`/`Fake` are kept verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Prediction {
    Real,
    Fake,
    Other(String),
}

impl Prediction {
    pub fn is_fake(&self) -> bool {
        matches!(self, Self::Fake)
    }
}

impl From<String> for Prediction {
    fn from(label: String) -> Self {
        match label.as_str() {
            PREDICTION_REAL => Self::Real,
            PREDICTION_FAKE => Self::Fake,
            _ => Self::Other(label),
        }
    }
}

impl From<Prediction> for String {
    fn from(prediction: Prediction) -> Self {
        match prediction {
            Prediction::Real => PREDICTION_REAL.to_string(),
            Prediction::Fake => PREDICTION_FAKE.to_string(),
            Prediction::Other(label) => label,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => f.write_str(PREDICTION_REAL),
            Self::Fake => f.write_str(PREDICTION_FAKE),
            Self::Other(label) => f.write_str(label),
        }
    }
}

/// One classified image found on a scanned site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResultRecord {
    /// Site the image was found on, as listed in the website list.
    pub source_url: String,
    pub prediction: Prediction,
    /// Classifier confidence in percent.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Running totals the scanner recomputes on each cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    #[serde(default)]
    pub total_scanned: u64,
    #[serde(default)]
    pub deepfakes_found: u64,
    /// Only written once the scan has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_found: Option<u64>,
}

/// Full results document as written by the scanner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResultsDocument {
    #[serde(default)]
    pub summary: ScanSummary,
    #[serde(default, deserialize_with = "skip_invalid_records")]
    pub all_results: Vec<ScanResultRecord>,
    /// Fake-only subset, present in the final write of a completed scan.
    #[serde(
        default,
        deserialize_with = "skip_invalid_records",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub deepfakes: Vec<ScanResultRecord>,
}

/// Deserialize a record list, dropping entries that are not valid records
/// so one bad entry does not discard the rest of the document.
fn skip_invalid_records<'de, D>(deserializer: D) -> Result<Vec<ScanResultRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid scan result record");
                None
            }
        })
        .collect())
}

/// Parse document contents, degrading to the empty default on any error.
///
/// Takes raw bytes: a write cut off inside a multi-byte character is just
/// another malformed document.
pub fn parse_results_document(contents: impl AsRef<[u8]>) -> ScanResultsDocument {
    let contents = contents.as_ref();
    if contents.iter().all(u8::is_ascii_whitespace) {
        return ScanResultsDocument::default();
    }

    match serde_json::from_slice(contents) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(error = %e, "Scan results document is not valid, serving empty results");
            ScanResultsDocument::default()
        }
    }
}

/// Load the results document at `path`.
///
/// A missing file yields the empty default. Only I/O failures other than
/// "not found" (permissions, path is a directory, ...) are errors.
pub async fn load_results_document(path: &Path) -> Result<ScanResultsDocument, CoreError> {
    match tokio::fs::read(path).await {
        Ok(contents) => Ok(parse_results_document(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No scan results yet");
            Ok(ScanResultsDocument::default())
        }
        Err(source) => Err(CoreError::StorageRead {
            what: "scan results",
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SCANNER_OUTPUT: &str = r#"{
        "summary": {"total_scanned": 3, "deepfakes_found": 1},
        "all_results": [
            {
                "source_url": "https://a.com/",
                "image_url": "https://a.com/face.jpg",
                "prediction": "Fake",
                "confidence": 91.25,
                "timestamp": "2024-05-01 10:00:00"
            },
            {"source_url": "https://b.com/", "prediction": "Real", "confidence": 77.0}
        ]
    }"#;

    #[test]
    fn parses_scanner_document() {
        let doc = parse_results_document(SCANNER_OUTPUT);
        assert_eq!(doc.summary.total_scanned, 3);
        assert_eq!(doc.summary.deepfakes_found, 1);
        assert_eq!(doc.all_results.len(), 2);
        assert_eq!(doc.all_results[0].prediction, Prediction::Fake);
        assert_eq!(
            doc.all_results[0].image_url.as_deref(),
            Some("https://a.com/face.jpg")
        );
        assert_eq!(doc.all_results[1].prediction, Prediction::Real);
        assert!(doc.all_results[1].timestamp.is_none());
    }

    #[test]
    fn completed_scan_document_keeps_real_found_and_deepfakes() {
        let doc = parse_results_document(
            r#"{
                "summary": {"total_scanned": 1, "deepfakes_found": 1, "real_found": 0},
                "deepfakes": [{"source_url": "x.com", "prediction": "Fake", "confidence": 60}],
                "all_results": [{"source_url": "x.com", "prediction": "Fake", "confidence": 60}]
            }"#,
        );
        assert_eq!(doc.summary.real_found, Some(0));
        assert_eq!(doc.deepfakes.len(), 1);
    }

    #[test]
    fn empty_or_whitespace_yields_default() {
        assert_eq!(parse_results_document(""), ScanResultsDocument::default());
        assert_eq!(parse_results_document("  \n"), ScanResultsDocument::default());
    }

    #[test]
    fn truncated_document_yields_default() {
        let truncated = &SCANNER_OUTPUT[..SCANNER_OUTPUT.len() / 2];
        assert_eq!(
            parse_results_document(truncated),
            ScanResultsDocument::default()
        );
    }

    #[test]
    fn wrong_shape_yields_default() {
        assert_eq!(parse_results_document("[1, 2, 3]"), ScanResultsDocument::default());
        assert_eq!(
            parse_results_document(r#"{"summary": {"total_scanned": "many"}}"#),
            ScanResultsDocument::default()
        );
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let doc = parse_results_document(r#"{"all_results": []}"#);
        assert_eq!(doc.summary, ScanSummary::default());
    }

    #[test]
    fn record_without_source_url_is_skipped() {
        let doc = parse_results_document(
            r#"{
                "summary": {"total_scanned": 2},
                "all_results": [
                    {"prediction": "Fake", "confidence": 99.0},
                    {"source_url": "https://a.com", "prediction": "Real", "confidence": 80.0}
                ]
            }"#,
        );
        assert_eq!(doc.summary.total_scanned, 2);
        assert_eq!(doc.all_results.len(), 1);
        assert_eq!(doc.all_results[0].source_url, "https://a.com");
    }

    #[test]
    fn unknown_prediction_is_kept_verbatim() {
        let doc = parse_results_document(
            r#"{"all_results": [{"source_url": "a.com", "prediction": "Unsure"}]}"#,
        );
        let record = &doc.all_results[0];
        assert_eq!(record.prediction, Prediction::Other("Unsure".to_string()));
        assert!(!record.prediction.is_fake());
        assert_eq!(record.confidence, 0.0);
    }

    #[test]
    fn prediction_serializes_as_plain_label() {
        let json = serde_json::to_value(Prediction::Fake).expect("serialize");
        assert_eq!(json, "Fake");
        assert_eq!(Prediction::Other("Maybe".into()).to_string(), "Maybe");
    }

    #[tokio::test]
    async fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let doc = load_results_document(&dir.path().join("scan_results.json"))
            .await
            .expect("missing file is not an error");
        assert_eq!(doc, ScanResultsDocument::default());
    }

    #[tokio::test]
    async fn invalid_utf8_loads_as_default() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("scan_results.json");
        // Write cut off inside a two-byte character.
        std::fs::write(&path, b"{\"summary\": {\"total_scanned\": 1}, \"x\": \"\xc3")
            .expect("write results");

        let doc = load_results_document(&path)
            .await
            .expect("bad encoding is not a storage error");
        assert_eq!(doc, ScanResultsDocument::default());
    }

    #[tokio::test]
    async fn directory_path_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = load_results_document(dir.path()).await;
        assert_matches!(
            result,
            Err(CoreError::StorageRead { what: "scan results", .. })
        );
    }

    #[tokio::test]
    async fn loads_document_from_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("scan_results.json");
        tokio::fs::write(&path, SCANNER_OUTPUT).await.expect("write doc");

        let doc = load_results_document(&path).await.expect("load doc");
        assert_eq!(doc.all_results.len(), 2);
    }
}
