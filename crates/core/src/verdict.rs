//! Verdict parsing for the single-image analyzer.
//!
//! The analyzer reports its result on stdout. Two formats are accepted:
//!
//! - a structured record: one line holding a JSON object with `label` and
//!   `confidence` fields, e.g. `{"label": "Fake", "confidence": 87.5}`;
//! - the legacy text lines `[Result] Class: <label>` and
//!   `[Confidence] <number>%`.
//!
//! The structured record takes precedence when both are present. Any other
//! output is a contract mismatch even if the analyzer exited cleanly.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RESULT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Result\]\s*Class:\s*(.+)").expect("valid regex"));

static CONFIDENCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[Confidence\]\s*([-+]?\d+(?:\.\d+)?)\s*%").expect("valid regex")
});

/// Substring marking a label as manipulated media.
const FAKE_MARKER: &str = "Fake";

/// Classification returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub label: String,
    /// Confidence in percent, always within `0..=100`.
    pub confidence: f64,
    pub is_fake: bool,
}

impl Verdict {
    /// Build a verdict, deriving `is_fake` from the label and rejecting
    /// confidence values outside `0..=100`.
    pub fn new(label: impl Into<String>, confidence: f64) -> Result<Self, VerdictError> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(VerdictError::MissingLabel);
        }
        if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
            return Err(VerdictError::ConfidenceOutOfRange(confidence));
        }
        let is_fake = label.contains(FAKE_MARKER);
        Ok(Self {
            label,
            confidence,
            is_fake,
        })
    }
}

/// The analyzer's output did not match either accepted format.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerdictError {
    #[error("analyzer output has no result label")]
    MissingLabel,

    #[error("analyzer output has no confidence value")]
    MissingConfidence,

    #[error("analyzer confidence {0} is outside 0-100")]
    ConfidenceOutOfRange(f64),
}

#[derive(Deserialize)]
struct AnalysisRecord {
    label: String,
    confidence: f64,
}

/// Extract a [`Verdict`] from the analyzer's captured stdout.
pub fn parse_analysis_output(stdout: &str) -> Result<Verdict, VerdictError> {
    if let Some(record) = find_structured_record(stdout) {
        return Verdict::new(record.label, record.confidence);
    }

    let label = RESULT_LINE_RE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or(VerdictError::MissingLabel)?;

    let confidence = CONFIDENCE_LINE_RE
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or(VerdictError::MissingConfidence)?;

    Verdict::new(label, confidence)
}

/// Last stdout line that deserializes as an [`AnalysisRecord`].
fn find_structured_record(stdout: &str) -> Option<AnalysisRecord> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str(line).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_legacy_text_lines() {
        let stdout = "Loading model...\n[Result] Class: Fake\n[Confidence] 87.53%\n";
        let verdict = parse_analysis_output(stdout).expect("parse");
        assert_eq!(verdict.label, "Fake");
        assert_eq!(verdict.confidence, 87.53);
        assert!(verdict.is_fake);
    }

    #[test]
    fn legacy_label_is_trimmed_and_may_contain_spaces() {
        let stdout = "[Result] Class: Likely Fake (GAN)  \r\n[Confidence] 64%\n";
        let verdict = parse_analysis_output(stdout).expect("parse");
        assert_eq!(verdict.label, "Likely Fake (GAN)");
        assert_eq!(verdict.confidence, 64.0);
        assert!(verdict.is_fake);
    }

    #[test]
    fn real_label_is_not_fake() {
        let verdict =
            parse_analysis_output("[Result] Class: Real\n[Confidence] 99.1%").expect("parse");
        assert!(!verdict.is_fake);
    }

    #[test]
    fn structured_record_is_preferred() {
        let stdout = "[Result] Class: Real\n[Confidence] 12%\n{\"label\": \"Fake\", \"confidence\": 70.5}\n";
        let verdict = parse_analysis_output(stdout).expect("parse");
        assert_eq!(verdict.label, "Fake");
        assert_eq!(verdict.confidence, 70.5);
        assert!(verdict.is_fake);
    }

    #[test]
    fn unrelated_json_lines_are_ignored() {
        let stdout = "{\"progress\": 1}\n[Result] Class: Real\n[Confidence] 80%\n";
        let verdict = parse_analysis_output(stdout).expect("parse");
        assert_eq!(verdict.label, "Real");
    }

    #[test]
    fn missing_result_line_is_a_mismatch() {
        assert_matches!(
            parse_analysis_output("[Confidence] 50%\n"),
            Err(VerdictError::MissingLabel)
        );
    }

    #[test]
    fn missing_confidence_line_is_a_mismatch() {
        assert_matches!(
            parse_analysis_output("[Result] Class: Fake\n"),
            Err(VerdictError::MissingConfidence)
        );
        assert_matches!(
            parse_analysis_output("[Result] Class: Fake\n[Confidence] high%\n"),
            Err(VerdictError::MissingConfidence)
        );
    }

    #[test]
    fn empty_output_is_a_mismatch() {
        assert_matches!(parse_analysis_output(""), Err(VerdictError::MissingLabel));
    }

    #[test]
    fn out_of_range_confidence_is_a_mismatch() {
        assert_matches!(
            parse_analysis_output("[Result] Class: Fake\n[Confidence] 150%\n"),
            Err(VerdictError::ConfidenceOutOfRange(c)) if c == 150.0
        );
        assert_matches!(
            parse_analysis_output("{\"label\": \"Real\", \"confidence\": -1}"),
            Err(VerdictError::ConfidenceOutOfRange(_))
        );
    }

    #[test]
    fn boundary_confidence_values_are_accepted() {
        assert!(Verdict::new("Real", 0.0).is_ok());
        assert!(Verdict::new("Fake", 100.0).is_ok());
        assert_matches!(
            Verdict::new("Fake", f64::NAN),
            Err(VerdictError::ConfidenceOutOfRange(_))
        );
    }

    #[test]
    fn serializes_with_camel_case_flag() {
        let verdict = Verdict::new("Fake", 90.0).expect("valid verdict");
        let json = serde_json::to_value(&verdict).expect("serialize");
        assert_eq!(json["label"], "Fake");
        assert_eq!(json["confidence"], 90.0);
        assert_eq!(json["isFake"], true);
    }
}
