//! Loading evaluation payloads from JSON text or files.
//!
//! The producer hands the dashboard one JSON document per diagnosis run,
//! keyed by prediction id. This module is the only place the crate touches
//! IO; everything past it works on the parsed [`EvaluationResult`].

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::schema::EvaluationResult;

/// Parse an evaluation payload from JSON text.
pub fn parse_evaluation_result(json: &str) -> Result<EvaluationResult> {
    let result: EvaluationResult = serde_json::from_str(json)?;
    debug!(
        "parsed evaluation payload with {} prediction(s)",
        result.len()
    );
    Ok(result)
}

/// Load an evaluation payload from a JSON file.
pub fn load_evaluation_result(path: impl AsRef<Path>) -> Result<EvaluationResult> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let result = parse_evaluation_result(&content)?;
    debug!("loaded evaluation payload from {}", path.display());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    const PAYLOAD: &str = r#"{
        "1": {
            "dataset_evaluation": {
                "iou_evaluations": {
                    "0.5": {
                        "ci_evaluations": {"cat": {"ap": 0.8}},
                        "ci_averaged_evaluation": {"ap": 0.8}
                    }
                }
            }
        },
        "2": {}
    }"#;

    #[test]
    fn test_parse_payload() {
        let result = parse_evaluation_result(PAYLOAD).unwrap();
        assert_eq!(result.len(), 2);
        let first = result.record(1).unwrap().dataset_evaluation.first_iou();
        assert_eq!(first.unwrap().ci_evaluations["cat"].ap, Some(0.8));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_evaluation_result("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_round_trips_through_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{PAYLOAD}").unwrap();

        let result = load_evaluation_result(file.path()).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_evaluation_result(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
