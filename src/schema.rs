//! Wire schema for raw evaluation payloads.
//!
//! These types mirror the producer's JSON bit-for-bit: field names
//! (`dataset_evaluation`, `iou_evaluations`, `ci_evaluations`, `sub_cks`,
//! curve points keyed `x`/`y`/`z`) are part of the interface and must not
//! drift. Every collection defaults to empty when absent; a partial payload
//! deserializes cleanly and simply yields fewer metrics downstream.
//!
//! String-keyed maps are `BTreeMap` so iteration and re-serialization are
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::PredictionId;

// =============================================================================
// Curve Points
// =============================================================================

/// One operating point on a precision-recall curve.
///
/// `x` is recall, `y` is precision, `z` is the confidence threshold that
/// produced the point. Coordinates are optional because the sampler's
/// degenerate fallback point (returned when a curve is empty or missing)
/// carries only the sampled coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Recall at this operating point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Precision at this operating point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Confidence threshold that produced this operating point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl CurvePoint {
    /// Point with all three coordinates present.
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }
}

// =============================================================================
// Per-Keyword Metrics
// =============================================================================

/// Metric record for a single keyword (or condition-tag value).
///
/// Every scalar is optional: absence means "not computed for this view",
/// never zero. Which scalar a dashboard view reads is decided by
/// [`ViewKind::scalar_of`](crate::extract::ViewKind::scalar_of).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordMetric {
    /// Average precision, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap: Option<f64>,
    /// Intersection-over-union score, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iou: Option<f64>,
    /// Accuracy, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,
    /// Mask average precision (instance segmentation), in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maskap: Option<f64>,
    /// Box average precision (instance segmentation), in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boxap: Option<f64>,
    /// Full precision-recall curve, ordered by ascending recall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_curve: Option<Vec<CurvePoint>>,
}

/// Metric records keyed by keyword or condition-tag value.
///
/// Keys are dynamic and dataset-driven; callers must not assume any fixed
/// vocabulary.
pub type MetricsMap = BTreeMap<String, KeywordMetric>;

// =============================================================================
// Confidence / IOU Nesting
// =============================================================================

/// Metrics computed at one confidence threshold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceEvaluation {
    /// Per-keyword metrics at this confidence threshold.
    #[serde(default)]
    pub ci_evaluations: MetricsMap,
    /// Aggregate metric record averaged across keywords.
    ///
    /// The producer emits a single averaged record here, not a per-keyword
    /// map; condition-tag extraction reads it directly as the tag's metric.
    #[serde(default)]
    pub ci_averaged_evaluation: KeywordMetric,
}

/// Evaluation slice for one dataset: per-IOU-threshold metrics plus
/// IOU-averaged aggregates and segmentation summaries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IouEvaluation {
    /// Metrics keyed by IOU threshold rendered as a decimal string ("0.5").
    ///
    /// "First entry" throughout the crate means the smallest key in map
    /// order, which for the producer's zero-padded threshold strings is the
    /// numerically lowest threshold.
    #[serde(default)]
    pub iou_evaluations: BTreeMap<String, ConfidenceEvaluation>,
    /// Metrics averaged across all IOU thresholds.
    #[serde(default)]
    pub iou_averaged_evaluation: ConfidenceEvaluation,
    /// Segmentation metrics: metric field -> keyword -> value.
    ///
    /// Already keyword-indexed at the top level; the detection-only
    /// confidence/IOU nesting does not apply to these.
    #[serde(default)]
    pub segmentation_metrics: BTreeMap<String, BTreeMap<String, f64>>,
}

impl IouEvaluation {
    /// The confidence evaluation at the lowest IOU threshold, if any.
    #[must_use]
    pub fn first_iou(&self) -> Option<&ConfidenceEvaluation> {
        self.iou_evaluations.values().next()
    }
}

// =============================================================================
// Records & Result Snapshot
// =============================================================================

/// Everything the producer evaluated for one prediction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The whole-dataset evaluation slice.
    #[serde(default)]
    pub dataset_evaluation: IouEvaluation,
    /// Per-condition-tag slices, keyed by tag value.
    ///
    /// Present only for detection predictions evaluated with a condition
    /// tag; `None` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_cks: Option<BTreeMap<String, IouEvaluation>>,
}

/// Immutable snapshot of one diagnosis run, keyed by prediction id.
///
/// A snapshot is replaced wholesale when the user re-runs a diagnosis; it is
/// never patched in place. See [`DiagnosisSession`](crate::session::DiagnosisSession)
/// for the replacement protocol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationResult {
    records: BTreeMap<PredictionId, EvaluationRecord>,
}

impl EvaluationResult {
    /// Build a snapshot from per-prediction records.
    #[must_use]
    pub fn new(records: BTreeMap<PredictionId, EvaluationRecord>) -> Self {
        Self { records }
    }

    /// The record for one prediction, if it was evaluated.
    #[must_use]
    pub fn record(&self, id: PredictionId) -> Option<&EvaluationRecord> {
        self.records.get(&id)
    }

    /// Number of evaluated predictions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no predictions were evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of all evaluated predictions, ascending.
    pub fn prediction_ids(&self) -> impl Iterator<Item = PredictionId> + '_ {
        self.records.keys().copied()
    }

    /// Iterate over `(id, record)` pairs, ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = (PredictionId, &EvaluationRecord)> {
        self.records.iter().map(|(id, rec)| (*id, rec))
    }
}

impl FromIterator<(PredictionId, EvaluationRecord)> for EvaluationResult {
    fn from_iter<I: IntoIterator<Item = (PredictionId, EvaluationRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_metric(ap: f64) -> KeywordMetric {
        KeywordMetric {
            ap: Some(ap),
            ..Default::default()
        }
    }

    #[test]
    fn partial_payload_defaults_to_empty() {
        let record: EvaluationRecord = serde_json::from_str("{}").unwrap();
        assert!(record.dataset_evaluation.iou_evaluations.is_empty());
        assert!(record.dataset_evaluation.segmentation_metrics.is_empty());
        assert!(record.sub_cks.is_none());
    }

    #[test]
    fn wire_field_names_round_trip() {
        let json = r#"{
            "7": {
                "dataset_evaluation": {
                    "iou_evaluations": {
                        "0.5": {
                            "ci_evaluations": {
                                "cat": {"ap": 0.8, "pr_curve": [{"x": 0.7, "y": 0.9, "z": 0.5}]}
                            },
                            "ci_averaged_evaluation": {"ap": 0.8}
                        }
                    },
                    "iou_averaged_evaluation": {
                        "ci_evaluations": {"cat": {"ap": 0.75}},
                        "ci_averaged_evaluation": {"ap": 0.75}
                    }
                }
            }
        }"#;
        let result: EvaluationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.len(), 1);

        let record = result.record(7).unwrap();
        let first = record.dataset_evaluation.first_iou().unwrap();
        assert_eq!(first.ci_evaluations["cat"].ap, Some(0.8));
        let curve = first.ci_evaluations["cat"].pr_curve.as_ref().unwrap();
        assert_eq!(curve[0], CurvePoint::new(0.7, 0.9, 0.5));

        // Field names survive a round trip unchanged.
        let back = serde_json::to_value(&result).unwrap();
        assert!(back["7"]["dataset_evaluation"]["iou_evaluations"]["0.5"]["ci_evaluations"]
            .is_object());
        assert_eq!(
            back["7"]["dataset_evaluation"]["iou_averaged_evaluation"]["ci_averaged_evaluation"]
                ["ap"],
            0.75
        );
    }

    #[test]
    fn absent_coordinates_are_omitted() {
        let fallback = CurvePoint {
            x: Some(1.0),
            y: None,
            z: None,
        };
        let json = serde_json::to_string(&fallback).unwrap();
        assert_eq!(json, r#"{"x":1.0}"#);
    }

    #[test]
    fn first_iou_is_lowest_threshold() {
        let mut iou_evaluations = BTreeMap::new();
        for key in ["0.75", "0.5", "0.95"] {
            let mut ci_evaluations = MetricsMap::new();
            ci_evaluations.insert("cat".into(), make_metric(0.5));
            iou_evaluations.insert(
                key.to_string(),
                ConfidenceEvaluation {
                    ci_evaluations,
                    ci_averaged_evaluation: make_metric(0.5),
                },
            );
        }
        let eval = IouEvaluation {
            iou_evaluations,
            ..Default::default()
        };
        let first_key = eval.iou_evaluations.keys().next().unwrap();
        assert_eq!(first_key, "0.5");
        assert!(eval.first_iou().is_some());
    }

    #[test]
    fn empty_evaluation_result() {
        let result = EvaluationResult::default();
        assert!(result.is_empty());
        assert!(result.record(1).is_none());
        assert_eq!(result.prediction_ids().count(), 0);
    }
}
