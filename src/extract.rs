//! View-driven metric extraction from evaluation records.
//!
//! The dashboard offers a fixed set of views (mAP, boxAP, maskAP,
//! segmentation IoU/accuracy, and the two curve read-outs). [`ViewKind`]
//! enumerates them as a closed set: every dispatch is an exhaustive match,
//! so adding a view is a compile-time checklist instead of a stringly-keyed
//! lookup that silently misses.
//!
//! Extraction never fails. A record that lacks the requested slice yields an
//! empty map and the pivot simply renders fewer cells.
//!
//! # Example
//!
//! ```rust
//! use trellis::extract::{scalar_values, MetricSelection, ViewKind};
//! use trellis::schema::EvaluationRecord;
//!
//! let record = EvaluationRecord::default();
//! let values = scalar_values(&record, ViewKind::MeanAp, MetricSelection::default());
//! assert!(values.is_empty()); // nothing evaluated, nothing extracted
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sampler::CurveAxis;
use crate::schema::{CurvePoint, EvaluationRecord, KeywordMetric};

// =============================================================================
// View Kinds
// =============================================================================

/// One dashboard view over the evaluation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Mean average precision (detection). The default view.
    #[default]
    MeanAp,
    /// Box average precision (instance segmentation).
    BoxAp,
    /// Mask average precision (instance segmentation).
    MaskAp,
    /// Mean IoU (semantic segmentation).
    SegmentationIou,
    /// Pixel accuracy (semantic segmentation).
    SegmentationAccuracy,
    /// Precision read off the PR curve at fixed recall targets.
    PrecisionAtRecall,
    /// Recall read off the PR curve at fixed precision targets.
    RecallAtPrecision,
}

impl ViewKind {
    /// All available views.
    pub fn all() -> &'static [ViewKind] {
        &[
            ViewKind::MeanAp,
            ViewKind::BoxAp,
            ViewKind::MaskAp,
            ViewKind::SegmentationIou,
            ViewKind::SegmentationAccuracy,
            ViewKind::PrecisionAtRecall,
            ViewKind::RecallAtPrecision,
        ]
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::MeanAp => "mAP",
            ViewKind::BoxAp => "boxAP",
            ViewKind::MaskAp => "maskAP",
            ViewKind::SegmentationIou => "mIoU",
            ViewKind::SegmentationAccuracy => "mAcc",
            ViewKind::PrecisionAtRecall => "precision@recall",
            ViewKind::RecallAtPrecision => "recall@precision",
        }
    }

    /// True for the two curve read-out views.
    #[must_use]
    pub fn is_curve(&self) -> bool {
        matches!(self, ViewKind::PrecisionAtRecall | ViewKind::RecallAtPrecision)
    }

    /// True for the segmentation summary views.
    #[must_use]
    pub fn is_segmentation(&self) -> bool {
        matches!(self, ViewKind::SegmentationIou | ViewKind::SegmentationAccuracy)
    }

    /// Curve axis the target rates are matched against, for curve views.
    #[must_use]
    pub fn sample_axis(&self) -> Option<CurveAxis> {
        match self {
            ViewKind::PrecisionAtRecall => Some(CurveAxis::Recall),
            ViewKind::RecallAtPrecision => Some(CurveAxis::Precision),
            _ => None,
        }
    }

    /// Curve axis whose coordinate becomes the cell value, for curve views.
    #[must_use]
    pub fn readout_axis(&self) -> Option<CurveAxis> {
        self.sample_axis().map(|axis| axis.complement())
    }

    /// The scalar this view reads from a keyword's metric record.
    ///
    /// `None` both for curve views (they read points, not scalars) and for
    /// records that never computed the scalar. Absence must stay absent; it
    /// is not zero.
    #[must_use]
    pub fn scalar_of(&self, metric: &KeywordMetric) -> Option<f64> {
        match self {
            ViewKind::MeanAp => metric.ap,
            ViewKind::BoxAp => metric.boxap,
            ViewKind::MaskAp => metric.maskap,
            ViewKind::SegmentationIou => metric.iou,
            ViewKind::SegmentationAccuracy => metric.acc,
            ViewKind::PrecisionAtRecall | ViewKind::RecallAtPrecision => None,
        }
    }

    /// Key into `segmentation_metrics` for the segmentation views.
    #[must_use]
    pub fn segmentation_field(&self) -> Option<&'static str> {
        match self {
            ViewKind::SegmentationIou => Some("iou"),
            ViewKind::SegmentationAccuracy => Some("acc"),
            _ => None,
        }
    }
}

// =============================================================================
// Selection Flags
// =============================================================================

/// How detection metrics are sliced out of the nested payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricSelection {
    /// Index by condition-tag value (`sub_cks`) instead of keyword.
    #[serde(default)]
    pub by_condition_tag: bool,
    /// Read the IOU-averaged aggregate instead of the lowest threshold.
    #[serde(default)]
    pub average_iou: bool,
}

impl MetricSelection {
    /// Create a selection.
    #[must_use]
    pub fn new(by_condition_tag: bool, average_iou: bool) -> Self {
        Self {
            by_condition_tag,
            average_iou,
        }
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Keyword-indexed (or tag-indexed) metric records for a detection payload.
///
/// Without the condition-tag flag this is the `ci_evaluations` map of either
/// the IOU-averaged aggregate or the lowest IOU threshold, per
/// `selection.average_iou`. With the flag, each `sub_cks` tag contributes its
/// IOU-averaged, keyword-averaged record under the tag value.
///
/// Missing slices yield an empty map, never an error.
#[must_use]
pub fn detection_metrics<'a>(
    record: &'a EvaluationRecord,
    selection: MetricSelection,
) -> BTreeMap<&'a str, &'a KeywordMetric> {
    if selection.by_condition_tag {
        let Some(sub_cks) = record.sub_cks.as_ref() else {
            return BTreeMap::new();
        };
        return sub_cks
            .iter()
            .map(|(tag, slice)| {
                let metric = &slice.iou_averaged_evaluation.ci_averaged_evaluation;
                (tag.as_str(), metric)
            })
            .collect();
    }

    let evaluation = &record.dataset_evaluation;
    let confidence = if selection.average_iou {
        Some(&evaluation.iou_averaged_evaluation)
    } else {
        evaluation.first_iou()
    };
    confidence
        .map(|ci| {
            ci.ci_evaluations
                .iter()
                .map(|(keyword, metric)| (keyword.as_str(), metric))
                .collect()
        })
        .unwrap_or_default()
}

/// Keyword-indexed scalar values for a scalar view.
///
/// Detection views go through [`detection_metrics`] and read
/// [`ViewKind::scalar_of`]; keywords whose record lacks the scalar are
/// omitted rather than reported as zero. Segmentation views read the
/// already-keyword-indexed `segmentation_metrics` table (the condition-tag
/// flag does not apply there and is ignored). Curve views have no scalars
/// and yield an empty map.
#[must_use]
pub fn scalar_values<'a>(
    record: &'a EvaluationRecord,
    view: ViewKind,
    selection: MetricSelection,
) -> BTreeMap<&'a str, f64> {
    if view.is_curve() {
        return BTreeMap::new();
    }

    if let Some(field) = view.segmentation_field() {
        return record
            .dataset_evaluation
            .segmentation_metrics
            .get(field)
            .map(|by_keyword| {
                by_keyword
                    .iter()
                    .map(|(keyword, value)| (keyword.as_str(), *value))
                    .collect()
            })
            .unwrap_or_default();
    }

    detection_metrics(record, selection)
        .into_iter()
        .filter_map(|(keyword, metric)| view.scalar_of(metric).map(|value| (keyword, value)))
        .collect()
}

/// Keyword-indexed PR curves for the curve views.
///
/// Curves live under a concrete IOU threshold, so the averaged-IOU flag does
/// not apply and the lowest threshold is always used. Keywords without a
/// stored curve are omitted; the sampler's fallback point handles them at
/// cell level.
#[must_use]
pub fn keyword_curves<'a>(
    record: &'a EvaluationRecord,
    selection: MetricSelection,
) -> BTreeMap<&'a str, &'a [CurvePoint]> {
    let selection = MetricSelection {
        average_iou: false,
        ..selection
    };
    detection_metrics(record, selection)
        .into_iter()
        .filter_map(|(keyword, metric)| {
            metric.pr_curve.as_deref().map(|curve| (keyword, curve))
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConfidenceEvaluation, IouEvaluation, MetricsMap};

    fn make_metric(ap: Option<f64>, boxap: Option<f64>) -> KeywordMetric {
        KeywordMetric {
            ap,
            boxap,
            ..Default::default()
        }
    }

    fn make_confidence(entries: &[(&str, KeywordMetric)]) -> ConfidenceEvaluation {
        let mut ci_evaluations = MetricsMap::new();
        for (keyword, metric) in entries {
            ci_evaluations.insert((*keyword).into(), metric.clone());
        }
        ConfidenceEvaluation {
            ci_evaluations,
            ci_averaged_evaluation: KeywordMetric::default(),
        }
    }

    fn make_record() -> EvaluationRecord {
        let mut iou_evaluations = BTreeMap::new();
        iou_evaluations.insert(
            "0.5".to_string(),
            make_confidence(&[
                ("cat", make_metric(Some(0.8), None)),
                ("dog", make_metric(Some(0.6), Some(0.55))),
            ]),
        );
        iou_evaluations.insert(
            "0.75".to_string(),
            make_confidence(&[("cat", make_metric(Some(0.5), None))]),
        );
        EvaluationRecord {
            dataset_evaluation: IouEvaluation {
                iou_evaluations,
                iou_averaged_evaluation: make_confidence(&[(
                    "cat",
                    make_metric(Some(0.65), None),
                )]),
                segmentation_metrics: BTreeMap::new(),
            },
            sub_cks: None,
        }
    }

    #[test]
    fn test_single_iou_uses_lowest_threshold() {
        let record = make_record();
        let metrics = detection_metrics(&record, MetricSelection::default());
        assert_eq!(metrics["cat"].ap, Some(0.8));
        assert_eq!(metrics["dog"].ap, Some(0.6));
    }

    #[test]
    fn test_average_iou_uses_aggregate() {
        let record = make_record();
        let metrics = detection_metrics(&record, MetricSelection::new(false, true));
        assert_eq!(metrics["cat"].ap, Some(0.65));
        assert!(!metrics.contains_key("dog"));
    }

    #[test]
    fn test_tag_mode_reads_averaged_records() {
        let mut record = make_record();
        let mut sub_cks = BTreeMap::new();
        for (tag, ap) in [("sunny", 0.9), ("rainy", 0.3)] {
            sub_cks.insert(
                tag.to_string(),
                IouEvaluation {
                    iou_averaged_evaluation: ConfidenceEvaluation {
                        ci_evaluations: MetricsMap::new(),
                        ci_averaged_evaluation: make_metric(Some(ap), None),
                    },
                    ..Default::default()
                },
            );
        }
        record.sub_cks = Some(sub_cks);

        let metrics = detection_metrics(&record, MetricSelection::new(true, false));
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["sunny"].ap, Some(0.9));
        assert_eq!(metrics["rainy"].ap, Some(0.3));
    }

    #[test]
    fn test_tag_mode_without_slices_is_empty() {
        let record = make_record();
        let metrics = detection_metrics(&record, MetricSelection::new(true, false));
        assert!(metrics.is_empty());

        let mut record = make_record();
        record.sub_cks = Some(BTreeMap::new());
        let metrics = detection_metrics(&record, MetricSelection::new(true, false));
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_absent_scalar_is_omitted_not_zero() {
        let record = make_record();
        // Only "dog" carries boxap; "cat" must not appear as 0.
        let values = scalar_values(&record, ViewKind::BoxAp, MetricSelection::default());
        assert_eq!(values.len(), 1);
        assert_eq!(values["dog"], 0.55);
    }

    #[test]
    fn test_segmentation_branch_ignores_tag_flag() {
        let mut record = EvaluationRecord::default();
        let mut by_keyword = BTreeMap::new();
        by_keyword.insert("road".to_string(), 0.72);
        record
            .dataset_evaluation
            .segmentation_metrics
            .insert("iou".to_string(), by_keyword);

        for by_tag in [false, true] {
            let values = scalar_values(
                &record,
                ViewKind::SegmentationIou,
                MetricSelection::new(by_tag, false),
            );
            assert_eq!(values["road"], 0.72);
        }
        let acc = scalar_values(
            &record,
            ViewKind::SegmentationAccuracy,
            MetricSelection::default(),
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_curve_views_have_no_scalars() {
        let record = make_record();
        for view in [ViewKind::PrecisionAtRecall, ViewKind::RecallAtPrecision] {
            assert!(scalar_values(&record, view, MetricSelection::default()).is_empty());
        }
    }

    #[test]
    fn test_curves_force_single_iou() {
        let mut record = make_record();
        let ci = record
            .dataset_evaluation
            .iou_evaluations
            .get_mut("0.5")
            .unwrap();
        ci.ci_evaluations.get_mut("cat").unwrap().pr_curve =
            Some(vec![CurvePoint::new(0.7, 0.9, 0.5)]);

        // The averaged flag must not reroute curve extraction to the
        // aggregate (which has no curves).
        let curves = keyword_curves(&record, MetricSelection::new(false, true));
        assert_eq!(curves.len(), 1);
        assert_eq!(curves["cat"].len(), 1);
    }

    #[test]
    fn test_view_axes() {
        assert_eq!(ViewKind::PrecisionAtRecall.sample_axis(), Some(CurveAxis::Recall));
        assert_eq!(
            ViewKind::PrecisionAtRecall.readout_axis(),
            Some(CurveAxis::Precision)
        );
        assert_eq!(ViewKind::RecallAtPrecision.sample_axis(), Some(CurveAxis::Precision));
        assert_eq!(ViewKind::MeanAp.sample_axis(), None);
        for view in ViewKind::all() {
            assert_eq!(view.is_curve(), view.sample_axis().is_some());
        }
    }
}
