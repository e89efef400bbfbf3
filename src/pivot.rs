//! Panel assembly: reshaping extracted metrics along a comparison axis.
//!
//! A diagnosis compares N predictions (model-stage pairs run against
//! datasets) under one view. The same leaf values can be laid out two ways:
//!
//! - **by dataset**: one panel per dataset, rows are predictions, columns
//!   are keywords;
//! - **by keyword**: one panel per keyword (or condition-tag value), rows
//!   are distinct model-stage pairs, columns are datasets.
//!
//! Curve views additionally fan each row out per target rate, so a panel
//! row becomes a (prediction, target-rate) pair.
//!
//! The builder is pure and infallible: identical inputs produce identical
//! panels, and missing payload slices surface as absent cells rather than
//! errors. Callers rebuild the whole panel list whenever any input changes;
//! there is no incremental path.
//!
//! # Example
//!
//! ```rust
//! use trellis::catalog::{Dataset, Model, Prediction, PredictionKind};
//! use trellis::pivot::{DiagnosisConfig, PivotBuilder};
//! use trellis::schema::EvaluationResult;
//!
//! let result = EvaluationResult::default();
//! let predictions = vec![Prediction::new(1, 10, 2, 55, PredictionKind::Detection)];
//! let models = vec![Model::new(10, "yolo-v5").with_stage(2, "best")];
//! let datasets = vec![Dataset::new(55, "val-set")];
//! let keywords = vec!["cat".to_string()];
//!
//! let builder = PivotBuilder::new(
//!     &result,
//!     &predictions,
//!     &models,
//!     &datasets,
//!     &keywords,
//!     DiagnosisConfig::default(),
//! );
//! let panels = builder.build();
//! assert_eq!(panels.len(), 1); // one panel per dataset
//! ```

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::{Dataset, DatasetId, Model, ModelId, Prediction, StageId};
use crate::error::{Error, Result};
use crate::extract::{keyword_curves, scalar_values, MetricSelection, ViewKind};
use crate::sampler::{closest_point, CurveAxis, CurveSampler};
use crate::schema::{CurvePoint, EvaluationResult};
use crate::stats;

// =============================================================================
// Configuration
// =============================================================================

/// Lowest confidence a diagnosis may request from the producer.
pub const CONFIDENCE_MIN: f64 = 0.0005;
/// Highest confidence a diagnosis may request from the producer.
pub const CONFIDENCE_MAX: f64 = 0.9995;

/// Which way the panels slice the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotAxis {
    /// One panel per dataset; rows are predictions, columns are keywords.
    #[default]
    Dataset,
    /// One panel per keyword; rows are model-stage pairs, columns are
    /// datasets.
    Keyword,
}

/// Everything the user selected for one diagnosis.
///
/// Any field change invalidates the current panels; callers re-run
/// [`PivotBuilder::build`] from scratch. The `confidence` parameterizes the
/// upstream evaluation fetch and is validated here so a bad form value is
/// rejected before any request goes out; the pivot itself does not consume
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosisConfig {
    /// The metric view to extract.
    pub view: ViewKind,
    /// Panel layout axis.
    pub axis: PivotAxis,
    /// Slice detection metrics by condition-tag value instead of keyword.
    pub by_condition_tag: bool,
    /// Read IOU-averaged aggregates instead of the lowest threshold.
    pub average_iou: bool,
    /// Confidence requested from the producer, in
    /// [[`CONFIDENCE_MIN`], [`CONFIDENCE_MAX`]].
    pub confidence: f64,
    /// Inclusive `[min, max]` target-rate range for curve views.
    pub target_rate_range: [f64; 2],
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            view: ViewKind::default(),
            axis: PivotAxis::default(),
            by_condition_tag: false,
            average_iou: false,
            confidence: 0.5,
            target_rate_range: [0.0, 1.0],
        }
    }
}

impl DiagnosisConfig {
    /// Check the user-entered fields before running a diagnosis.
    pub fn validate(&self) -> Result<()> {
        if !(CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&self.confidence) {
            return Err(Error::invalid_config(format!(
                "confidence {} outside [{CONFIDENCE_MIN}, {CONFIDENCE_MAX}]",
                self.confidence
            )));
        }
        let [min, max] = self.target_rate_range;
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(Error::invalid_config(format!(
                "target rate range [{min}, {max}] is not an ordered subrange of [0, 1]"
            )));
        }
        Ok(())
    }

    fn selection(&self) -> MetricSelection {
        MetricSelection::new(self.by_condition_tag, self.average_iou)
    }
}

// =============================================================================
// Output Shape
// =============================================================================

/// One row of a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Stable row id, unique within the panel (`"17"`, `"17@0.85"`,
    /// `"10-2"`).
    pub id: String,
    /// Display label (model version + stage name).
    pub name: String,
    /// Cell values keyed by column. `None` marks a column with no value;
    /// lookup is by key, presentation order is the caller's column array.
    pub column_values: BTreeMap<String, Option<f64>>,
    /// Row summary over the columns, full-length denominator
    /// ([`stats::average_defined`]). NaN (serialized as null) when the row
    /// has no columns at all.
    pub average: f64,
    /// Mean of the confidence (`z`) read-outs; curve rows only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_average: Option<f64>,
    /// The target rate this row samples; curve rows only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rate: Option<f64>,
}

/// One comparison panel (a titled table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    /// Stable panel id (dataset id or keyword).
    pub id: String,
    /// Display label (dataset version name or keyword).
    pub label: String,
    /// Rows in presentation order.
    pub rows: Vec<Row>,
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles ordered panels from an evaluation snapshot.
///
/// Borrows everything: the snapshot, the catalog slices, and the keyword
/// list (keyword values, or condition-tag values when the config slices by
/// tag). Panel, row, and column orders follow the caller's arrays so the
/// dashboard controls presentation.
#[derive(Debug, Clone)]
pub struct PivotBuilder<'a> {
    result: &'a EvaluationResult,
    predictions: &'a [Prediction],
    models: &'a [Model],
    datasets: &'a [Dataset],
    keywords: &'a [String],
    config: DiagnosisConfig,
    sampler: CurveSampler,
}

impl<'a> PivotBuilder<'a> {
    /// Create a builder over one diagnosis worth of inputs.
    #[must_use]
    pub fn new(
        result: &'a EvaluationResult,
        predictions: &'a [Prediction],
        models: &'a [Model],
        datasets: &'a [Dataset],
        keywords: &'a [String],
        config: DiagnosisConfig,
    ) -> Self {
        Self {
            result,
            predictions,
            models,
            datasets,
            keywords,
            config,
            sampler: CurveSampler::default(),
        }
    }

    /// Override the target-rate spacing for curve views.
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.sampler = CurveSampler::new(step);
        self
    }

    /// Build all panels for the configured axis.
    ///
    /// Infallible: inputs with no usable data produce empty panels or rows
    /// of absent cells, never an error.
    #[must_use]
    pub fn build(&self) -> Vec<Panel> {
        let panels = match self.config.axis {
            PivotAxis::Dataset => self.dataset_panels(),
            PivotAxis::Keyword => self.keyword_panels(),
        };
        debug!(
            "built {} panel(s) along the {:?} axis for view {}",
            panels.len(),
            self.config.axis,
            self.config.view.name()
        );
        panels
    }

    // -------------------------------------------------------------------------
    // By-dataset axis
    // -------------------------------------------------------------------------

    fn dataset_panels(&self) -> Vec<Panel> {
        self.datasets
            .iter()
            .map(|dataset| {
                let mut rows = Vec::new();
                for pred in self
                    .predictions
                    .iter()
                    .filter(|p| p.infer_dataset_id == dataset.id)
                {
                    if self.config.view.is_curve() {
                        rows.extend(self.curve_rows_for_prediction(pred));
                    } else {
                        rows.push(self.scalar_row_for_prediction(pred));
                    }
                }
                Panel {
                    id: dataset.id.to_string(),
                    label: dataset.version_name.clone(),
                    rows,
                }
            })
            .collect()
    }

    /// Scalar row: one cell per keyword, all drawn from this prediction's
    /// record.
    fn scalar_row_for_prediction(&self, pred: &Prediction) -> Row {
        let values = self
            .result
            .record(pred.id)
            .map(|rec| scalar_values(rec, self.config.view, self.config.selection()))
            .unwrap_or_default();
        let cells: Vec<Option<f64>> = self
            .keywords
            .iter()
            .map(|keyword| values.get(keyword.as_str()).copied())
            .collect();
        self.scalar_row(
            pred.id.to_string(),
            self.model_label(pred.model_id(), pred.stage_id()),
            self.keywords,
            cells,
        )
    }

    /// Curve rows: one per target rate, each cell sampling the matching
    /// keyword's stored curve.
    fn curve_rows_for_prediction(&self, pred: &Prediction) -> Vec<Row> {
        let Some(sample_axis) = self.config.view.sample_axis() else {
            return Vec::new();
        };
        let stored = self
            .result
            .record(pred.id)
            .map(|rec| keyword_curves(rec, self.config.selection()))
            .unwrap_or_default();
        let curves: Vec<&[CurvePoint]> = self
            .keywords
            .iter()
            .map(|keyword| stored.get(keyword.as_str()).copied().unwrap_or(&[]))
            .collect();

        let base_id = pred.id.to_string();
        let name = self.model_label(pred.model_id(), pred.stage_id());
        self.rates()
            .into_iter()
            .map(|rate| {
                let sampled: Vec<(Option<f64>, Option<f64>)> = curves
                    .iter()
                    .map(|curve| sample_cell(rate, curve, sample_axis))
                    .collect();
                self.curve_row(&base_id, name.clone(), self.keywords, rate, sampled)
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // By-keyword axis
    // -------------------------------------------------------------------------

    fn keyword_panels(&self) -> Vec<Panel> {
        let pairs = self.model_stage_pairs();
        let columns: Vec<String> = self.datasets.iter().map(|d| d.id.to_string()).collect();

        self.keywords
            .iter()
            .map(|keyword| {
                let mut rows = Vec::new();
                for &pair in &pairs {
                    if self.config.view.is_curve() {
                        rows.extend(self.curve_rows_for_pair(pair, keyword, &columns));
                    } else {
                        rows.push(self.scalar_row_for_pair(pair, keyword, &columns));
                    }
                }
                Panel {
                    id: keyword.clone(),
                    label: keyword.clone(),
                    rows,
                }
            })
            .collect()
    }

    /// Scalar row: one cell per dataset, each reading `keyword` out of the
    /// record of the prediction matching (model, stage, dataset).
    fn scalar_row_for_pair(
        &self,
        pair: (ModelId, StageId),
        keyword: &str,
        columns: &[String],
    ) -> Row {
        let cells: Vec<Option<f64>> = self
            .datasets
            .iter()
            .map(|dataset| {
                self.prediction_for(pair, dataset.id)
                    .and_then(|p| self.result.record(p.id))
                    .and_then(|rec| {
                        scalar_values(rec, self.config.view, self.config.selection())
                            .get(keyword)
                            .copied()
                    })
            })
            .collect();
        self.scalar_row(
            format!("{}-{}", pair.0, pair.1),
            self.model_label(pair.0, pair.1),
            columns,
            cells,
        )
    }

    /// Curve rows: one per target rate, each cell sampling `keyword`'s curve
    /// from the matching dataset's prediction.
    fn curve_rows_for_pair(
        &self,
        pair: (ModelId, StageId),
        keyword: &str,
        columns: &[String],
    ) -> Vec<Row> {
        let Some(sample_axis) = self.config.view.sample_axis() else {
            return Vec::new();
        };
        let curves: Vec<&[CurvePoint]> = self
            .datasets
            .iter()
            .map(|dataset| {
                self.prediction_for(pair, dataset.id)
                    .and_then(|p| self.result.record(p.id))
                    .and_then(|rec| {
                        keyword_curves(rec, self.config.selection())
                            .get(keyword)
                            .copied()
                    })
                    .unwrap_or(&[])
            })
            .collect();

        let base_id = format!("{}-{}", pair.0, pair.1);
        let name = self.model_label(pair.0, pair.1);
        self.rates()
            .into_iter()
            .map(|rate| {
                let sampled: Vec<(Option<f64>, Option<f64>)> = curves
                    .iter()
                    .map(|curve| sample_cell(rate, curve, sample_axis))
                    .collect();
                self.curve_row(&base_id, name.clone(), columns, rate, sampled)
            })
            .collect()
    }

    /// Distinct model-stage pairs in first-seen prediction order.
    fn model_stage_pairs(&self) -> Vec<(ModelId, StageId)> {
        let mut pairs = Vec::new();
        for pred in self.predictions {
            if !pairs.contains(&pred.infer_model_id) {
                pairs.push(pred.infer_model_id);
            }
        }
        pairs
    }

    /// First prediction matching (model, stage) on `dataset`.
    fn prediction_for(
        &self,
        pair: (ModelId, StageId),
        dataset: DatasetId,
    ) -> Option<&'a Prediction> {
        self.predictions
            .iter()
            .find(|p| p.infer_model_id == pair && p.infer_dataset_id == dataset)
    }

    // -------------------------------------------------------------------------
    // Row assembly
    // -------------------------------------------------------------------------

    fn rates(&self) -> Vec<f64> {
        let [min, max] = self.config.target_rate_range;
        self.sampler.target_rates(min, max)
    }

    fn scalar_row(
        &self,
        id: String,
        name: String,
        columns: &[String],
        cells: Vec<Option<f64>>,
    ) -> Row {
        let average = stats::average_defined(&cells);
        Row {
            id,
            name,
            column_values: columns.iter().cloned().zip(cells).collect(),
            average,
            confidence_average: None,
            target_rate: None,
        }
    }

    fn curve_row(
        &self,
        base_id: &str,
        name: String,
        columns: &[String],
        rate: f64,
        sampled: Vec<(Option<f64>, Option<f64>)>,
    ) -> Row {
        let (cells, confidences): (Vec<Option<f64>>, Vec<Option<f64>>) =
            sampled.into_iter().unzip();
        let average = stats::average_defined(&cells);
        let confidence_average = Some(stats::average_defined(&confidences));
        Row {
            id: format!("{base_id}@{rate}"),
            name,
            column_values: columns.iter().cloned().zip(cells).collect(),
            average,
            confidence_average,
            target_rate: Some(rate),
        }
    }

    fn model_label(&self, model: ModelId, stage: StageId) -> String {
        self.models
            .iter()
            .find(|m| m.id == model)
            .map(|m| m.label(stage))
            .unwrap_or_else(|| model.to_string())
    }
}

/// `(metric readout, confidence readout)` for one sampled cell.
fn sample_cell(rate: f64, curve: &[CurvePoint], sample_axis: CurveAxis) -> (Option<f64>, Option<f64>) {
    let point = closest_point(rate, curve, sample_axis);
    (sample_axis.complement().coordinate(&point), point.z)
}

// =============================================================================
// Tests
// =============================================================================
