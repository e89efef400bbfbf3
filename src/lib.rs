//! # trellis
//!
//! Evaluation-metrics pivoting and curve sampling for model-diagnosis
//! dashboards.
//!
//! A diagnosis run produces one raw evaluation payload per prediction
//! (AP/IOU/accuracy per keyword, optional condition-tag slices, optional
//! full precision-recall curves). This crate reshapes those payloads into
//! the ordered comparison panels a dashboard renders:
//!
//! - **Schema**: serde types mirroring the producer's payload bit-for-bit
//! - **Extraction**: view-driven, keyword-indexed metric lookup
//! - **Sampling**: exact target-rate grids + nearest-point curve read-outs
//! - **Pivoting**: panels along a by-dataset or by-keyword axis
//! - **Session**: fetch sequencing so stale snapshots never win
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis::prelude::*;
//!
//! # fn main() -> trellis::Result<()> {
//! let result = trellis::loader::parse_evaluation_result(
//!     r#"{
//!         "1": {
//!             "dataset_evaluation": {
//!                 "iou_evaluations": {
//!                     "0.5": {
//!                         "ci_evaluations": {"cat": {"ap": 0.8}, "dog": {"ap": 0.6}},
//!                         "ci_averaged_evaluation": {"ap": 0.7}
//!                     }
//!                 }
//!             }
//!         }
//!     }"#,
//! )?;
//!
//! let predictions = vec![Prediction::new(1, 10, 2, 55, PredictionKind::Detection)];
//! let models = vec![Model::new(10, "yolo-v5").with_stage(2, "best")];
//! let datasets = vec![Dataset::new(55, "val-set")];
//! let keywords = vec!["cat".to_string(), "dog".to_string()];
//!
//! let config = DiagnosisConfig::default();
//! config.validate()?;
//!
//! let panels = PivotBuilder::new(
//!     &result,
//!     &predictions,
//!     &models,
//!     &datasets,
//!     &keywords,
//!     config,
//! )
//! .build();
//!
//! assert_eq!(panels.len(), 1); // one panel per dataset
//! assert_eq!(panels[0].rows[0].average, 0.7); // (0.8 + 0.6) / 2
//! # Ok(())
//! # }
//! ```
//!
//! ## Views
//!
//! | View | Reads | Kind |
//! |------|-------|------|
//! | `MeanAp` | `ap` | scalar |
//! | `BoxAp` | `boxap` | scalar |
//! | `MaskAp` | `maskap` | scalar |
//! | `SegmentationIou` | `segmentation_metrics["iou"]` | scalar |
//! | `SegmentationAccuracy` | `segmentation_metrics["acc"]` | scalar |
//! | `PrecisionAtRecall` | `pr_curve`, sampled along recall | curve |
//! | `RecallAtPrecision` | `pr_curve`, sampled along precision | curve |
//!
//! ## Design Notes
//!
//! - **Pure transform**: identical inputs produce identical panels; callers
//!   rebuild from scratch on any change
//! - **Absence is not zero**: metrics the producer never computed stay out
//!   of cells, but sparse rows still average over the full column count
//! - **Exact rates**: target-rate walks run in whole centiles, so `0.85`
//!   is `0.85`, every time

#![warn(missing_docs)]

pub mod catalog;
pub mod display;
mod error;
pub mod extract;
pub mod loader;
pub mod pivot;
pub mod sampler;
pub mod schema;
pub mod session;
pub mod stats;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use trellis::prelude::*;
    //!
    //! let config = DiagnosisConfig::default();
    //! assert!(config.validate().is_ok());
    //! ```
    pub use crate::catalog::{Dataset, Model, ModelStage, Prediction, PredictionKind};
    pub use crate::error::{Error, Result};
    pub use crate::extract::{MetricSelection, ViewKind};
    pub use crate::pivot::{DiagnosisConfig, Panel, PivotAxis, PivotBuilder, Row};
    pub use crate::sampler::{CurveAxis, CurveSampler};
    pub use crate::schema::{CurvePoint, EvaluationRecord, EvaluationResult, KeywordMetric};
    pub use crate::session::{DiagnosisSession, FetchTicket};
}

// Re-exports
pub use catalog::{
    Dataset, DatasetId, Model, ModelId, ModelStage, Prediction, PredictionId, PredictionKind,
    StageId,
};
pub use error::{Error, Result};
pub use extract::{MetricSelection, ViewKind};
pub use pivot::{
    DiagnosisConfig, Panel, PivotAxis, PivotBuilder, Row, CONFIDENCE_MAX, CONFIDENCE_MIN,
};
pub use sampler::{CurveAxis, CurveSampler, DEFAULT_RATE_STEP};
pub use schema::{
    ConfidenceEvaluation, CurvePoint, EvaluationRecord, EvaluationResult, IouEvaluation,
    KeywordMetric, MetricsMap,
};
pub use session::{DiagnosisSession, FetchTicket};
