//! Collaborator references: predictions, models, stages, datasets.
//!
//! The pivot engine does not own these records; the application hands in
//! read-only slices and the engine uses them for grouping keys and row/panel
//! labels only. Shapes are serialized camelCase (`inferModelId`,
//! `versionName`) to match the dashboard's props.

use serde::{Deserialize, Serialize};

/// Identifier of an evaluated prediction.
pub type PredictionId = u64;
/// Identifier of a model.
pub type ModelId = u64;
/// Identifier of a model training stage.
pub type StageId = u64;
/// Identifier of a dataset version.
pub type DatasetId = u64;

// =============================================================================
// Predictions
// =============================================================================

/// What kind of output a prediction's model produces.
///
/// Condition-tag slices (`sub_cks`) only exist for detection; segmentation
/// metrics only exist for the two segmentation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    /// Object detection (boxes).
    Detection,
    /// Semantic segmentation (per-pixel classes).
    SemanticSegmentation,
    /// Instance segmentation (per-instance masks).
    InstanceSegmentation,
}

impl PredictionKind {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PredictionKind::Detection => "detection",
            PredictionKind::SemanticSegmentation => "semantic_segmentation",
            PredictionKind::InstanceSegmentation => "instance_segmentation",
        }
    }

    /// True for detection predictions.
    #[must_use]
    pub fn is_detection(&self) -> bool {
        matches!(self, PredictionKind::Detection)
    }
}

/// One evaluated prediction: a (model, stage) pair run against a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Prediction id; keys the evaluation payload.
    pub id: PredictionId,
    /// `(model, stage)` pair that produced this prediction.
    pub infer_model_id: (ModelId, StageId),
    /// Dataset the model was run against.
    pub infer_dataset_id: DatasetId,
    /// Output kind of the producing model.
    #[serde(rename = "type")]
    pub kind: PredictionKind,
}

impl Prediction {
    /// Create a prediction reference.
    #[must_use]
    pub fn new(
        id: PredictionId,
        model: ModelId,
        stage: StageId,
        dataset: DatasetId,
        kind: PredictionKind,
    ) -> Self {
        Self {
            id,
            infer_model_id: (model, stage),
            infer_dataset_id: dataset,
            kind,
        }
    }

    /// The producing model's id.
    #[must_use]
    pub fn model_id(&self) -> ModelId {
        self.infer_model_id.0
    }

    /// The producing stage's id.
    #[must_use]
    pub fn stage_id(&self) -> StageId {
        self.infer_model_id.1
    }
}

// =============================================================================
// Models & Datasets
// =============================================================================

/// One training stage of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStage {
    /// Stage id.
    pub id: StageId,
    /// Stage name ("best", "epoch-40").
    pub name: String,
}

/// A model version with its selectable stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Model id.
    pub id: ModelId,
    /// Human-readable version name.
    pub version_name: String,
    /// Stages this model exposes.
    #[serde(default)]
    pub stages: Vec<ModelStage>,
}

impl Model {
    /// Create a model reference with no stages.
    #[must_use]
    pub fn new(id: ModelId, version_name: impl Into<String>) -> Self {
        Self {
            id,
            version_name: version_name.into(),
            stages: Vec::new(),
        }
    }

    /// Add a stage.
    #[must_use]
    pub fn with_stage(mut self, id: StageId, name: impl Into<String>) -> Self {
        self.stages.push(ModelStage {
            id,
            name: name.into(),
        });
        self
    }

    /// Name of a stage, if the model has it.
    #[must_use]
    pub fn stage_name(&self, stage: StageId) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.id == stage)
            .map(|s| s.name.as_str())
    }

    /// Row label for a (model, stage) pair: `"versionName stageName"`.
    ///
    /// Falls back to the bare version name when the stage is unknown.
    #[must_use]
    pub fn label(&self, stage: StageId) -> String {
        match self.stage_name(stage) {
            Some(name) => format!("{} {}", self.version_name, name),
            None => self.version_name.clone(),
        }
    }
}

/// A dataset version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Dataset id.
    pub id: DatasetId,
    /// Human-readable version name.
    pub version_name: String,
}

impl Dataset {
    /// Create a dataset reference.
    #[must_use]
    pub fn new(id: DatasetId, version_name: impl Into<String>) -> Self {
        Self {
            id,
            version_name: version_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_serializes_camel_case() {
        let pred = Prediction::new(3, 10, 2, 55, PredictionKind::Detection);
        let value = serde_json::to_value(&pred).unwrap();
        assert_eq!(value["inferModelId"][0], 10);
        assert_eq!(value["inferModelId"][1], 2);
        assert_eq!(value["inferDatasetId"], 55);
        assert_eq!(value["type"], "detection");
    }

    #[test]
    fn model_label_uses_stage_name() {
        let model = Model::new(10, "yolo-v5").with_stage(2, "best");
        assert_eq!(model.label(2), "yolo-v5 best");
        assert_eq!(model.label(99), "yolo-v5");
        assert_eq!(model.stage_name(2), Some("best"));
        assert_eq!(model.stage_name(99), None);
    }

    #[test]
    fn only_detection_is_detection() {
        assert!(PredictionKind::Detection.is_detection());
        assert!(!PredictionKind::SemanticSegmentation.is_detection());
        assert!(!PredictionKind::InstanceSegmentation.is_detection());
        assert_eq!(PredictionKind::SemanticSegmentation.name(), "semantic_segmentation");
    }
}
