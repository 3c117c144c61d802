//! JSON model files (feature: `serde`).
//!
//! A versioned, human-readable alternative to the binary layout in `persist`.
//!
//! Design notes:
//! - `Model` itself is not serialized directly, so the file format stays stable even if the
//!   in-memory representation changes.
//! - Deserialization validates the version, dimensions, parameter lengths, the learning rate,
//!   and that all parameters are finite.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Model, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedModel {
    pub format_version: u32,
    pub feature_size: usize,
    pub num_classes: usize,
    pub learning_rate: f32,
    /// Row-major (num_classes, feature_size).
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl SerializedModel {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        Ok(())
    }
}

impl From<&Model> for SerializedModel {
    fn from(model: &Model) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            feature_size: model.feature_size(),
            num_classes: model.num_classes(),
            learning_rate: model.learning_rate(),
            weights: model.weights().to_vec(),
            biases: model.biases().to_vec(),
        }
    }
}

impl TryFrom<SerializedModel> for Model {
    type Error = Error;

    fn try_from(value: SerializedModel) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        // Model::from_parts performs shape validation and finiteness checks.
        Model::from_parts(
            value.feature_size,
            value.num_classes,
            value.learning_rate,
            value.weights,
            value.biases,
        )
        .map_err(|e| Error::InvalidData(format!("serialized model invalid: {e}")))
    }
}

impl Model {
    /// Serialize the model to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SerializedModel::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Serialize the model to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&SerializedModel::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedModel = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the model to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s).map_err(|e| Error::io(p, e))?;
        debug!("saved json model to {}", p.display());
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p).map_err(|e| Error::io(p, e))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_stable_and_roundtrips() {
        let model = Model::from_parts(2, 1, 0.5, vec![0.25, -1.0], vec![2.0]).unwrap();
        let json = model.to_json_string().unwrap();
        assert_eq!(
            json,
            r#"{"format_version":1,"feature_size":2,"num_classes":1,"learning_rate":0.5,"weights":[0.25,-1.0],"biases":[2.0]}"#
        );

        let loaded = Model::from_json_str(&json).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(
            Model::from_json_str(&model.to_json_string_pretty().unwrap()).unwrap(),
            model
        );
    }

    #[test]
    fn rejects_unknown_version() {
        let bad = r#"{"format_version":999,"feature_size":1,"num_classes":1,"learning_rate":0.1,"weights":[0.0],"biases":[0.0]}"#;
        let err = Model::from_json_str(bad).unwrap_err();
        assert!(format!("{err}").contains("format_version"));
    }

    #[test]
    fn rejects_wrong_parameter_count() {
        let bad = r#"{"format_version":1,"feature_size":2,"num_classes":1,"learning_rate":0.1,"weights":[0.0],"biases":[0.0]}"#;
        assert!(matches!(
            Model::from_json_str(bad),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = Model::new_with_seed(4, 3, 0.05, 2).unwrap();
        model.save_json(&path).unwrap();
        assert_eq!(Model::load_json(&path).unwrap(), model);
    }
}
