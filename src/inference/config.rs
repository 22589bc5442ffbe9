//! Post-processor configuration, loadable from YAML.
//!
//! ```yaml
//! input_width: 640
//! input_height: 640
//! confidence_threshold: 0.25
//! names:
//!   - G-
//!   - B+
//! ```
//!
//! Every field is optional; missing fields take the defaults below. `names`
//! may also be a mapping from class id to name, as in Ultralytics `data.yaml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnnotoolError;

/// Side length of the square network input.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Number of mask coefficients per detection row.
pub const DEFAULT_MASK_COEFFICIENTS: usize = 32;

/// Score a candidate must exceed to be kept; also the NMS score cutoff.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.1;

/// Overlap above which the lower-scoring of two boxes is suppressed.
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.1;

/// Sigmoid output above which a mask pixel is foreground.
pub const DEFAULT_MASK_THRESHOLD: f32 = 0.5;

/// Gray level used for letterbox padding.
pub const DEFAULT_PAD_VALUE: u8 = 114;

/// Settings for [`SegmentationPostProcess`](super::SegmentationPostProcess)
/// and the letterbox step of [`SegmentationPipeline`](super::SegmentationPipeline).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub input_width: u32,
    pub input_height: u32,
    pub mask_coefficients: usize,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub mask_threshold: f32,
    pub pad_value: u8,
    pub names: LabelTable,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            input_width: DEFAULT_INPUT_SIZE,
            input_height: DEFAULT_INPUT_SIZE,
            mask_coefficients: DEFAULT_MASK_COEFFICIENTS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            pad_value: DEFAULT_PAD_VALUE,
            names: LabelTable::default(),
        }
    }
}

impl ProcessorConfig {
    /// Reads a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, AnnotoolError> {
        let data = fs::read_to_string(path).map_err(AnnotoolError::Io)?;
        let config: Self =
            serde_yaml::from_str(&data).map_err(|source| AnnotoolError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.check()?;
        log::debug!(
            "Loaded processor config from {} ({} class name(s))",
            path.display(),
            config.names.len()
        );
        Ok(config)
    }

    /// Rejects settings the pipeline cannot run with: a zero-sized input or
    /// a threshold that is not a finite number.
    pub fn check(&self) -> Result<(), AnnotoolError> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(AnnotoolError::InvalidArgument(format!(
                "input size must be non-zero, got {}x{}",
                self.input_width, self.input_height
            )));
        }
        let thresholds = [
            ("confidence_threshold", self.confidence_threshold),
            ("nms_threshold", self.nms_threshold),
            ("mask_threshold", self.mask_threshold),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnnotoolError::InvalidArgument(format!(
                "{} must be a finite number, got {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Parses a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Replaces the class-name table.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = LabelTable::from_names(names);
        self
    }
}

/// Maps class ids to label strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LabelTable {
    names: BTreeMap<u32, String>,
}

impl LabelTable {
    /// Builds a table where the n-th name belongs to class id n.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(id, name)| (id as u32, name.into()))
                .collect(),
        }
    }

    /// The name registered for `class_id`, if any.
    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// The label for `class_id`. Ids missing from the table are labelled
    /// with their decimal value.
    pub fn resolve(&self, class_id: u32) -> String {
        match self.get(class_id) {
            Some(name) => name.to_string(),
            None => {
                log::warn!(
                    "Class id {} has no entry in the label table ({} name(s)); using the id as label",
                    class_id,
                    self.names.len()
                );
                class_id.to_string()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'de> Deserialize<'de> for LabelTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Names {
            Sequence(Vec<String>),
            Mapping(BTreeMap<u32, String>),
        }

        Ok(match Names::deserialize(deserializer)? {
            Names::Sequence(names) => LabelTable::from_names(names),
            Names::Mapping(names) => LabelTable { names },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_fields() {
        let config = ProcessorConfig::from_yaml_str("confidence_threshold: 0.4\n").unwrap();
        assert_eq!(config.confidence_threshold, 0.4);
        assert_eq!(config.input_width, 640);
        assert_eq!(config.mask_coefficients, 32);
        assert_eq!(config.pad_value, 114);
        assert!(config.names.is_empty());
    }

    #[test]
    fn test_check_rejects_zero_input_and_nan_thresholds() {
        assert!(ProcessorConfig::default().check().is_ok());

        let zero = ProcessorConfig::from_yaml_str("input_width: 0\n").unwrap();
        let err = zero.check().unwrap_err();
        assert!(err.to_string().contains("input size must be non-zero"));

        let nan = ProcessorConfig {
            mask_threshold: f32::NAN,
            ..ProcessorConfig::default()
        };
        assert!(nan.check().unwrap_err().to_string().contains("mask_threshold"));
    }

    #[test]
    fn test_yaml_file_with_zero_input_is_rejected() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "input_width: 0\ninput_height: 640\n").unwrap();
        let err = ProcessorConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, AnnotoolError::InvalidArgument(_)));
    }

    #[test]
    fn test_names_as_sequence() {
        let config = ProcessorConfig::from_yaml_str("names:\n  - G-\n  - B+\n").unwrap();
        assert_eq!(config.names.get(0), Some("G-"));
        assert_eq!(config.names.get(1), Some("B+"));
        assert_eq!(config.names.get(2), None);
    }

    #[test]
    fn test_names_as_mapping() {
        let config = ProcessorConfig::from_yaml_str("names:\n  0: cell\n  3: debris\n").unwrap();
        assert_eq!(config.names.get(0), Some("cell"));
        assert_eq!(config.names.get(3), Some("debris"));
        assert_eq!(config.names.resolve(1), "1");
    }

    #[test]
    fn test_from_yaml_file_reports_parse_errors() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("bad.yaml");
        fs::write(&path, "input_width: [not, a, number]\n").expect("write yaml");
        let err = ProcessorConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, AnnotoolError::ConfigParse { .. }));
    }
}
