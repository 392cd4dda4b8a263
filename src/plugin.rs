//! The plugin boundary: traits standing in for the stable binary
//! interface of the analysis plugins under test, plus the library that
//! resolves keys to instances.
//!
//! The harness consumes this surface and never looks behind it. The
//! built-in [`crate::reference`] library and the mock libraries in the
//! integration tests are the two implementations shipped here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{FeatureSet, Timestamp};

/// Whether the plugin consumes time-domain samples or pre-transformed
/// frequency-domain blocks. Affects the default step-size fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDomain {
    Time,
    Frequency,
}

/// Timing policy a declared output commits to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    /// One value per processing step; features need no timestamps.
    OneSamplePerStep,
    /// Regularly spaced at the given rate, which must be nonzero.
    FixedSampleRate(f32),
    /// Irregular; every feature must carry an explicit timestamp.
    VariableSampleRate(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub sample_type: SampleType,
    pub has_duration: bool,
}

impl OutputDescriptor {
    #[must_use]
    pub fn named(identifier: &str, name: &str, sample_type: SampleType) -> Self {
        Self {
            identifier: identifier.to_owned(),
            name: name.to_owned(),
            description: String::new(),
            unit: String::new(),
            sample_type,
            has_duration: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
    /// `Some(step)` when the parameter only takes values on a grid of
    /// this spacing anchored at `min_value`.
    pub quantize_step: Option<f32>,
    /// Optional display names, one per grid point.
    pub value_names: Vec<String>,
}

impl ParameterDescriptor {
    #[must_use]
    pub fn ranged(identifier: &str, name: &str, min: f32, max: f32, default: f32) -> Self {
        Self {
            identifier: identifier.to_owned(),
            name: name.to_owned(),
            description: String::new(),
            unit: String::new(),
            min_value: min,
            max_value: max,
            default_value: default,
            quantize_step: None,
            value_names: Vec::new(),
        }
    }
}

/// One loaded plugin instance under test.
///
/// `process` receives one slice per channel, each `block_size` samples
/// long, plus the timestamp of the block's first frame. Implementations
/// are synchronous; the harness applies no timeout to them.
pub trait Plugin {
    fn identifier(&self) -> String;
    fn name(&self) -> String;
    fn description(&self) -> String;
    fn maker(&self) -> String;
    fn copyright(&self) -> String;

    fn parameter_descriptors(&self) -> Vec<ParameterDescriptor>;
    fn get_parameter(&self, identifier: &str) -> f32;
    fn set_parameter(&mut self, identifier: &str, value: f32);

    fn programs(&self) -> Vec<String> {
        Vec::new()
    }
    fn current_program(&self) -> String {
        String::new()
    }
    fn select_program(&mut self, _name: &str) {}

    fn input_domain(&self) -> InputDomain {
        InputDomain::Time
    }
    fn min_channel_count(&self) -> usize {
        1
    }
    fn max_channel_count(&self) -> usize {
        1
    }
    /// 0 means no preference.
    fn preferred_step_size(&self) -> usize {
        0
    }
    /// 0 means no preference.
    fn preferred_block_size(&self) -> usize {
        0
    }

    /// Returns false when the plugin rejects these settings; that is a
    /// refusal, not a crash, and callers decide how severe it is.
    fn initialise(&mut self, channels: usize, step_size: usize, block_size: usize) -> bool;

    fn reset(&mut self);

    fn process(&mut self, input: &[&[f32]], timestamp: Timestamp) -> FeatureSet;

    /// End-of-stream flush, called exactly once after the final block.
    fn remaining_features(&mut self) -> FeatureSet;

    fn output_descriptors(&self) -> Vec<OutputDescriptor>;
}

/// Why a key could not be resolved to a live instance.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("no plugin with key `{0}`")]
    UnknownKey(String),
    #[error("plugin `{key}` failed to construct: {detail}")]
    Construction { key: String, detail: String },
}

/// Resolves plugin keys to instances. `load` hands back a fresh instance
/// every call; scenarios that compare runs rely on that.
pub trait PluginLibrary {
    fn list_keys(&self) -> Vec<String>;

    fn load(&self, key: &str, sample_rate: u32) -> Result<Box<dyn Plugin>, LoadError>;

    /// Category hierarchy for the key; empty when none is published.
    fn category(&self, _key: &str) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadError, OutputDescriptor, ParameterDescriptor, SampleType};

    #[test]
    fn load_error_messages_name_the_key() {
        let unknown = LoadError::UnknownKey("vendor:missing".to_owned());
        assert!(unknown.to_string().contains("vendor:missing"));

        let construction = LoadError::Construction {
            key: "vendor:broken".to_owned(),
            detail: "allocation failed".to_owned(),
        };
        let text = construction.to_string();
        assert!(text.contains("vendor:broken"));
        assert!(text.contains("allocation failed"));
    }

    #[test]
    fn descriptor_builders_fill_optional_fields_empty() {
        let output = OutputDescriptor::named("rms", "RMS level", SampleType::OneSamplePerStep);
        assert!(output.description.is_empty());
        assert!(!output.has_duration);

        let param = ParameterDescriptor::ranged("gain", "Gain", 0.0, 10.0, 1.0);
        assert!(param.quantize_step.is_none());
        assert!(param.value_names.is_empty());
    }
}
