//! Static-metadata probes: no audio is processed, only the descriptors
//! the plugin publishes are inspected.

use crate::driver::STANDARD_RATE;
use crate::error::FvResult;
use crate::model::{Diagnostic, Diagnostics, RunOptions};
use crate::plugin::{ParameterDescriptor, PluginLibrary};
use crate::scenario::{load, Scenario};

/// Grid checks tolerate this much float error, matching the precision a
/// descriptor's single-precision fields can express.
const QUANTIZE_EPSILON: f32 = 1e-5;

/// A1: identifiers for the plugin itself, its parameters, and its
/// outputs must stay within `[A-Za-z0-9_-]`.
///
/// The empty identifier contains no invalid character and therefore
/// passes this check; missing names are the empty-fields probe's job.
pub struct InvalidIdentifiers;

impl Scenario for InvalidIdentifiers {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        _options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let plugin = load(library, key, STANDARD_RATE)?;

        let mut results = vec![check_identifier(&plugin.identifier(), "Plugin identifier")];
        for parameter in plugin.parameter_descriptors() {
            results.push(check_identifier(
                &parameter.identifier,
                "Parameter identifier",
            ));
        }
        for output in plugin.output_descriptors() {
            results.push(check_identifier(&output.identifier, "Output identifier"));
        }
        Ok(results)
    }
}

fn check_identifier(identifier: &str, what: &str) -> Diagnostic {
    let valid = identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Diagnostic::success()
    } else {
        Diagnostic::error(format!(
            "{what} \"{identifier}\" contains invalid character(s); permitted are: [a-zA-Z0-9_-]"
        ))
    }
}

/// A2: name fields are mandatory (Error when empty); description, maker
/// and copyright are recommended (Warning when empty).
pub struct EmptyMetadataFields;

impl Scenario for EmptyMetadataFields {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        _options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let plugin = load(library, key, STANDARD_RATE)?;

        let mut results = vec![
            mandatory(&plugin.name(), "Plugin name"),
            recommended(&plugin.description(), "Plugin description"),
            recommended(&plugin.maker(), "Plugin maker"),
            recommended(&plugin.copyright(), "Plugin copyright"),
        ];
        for parameter in plugin.parameter_descriptors() {
            let id = &parameter.identifier;
            results.push(mandatory(
                &parameter.name,
                &format!("Plugin parameter \"{id}\" name"),
            ));
            results.push(recommended(
                &parameter.description,
                &format!("Plugin parameter \"{id}\" description"),
            ));
        }
        for output in plugin.output_descriptors() {
            let id = &output.identifier;
            results.push(mandatory(
                &output.name,
                &format!("Plugin output \"{id}\" name"),
            ));
            results.push(recommended(
                &output.description,
                &format!("Plugin output \"{id}\" description"),
            ));
        }
        Ok(results)
    }
}

fn mandatory(text: &str, what: &str) -> Diagnostic {
    if text.is_empty() {
        Diagnostic::error(format!("{what} is empty"))
    } else {
        Diagnostic::success()
    }
}

fn recommended(text: &str, what: &str) -> Diagnostic {
    if text.is_empty() {
        Diagnostic::warning(format!("{what} is empty"))
    } else {
        Diagnostic::success()
    }
}

/// A3: parameter ranges must be sane and quantized parameters must put
/// their range, default, and value-name count on the declared grid.
pub struct ValueRanges;

impl Scenario for ValueRanges {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        _options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let plugin = load(library, key, STANDARD_RATE)?;

        let mut results = Diagnostics::new();
        for parameter in plugin.parameter_descriptors() {
            check_parameter_extents(&parameter, &mut results);
        }
        Ok(results)
    }
}

fn check_parameter_extents(parameter: &ParameterDescriptor, results: &mut Diagnostics) {
    let prefix = format!("Plugin parameter \"{}\"", parameter.identifier);
    let min = parameter.min_value;
    let max = parameter.max_value;
    let default = parameter.default_value;

    if max <= min {
        results.push(Diagnostic::error(format!(
            "{prefix} max value <= min value"
        )));
    }
    if default < min || default > max {
        results.push(Diagnostic::error(format!(
            "{prefix} default value out of range"
        )));
    }

    let Some(step) = parameter.quantize_step else {
        return;
    };
    if step == 0.0 {
        results.push(Diagnostic::error(format!(
            "{prefix} is quantized, but quantize step is zero"
        )));
        return;
    }

    let steps = ((max - min) / step + 0.5) as i64;
    let range_target = min + step * steps as f32;
    if (max - range_target).abs() > QUANTIZE_EPSILON {
        results.push(Diagnostic::warning(format!(
            "{prefix} value range is not a multiple of quantize step"
        )));
    }

    if !parameter.value_names.is_empty() {
        let names = parameter.value_names.len() as i64;
        if names < steps + 1 {
            results.push(Diagnostic::warning(format!(
                "{prefix} has fewer value names than quantize steps"
            )));
        } else if names > steps + 1 {
            results.push(Diagnostic::warning(format!(
                "{prefix} has more value names than quantize steps"
            )));
        }
    }

    let default_steps = ((default - min) / step + 0.5) as i64;
    let default_target = min + step * default_steps as f32;
    if (default - default_target).abs() > QUANTIZE_EPSILON {
        results.push(Diagnostic::warning(format!(
            "{prefix} default value is not a multiple of quantize step beyond minimum"
        )));
    }
}

/// A4: a plugin should publish a category hierarchy.
pub struct MissingCategory;

impl Scenario for MissingCategory {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        _options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut results = Diagnostics::new();
        if library.category(key).is_empty() {
            results.push(Diagnostic::warning(
                "Plugin category missing or cannot be loaded",
            ));
        }
        Ok(results)
    }
}
