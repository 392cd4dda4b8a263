//! The scenario catalogue: one module per probe family, all conforming
//! to the same [`Scenario`] interface.
//!
//! A scenario owns every plugin instance it loads for the duration of
//! one `run` call. All non-fatal findings are returned as
//! [`Diagnostics`]; only a failure to load the plugin at all escapes as
//! an error, which the orchestrator treats as fatal for that plugin's
//! remaining scenarios.

pub mod defaults;
pub mod initialise;
pub mod input_extremes;
pub mod multiple_runs;
pub mod outputs;
pub mod static_data;

use crate::conformance;
use crate::error::{FvError, FvResult};
use crate::model::{Diagnostics, FeatureSet, RunOptions};
use crate::plugin::{Plugin, PluginLibrary};

/// One independent probe. Implementations are stateless; everything a
/// run needs arrives through the arguments.
pub trait Scenario {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics>;
}

/// Load a fresh instance, converting the library's refusal into the
/// fatal per-plugin error.
pub(crate) fn load(
    library: &dyn PluginLibrary,
    key: &str,
    rate: u32,
) -> FvResult<Box<dyn Plugin>> {
    library
        .load(key, rate)
        .map_err(|error| FvError::load_failure(key, error.to_string()))
}

/// Show the captured data behind a failed check: always logged at debug
/// level, printed to the report stream only in verbose mode.
pub(crate) fn dump_capture(options: &RunOptions, label: &str, capture: &FeatureSet) {
    let rendered = conformance::render(capture);
    tracing::debug!(label, "capture dump:\n{rendered}");
    if options.verbose {
        println!("    {label}:");
        for line in rendered.lines() {
            println!("    {line}");
        }
    }
}

/// Explain a divergence between two runs of the same drive.
pub(crate) fn dump_divergence(options: &RunOptions, first: &FeatureSet, second: &FeatureSet) {
    let report = conformance::diff(first, second);
    tracing::debug!("divergence:\n{report}");
    if options.verbose {
        for line in &report.lines {
            println!("    {line}");
        }
        dump_capture(options, "first run", first);
        dump_capture(options, "second run", second);
    }
}
