//! Extreme-input probes: the plugin is driven at its own preferred
//! sizes with signals at the edges of what a host may legally feed it.
//! The only oracle is numeric sanity: no NaN, no infinities.

use crate::audio;
use crate::conformance::all_values_finite;
use crate::driver::{self, STANDARD_RATE};
use crate::error::FvResult;
use crate::model::{Diagnostic, Diagnostics, FeatureSet, RunOptions};
use crate::plugin::PluginLibrary;
use crate::scenario::{dump_capture, load, Scenario};

const LONG_RUN_BLOCKS: usize = 200;
const NOISE_BLOCKS: usize = 100;

fn finite_verdict(capture: &FeatureSet, options: &RunOptions) -> Diagnostic {
    if all_values_finite(capture) {
        Diagnostic::success()
    } else {
        let diagnostic = Diagnostic::warning("plugin returned one or more NaN/inf values");
        dump_capture(options, "capture", capture);
        diagnostic
    }
}

/// Drive `count` blocks of the given mono signal (replicated across the
/// plugin's channels) at default sizing, or return early with the hard
/// initialisation error.
fn run_signal(
    library: &dyn PluginLibrary,
    key: &str,
    options: &RunOptions,
    count: usize,
    make_signal: impl FnOnce(usize) -> Vec<f32>,
) -> FvResult<Diagnostics> {
    let mut plugin = load(library, key, STANDARD_RATE)?;
    let sizing = match driver::initialise_default(plugin.as_mut()) {
        Ok(sizing) => sizing,
        Err(message) => return Ok(vec![Diagnostic::error(message)]),
    };

    let signal = make_signal(driver::required_len(&sizing, count));
    let source = audio::replicate(signal, sizing.channels);
    let capture = driver::drive(
        plugin.as_mut(),
        &sizing,
        &source,
        count,
        STANDARD_RATE,
        0,
    );
    Ok(vec![finite_verdict(&capture, options)])
}

/// C1: a long run of an ordinary sine.
pub struct NormalInput;

impl Scenario for NormalInput {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        run_signal(library, key, options, LONG_RUN_BLOCKS, |len| {
            audio::sine(len, 1.0)
        })
    }
}

/// C2: end-of-stream with no input at all. Initialise, then go straight
/// to the flush.
pub struct EmptyInput;

impl Scenario for EmptyInput {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut plugin = load(library, key, STANDARD_RATE)?;
        if let Err(message) = driver::initialise_default(plugin.as_mut()) {
            return Ok(vec![Diagnostic::error(message)]);
        }
        let capture = plugin.remaining_features();
        Ok(vec![finite_verdict(&capture, options)])
    }
}

/// C3: exactly one block, starting at time zero.
pub struct ShortInput;

impl Scenario for ShortInput {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        run_signal(library, key, options, 1, |len| audio::sine(len, 1.0))
    }
}

/// C4: a long run of digital silence.
pub struct SilentInput;

impl Scenario for SilentInput {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        run_signal(library, key, options, LONG_RUN_BLOCKS, audio::silence)
    }
}

/// C5: input three orders of magnitude beyond the nominal ±1 range.
pub struct TooLoudInput;

impl Scenario for TooLoudInput {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        run_signal(library, key, options, LONG_RUN_BLOCKS, |len| {
            audio::sine(len, 1000.0)
        })
    }
}

/// C6: seeded uniform noise.
pub struct RandomInput;

impl Scenario for RandomInput {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        run_signal(library, key, options, NOISE_BLOCKS, |len| {
            audio::noise(len, audio::NOISE_SEED)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EmptyInput, NormalInput, RandomInput, SilentInput, ShortInput, TooLoudInput};
    use crate::model::{Feature, FeatureSet, RunOptions, Severity};
    use crate::scenario::testutil::{ScriptedLibrary, ScriptedPlugin};
    use crate::scenario::Scenario;

    fn nan_emitting_library() -> ScriptedLibrary {
        ScriptedLibrary::single("t:nan", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(|input, _| {
                let mut set = FeatureSet::new();
                set.push(0, Feature::with_values(vec![input[0][0] / 0.0]));
                set
            });
            plugin
        })
    }

    fn all_scenarios() -> Vec<Box<dyn Scenario>> {
        vec![
            Box::new(NormalInput),
            Box::new(ShortInput),
            Box::new(SilentInput),
            Box::new(TooLoudInput),
            Box::new(RandomInput),
        ]
    }

    #[test]
    fn well_behaved_plugin_passes_every_extreme() {
        let library = ScriptedLibrary::single("t:ok", |_| ScriptedPlugin::well_behaved());
        for scenario in all_scenarios() {
            let results = scenario
                .run(&library, "t:ok", &RunOptions::default())
                .expect("runs");
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].severity, Severity::Success);
        }
    }

    #[test]
    fn division_by_silence_is_caught_as_nan_warning() {
        // 0/0 on the silent signal, inf elsewhere; either way non-finite.
        let library = nan_emitting_library();
        let results = SilentInput
            .run(&library, "t:nan", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Warning);
        assert_eq!(
            results[0].message,
            "plugin returned one or more NaN/inf values"
        );
    }

    #[test]
    fn nan_is_a_warning_never_an_error() {
        let library = nan_emitting_library();
        for scenario in all_scenarios() {
            let results = scenario
                .run(&library, "t:nan", &RunOptions::default())
                .expect("runs");
            assert!(results.iter().all(|d| d.severity <= Severity::Warning));
        }
    }

    #[test]
    fn empty_input_only_flushes() {
        let library = ScriptedLibrary::single("t:flush", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(|_, _| panic!("process must not be called"));
            plugin.remaining_hook = Box::new(|| {
                let mut set = FeatureSet::new();
                set.push(0, Feature::with_values(vec![0.25]));
                set
            });
            plugin
        });
        let results = EmptyInput
            .run(&library, "t:flush", &RunOptions::default())
            .expect("runs");
        assert_eq!(results[0].severity, Severity::Success);
    }

    #[test]
    fn initialisation_refusal_is_a_hard_error_here() {
        let library = ScriptedLibrary::single("t:refuse", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.accept_init = false;
            plugin
        });
        let results = NormalInput
            .run(&library, "t:refuse", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Error);
        assert_eq!(results[0].message, "initialisation with default values failed");
    }

    #[test]
    fn load_failure_propagates_as_fatal() {
        let library = ScriptedLibrary::single("t:ok", |_| ScriptedPlugin::well_behaved());
        let error = NormalInput
            .run(&library, "t:other", &RunOptions::default())
            .expect_err("unknown key must be fatal");
        assert_eq!(error.error_code(), "FV-PLUGIN-LOAD");
    }
}
