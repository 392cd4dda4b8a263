//! Determinism probes: the same input driven twice must produce
//! bit-identical captures, whether the second run uses a fresh
//! instance, a reset instance, or an instance interleaved with the
//! first on one call stack. The shifted-start probe inverts the
//! expectation: identical output despite a different absolute start
//! time is the suspicious case.

use crate::audio;
use crate::conformance::contains_timestamps;
use crate::driver::{self, STANDARD_RATE};
use crate::error::FvResult;
use crate::model::{Diagnostic, Diagnostics, FeatureSet, RunOptions};
use crate::plugin::PluginLibrary;
use crate::scenario::{dump_divergence, load, Scenario};

const COMPARISON_BLOCKS: usize = 100;

/// The shifted-start probe begins its second run one second in.
const SHIFT_FRAMES: u64 = STANDARD_RATE as u64;

fn comparison_source(sizing: &driver::Sizing, count: usize) -> Vec<Vec<f32>> {
    audio::replicate(
        audio::spiked_sine(driver::required_len(sizing, count)),
        sizing.channels,
    )
}

fn compare(
    options: &RunOptions,
    first: &FeatureSet,
    second: &FeatureSet,
    message: &str,
) -> Diagnostic {
    if first == second {
        Diagnostic::success()
    } else {
        dump_divergence(options, first, second);
        options.divergence(message)
    }
}

/// D1: two consecutive runs on two freshly constructed instances.
pub struct DistinctRuns;

impl Scenario for DistinctRuns {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut captures = Vec::with_capacity(2);
        for _ in 0..2 {
            let mut plugin = load(library, key, STANDARD_RATE)?;
            let sizing = match driver::initialise_default(plugin.as_mut()) {
                Ok(sizing) => sizing,
                Err(message) => return Ok(vec![Diagnostic::error(message)]),
            };
            let source = comparison_source(&sizing, COMPARISON_BLOCKS);
            captures.push(driver::drive(
                plugin.as_mut(),
                &sizing,
                &source,
                COMPARISON_BLOCKS,
                STANDARD_RATE,
                0,
            ));
        }
        Ok(vec![compare(
            options,
            &captures[0],
            &captures[1],
            "Consecutive runs with separate instances produce different results",
        )])
    }
}

/// D2: one instance, run twice with a `reset` in between.
pub struct ResetBetweenRuns;

impl Scenario for ResetBetweenRuns {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut plugin = load(library, key, STANDARD_RATE)?;
        let mut captures = Vec::with_capacity(2);
        for run in 0..2 {
            if run == 1 {
                plugin.reset();
            }
            let sizing = match driver::initialise_default(plugin.as_mut()) {
                Ok(sizing) => sizing,
                Err(message) => return Ok(vec![Diagnostic::error(message)]),
            };
            let source = comparison_source(&sizing, COMPARISON_BLOCKS);
            captures.push(driver::drive(
                plugin.as_mut(),
                &sizing,
                &source,
                COMPARISON_BLOCKS,
                STANDARD_RATE,
                0,
            ));
        }
        Ok(vec![compare(
            options,
            &captures[0],
            &captures[1],
            "Consecutive runs with the same instance (using reset) produce different results",
        )])
    }
}

/// D3: two instances fed the same blocks in lockstep from one call
/// stack, probing whether one instance's processing leaks into the
/// other's state.
pub struct InterleavedRuns;

impl Scenario for InterleavedRuns {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut first = load(library, key, STANDARD_RATE)?;
        let mut second = load(library, key, STANDARD_RATE)?;

        let sizing = match driver::initialise_default(first.as_mut()) {
            Ok(sizing) => sizing,
            Err(message) => return Ok(vec![Diagnostic::error(message)]),
        };
        if driver::initialise_default(second.as_mut()).is_err() {
            return Ok(vec![Diagnostic::error(
                "initialisation with default values failed",
            )]);
        }

        let source = comparison_source(&sizing, COMPARISON_BLOCKS);
        let mut captures = [FeatureSet::new(), FeatureSet::new()];
        for index in 0..COMPARISON_BLOCKS {
            let offset = index * sizing.step;
            let pointers = driver::window(&source, offset, sizing.block);
            let timestamp = driver::block_timestamp(index, sizing.step, STANDARD_RATE, 0);
            captures[0].append(first.process(&pointers, timestamp));
            captures[1].append(second.process(&pointers, timestamp));
        }
        captures[0].append(first.remaining_features());
        captures[1].append(second.remaining_features());

        Ok(vec![compare(
            options,
            &captures[0],
            &captures[1],
            "Simultaneous runs with separate instances produce different results",
        )])
    }
}

/// D4: the same drive started at a different absolute time. An analysis
/// whose features carry timestamps should reflect the shifted timing
/// context; captures that come back bit-identical anyway suggest the
/// plugin ignores the timestamps it is given.
pub struct ShiftedStartTime;

impl Scenario for ShiftedStartTime {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut captures = Vec::with_capacity(2);
        for run in 0..2u64 {
            let mut plugin = load(library, key, STANDARD_RATE)?;
            let sizing = match driver::initialise_default(plugin.as_mut()) {
                Ok(sizing) => sizing,
                Err(message) => return Ok(vec![Diagnostic::error(message)]),
            };
            let source = comparison_source(&sizing, COMPARISON_BLOCKS);
            captures.push(driver::drive(
                plugin.as_mut(),
                &sizing,
                &source,
                COMPARISON_BLOCKS,
                STANDARD_RATE,
                run * SHIFT_FRAMES,
            ));
        }

        // Without any timestamped output the two captures are trivially
        // identical and the probe proves nothing.
        if !contains_timestamps(&captures[0]) {
            return Ok(Diagnostics::new());
        }

        if captures[0] == captures[1] {
            Ok(vec![options.divergence(
                "Running with a shifted start time does not change the results",
            )])
        } else {
            Ok(vec![Diagnostic::success()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DistinctRuns, InterleavedRuns, ResetBetweenRuns, ShiftedStartTime};
    use crate::model::{Feature, FeatureSet, RunOptions, Severity, Timestamp};
    use crate::scenario::testutil::{ScriptedLibrary, ScriptedPlugin};
    use crate::scenario::Scenario;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn tolerant() -> RunOptions {
        RunOptions {
            nondeterministic: true,
            ..RunOptions::default()
        }
    }

    /// Library whose plugin emits a per-instance serial number, so every
    /// instance produces different output.
    fn nondeterministic_library() -> ScriptedLibrary {
        let counter = Arc::new(AtomicU32::new(0));
        ScriptedLibrary::single("t:flaky", move |_| {
            let serial = counter.fetch_add(1, Ordering::SeqCst) as f32;
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(move |_, _| {
                let mut set = FeatureSet::new();
                set.push(0, Feature::with_values(vec![serial]));
                set
            });
            plugin
        })
    }

    /// Plugin that stamps every feature with the timestamp it was given.
    fn timestamp_echo_library() -> ScriptedLibrary {
        ScriptedLibrary::single("t:echo", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(|input, timestamp| {
                let mut set = FeatureSet::new();
                set.push(
                    0,
                    Feature {
                        timestamp: Some(timestamp),
                        ..Feature::with_values(vec![input[0][0]])
                    },
                );
                set
            });
            plugin
        })
    }

    /// Plugin that stamps timestamps but ignores the one it is handed,
    /// deriving time from an internal frame counter instead.
    fn clock_ignoring_library() -> ScriptedLibrary {
        ScriptedLibrary::single("t:deaf", |_| {
            let mut frames = 0u64;
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(move |input, _| {
                let mut set = FeatureSet::new();
                set.push(
                    0,
                    Feature {
                        timestamp: Some(Timestamp::from_frames(frames, 44100)),
                        ..Feature::with_values(vec![input[0][0]])
                    },
                );
                frames += input[0].len() as u64;
                set
            });
            plugin
        })
    }

    #[test]
    fn deterministic_plugin_passes_all_run_comparisons() {
        let library = ScriptedLibrary::single("t:ok", |_| ScriptedPlugin::well_behaved());
        for scenario in [
            Box::new(DistinctRuns) as Box<dyn Scenario>,
            Box::new(ResetBetweenRuns),
            Box::new(InterleavedRuns),
        ] {
            let results = scenario
                .run(&library, "t:ok", &RunOptions::default())
                .expect("runs");
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].severity, Severity::Success, "{results:?}");
        }
    }

    #[test]
    fn per_instance_variation_fails_distinct_runs() {
        let library = nondeterministic_library();
        let results = DistinctRuns
            .run(&library, "t:flaky", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Error);
        assert_eq!(
            results[0].message,
            "Consecutive runs with separate instances produce different results"
        );
    }

    #[test]
    fn tolerant_mode_downgrades_divergence_to_note() {
        let library = nondeterministic_library();
        let results = DistinctRuns
            .run(&library, "t:flaky", &tolerant())
            .expect("runs");
        assert_eq!(results[0].severity, Severity::Note);
    }

    #[test]
    fn per_instance_variation_fails_interleaved_runs_with_its_own_message() {
        let library = nondeterministic_library();
        let results = InterleavedRuns
            .run(&library, "t:flaky", &RunOptions::default())
            .expect("runs");
        assert_eq!(
            results[0].message,
            "Simultaneous runs with separate instances produce different results"
        );
    }

    #[test]
    fn reset_scenario_passes_for_stateless_plugin() {
        let library = ScriptedLibrary::single("t:ok", |_| ScriptedPlugin::well_behaved());
        let results = ResetBetweenRuns
            .run(&library, "t:ok", &RunOptions::default())
            .expect("runs");
        assert_eq!(results[0].severity, Severity::Success);
    }

    #[test]
    fn shifted_start_flags_timestamping_plugin_that_ignores_its_clock() {
        let library = clock_ignoring_library();
        let results = ShiftedStartTime
            .run(&library, "t:deaf", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Error);
        assert_eq!(
            results[0].message,
            "Running with a shifted start time does not change the results"
        );
    }

    #[test]
    fn shifted_start_passes_plugin_that_honours_its_clock() {
        let library = timestamp_echo_library();
        let results = ShiftedStartTime
            .run(&library, "t:echo", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Success);
    }

    #[test]
    fn shifted_start_is_inapplicable_without_timestamps() {
        // The default double never stamps features, so both runs are
        // trivially identical and the probe must stay silent.
        let library = ScriptedLibrary::single("t:ok", |_| ScriptedPlugin::well_behaved());
        let results = ShiftedStartTime
            .run(&library, "t:ok", &RunOptions::default())
            .expect("runs");
        assert!(results.is_empty());
    }

    #[test]
    fn init_refusal_reports_one_error_and_stops() {
        let library = ScriptedLibrary::single("t:refuse", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.accept_init = false;
            plugin
        });
        for scenario in [
            Box::new(DistinctRuns) as Box<dyn Scenario>,
            Box::new(ResetBetweenRuns),
            Box::new(InterleavedRuns),
            Box::new(ShiftedStartTime),
        ] {
            let results = scenario
                .run(&library, "t:refuse", &RunOptions::default())
                .expect("runs");
            assert_eq!(results.len(), 1, "{results:?}");
            assert_eq!(results[0].severity, Severity::Error);
        }
    }
}
