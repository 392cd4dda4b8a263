//! Output-contract probes: emitted output indices must exist in the
//! descriptor list, and each output's timing policy must match what its
//! features actually carry.

use std::collections::BTreeSet;

use crate::audio;
use crate::driver::{self, ADAPTED_STEP, STANDARD_RATE};
use crate::error::FvResult;
use crate::model::{Diagnostic, Diagnostics, RunOptions};
use crate::plugin::{PluginLibrary, SampleType};
use crate::scenario::{dump_capture, load, Scenario};

const DRIVE_BLOCKS: usize = 100;

/// B1: drive with adapted sizing and check that every emitted output
/// index names a declared output, and that every declared output was
/// exercised at least once.
pub struct OutputNumbers;

impl Scenario for OutputNumbers {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut plugin = load(library, key, STANDARD_RATE)?;
        let mut results = Diagnostics::new();

        let sizing = match driver::initialise_adapted(plugin.as_mut(), ADAPTED_STEP, ADAPTED_STEP)
        {
            Ok(sizing) => sizing,
            Err(message) => {
                results.push(Diagnostic::note(message));
                return Ok(results);
            }
        };

        let source = audio::replicate(
            audio::spiked_sine(driver::required_len(&sizing, DRIVE_BLOCKS)),
            sizing.channels,
        );
        let capture = driver::drive(
            plugin.as_mut(),
            &sizing,
            &source,
            DRIVE_BLOCKS,
            STANDARD_RATE,
            0,
        );

        let outputs = plugin.output_descriptors();
        let mut used = BTreeSet::new();
        for (index, _) in capture.iter() {
            used.insert(index);
            if index as usize >= outputs.len() {
                results.push(Diagnostic::error("Data returned on nonexistent output"));
            }
        }
        for (index, output) in outputs.iter().enumerate() {
            if !used.contains(&(index as u32)) {
                results.push(Diagnostic::note(format!(
                    "No results returned for output \"{}\"",
                    output.identifier
                )));
            }
        }

        if !results.is_empty() {
            dump_capture(options, "capture", &capture);
        }
        Ok(results)
    }
}

/// B2: the sample-type contract. Driven at the plugin's preferred sizes
/// so no buffering adapter can rewrite the timing it emits.
pub struct TimestampContract;

impl Scenario for TimestampContract {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut plugin = load(library, key, STANDARD_RATE)?;
        let mut results = Diagnostics::new();

        let sizing = match driver::initialise_default(plugin.as_mut()) {
            Ok(sizing) => sizing,
            Err(message) => {
                results.push(Diagnostic::error(message));
                return Ok(results);
            }
        };

        let outputs = plugin.output_descriptors();
        for output in &outputs {
            if let SampleType::FixedSampleRate(rate) = output.sample_type
                && rate == 0.0
            {
                results.push(Diagnostic::error(format!(
                    "Plugin output \"{}\" has a fixed sample rate but gives the rate as 0",
                    output.identifier
                )));
            }
        }

        let source = audio::replicate(
            audio::spiked_sine(driver::required_len(&sizing, DRIVE_BLOCKS)),
            sizing.channels,
        );
        let capture = driver::drive(
            plugin.as_mut(),
            &sizing,
            &source,
            DRIVE_BLOCKS,
            STANDARD_RATE,
            0,
        );

        for (index, features) in capture.iter() {
            let Some(output) = outputs.get(index as usize) else {
                // Emitting on a nonexistent output is the B1 finding;
                // the timing contract has nothing to say about it.
                continue;
            };
            for feature in features {
                match output.sample_type {
                    SampleType::OneSamplePerStep => {
                        if feature.timestamp.is_some() {
                            results.push(Diagnostic::note(format!(
                                "Plugin returns features with timestamps on one-sample-per-step output \"{}\"",
                                output.identifier
                            )));
                        }
                        if feature.duration.is_some() {
                            results.push(Diagnostic::note(format!(
                                "Plugin returns features with durations on one-sample-per-step output \"{}\"",
                                output.identifier
                            )));
                        }
                    }
                    SampleType::FixedSampleRate(_) => {}
                    SampleType::VariableSampleRate(_) => {
                        if feature.timestamp.is_none() {
                            results.push(Diagnostic::error(format!(
                                "Plugin returns features with no timestamps on variable-sample-rate output \"{}\"",
                                output.identifier
                            )));
                        }
                    }
                }
            }
        }

        if !results.is_empty() {
            dump_capture(options, "capture", &capture);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputNumbers, TimestampContract};
    use crate::model::{Feature, FeatureSet, RunOptions, Severity, Timestamp};
    use crate::plugin::{OutputDescriptor, SampleType};
    use crate::scenario::testutil::{ScriptedLibrary, ScriptedPlugin};
    use crate::scenario::Scenario;

    #[test]
    fn well_behaved_plugin_raises_nothing() {
        let library = ScriptedLibrary::single("t:ok", |_| ScriptedPlugin::well_behaved());
        for scenario in [
            Box::new(OutputNumbers) as Box<dyn Scenario>,
            Box::new(TimestampContract),
        ] {
            let results = scenario
                .run(&library, "t:ok", &RunOptions::default())
                .expect("runs");
            assert!(results.is_empty(), "{results:?}");
        }
    }

    #[test]
    fn emitting_on_undeclared_output_is_an_error() {
        let library = ScriptedLibrary::single("t:stray", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(|_, _| {
                let mut set = FeatureSet::new();
                set.push(0, Feature::with_values(vec![1.0]));
                set.push(5, Feature::with_values(vec![2.0]));
                set
            });
            plugin
        });
        let results = OutputNumbers
            .run(&library, "t:stray", &RunOptions::default())
            .expect("runs");
        assert!(results.iter().any(|d| d.severity == Severity::Error
            && d.message == "Data returned on nonexistent output"));
    }

    #[test]
    fn silent_declared_output_is_a_note() {
        let library = ScriptedLibrary::single("t:quiet", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.outputs.push(OutputDescriptor::named(
                "never",
                "Never emitted",
                SampleType::OneSamplePerStep,
            ));
            plugin
        });
        let results = OutputNumbers
            .run(&library, "t:quiet", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Note);
        assert_eq!(
            results[0].message,
            "No results returned for output \"never\""
        );
    }

    #[test]
    fn adapted_refusal_is_a_note_not_an_error() {
        let library = ScriptedLibrary::single("t:refuse", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.accept_init = false;
            plugin
        });
        let results = OutputNumbers
            .run(&library, "t:refuse", &RunOptions::default())
            .expect("runs");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Note);
    }

    #[test]
    fn variable_rate_output_without_timestamps_is_an_error() {
        let library = ScriptedLibrary::single("t:unstamped", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.outputs = vec![OutputDescriptor::named(
                "events",
                "Events",
                SampleType::VariableSampleRate(0.0),
            )];
            plugin.process_hook = Box::new(|_, _| {
                let mut set = FeatureSet::new();
                set.push(0, Feature::with_values(vec![1.0]));
                set
            });
            plugin
        });
        let results = TimestampContract
            .run(&library, "t:unstamped", &RunOptions::default())
            .expect("runs");
        assert!(results.iter().any(|d| d.severity == Severity::Error
            && d.message.contains("no timestamps on variable-sample-rate output \"events\"")));
    }

    #[test]
    fn one_sample_per_step_with_timestamps_is_only_a_note() {
        let library = ScriptedLibrary::single("t:stamped", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.process_hook = Box::new(|_, timestamp| {
                let mut set = FeatureSet::new();
                set.push(
                    0,
                    Feature {
                        timestamp: Some(timestamp),
                        ..Feature::with_values(vec![1.0])
                    },
                );
                set
            });
            plugin
        });
        let results = TimestampContract
            .run(&library, "t:stamped", &RunOptions::default())
            .expect("runs");
        assert!(!results.is_empty());
        assert!(results.iter().all(|d| d.severity == Severity::Note));
        assert!(results[0]
            .message
            .contains("timestamps on one-sample-per-step output"));
    }

    #[test]
    fn zero_fixed_sample_rate_declaration_is_an_error() {
        let library = ScriptedLibrary::single("t:zero", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.outputs = vec![OutputDescriptor::named(
                "curve",
                "Curve",
                SampleType::FixedSampleRate(0.0),
            )];
            plugin
        });
        let results = TimestampContract
            .run(&library, "t:zero", &RunOptions::default())
            .expect("runs");
        assert!(results.iter().any(|d| d.severity == Severity::Error
            && d.message.contains("gives the rate as 0")));
    }

    #[test]
    fn fixed_rate_features_are_free_to_stamp_or_not() {
        let library = ScriptedLibrary::single("t:fixed", |_| {
            let mut plugin = ScriptedPlugin::well_behaved();
            plugin.outputs = vec![OutputDescriptor::named(
                "curve",
                "Curve",
                SampleType::FixedSampleRate(100.0),
            )];
            let mut tick = 0i64;
            plugin.process_hook = Box::new(move |_, _| {
                let mut set = FeatureSet::new();
                // Alternate stamped and unstamped features.
                let timestamp = (tick % 2 == 0).then(|| Timestamp::new(tick, 0));
                tick += 1;
                set.push(
                    0,
                    Feature {
                        timestamp,
                        ..Feature::with_values(vec![0.5])
                    },
                );
                set
            });
            plugin
        });
        let results = TimestampContract
            .run(&library, "t:fixed", &RunOptions::default())
            .expect("runs");
        assert!(results.is_empty(), "{results:?}");
    }
}
