//! Construction and initialisation probes: survival across a sweep of
//! sample rates from sub-audio to ultrasonic, and the cost of
//! construction itself.

use std::time::{Duration, Instant};

use crate::audio;
use crate::driver::{self, ADAPTED_STEP, STANDARD_RATE};
use crate::error::FvResult;
use crate::model::{Diagnostic, Diagnostics, RunOptions};
use crate::plugin::PluginLibrary;
use crate::scenario::{load, Scenario};

/// Sub-audio through ultrasonic, plus a few deliberately awkward values.
pub const SWEEP_RATES: [u32; 10] = [
    11, 800, 10_099, 11_024, 44_100, 48_000, 96_000, 192_000, 201_011, 1_094_091,
];

const DRIVE_BLOCKS: usize = 100;

/// Construction slower than this suggests work that belongs in
/// `initialise`.
const CONSTRUCTION_BUDGET: Duration = Duration::from_secs(1);

/// F1: load and drive at every sweep rate. Refusing to initialise at a
/// weird rate is legitimate and often the best answer; the probe exists
/// purely to catch crashes, so successful drives add nothing to the
/// result.
pub struct SampleRateSweep;

impl Scenario for SampleRateSweep {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let mut results = Diagnostics::new();

        for rate in SWEEP_RATES {
            if options.verbose {
                print!("[{rate}Hz] ");
            }
            tracing::debug!(rate, "sample-rate sweep step");

            let mut plugin = load(library, key, rate)?;
            match driver::initialise_adapted(plugin.as_mut(), ADAPTED_STEP, ADAPTED_STEP) {
                Ok(sizing) => {
                    let source = audio::replicate(
                        audio::spiked_sine(driver::required_len(&sizing, DRIVE_BLOCKS)),
                        sizing.channels,
                    );
                    let _ = driver::drive(
                        plugin.as_mut(),
                        &sizing,
                        &source,
                        DRIVE_BLOCKS,
                        rate,
                        0,
                    );
                }
                Err(message) => {
                    if !message.is_empty() {
                        results.push(Diagnostic::note(message));
                    }
                }
            }
        }
        if options.verbose {
            println!();
        }

        Ok(results)
    }
}

/// F2: time construction alone.
pub struct LengthyConstructor;

impl Scenario for LengthyConstructor {
    fn run(
        &self,
        library: &dyn PluginLibrary,
        key: &str,
        _options: &RunOptions,
    ) -> FvResult<Diagnostics> {
        let started = Instant::now();
        let plugin = load(library, key, STANDARD_RATE)?;
        let elapsed = started.elapsed();
        drop(plugin);

        let mut results = Diagnostics::new();
        if elapsed > CONSTRUCTION_BUDGET {
            results.push(Diagnostic::warning(
                "Constructor takes some time to run: work should be deferred to initialise?",
            ));
        }
        Ok(results)
    }
}
