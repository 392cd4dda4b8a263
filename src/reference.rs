//! A small built-in library of reference analyzers.
//!
//! These give the binary a default target set, and give the integration
//! tests a full, well-behaved plugin surface to drive end to end. Each
//! analyzer is deliberately tiny and deterministic.

use crate::model::{Feature, FeatureSet, Timestamp};
use crate::plugin::{
    InputDomain, LoadError, OutputDescriptor, ParameterDescriptor, Plugin, PluginLibrary,
    SampleType,
};

pub const AMP_FOLLOWER_KEY: &str = "reference:amp_follower";
pub const ZERO_CROSSINGS_KEY: &str = "reference:zero_crossings";
pub const POWER_KEY: &str = "reference:power";

const MAKER: &str = "franken_vamp reference set";

fn offset_timestamp(base: Timestamp, frames: u64, rate: u32) -> Timestamp {
    let delta = Timestamp::from_frames(frames, rate);
    let mut sec = base.sec + delta.sec;
    let mut nsec = base.nsec + delta.nsec;
    if nsec >= 1_000_000_000 {
        sec += 1;
        nsec -= 1_000_000_000;
    }
    Timestamp::new(sec, nsec)
}

/// Per-block peak amplitude scaled by a gain parameter, with two gain
/// preset programs.
pub struct AmpFollower {
    gain: f32,
    program: String,
}

impl AmpFollower {
    const DEFAULT_GAIN: f32 = 1.0;

    #[must_use]
    pub fn new() -> Self {
        Self {
            gain: Self::DEFAULT_GAIN,
            program: "clean".to_owned(),
        }
    }
}

impl Default for AmpFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for AmpFollower {
    fn identifier(&self) -> String {
        "amp_follower".to_owned()
    }
    fn name(&self) -> String {
        "Amplitude Follower".to_owned()
    }
    fn description(&self) -> String {
        "Tracks the peak absolute amplitude of each processing block".to_owned()
    }
    fn maker(&self) -> String {
        MAKER.to_owned()
    }
    fn copyright(&self) -> String {
        "MIT".to_owned()
    }

    fn parameter_descriptors(&self) -> Vec<ParameterDescriptor> {
        let mut gain = ParameterDescriptor::ranged("gain", "Gain", 0.0, 10.0, Self::DEFAULT_GAIN);
        gain.description = "Scale factor applied to the tracked peak".to_owned();
        vec![gain]
    }
    fn get_parameter(&self, identifier: &str) -> f32 {
        if identifier == "gain" { self.gain } else { 0.0 }
    }
    fn set_parameter(&mut self, identifier: &str, value: f32) {
        if identifier == "gain" {
            self.gain = value;
        }
    }

    fn programs(&self) -> Vec<String> {
        vec!["clean".to_owned(), "boost".to_owned()]
    }
    fn current_program(&self) -> String {
        self.program.clone()
    }
    fn select_program(&mut self, name: &str) {
        match name {
            "clean" => {
                self.program = name.to_owned();
                self.gain = Self::DEFAULT_GAIN;
            }
            "boost" => {
                self.program = name.to_owned();
                self.gain = 2.0;
            }
            _ => {}
        }
    }

    fn input_domain(&self) -> InputDomain {
        InputDomain::Time
    }
    fn initialise(&mut self, channels: usize, step: usize, block: usize) -> bool {
        channels >= 1 && step > 0 && block > 0
    }
    fn reset(&mut self) {}

    fn process(&mut self, input: &[&[f32]], _timestamp: Timestamp) -> FeatureSet {
        let peak = input
            .iter()
            .flat_map(|channel| channel.iter())
            .fold(0.0_f32, |acc, sample| acc.max(sample.abs()));
        let mut set = FeatureSet::new();
        set.push(0, Feature::with_values(vec![peak * self.gain]));
        set
    }
    fn remaining_features(&mut self) -> FeatureSet {
        FeatureSet::new()
    }

    fn output_descriptors(&self) -> Vec<OutputDescriptor> {
        let mut peak = OutputDescriptor::named("peak", "Peak amplitude", SampleType::OneSamplePerStep);
        peak.description = "Scaled peak absolute amplitude per block".to_owned();
        peak.unit = "V".to_owned();
        vec![peak]
    }
}

/// Per-block zero-crossing count plus a timestamped event per crossing.
/// The event output exercises the variable-sample-rate contract and the
/// shifted-start probe: event times derive from the timestamps the host
/// supplies.
pub struct ZeroCrossings {
    rate: u32,
    previous: f32,
}

impl ZeroCrossings {
    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            previous: 0.0,
        }
    }
}

impl Plugin for ZeroCrossings {
    fn identifier(&self) -> String {
        "zero_crossings".to_owned()
    }
    fn name(&self) -> String {
        "Zero Crossings".to_owned()
    }
    fn description(&self) -> String {
        "Counts sign changes and marks where they happen".to_owned()
    }
    fn maker(&self) -> String {
        MAKER.to_owned()
    }
    fn copyright(&self) -> String {
        "MIT".to_owned()
    }

    fn parameter_descriptors(&self) -> Vec<ParameterDescriptor> {
        Vec::new()
    }
    fn get_parameter(&self, _identifier: &str) -> f32 {
        0.0
    }
    fn set_parameter(&mut self, _identifier: &str, _value: f32) {}

    fn input_domain(&self) -> InputDomain {
        InputDomain::Time
    }
    fn initialise(&mut self, channels: usize, step: usize, block: usize) -> bool {
        self.previous = 0.0;
        channels >= 1 && step > 0 && block > 0
    }
    fn reset(&mut self) {
        self.previous = 0.0;
    }

    fn process(&mut self, input: &[&[f32]], timestamp: Timestamp) -> FeatureSet {
        let mut set = FeatureSet::new();
        let mut count = 0u32;
        for (offset, &sample) in input[0].iter().enumerate() {
            let crossed = (self.previous < 0.0) != (sample < 0.0);
            if crossed {
                count += 1;
                set.push(
                    1,
                    Feature {
                        timestamp: Some(offset_timestamp(timestamp, offset as u64, self.rate)),
                        duration: None,
                        label: "crossing".to_owned(),
                        values: Vec::new(),
                    },
                );
            }
            self.previous = sample;
        }
        set.push(0, Feature::with_values(vec![count as f32]));
        set
    }
    fn remaining_features(&mut self) -> FeatureSet {
        FeatureSet::new()
    }

    fn output_descriptors(&self) -> Vec<OutputDescriptor> {
        let mut counts =
            OutputDescriptor::named("counts", "Crossing counts", SampleType::OneSamplePerStep);
        counts.description = "Zero crossings per processing block".to_owned();
        let mut crossings = OutputDescriptor::named(
            "crossings",
            "Crossing points",
            SampleType::VariableSampleRate(self.rate as f32),
        );
        crossings.description = "One event at each detected sign change".to_owned();
        vec![counts, crossings]
    }
}

/// Mean-square power per block on a fixed-rate curve output.
pub struct PowerCurve {
    rate: u32,
}

impl PowerCurve {
    const PREFERRED_BLOCK: usize = 1024;

    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self { rate }
    }
}

impl Plugin for PowerCurve {
    fn identifier(&self) -> String {
        "power".to_owned()
    }
    fn name(&self) -> String {
        "Power Curve".to_owned()
    }
    fn description(&self) -> String {
        "Mean-square signal power per block".to_owned()
    }
    fn maker(&self) -> String {
        MAKER.to_owned()
    }
    fn copyright(&self) -> String {
        "MIT".to_owned()
    }

    fn parameter_descriptors(&self) -> Vec<ParameterDescriptor> {
        Vec::new()
    }
    fn get_parameter(&self, _identifier: &str) -> f32 {
        0.0
    }
    fn set_parameter(&mut self, _identifier: &str, _value: f32) {}

    fn input_domain(&self) -> InputDomain {
        InputDomain::Time
    }
    fn preferred_step_size(&self) -> usize {
        Self::PREFERRED_BLOCK
    }
    fn preferred_block_size(&self) -> usize {
        Self::PREFERRED_BLOCK
    }
    fn initialise(&mut self, channels: usize, step: usize, block: usize) -> bool {
        channels >= 1 && step > 0 && block > 0
    }
    fn reset(&mut self) {}

    fn process(&mut self, input: &[&[f32]], _timestamp: Timestamp) -> FeatureSet {
        let samples = input.iter().map(|channel| channel.len()).sum::<usize>();
        let energy: f32 = input
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|sample| sample * sample)
            .sum();
        let mut set = FeatureSet::new();
        set.push(
            0,
            Feature::with_values(vec![if samples == 0 {
                0.0
            } else {
                energy / samples as f32
            }]),
        );
        set
    }
    fn remaining_features(&mut self) -> FeatureSet {
        FeatureSet::new()
    }

    fn output_descriptors(&self) -> Vec<OutputDescriptor> {
        let mut curve = OutputDescriptor::named(
            "power",
            "Signal power",
            SampleType::FixedSampleRate(self.rate as f32 / Self::PREFERRED_BLOCK as f32),
        );
        curve.description = "Mean-square power, one value per preferred block".to_owned();
        vec![curve]
    }
}

/// The in-process library holding the reference analyzers.
pub struct ReferenceLibrary;

impl PluginLibrary for ReferenceLibrary {
    fn list_keys(&self) -> Vec<String> {
        vec![
            AMP_FOLLOWER_KEY.to_owned(),
            ZERO_CROSSINGS_KEY.to_owned(),
            POWER_KEY.to_owned(),
        ]
    }

    fn load(&self, key: &str, sample_rate: u32) -> Result<Box<dyn Plugin>, LoadError> {
        match key {
            AMP_FOLLOWER_KEY => Ok(Box::new(AmpFollower::new())),
            ZERO_CROSSINGS_KEY => Ok(Box::new(ZeroCrossings::new(sample_rate))),
            POWER_KEY => Ok(Box::new(PowerCurve::new(sample_rate))),
            other => Err(LoadError::UnknownKey(other.to_owned())),
        }
    }

    fn category(&self, key: &str) -> Vec<String> {
        if self.list_keys().iter().any(|known| known == key) {
            vec!["Reference".to_owned(), "Diagnostics".to_owned()]
        } else {
            Vec::new()
        }
    }
}
