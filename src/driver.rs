//! The plugin-drive protocol: initialisation policies and the block
//! feeding loop shared by every processing scenario.
//!
//! A drive is always the same sequence: initialise, slice the source
//! into per-channel windows at consecutive step offsets, stamp each
//! window with the timestamp of its first frame, `process`, accumulate,
//! and flush `remaining_features` once after the final block.

use crate::model::{FeatureSet, Timestamp};
use crate::plugin::{InputDomain, Plugin};

/// Fallback block size when the plugin expresses no preference.
pub const FALLBACK_BLOCK: usize = 1024;

/// Step and block size forced by the adapted-sizing scenarios.
pub const ADAPTED_STEP: usize = 1000;

/// The sample rate every default-sizing scenario drives at.
pub const STANDARD_RATE: u32 = 44100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizing {
    pub channels: usize,
    pub step: usize,
    pub block: usize,
}

/// Resolve the sizes a default-policy initialisation will use. Mirrors
/// the interface's own negotiation: preferred block (1024 when the
/// plugin has no preference), preferred step, and when the step
/// preference is absent, block/2 for frequency-domain plugins and the
/// whole block otherwise.
#[must_use]
pub fn default_sizing(plugin: &dyn Plugin) -> Sizing {
    let channels = plugin.min_channel_count().max(1);
    let mut block = plugin.preferred_block_size();
    if block == 0 {
        block = FALLBACK_BLOCK;
    }
    let mut step = plugin.preferred_step_size();
    if step == 0 {
        step = match plugin.input_domain() {
            InputDomain::Frequency => block / 2,
            InputDomain::Time => block,
        };
    }
    Sizing {
        channels,
        step,
        block,
    }
}

/// Initialise at the plugin's own preferred sizes. Refusal here is a
/// hard failure: these are the settings the plugin asked for.
pub fn initialise_default(plugin: &mut dyn Plugin) -> Result<Sizing, String> {
    let sizing = default_sizing(plugin);
    if plugin.initialise(sizing.channels, sizing.step, sizing.block) {
        Ok(sizing)
    } else {
        Err("initialisation with default values failed".to_owned())
    }
}

/// Initialise at caller-chosen step/block with plugin-minimum channels,
/// through the adaptation layer. Refusal is soft: plugins may
/// legitimately reject unusual sizes, so the caller gets the refusal
/// message and decides what it is worth.
pub fn initialise_adapted(
    plugin: &mut dyn Plugin,
    step: usize,
    block: usize,
) -> Result<Sizing, String> {
    let channels = plugin.min_channel_count().max(1);
    if plugin.initialise(channels, step, block) {
        Ok(Sizing {
            channels,
            step,
            block,
        })
    } else {
        Err(format!(
            "initialisation with step {step} and block {block} failed"
        ))
    }
}

/// Source length needed to feed `count` windows at this sizing.
#[must_use]
pub const fn required_len(sizing: &Sizing, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (count - 1) * sizing.step + sizing.block
    }
}

/// Borrow one per-channel window starting at `offset`.
#[must_use]
pub fn window(source: &[Vec<f32>], offset: usize, block: usize) -> Vec<&[f32]> {
    source
        .iter()
        .map(|channel| &channel[offset..offset + block])
        .collect()
}

/// Timestamp of the window at step index `index`, shifted by
/// `start_frame` frames.
#[must_use]
pub fn block_timestamp(index: usize, step: usize, rate: u32, start_frame: u64) -> Timestamp {
    Timestamp::from_frames(start_frame + (index * step) as u64, rate)
}

/// Feed `count` consecutive windows of `source` and append everything
/// the plugin returns (including the end-of-stream flush) into one
/// capture.
pub fn drive(
    plugin: &mut dyn Plugin,
    sizing: &Sizing,
    source: &[Vec<f32>],
    count: usize,
    rate: u32,
    start_frame: u64,
) -> FeatureSet {
    debug_assert_eq!(source.len(), sizing.channels);
    debug_assert!(source.iter().all(|c| c.len() >= required_len(sizing, count)));

    let mut capture = FeatureSet::new();
    for index in 0..count {
        let offset = index * sizing.step;
        let pointers = window(source, offset, sizing.block);
        let timestamp = block_timestamp(index, sizing.step, rate, start_frame);
        capture.append(plugin.process(&pointers, timestamp));
    }
    capture.append(plugin.remaining_features());
    capture
}
