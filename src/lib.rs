#![forbid(unsafe_code)]

//! franken_vamp: a conformance and fuzz-test harness for audio-analysis
//! plugins exposed through a stable binary interface.
//!
//! The harness loads a plugin under test, drives it through a battery
//! of adversarial and edge-case input scenarios, and reports
//! divergences from expected behavior: NaN/Inf outputs, nondeterminism,
//! malformed metadata, and timestamp-contract violations.

pub mod audio;
pub mod cli;
pub mod conformance;
pub mod driver;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod plugin;
pub mod reference;
pub mod registry;
pub mod scenario;

pub use error::{FvError, FvResult};
pub use model::{
    Diagnostic, Diagnostics, Feature, FeatureList, FeatureSet, RunOptions, Severity, Timestamp,
};
pub use orchestrator::{PluginReport, TestSummary, Tester};
