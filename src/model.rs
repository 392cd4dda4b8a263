//! Core value types shared across the harness: exact timestamps,
//! captured plugin output (features), diagnostics with severities, and
//! the run options threaded through every scenario.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Exact time as whole seconds plus nanoseconds, mirroring the plugin
/// interface's own time representation. Comparisons are exact; there is
/// no tolerance anywhere in the harness, because the determinism
/// scenarios are defined in terms of bit-identical captures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub sec: i64,
    pub nsec: u32,
}

impl Timestamp {
    pub const ZERO: Self = Self { sec: 0, nsec: 0 };

    #[must_use]
    pub const fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// Convert a frame offset at the given sample rate into a timestamp,
    /// the way every drive loop stamps its `process` calls.
    #[must_use]
    pub fn from_frames(frame: u64, rate: u32) -> Self {
        let rate = u64::from(rate.max(1));
        let sec = (frame / rate) as i64;
        let nsec = ((frame % rate) * 1_000_000_000 / rate) as u32;
        Self { sec, nsec }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

/// One analysis event emitted by a plugin: an optional timestamp, an
/// optional duration, a label (possibly empty), and an ordered run of
/// numeric values (possibly empty).
///
/// The derived equality is the capture-comparison contract: an absent
/// timestamp or duration matches only another absent one and is never
/// compared against a stand-in value; present ones compare exactly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    pub timestamp: Option<Timestamp>,
    pub duration: Option<Timestamp>,
    pub label: String,
    pub values: Vec<f32>,
}

impl Feature {
    #[must_use]
    pub fn with_values(values: Vec<f32>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }
}

/// Ordered features for one output index.
pub type FeatureList = Vec<Feature>;

/// Everything a plugin emitted, partitioned by declared output index.
/// Backed by a `BTreeMap` so key iteration is ascending and diff output
/// is reproducible.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    outputs: BTreeMap<u32, FeatureList>,
}

impl FeatureSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, output: u32, feature: Feature) {
        self.outputs.entry(output).or_default().push(feature);
    }

    /// Union-append: every feature of `other` is appended to the list of
    /// its output, preserving arrival order per output. This is how the
    /// drive loop accumulates per-block results into one capture.
    pub fn append(&mut self, other: Self) {
        for (output, features) in other.outputs {
            self.outputs.entry(output).or_default().extend(features);
        }
    }

    #[must_use]
    pub fn get(&self, output: u32) -> Option<&FeatureList> {
        self.outputs.get(&output)
    }

    /// Ascending by output index.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FeatureList)> {
        self.outputs.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.outputs.values().map(Vec::len).sum()
    }
}

impl FromIterator<(u32, FeatureList)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (u32, FeatureList)>>(iter: I) -> Self {
        Self {
            outputs: iter.into_iter().collect(),
        }
    }
}

/// Badness of one diagnostic, ordered. Success contributes nothing to
/// aggregation; any Error flips the plugin verdict to failure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Note,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Note => "NOTE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One finding from one scenario. Deduplication within a scenario run is
/// by message text, so a check that fires identically on every frame is
/// reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn success() -> Self {
        Self {
            severity: Severity::Success,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Ordered findings from one scenario run; empty means the scenario was
/// inapplicable (e.g. the plugin declares no programs).
pub type Diagnostics = Vec<Diagnostic>;

/// Options threaded through the orchestrator into every scenario.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Downgrade "results differ between runs" findings from Error to
    /// Note, for plugins with legitimate run-to-run variation.
    pub nondeterministic: bool,
    /// Dump captured feature data and diff detail when a check fails.
    pub verbose: bool,
    /// Run only the scenario with this id.
    pub single_test: Option<String>,
}

impl RunOptions {
    /// Severity for a run-to-run divergence finding under these options.
    #[must_use]
    pub fn divergence(&self, message: impl Into<String>) -> Diagnostic {
        if self.nondeterministic {
            Diagnostic::note(message)
        } else {
            Diagnostic::error(message)
        }
    }
}
