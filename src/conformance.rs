//! Capture comparison: the equality oracle used by every
//! run-against-run scenario, the bounded diff used to explain a
//! divergence, and the numeric-validity oracle used by the extreme-input
//! scenarios.
//!
//! Equality itself lives on the model types (`FeatureSet: PartialEq`);
//! this module owns everything that interprets a mismatch.

use std::fmt;

use crate::model::{Feature, FeatureSet};

/// Human-readable explanation of how two captures differ. Bounded: per
/// output, only the first divergent feature is explained in full and the
/// rest are counted behind one elision line, so output stays readable
/// even when a plugin diverges on every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub lines: Vec<String>,
    /// Total divergent features across all outputs, including elided ones.
    pub differing_features: usize,
}

impl DiffReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Explain the differences between two captures. Empty report iff the
/// captures are equal.
#[must_use]
pub fn diff(a: &FeatureSet, b: &FeatureSet) -> DiffReport {
    let mut report = DiffReport::default();

    if a.output_count() != b.output_count() {
        report.lines.push(format!(
            "captures contain different output counts ({} vs {})",
            a.output_count(),
            b.output_count()
        ));
        return report;
    }

    for (output, left) in a.iter() {
        let Some(right) = b.get(output) else {
            report
                .lines
                .push(format!("output {output} is present in only one capture"));
            continue;
        };

        if left.len() != right.len() {
            report.lines.push(format!(
                "output {output}: feature counts differ ({} vs {})",
                left.len(),
                right.len()
            ));
            continue;
        }

        let mut further = 0usize;
        let mut explained = false;
        for (index, (fa, fb)) in left.iter().zip(right.iter()).enumerate() {
            if fa == fb {
                continue;
            }
            report.differing_features += 1;
            if explained {
                further += 1;
                continue;
            }
            explained = true;
            explain_feature(&mut report.lines, output, index, fa, fb);
        }
        if further > 0 {
            report.lines.push(format!(
                "output {output}: {further} further differing feature(s) elided"
            ));
        }
    }

    report
}

fn explain_feature(lines: &mut Vec<String>, output: u32, index: usize, a: &Feature, b: &Feature) {
    let prefix = format!("output {output}, feature {index}");

    match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) if ta != tb => {
            lines.push(format!("{prefix}: timestamps differ ({ta} vs {tb})"));
        }
        (Some(_), None) | (None, Some(_)) => {
            lines.push(format!(
                "{prefix}: timestamp is present in only one capture"
            ));
        }
        _ => {}
    }

    match (a.duration, b.duration) {
        (Some(da), Some(db)) if da != db => {
            lines.push(format!("{prefix}: durations differ ({da} vs {db})"));
        }
        (Some(_), None) | (None, Some(_)) => {
            lines.push(format!("{prefix}: duration is present in only one capture"));
        }
        _ => {}
    }

    if a.label != b.label {
        lines.push(format!(
            "{prefix}: labels differ (\"{}\" vs \"{}\")",
            a.label, b.label
        ));
    }

    if a.values.len() != b.values.len() {
        lines.push(format!(
            "{prefix}: value counts differ ({} vs {})",
            a.values.len(),
            b.values.len()
        ));
    } else if let Some(at) = a
        .values
        .iter()
        .zip(b.values.iter())
        .position(|(x, y)| x != y)
    {
        lines.push(format!(
            "{prefix}: values differ from index {at} ({} vs {})",
            a.values[at], b.values[at]
        ));
    }
}

/// True iff no contained value is NaN or infinite. The oracle for the
/// extreme-input scenarios, which make no claim about *what* a plugin
/// computes, only that it stays numerically sane.
#[must_use]
pub fn all_values_finite(capture: &FeatureSet) -> bool {
    capture
        .iter()
        .flat_map(|(_, features)| features.iter())
        .flat_map(|feature| feature.values.iter())
        .all(|value| value.is_finite())
}

/// True iff any feature anywhere carries a timestamp. Used to decide
/// whether timing-sensitivity checks are applicable at all.
#[must_use]
pub fn contains_timestamps(capture: &FeatureSet) -> bool {
    capture
        .iter()
        .flat_map(|(_, features)| features.iter())
        .any(|feature| feature.timestamp.is_some())
}

/// Render a capture for verbose dumps.
#[must_use]
pub fn render(capture: &FeatureSet) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for (output, features) in capture.iter() {
        let _ = writeln!(out, "output {output} ({} feature(s)):", features.len());
        for (index, feature) in features.iter().enumerate() {
            let time = feature
                .timestamp
                .map_or_else(|| "-".to_owned(), |t| t.to_string());
            let duration = feature
                .duration
                .map_or_else(|| "-".to_owned(), |d| d.to_string());
            let _ = writeln!(
                out,
                "  [{index}] time={time} duration={duration} label=\"{}\" values={:?}",
                feature.label, feature.values
            );
        }
    }
    out
}
