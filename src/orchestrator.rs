//! The orchestrator: runs the catalogue (or one selected scenario)
//! against a plugin, deduplicates findings, aggregates severities into
//! a returned summary, and renders the human report.
//!
//! Aggregation is plain data in, plain data out. Printing happens
//! beside it, never inside it, so the counting logic is testable on its
//! own.

use serde::Serialize;

use crate::error::{FvError, FvResult};
use crate::model::{Diagnostic, Diagnostics, RunOptions, Severity};
use crate::plugin::PluginLibrary;
use crate::registry::{self, ScenarioEntry};

/// Severity counters for one or more test runs. Success contributes to
/// none of them; the verdict fails iff any error was counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub notes: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl TestSummary {
    pub fn count(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Success => {}
            Severity::Note => self.notes += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }

    pub fn merge(&mut self, other: TestSummary) {
        self.notes += other.notes;
        self.warnings += other.warnings;
        self.errors += other.errors;
    }

    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Deduplicate by message text, preserving first-occurrence order, and
/// drop Success entries (they carry no message and count toward
/// nothing).
#[must_use]
pub fn dedup(diagnostics: Diagnostics) -> Diagnostics {
    let mut seen = std::collections::HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| d.severity != Severity::Success)
        .filter(|d| seen.insert(d.message.clone()))
        .collect()
}

/// Count deduplicated diagnostics into a summary.
#[must_use]
pub fn summarize(diagnostics: &[Diagnostic]) -> TestSummary {
    let mut summary = TestSummary::default();
    for diagnostic in diagnostics {
        summary.count(diagnostic);
    }
    summary
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub id: String,
    pub name: String,
    /// Deduplicated, Success entries removed.
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginReport {
    pub key: String,
    pub scenarios: Vec<ScenarioReport>,
    /// Set when the plugin failed to load and the remaining scenarios
    /// were skipped.
    pub aborted: Option<String>,
    pub summary: TestSummary,
}

impl PluginReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.summary.is_clean()
    }
}

pub struct Tester<'a> {
    library: &'a dyn PluginLibrary,
    options: RunOptions,
    /// Print the report while running (plain mode); JSON mode renders
    /// from the returned report instead.
    live: bool,
}

impl<'a> Tester<'a> {
    #[must_use]
    pub fn new(library: &'a dyn PluginLibrary, options: RunOptions, live: bool) -> Self {
        Self {
            library,
            options,
            live,
        }
    }

    /// The catalogue entries this run covers, honouring the single-test
    /// filter.
    pub fn selected(&self) -> FvResult<Vec<&'static ScenarioEntry>> {
        match &self.options.single_test {
            Some(id) => registry::find(id)
                .map(|entry| vec![entry])
                .ok_or_else(|| FvError::UnknownTest(id.clone())),
            None => Ok(registry::CATALOGUE.iter().collect()),
        }
    }

    /// Run every selected scenario against one plugin. Scenario findings
    /// never abort the run; only a load failure does, and it is folded
    /// into the report as a single error.
    pub fn test_plugin(&self, key: &str) -> FvResult<PluginReport> {
        let mut report = PluginReport {
            key: key.to_owned(),
            scenarios: Vec::new(),
            aborted: None,
            summary: TestSummary::default(),
        };

        for entry in self.selected()? {
            if self.live {
                println!(" -- Performing test: {} {}", entry.id, entry.name);
            }
            tracing::debug!(id = entry.id, key, "running scenario");

            match entry.build().run(self.library, key, &self.options) {
                Ok(diagnostics) => {
                    let diagnostics = dedup(diagnostics);
                    if self.live {
                        for diagnostic in &diagnostics {
                            println!(" ** {}: {}", diagnostic.severity, diagnostic.message);
                        }
                    }
                    report.summary.merge(summarize(&diagnostics));
                    report.scenarios.push(ScenarioReport {
                        id: entry.id.to_owned(),
                        name: entry.name.to_owned(),
                        diagnostics,
                    });
                }
                Err(error @ FvError::PluginLoad { .. }) => {
                    let message = error.to_string();
                    if self.live {
                        println!(" ** ERROR: {message}");
                    }
                    tracing::warn!(key, "{message}; skipping remaining tests");
                    report.summary.errors += 1;
                    report.aborted = Some(message);
                    break;
                }
                Err(error) => return Err(error),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{dedup, summarize, TestSummary};
    use crate::model::{Diagnostic, Severity};

    #[test]
    fn dedup_reports_a_repeated_message_once() {
        let diagnostics = vec![
            Diagnostic::warning("same finding"),
            Diagnostic::warning("same finding"),
            Diagnostic::warning("same finding"),
            Diagnostic::note("other finding"),
        ];
        let deduped = dedup(diagnostics);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].message, "same finding");
        assert_eq!(deduped[1].message, "other finding");
    }

    #[test]
    fn dedup_drops_success_entries() {
        let diagnostics = vec![
            Diagnostic::success(),
            Diagnostic::error("broken"),
            Diagnostic::success(),
        ];
        let deduped = dedup(diagnostics);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].severity, Severity::Error);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let diagnostics = vec![
            Diagnostic::note("b"),
            Diagnostic::warning("a"),
            Diagnostic::note("b"),
        ];
        let deduped = dedup(diagnostics);
        let messages: Vec<&str> = deduped.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "a"]);
    }

    #[test]
    fn summarize_counts_each_severity_separately() {
        let diagnostics = vec![
            Diagnostic::note("n1"),
            Diagnostic::note("n2"),
            Diagnostic::warning("w"),
            Diagnostic::error("e"),
        ];
        let summary = summarize(&diagnostics);
        assert_eq!(
            summary,
            TestSummary {
                notes: 2,
                warnings: 1,
                errors: 1
            }
        );
        assert!(!summary.is_clean());
    }

    #[test]
    fn success_counts_toward_nothing() {
        let summary = summarize(&[Diagnostic::success(), Diagnostic::success()]);
        assert_eq!(summary, TestSummary::default());
        assert!(summary.is_clean());
    }

    #[test]
    fn merge_adds_counter_wise() {
        let mut total = TestSummary {
            notes: 1,
            warnings: 2,
            errors: 0,
        };
        total.merge(TestSummary {
            notes: 0,
            warnings: 1,
            errors: 3,
        });
        assert_eq!(
            total,
            TestSummary {
                notes: 1,
                warnings: 3,
                errors: 3
            }
        );
        assert!(!total.is_clean());
    }

    #[test]
    fn warnings_alone_keep_the_verdict_clean() {
        let summary = summarize(&[Diagnostic::warning("w"), Diagnostic::note("n")]);
        assert!(summary.is_clean());
    }
}
