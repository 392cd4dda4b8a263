//! The scenario catalogue: one ordered table, built in one place, read
//! for the lifetime of the process.

use crate::scenario::{defaults, initialise, input_extremes, multiple_runs, outputs, static_data};
use crate::scenario::Scenario;

#[derive(Debug)]
pub struct ScenarioEntry {
    pub id: &'static str,
    pub name: &'static str,
    build: fn() -> Box<dyn Scenario>,
}

impl ScenarioEntry {
    #[must_use]
    pub fn build(&self) -> Box<dyn Scenario> {
        (self.build)()
    }
}

/// Catalogue order is run order.
pub const CATALOGUE: &[ScenarioEntry] = &[
    ScenarioEntry {
        id: "A1",
        name: "Invalid identifiers",
        build: || Box::new(static_data::InvalidIdentifiers),
    },
    ScenarioEntry {
        id: "A2",
        name: "Empty metadata fields",
        build: || Box::new(static_data::EmptyMetadataFields),
    },
    ScenarioEntry {
        id: "A3",
        name: "Inappropriate value extents",
        build: || Box::new(static_data::ValueRanges),
    },
    ScenarioEntry {
        id: "A4",
        name: "Missing category",
        build: || Box::new(static_data::MissingCategory),
    },
    ScenarioEntry {
        id: "B1",
        name: "Output number mismatching",
        build: || Box::new(outputs::OutputNumbers),
    },
    ScenarioEntry {
        id: "B2",
        name: "Invalid or dubious timestamp usage",
        build: || Box::new(outputs::TimestampContract),
    },
    ScenarioEntry {
        id: "C1",
        name: "Normal input",
        build: || Box::new(input_extremes::NormalInput),
    },
    ScenarioEntry {
        id: "C2",
        name: "Empty input",
        build: || Box::new(input_extremes::EmptyInput),
    },
    ScenarioEntry {
        id: "C3",
        name: "Short input",
        build: || Box::new(input_extremes::ShortInput),
    },
    ScenarioEntry {
        id: "C4",
        name: "Absolutely silent input",
        build: || Box::new(input_extremes::SilentInput),
    },
    ScenarioEntry {
        id: "C5",
        name: "Input beyond the expected +/-1 range",
        build: || Box::new(input_extremes::TooLoudInput),
    },
    ScenarioEntry {
        id: "C6",
        name: "Random input",
        build: || Box::new(input_extremes::RandomInput),
    },
    ScenarioEntry {
        id: "D1",
        name: "Consecutive runs with separate instances",
        build: || Box::new(multiple_runs::DistinctRuns),
    },
    ScenarioEntry {
        id: "D2",
        name: "Consecutive runs with a single instance using reset",
        build: || Box::new(multiple_runs::ResetBetweenRuns),
    },
    ScenarioEntry {
        id: "D3",
        name: "Simultaneous interleaved runs in a single thread",
        build: || Box::new(multiple_runs::InterleavedRuns),
    },
    ScenarioEntry {
        id: "D4",
        name: "Runs with shifted start times",
        build: || Box::new(multiple_runs::ShiftedStartTime),
    },
    ScenarioEntry {
        id: "E1",
        name: "Inconsistent default program",
        build: || Box::new(defaults::DefaultProgram),
    },
    ScenarioEntry {
        id: "E2",
        name: "Inconsistent default parameters",
        build: || Box::new(defaults::DefaultParameters),
    },
    ScenarioEntry {
        id: "E3",
        name: "Parameter retention through reset",
        build: || Box::new(defaults::ParametersThroughReset),
    },
    ScenarioEntry {
        id: "F1",
        name: "Different sample rates",
        build: || Box::new(initialise::SampleRateSweep),
    },
    ScenarioEntry {
        id: "F2",
        name: "Lengthy constructor",
        build: || Box::new(initialise::LengthyConstructor),
    },
];

#[must_use]
pub fn find(id: &str) -> Option<&'static ScenarioEntry> {
    CATALOGUE.iter().find(|entry| entry.id == id)
}

#[cfg(test)]
mod tests {
    use super::{find, CATALOGUE};

    #[test]
    fn catalogue_ids_are_unique_and_ordered_by_family() {
        let mut seen = std::collections::HashSet::new();
        for entry in CATALOGUE {
            assert!(seen.insert(entry.id), "duplicate id {}", entry.id);
        }
        let ids: Vec<&str> = CATALOGUE.iter().map(|e| e.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted, "catalogue runs in id order");
    }

    #[test]
    fn catalogue_covers_every_family() {
        for family in ["A", "B", "C", "D", "E", "F"] {
            assert!(
                CATALOGUE.iter().any(|e| e.id.starts_with(family)),
                "family {family} missing"
            );
        }
        assert_eq!(CATALOGUE.len(), 21);
    }

    #[test]
    fn find_resolves_known_ids_and_rejects_unknown() {
        let entry = find("D1").expect("D1 exists");
        assert_eq!(entry.name, "Consecutive runs with separate instances");
        assert!(find("Z9").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn every_entry_builds_a_scenario() {
        for entry in CATALOGUE {
            let _scenario = entry.build();
        }
    }
}
