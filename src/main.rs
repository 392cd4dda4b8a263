use clap::Parser;
use serde_json::json;

use franken_vamp::cli::Cli;
use franken_vamp::orchestrator::{Tester, TestSummary};
use franken_vamp::plugin::PluginLibrary;
use franken_vamp::reference::ReferenceLibrary;
use franken_vamp::registry::CATALOGUE;
use franken_vamp::{FvError, FvResult};

fn main() {
    franken_vamp::logging::init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(if error.is_usage_error() { 2 } else { 1 });
        }
    }
}

/// Returns whether every tested plugin came through without errors.
fn run() -> FvResult<bool> {
    let cli = Cli::parse();

    if cli.list_tests {
        for entry in CATALOGUE {
            println!("{}  {}", entry.id, entry.name);
        }
        return Ok(true);
    }

    let library = ReferenceLibrary;
    let keys = match &cli.key {
        Some(key) => vec![key.clone()],
        None => library.list_keys(),
    };
    if keys.is_empty() {
        return Err(FvError::NoPlugins);
    }

    let tester = Tester::new(&library, cli.to_options(), !cli.json);
    // Resolve the single-test filter before any plugin runs so a typo
    // exits with a usage error rather than a half-finished report.
    tester.selected()?;

    let mut reports = Vec::with_capacity(keys.len());
    let mut total = TestSummary::default();

    for key in &keys {
        if !cli.json {
            println!("Testing plugin: {key}");
        }
        let report = tester.test_plugin(key)?;
        if !cli.json {
            if report.passed() {
                println!("franken_vamp: All tests succeeded for this plugin");
            } else {
                println!("franken_vamp: Some tests failed for this plugin");
            }
            println!();
        }
        total.merge(report.summary);
        reports.push(report);
    }

    let all_good = total.is_clean();
    if cli.json {
        let payload = json!({
            "plugins": reports,
            "summary": total,
            "verdict": if all_good { "pass" } else { "fail" },
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "franken_vamp: {} ({} note(s), {} warning(s), {} error(s))",
            if all_good {
                "All tests succeeded"
            } else {
                "Some tests failed"
            },
            total.notes,
            total.warnings,
            total.errors
        );
    }

    Ok(all_good)
}
