use clap::Parser;

use crate::model::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "franken_vamp")]
#[command(about = "Conformance and fuzz tester for audio-analysis plugins")]
#[command(version)]
pub struct Cli {
    /// Plugin key to test (e.g. `reference:amp_follower`). Without a
    /// key, every plugin the library lists is tested.
    pub key: Option<String>,

    /// Downgrade "results differ between runs" findings from Error to
    /// Note, for plugins with legitimate run-to-run variation.
    #[arg(long)]
    pub nondeterministic: bool,

    /// Dump captured feature data and diff detail when a check fails.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Run a single test by id (see --list-tests).
    #[arg(long = "test", value_name = "ID")]
    pub test: Option<String>,

    /// List the test catalogue and exit.
    #[arg(long)]
    pub list_tests: bool,

    /// Emit a machine-readable JSON report instead of the plain listing.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    #[must_use]
    pub fn to_options(&self) -> RunOptions {
        RunOptions {
            nondeterministic: self.nondeterministic,
            verbose: self.verbose,
            single_test: self.test.clone(),
        }
    }
}
