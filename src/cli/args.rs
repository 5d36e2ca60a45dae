//! CLI argument definitions using clap
//!
//! Commands:
//! - formflow check --form <path>
//! - formflow run --form <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formflow - reactive form field propagation
#[derive(Parser, Debug)]
#[command(name = "formflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and initialize a form, then print a summary
    Check {
        /// Path to the form definition
        #[arg(long, default_value = "./form.json")]
        form: PathBuf,
    },

    /// Initialize a form and apply edits read from stdin, one JSON object per line
    Run {
        /// Path to the form definition
        #[arg(long, default_value = "./form.json")]
        form: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["formflow", "run", "--form", "brief.json"]).unwrap();
        match cli.command {
            Command::Run { form } => assert_eq!(form, PathBuf::from("brief.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_form_defaults() {
        let cli = Cli::try_parse_from(["formflow", "check"]).unwrap();
        assert!(matches!(cli.command, Command::Check { form } if form == PathBuf::from("./form.json")));
    }
}
