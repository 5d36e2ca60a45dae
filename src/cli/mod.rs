//! CLI module for formflow
//!
//! Provides command-line interface for:
//! - check: Load a form definition and print its initial state
//! - run: Apply edits from stdin and stream change notifications

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, run, run_command, run_form};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_json_line, EditRequest, JsonLinesSink};
