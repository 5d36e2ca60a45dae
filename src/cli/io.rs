//! JSON-lines I/O for the CLI
//!
//! - Input: one edit request per line on stdin
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::engine::{ChangeEvent, ChangeSink};

/// One edit read from stdin
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EditRequest {
    /// `{"set": id, "value": v}`
    Set { set: String, value: String },
    /// `{"dialog": id, "values": {...}}`
    Dialog {
        dialog: String,
        #[serde(default)]
        values: BTreeMap<String, String>,
    },
}

/// Read edit requests line by line. Blank lines are skipped.
pub fn read_requests<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<EditRequest>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|(index, line)| {
            let line = line.map_err(CliError::from)?;
            serde_json::from_str(&line).map_err(|e| CliError::bad_request(index + 1, e))
        })
}

/// Write one value as a JSON line and flush
pub fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Change sink streaming every notification as a JSON line.
///
/// A sink cannot fail a notification, so the first write error is kept
/// and later writes are skipped.
pub struct JsonLinesSink<W: Write> {
    out: W,
    error: Option<CliError>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn emit(&mut self, event: ChangeEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = write_json_line(&mut self.out, &event) {
            self.error = Some(e);
        }
    }

    /// The first write error, if any
    pub fn take_error(&mut self) -> Option<CliError> {
        self.error.take()
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChangeSink for JsonLinesSink<W> {
    fn on_value_changed(&mut self, id: &str, value: &str) {
        self.emit(ChangeEvent::Value {
            id: id.to_string(),
            value: value.to_string(),
        });
    }

    fn on_visibility_changed(&mut self, id: &str, visible: bool) {
        self.emit(ChangeEvent::Visibility {
            id: id.to_string(),
            visible,
        });
    }

    fn on_validity_changed(&mut self, id: &str, okay: bool) {
        self.emit(ChangeEvent::Validity {
            id: id.to_string(),
            okay,
        });
    }
}

/// Write an error object to stderr
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_json_line(&mut io::stderr(), &response)
}
