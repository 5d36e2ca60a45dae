//! CLI command implementations
//!
//! Both commands follow the same boot sequence:
//! 1. Load the form definition
//! 2. Apply the logging configuration from its `engine` section
//! 3. Resolve functions and initialize the engine
//!
//! `check` stops there and prints a summary. `run` then applies edits from
//! stdin and streams every change notification to stdout.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use serde_json::json;

use crate::engine::{Engine, NullSink};
use crate::form::{FormDefinition, FormLoader};
use crate::functions::{DialogLibrary, FunctionLibrary, MapDialogLibrary};
use crate::observability::{Event, Logger};

use super::args::Command;
use super::errors::CliResult;
use super::io::{read_requests, write_json_line, EditRequest, JsonLinesSink};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { form } => check(&form, &mut io::stdout()),
        Command::Run { form } => run_form(&form, io::stdin().lock(), io::stdout()),
    }
}

/// Load a definition and apply its log level
fn load_definition(path: &Path) -> CliResult<FormDefinition> {
    let definition = FormLoader::new(Path::new(".")).load(path)?;
    Logger::set_min_severity(definition.engine.log_severity()?);
    Ok(definition)
}

/// A dialog library offering every dialog the definition reads
fn dialogs_for(definition: &FormDefinition) -> Rc<MapDialogLibrary> {
    Rc::new(MapDialogLibrary::new(definition.dialog_names()))
}

/// Initialize a form and print a summary of its initial state
pub fn check<W: Write>(form: &Path, out: &mut W) -> CliResult<()> {
    let definition = load_definition(form)?;
    let library = FunctionLibrary::with_dialogs(dialogs_for(&definition));
    let engine = Engine::from_definition(&definition, &library, Box::new(NullSink))?;

    write_json_line(
        out,
        &json!({
            "status": "ok",
            "fields": engine.field_ids(),
            "groups": engine.group_ids(),
            "invalid_fields": engine.invalid_fields(),
            "input_okay": engine.is_input_okay(),
        }),
    )
}

/// Initialize a form, apply every edit from `input` and stream the resulting
/// notifications to `output`, followed by one summary line.
///
/// Dialog requests play the user's part: the selection is stored and the
/// waiting callback reports it to the engine.
pub fn run_form<R, W>(form: &Path, input: R, output: W) -> CliResult<()>
where
    R: BufRead,
    W: Write + 'static,
{
    let definition = load_definition(form)?;
    let dialogs = dialogs_for(&definition);
    let library = FunctionLibrary::with_dialogs(dialogs.clone());

    let sink = Rc::new(RefCell::new(JsonLinesSink::new(output)));
    let engine = Rc::new(Engine::from_definition(
        &definition,
        &library,
        Box::new(sink.clone()),
    )?);

    for request in read_requests(input) {
        match request? {
            EditRequest::Set { set, value } => engine.set_value(&set, &value),
            EditRequest::Dialog { dialog, values } => {
                let weak = Rc::downgrade(&engine);
                let name = dialog.clone();
                let shown = dialogs.show(
                    &dialog,
                    Box::new(move || {
                        if let Some(engine) = weak.upgrade() {
                            engine.on_function_dialog_result(&name);
                        }
                    }),
                );
                if shown {
                    dialogs.select(&dialog, values);
                } else {
                    Logger::warn(Event::DialogUnknown, &[("context", "cli"), ("dialog", &dialog)]);
                }
            }
        }

        if let Some(err) = sink.borrow_mut().take_error() {
            return Err(err);
        }
    }

    let summary = json!({
        "status": "ok",
        "input_okay": engine.is_input_okay(),
        "invalid_fields": engine.invalid_fields(),
        "metrics": engine.metrics(),
    });
    {
        let mut sink = sink.borrow_mut();
        write_json_line(sink.get_mut(), &summary)?;
    }
    Ok(())
}
