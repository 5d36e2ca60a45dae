//! Form Loading Tests
//!
//! Definition files on disk through to a running engine:
//! - Loading and initializing from a file
//! - Construction failures that leave no engine behind
//! - The JSON-lines runner end to end

use std::cell::RefCell;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use formflow::cli::run_form;
use formflow::engine::{Engine, RecordingSink};
use formflow::form::{FormErrorCode, FormLoader};
use formflow::functions::FunctionLibrary;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_form(dir: &Path, name: &str, form: Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(&form).unwrap()).unwrap();
    path
}

fn letter_form() -> Value {
    json!({
        "engine": {"log_level": "warn"},
        "fields": [
            {"id": "Geschlecht"},
            {"id": "Anrede", "autofill": {"IF": {
                "cond": {"STRCMP": [{"VALUE": "Geschlecht"}, {"LITERAL": "w"}]},
                "then": {"LITERAL": "Frau"},
                "else": {"LITERAL": "Herr"}}}},
            {"id": "Ort",
             "autofill": {"DIALOG": {"dialog": "AddressLookup", "data": "Ort"}},
             "plausi": {"HAS_VALUE": "Ort"}}
        ]
    })
}

/// Output shared with the test after the runner takes ownership
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<Value> {
        String::from_utf8(self.0.borrow().clone())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_and_initialize_from_file() {
    let temp_dir = TempDir::new().unwrap();
    write_form(
        temp_dir.path(),
        "kontakt.json",
        json!({
            "fields": [
                {"id": "Name", "value": "Erika"},
                {"id": "Gruss", "autofill": {"CAT": [{"LITERAL": "Hallo "}, {"VALUE": "Name"}]}},
                {"id": "Notiz"}
            ],
            "presets": {"Notiz": "!!!PRÜFEN!!!<<<<"}
        }),
    );

    let loader = FormLoader::new(temp_dir.path());
    let definition = loader.load(Path::new("kontakt.json")).unwrap();
    let engine = Engine::from_definition(
        &definition,
        &FunctionLibrary::new(),
        Box::new(RecordingSink::new()),
    )
    .unwrap();

    assert_eq!(engine.value("Gruss").as_deref(), Some("Hallo Erika"));
    assert_eq!(engine.is_fishy("Notiz"), Some(true));
    assert_eq!(engine.invalid_fields(), ["Notiz"]);
}

// =============================================================================
// Construction failures
// =============================================================================

#[test]
fn test_strict_order_rejects_forward_reference() {
    let definition = FormLoader::parse(
        &json!({
            "engine": {"strict_autofill_order": true},
            "fields": [
                {"id": "Kopie", "autofill": {"VALUE": "Original"}},
                {"id": "Original"}
            ]
        })
        .to_string(),
        "<test>",
    )
    .unwrap();

    let sink = RecordingSink::shared();
    let err = Engine::from_definition(&definition, &FunctionLibrary::new(), Box::new(sink.clone()))
        .unwrap_err();

    assert_eq!(err.code(), FormErrorCode::FormAutofillOrder);
    assert!(err.is_fatal());
    assert!(sink.borrow().events().is_empty());
}

#[test]
fn test_unresolvable_functions_are_fatal() {
    let bad_pattern = FormLoader::parse(
        &json!({"fields": [
            {"id": "PLZ", "plausi": {"MATCH": {"value": {"VALUE": "PLZ"}, "pattern": "([0-9]"}}}
        ]})
        .to_string(),
        "<test>",
    )
    .unwrap();
    let err = Engine::from_definition(
        &bad_pattern,
        &FunctionLibrary::new(),
        Box::new(RecordingSink::new()),
    )
    .unwrap_err();
    assert_eq!(err.code(), FormErrorCode::FormInvalidFunction);
    assert_eq!(err.subject(), Some("PLZ"));

    // Dialogs need a library that offers them
    let dialog = FormLoader::parse(&letter_form().to_string(), "<test>").unwrap();
    let err = Engine::from_definition(
        &dialog,
        &FunctionLibrary::new(),
        Box::new(RecordingSink::new()),
    )
    .unwrap_err();
    assert_eq!(err.code(), FormErrorCode::FormInvalidFunction);
    assert_eq!(err.subject(), Some("Ort"));
}

#[test]
fn test_malformed_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("kaputt.json"), "{\"fields\": [").unwrap();

    let err = FormLoader::new(temp_dir.path())
        .load(Path::new("kaputt.json"))
        .unwrap_err();
    assert_eq!(err.code(), FormErrorCode::FormInvalidDefinition);

    let err = FormLoader::new(temp_dir.path())
        .load(Path::new("fehlt.json"))
        .unwrap_err();
    assert_eq!(err.code(), FormErrorCode::FormInvalidDefinition);
}

// =============================================================================
// JSON-lines runner
// =============================================================================

#[test]
fn test_run_streams_changes_and_summary() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_form(temp_dir.path(), "brief.json", letter_form());

    let input = Cursor::new(
        [
            r#"{"set": "Geschlecht", "value": "w"}"#,
            "",
            r#"{"dialog": "Unbekannt", "values": {}}"#,
            r#"{"dialog": "AddressLookup", "values": {"Ort": "Berlin"}}"#,
        ]
        .join("\n"),
    );
    let output = SharedBuffer::default();
    run_form(&path, input, output.clone()).unwrap();

    let lines = output.lines();
    assert!(lines.contains(&json!({"kind": "value", "id": "Anrede", "value": "Herr"})));
    assert!(lines.contains(&json!({"kind": "value", "id": "Anrede", "value": "Frau"})));
    assert!(lines.contains(&json!({"kind": "validity", "id": "Ort", "okay": false})));
    assert!(lines.contains(&json!({"kind": "value", "id": "Ort", "value": "Berlin"})));

    let summary = lines.last().unwrap();
    assert_eq!(summary["status"], "ok");
    assert_eq!(summary["input_okay"], true);
    assert_eq!(summary["invalid_fields"], json!([]));
    assert_eq!(summary["metrics"]["propagation_runs"], 2);
    assert_eq!(summary["metrics"]["evaluation_failures"], 1);
}

#[test]
fn test_run_summary_follows_numeric_edits() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_form(
        temp_dir.path(),
        "rechnung.json",
        json!({
            "engine": {"log_level": "error"},
            "fields": [
                {"id": "Porto"},
                {"id": "Gebuehr"},
                {"id": "Summe", "autofill": {"SUM": [{"VALUE": "Porto"}, {"VALUE": "Gebuehr"}]}},
                {"id": "Anteil", "autofill": {"DIVIDE": {
                    "value": {"VALUE": "Summe"}, "by": {"LITERAL": "3"}, "min": 2, "max": 2}}},
                {"id": "Limit", "value": "1",
                 "plausi": {"LE": {"values": [{"VALUE": "Summe"}, {"VALUE": "Limit"}]}}}
            ]
        }),
    );

    let input = Cursor::new(
        [
            r#"{"set": "Porto", "value": "0.1"}"#,
            r#"{"set": "Gebuehr", "value": "0,2"}"#,
        ]
        .join("\n"),
    );
    let output = SharedBuffer::default();
    run_form(&path, input, output.clone()).unwrap();

    let lines = output.lines();
    assert!(lines.contains(&json!({"kind": "value", "id": "Summe", "value": "0.3"})));
    assert!(lines.contains(&json!({"kind": "value", "id": "Anteil", "value": "0.10"})));

    let summary = lines.last().unwrap();
    assert_eq!(summary["status"], "ok");
    assert_eq!(summary["input_okay"], true);
    assert_eq!(summary["metrics"]["propagation_runs"], 2);
    assert_eq!(summary["metrics"]["evaluation_failures"], 0);
}

#[test]
fn test_run_set_value_for_foreign_id_is_echoed() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_form(temp_dir.path(), "brief.json", letter_form());

    let output = SharedBuffer::default();
    run_form(
        &path,
        Cursor::new(r#"{"set": "Aktenzeichen", "value": "AZ-7"}"#),
        output.clone(),
    )
    .unwrap();

    let lines = output.lines();
    assert!(lines.contains(&json!({"kind": "value", "id": "Aktenzeichen", "value": "AZ-7"})));
    assert_eq!(lines.last().unwrap()["input_okay"], false);
}
