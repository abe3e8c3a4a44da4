// Tests for subject and error report formatting
//
// Human output is checked line by line; machine formats are parsed back.

use super::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, 0, Box::new(buffer.clone()));
    (writer, buffer)
}

#[test]
fn test_human_scalar_prints_bare() {
    assert_eq!(OutputFormat::Human.format_subject(&Subject::from("ann")).unwrap(), "ann");
    assert_eq!(OutputFormat::Human.format_subject(&Subject::from(42)).unwrap(), "42");
    assert_eq!(OutputFormat::Human.format_subject(&Subject::Null).unwrap(), "null");
}

#[test]
fn test_human_collections_print_as_tree() {
    let subject = Subject::from(json!({
        "name": "ann",
        "tags": ["a", "b"],
        "address": {"city": "Oslo"},
        "empty": []
    }));

    let formatted = OutputFormat::Human.format_subject(&subject).unwrap();
    let lines: Vec<_> = formatted.lines().collect();
    assert_eq!(
        lines,
        vec![
            "name: \"ann\"",
            "tags:",
            "  - \"a\"",
            "  - \"b\"",
            "address:",
            "  city: \"Oslo\"",
            "empty: []",
        ]
    );
}

#[test]
fn test_machine_formats_round_trip() {
    let subject = Subject::from(json!({"total": 12.5, "lines": [1, 2]}));

    let formatted = OutputFormat::Json.format_subject(&subject).unwrap();
    let parsed: Value = serde_json::from_str(&formatted).unwrap();
    assert_eq!(parsed, json!({"total": 12.5, "lines": [1, 2]}));

    let formatted = OutputFormat::Yaml.format_subject(&subject).unwrap();
    let parsed: Value = serde_yaml::from_str(&formatted).unwrap();
    assert_eq!(parsed, json!({"total": 12.5, "lines": [1, 2]}));
}

#[test]
fn test_error_human_uses_message_block() {
    let (mut out, buffer) = writer(OutputFormat::Human, true);
    let err = Error::from(tractor_core::Error::invalid_data(
        "required",
        Subject::Null,
        vec!["value is required".to_string()],
    ));
    out.error(&err).unwrap();

    let contents = buffer.contents();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines[0], "Error: InvalidData in 'required'");
    assert_eq!(lines[1], "  - value is required");
}

#[test]
fn test_error_json_is_a_report() {
    let (mut out, buffer) = writer(OutputFormat::Json, true);
    let inner = tractor_core::Error::extraction("user.age", "map", "key 'age' not found");
    out.error(&Error::from(tractor_core::Error::stage(1, inner))).unwrap();

    let parsed: Value = serde_json::from_str(buffer.contents().trim()).unwrap();
    assert_eq!(parsed["kind"], "Extraction");
    assert_eq!(parsed["origin"], "user.age");
    assert_eq!(parsed["stage_index"], 1);
    assert_eq!(parsed["messages"], json!(["key 'age' not found"]));
    assert!(parsed.get("data").is_none());
}

#[test]
fn test_error_yaml_for_cli_failures() {
    let (mut out, buffer) = writer(OutputFormat::Yaml, false);
    out.error(&Error::invalid_args("only one input may be '-'")).unwrap();

    let parsed: Value = serde_yaml::from_str(&buffer.contents()).unwrap();
    assert_eq!(parsed["exit_code"], 6);
    assert_eq!(parsed["error"], "Invalid arguments: only one input may be '-'");
}

#[test]
fn test_writer_respects_quiet_and_format() {
    let (mut out, buffer) = writer(OutputFormat::Human, true);
    out.info("hidden").unwrap();
    out.success("hidden").unwrap();
    out.subject(&Subject::from("shown")).unwrap();
    assert_eq!(buffer.contents(), "shown\n");

    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.info("hidden").unwrap();
    out.section("hidden").unwrap();
    out.subject(&Subject::from(json!([1, 2]))).unwrap();
    assert_eq!(buffer.contents(), "[1,2]\n");
}

#[test]
fn test_table_alignment() {
    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.table(
        &["#", "stage"],
        vec![
            vec!["0".to_string(), "trim".to_string()],
            vec!["1".to_string(), "upper".to_string()],
        ],
    )
    .unwrap();

    let contents = buffer.contents();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines[0], "# │ stage");
    assert_eq!(lines[1], "──┼──────");
    assert_eq!(lines[2], "0 │ trim");
    assert_eq!(lines[3], "1 │ upper");
}

#[test]
fn test_format_value_compact() {
    assert_eq!(format_value_compact(&json!([1, 2, 3, 4])), "[4 items]");
    assert_eq!(format_value_compact(&json!({"a": 1})), "{a: 1}");
    assert_eq!(format_value_compact(&json!({"a": 1, "b": 2, "c": 3})), "{3 fields}");
}
