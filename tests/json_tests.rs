//! JSON Serializer Tests
//!
//! These tests verify:
//! - Exact output for single and empty rows
//! - Separator placement with many columns
//! - Escaping of quotes, backslashes and control characters
//! - Exact-length handling of binary fields

use colquery::protocol::{row_to_json, row_to_value, rows_to_json};
use colquery::{Cell, Row};

// =============================================================================
// Helper Functions
// =============================================================================

fn cell(family: &'static str, qualifier: &'static str, value: &'static str) -> Cell {
    Cell::new(family, qualifier, value, 1)
}

// =============================================================================
// Exact Output
// =============================================================================

#[test]
fn test_single_cell_row() {
    let row = Row::new("row1", vec![cell("f", "g", "v")]);

    assert_eq!(
        row_to_json(&row).unwrap(),
        r#"{"rowkey":"row1","columns":[{"name":"f:g","value":"v"}]}"#
    );
}

#[test]
fn test_empty_row_has_no_dangling_separator() {
    let row = Row::new("row1", vec![]);

    assert_eq!(row_to_json(&row).unwrap(), r#"{"rowkey":"row1","columns":[]}"#);
}

#[test]
fn test_multiple_cells_separated_once() {
    let row = Row::new(
        "1001",
        vec![cell("cf", "price", "9.99"), cell("cf", "qty", "5"), cell("meta", "src", "web")],
    );

    assert_eq!(
        row_to_json(&row).unwrap(),
        concat!(
            r#"{"rowkey":"1001","columns":["#,
            r#"{"name":"cf:price","value":"9.99"},"#,
            r#"{"name":"cf:qty","value":"5"},"#,
            r#"{"name":"meta:src","value":"web"}"#,
            r#"]}"#
        )
    );
}

#[test]
fn test_cell_order_is_preserved() {
    let row = Row::new("r", vec![cell("z", "1", "a"), cell("a", "1", "b")]);
    let value = row_to_value(&row).unwrap();

    assert_eq!(value["columns"][0]["name"], "z:1");
    assert_eq!(value["columns"][1]["name"], "a:1");
}

// =============================================================================
// Escaping
// =============================================================================

#[test]
fn test_value_with_quote_and_backslash_is_escaped() {
    let row = Row::new("r", vec![cell("f", "q", r#"say "hi" \ bye"#)]);

    let json = row_to_json(&row).unwrap();
    assert_eq!(
        json,
        r#"{"rowkey":"r","columns":[{"name":"f:q","value":"say \"hi\" \\ bye"}]}"#
    );

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["columns"][0]["value"], r#"say "hi" \ bye"#);
}

#[test]
fn test_control_characters_are_escaped() {
    let row = Row::new("line\nbreak", vec![cell("f", "q", "tab\there\u{1}")]);

    let json = row_to_json(&row).unwrap();
    assert!(json.contains(r#""rowkey":"line\nbreak""#));
    assert!(json.contains(r#""value":"tab\there\u0001""#));
    assert!(!json.contains('\n'));
}

// =============================================================================
// Binary Fields
// =============================================================================

#[test]
fn test_embedded_nul_is_kept() {
    let row = Row::new(
        &b"ab\0cd"[..],
        vec![Cell::new(&b"f"[..], &b"q"[..], &b"x\0y"[..], 7)],
    );

    let value = row_to_value(&row).unwrap();
    assert_eq!(value["rowkey"], "ab\u{0}cd");
    assert_eq!(value["columns"][0]["value"], "x\u{0}y");
}

#[test]
fn test_sliced_bytes_use_exact_length() {
    let backing = bytes::Bytes::from_static(b"row1-and-more");
    let key = backing.slice(0..4);
    let row = Row::new(key, vec![]);

    assert_eq!(row_to_json(&row).unwrap(), r#"{"rowkey":"row1","columns":[]}"#);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let row = Row::new(&b"k"[..], vec![Cell::new(&b"f"[..], &b"q"[..], vec![0xff, b'a'], 1)]);

    let value = row_to_value(&row).unwrap();
    assert_eq!(value["columns"][0]["value"], "\u{fffd}a");
}

// =============================================================================
// Scan Results
// =============================================================================

#[test]
fn test_rows_to_json_array() {
    let rows = vec![
        Row::new("a", vec![cell("f", "q", "1")]),
        Row::new("b", vec![]),
    ];

    assert_eq!(
        rows_to_json(&rows).unwrap(),
        r#"[{"rowkey":"a","columns":[{"name":"f:q","value":"1"}]},{"rowkey":"b","columns":[]}]"#
    );
    assert_eq!(rows_to_json(&[]).unwrap(), "[]");
}
