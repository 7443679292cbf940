pub mod ast;
pub mod config;
pub mod error;
pub mod lexer;
pub mod meta;
pub mod normalize;
pub mod parser;
pub mod query;
pub mod serializer;
pub mod snapshot;

use wasm_bindgen::prelude::*;

use ast::{Position, TablePosition};
use meta::{upsert_directive, Directive};
use query::{generate_query, Column};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Canonical text for the editor's format action
#[wasm_bindgen(js_name = "formatSchema")]
pub fn format_schema(source: &str) -> String {
    serializer::format(source)
}

/// Parse result as JSON for the diagram view
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema(source: &str) -> Result<String, String> {
    serde_json::to_string(&parser::parse(source)).map_err(|e| e.to_string())
}

/// SQL for the selected `table.field` strings; malformed entries are ignored
#[wasm_bindgen(js_name = "generateQuery")]
pub fn generate_query_js(source: &str, columns: &js_sys::Array) -> String {
    let selected: Vec<String> = columns.iter().filter_map(|v| v.as_string()).collect();
    query_for_source(source, &selected)
}

#[wasm_bindgen(js_name = "normalizeSchema")]
pub fn normalize_schema(source: &str, field: &str, table: Option<String>) -> String {
    normalize::normalize(source, field, table.as_deref().unwrap_or(""))
}

/// Write back a dragged table's position
#[wasm_bindgen(js_name = "setTablePosition")]
pub fn set_table_position(
    source: &str,
    name: &str,
    x: f64,
    y: f64,
    color: Option<String>,
) -> Result<String, String> {
    let directive = Directive::TablePosition {
        name: name.to_string(),
        position: TablePosition {
            x: x.round() as i64,
            y: y.round() as i64,
            color,
        },
    };
    write_directive(source, &directive)
}

#[wasm_bindgen(js_name = "setZoom")]
pub fn set_zoom(source: &str, zoom: f64) -> Result<String, String> {
    write_directive(source, &Directive::Zoom(zoom))
}

#[wasm_bindgen(js_name = "setView")]
pub fn set_view(source: &str, x: f64, y: f64) -> Result<String, String> {
    let view = Position {
        x: x.round() as i64,
        y: y.round() as i64,
    };
    write_directive(source, &Directive::View(view))
}

fn write_directive(source: &str, directive: &Directive) -> Result<String, String> {
    upsert_directive(source, directive).map_err(|e| e.to_string())
}

/// Parse `source` and generate the query for `table.field` selections.
pub fn query_for_source(source: &str, selected: &[String]) -> String {
    let columns: Vec<Column> = selected.iter().filter_map(|s| s.parse().ok()).collect();
    let result = parser::parse(source);
    generate_query(&columns, &result.table_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_for_source_skips_malformed() {
        let source = "user\n----\nid\nname\n";
        let selected = vec!["user.name".to_string(), "nonsense".to_string()];
        assert_eq!(query_for_source(source, &selected), "select name from user");
    }

    #[test]
    fn test_set_table_position_rounds() {
        let out = set_table_position("user\n----\nid\n", "user", 10.4, -3.6, None).unwrap();
        assert_eq!(out, "user\n----\nid\n# user (10, -4)\n");
        let out = set_table_position(&out, "user", 1.0, 2.0, Some("#abc".into())).unwrap();
        assert_eq!(out, "user\n----\nid\n# user (1, 2, #abc)\n");
    }

    #[test]
    fn test_setters_keep_the_text_readable() {
        let source = "order-item\n----------\nid\n";
        assert!(set_table_position(source, "order-item", 1.0, 2.0, None).is_err());
        assert!(set_zoom(source, -1.0).is_err());
        assert!(set_zoom(source, f64::NAN).is_err());

        let out = set_table_position("user\n----\nid\n", "user", 1.0, 2.0, Some("#ABCDEF".into())).unwrap();
        let out = set_table_position(&out, "user", 3.0, 4.0, Some("#ABCDEF".into())).unwrap();
        let parsed = parser::parse(&out);
        assert_eq!(parsed.table_positions.len(), 1);
        assert_eq!(
            parsed.table_positions.get("user"),
            Some(&TablePosition {
                x: 3,
                y: 4,
                color: Some("#ABCDEF".into())
            })
        );
    }

    #[test]
    fn test_parse_schema_json() {
        let json = parse_schema("user\n----\nid pk\n").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["table_list"][0]["name"], "user");
        assert_eq!(value["table_list"][0]["field_list"][0]["modifiers"][0], "Pk");
    }
}
