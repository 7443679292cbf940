//! Serializer for converting a [`ParseResult`] back to canonical schema text.

use crate::ast::{Field, FieldModifier, ParseResult, Reference, Table};
use crate::meta::{ColorSetting, Directive};
use unicode_width::UnicodeWidthStr;

/// Serialize to canonical text: one blank line between tables, an underline
/// as wide as the table name, modifiers in a fixed order, directives last,
/// trailing newline.
pub fn serialize(result: &ParseResult) -> String {
    let mut output = String::new();

    for (i, table) in result.table_list.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        serialize_table(&mut output, table);
    }

    let directives = directive_lines(result);
    if !directives.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        for line in directives {
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

/// Parse and re-serialize, the "format" action of the editor.
pub fn format(text: &str) -> String {
    serialize(&crate::parser::parse(text))
}

fn serialize_table(output: &mut String, table: &Table) {
    output.push_str(&table.name);
    output.push('\n');
    let width = UnicodeWidthStr::width(table.name.as_str()).max(1);
    output.push_str(&"-".repeat(width));
    output.push('\n');

    for field in &table.field_list {
        serialize_field(output, field);
    }
}

fn serialize_field(output: &mut String, field: &Field) {
    output.push_str(&field.name);

    if let Some(typ) = &field.field_type {
        output.push(' ');
        output.push_str(typ);
    }

    for modifier in &field.modifiers {
        match modifier {
            FieldModifier::Pk => output.push_str(" pk"),
            FieldModifier::Unique => output.push_str(" unique"),
            FieldModifier::Unsigned => output.push_str(" unsigned"),
            FieldModifier::Null => output.push_str(" null"),
            FieldModifier::Default(val) => output.push_str(&format!(" default {}", val)),
        }
    }

    if let Some(reference) = &field.references {
        if *reference == Reference::implicit(&field.name) {
            output.push_str(" fk");
        } else {
            output.push_str(&format!(
                " fk {} {}.{}",
                reference.kind.as_token(),
                reference.table,
                reference.field
            ));
        }
    }

    if let Some(comment) = &field.comment {
        output.push_str(" # ");
        output.push_str(comment);
    }

    output.push('\n');
}

fn directive_lines(result: &ParseResult) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(view) = result.view {
        lines.push(Directive::View(view).to_line());
    }
    if let Some(zoom) = result.zoom {
        lines.push(Directive::Zoom(zoom).to_line());
    }

    let colors = [
        (ColorSetting::TextBg, &result.text_bg_color),
        (ColorSetting::Text, &result.text_color),
        (ColorSetting::DiagramBg, &result.diagram_bg_color),
        (ColorSetting::DiagramText, &result.diagram_text_color),
        (ColorSetting::TableBg, &result.table_bg_color),
        (ColorSetting::TableText, &result.table_text_color),
    ];
    for (setting, color) in colors {
        if let Some(color) = color {
            lines.push(
                Directive::Color {
                    setting,
                    color: color.clone(),
                }
                .to_line(),
            );
        }
    }

    // Positions follow table order; positions for unknown tables come last.
    let mut emitted: Vec<&str> = Vec::new();
    let names = result
        .table_list
        .iter()
        .map(|t| t.name.as_str())
        .chain(result.table_positions.keys().map(String::as_str));
    for name in names {
        if emitted.contains(&name) {
            continue;
        }
        if let Some(position) = result.table_positions.get(name) {
            lines.push(
                Directive::TablePosition {
                    name: name.to_string(),
                    position: position.clone(),
                }
                .to_line(),
            );
            emitted.push(name);
        }
    }

    lines
}
