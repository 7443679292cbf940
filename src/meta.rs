//! Presentation directives stored as reserved comment lines.
//!
//! Diagram state (zoom, viewport, table placement and colors) travels inside
//! the schema text as `# ...` lines, so the text buffer stays the only
//! persisted artifact. Every directive has a writer ([`Directive::to_line`])
//! and a recognizer ([`Directive::parse_line`]); parsing a written line gives
//! back the same value.

use crate::ast::{Position, TablePosition};
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static ZOOM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# zoom: ([0-9.]+)$").unwrap());
static VIEW_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# view: \(([0-9.-]+), ([0-9.-]+)\)$").unwrap());
static TABLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^# (\w+) \(([0-9-]+), ([0-9-]+),? ?(#[0-9a-fA-F]+)?\)$").unwrap()
});
static COLOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# ([a-z-]+): (#\w+)$").unwrap());
static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());
static TABLE_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]+$").unwrap());
static SETTING_COLOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\w+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSetting {
    TextBg,
    Text,
    DiagramBg,
    DiagramText,
    TableBg,
    TableText,
}

impl ColorSetting {
    pub const ALL: [ColorSetting; 6] = [
        ColorSetting::TextBg,
        ColorSetting::Text,
        ColorSetting::DiagramBg,
        ColorSetting::DiagramText,
        ColorSetting::TableBg,
        ColorSetting::TableText,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ColorSetting::TextBg => "text-bg",
            ColorSetting::Text => "text-color",
            ColorSetting::DiagramBg => "diagram-bg",
            ColorSetting::DiagramText => "diagram-text",
            ColorSetting::TableBg => "table-bg",
            ColorSetting::TableText => "table-text",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Zoom(f64),
    View(Position),
    TablePosition { name: String, position: TablePosition },
    Color { setting: ColorSetting, color: String },
}

impl Directive {
    /// Recognize a whole (trimmed) line. `None` means the line is not a
    /// directive, which callers treat as "value not set".
    pub fn parse_line(line: &str) -> Option<Self> {
        if let Some(caps) = ZOOM_LINE.captures(line) {
            let zoom: f64 = caps[1].parse().ok()?;
            let zoom = round_zoom(zoom);
            return zoom.is_finite().then_some(Directive::Zoom(zoom));
        }
        if let Some(caps) = VIEW_LINE.captures(line) {
            return Some(Directive::View(Position {
                x: parse_coordinate(&caps[1])?,
                y: parse_coordinate(&caps[2])?,
            }));
        }
        if let Some(caps) = COLOR_LINE.captures(line) {
            let setting = ColorSetting::from_key(&caps[1])?;
            return Some(Directive::Color {
                setting,
                color: caps[2].to_string(),
            });
        }
        if let Some(caps) = TABLE_LINE.captures(line) {
            return Some(Directive::TablePosition {
                name: caps[1].to_string(),
                position: TablePosition {
                    x: caps[2].parse().ok()?,
                    y: caps[3].parse().ok()?,
                    color: caps.get(4).map(|m| m.as_str().to_string()),
                },
            });
        }
        None
    }

    pub fn to_line(&self) -> String {
        match self {
            Directive::Zoom(zoom) => format!("# zoom: {:.3}", zoom),
            Directive::View(view) => format!("# view: ({}, {})", view.x, view.y),
            Directive::TablePosition { name, position } => match &position.color {
                Some(color) => format!("# {} ({}, {}, {})", name, position.x, position.y, color),
                None => format!("# {} ({}, {})", name, position.x, position.y),
            },
            Directive::Color { setting, color } => format!("# {}: {}", setting.key(), color),
        }
    }

    /// Reject values whose line [`Directive::parse_line`] would not read back.
    pub fn check(&self) -> Result<()> {
        match self {
            Directive::Zoom(zoom) if !(zoom.is_finite() && round_zoom(*zoom) > 0.0) => Err(
                Error::InvalidDirective(format!("zoom must be a positive number, got {zoom}")),
            ),
            Directive::TablePosition { name, .. } if !TABLE_NAME.is_match(name) => {
                Err(Error::InvalidDirective(format!(
                    "table name {name:?} cannot carry a position"
                )))
            }
            Directive::TablePosition {
                position: TablePosition {
                    color: Some(color), ..
                },
                ..
            } if !TABLE_COLOR.is_match(color) => Err(Error::InvalidDirective(format!(
                "table color {color:?} is not a hex color"
            ))),
            Directive::Color { color, .. } if !SETTING_COLOR.is_match(color) => Err(
                Error::InvalidDirective(format!("color {color:?} is not a #value")),
            ),
            _ => Ok(()),
        }
    }

    /// Two directives with the same key occupy the same line slot.
    fn same_slot(&self, other: &Directive) -> bool {
        match (self, other) {
            (Directive::Zoom(_), Directive::Zoom(_)) => true,
            (Directive::View(_), Directive::View(_)) => true,
            (Directive::TablePosition { name: a, .. }, Directive::TablePosition { name: b, .. }) => {
                a == b
            }
            (Directive::Color { setting: a, .. }, Directive::Color { setting: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Zoom is persisted with three decimals; values read back are snapped to
/// that precision so a re-read never drifts.
fn round_zoom(zoom: f64) -> f64 {
    let scaled = zoom * 1000.0;
    if scaled.is_finite() && zoom.fract() != 0.0 {
        scaled.round() / 1000.0
    } else {
        zoom
    }
}

/// View coordinates are integers; fractional input is rounded.
fn parse_coordinate(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let value: f64 = text.parse().ok()?;
    value.is_finite().then(|| value.round() as i64)
}

/// All directives in `text`, in line order.
pub fn read_directives(text: &str) -> Vec<Directive> {
    text.lines()
        .filter_map(|line| Directive::parse_line(line.trim()))
        .collect()
}

/// Write `directive` into `text`: the existing line for the same slot is
/// replaced, otherwise the line is appended.
pub fn upsert_directive(text: &str, directive: &Directive) -> Result<String> {
    directive.check()?;
    let new_line = directive.to_line();
    let mut replaced = false;
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let hit = Directive::parse_line(line.trim()).is_some_and(|d| d.same_slot(directive));
        if !hit {
            lines.push(line.to_string());
        } else if !replaced {
            lines.push(new_line.clone());
            replaced = true;
        }
    }

    if !replaced {
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        lines.push(new_line);
    }

    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}
