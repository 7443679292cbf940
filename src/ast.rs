use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything recovered from one schema text buffer: the relational schema
/// plus the presentation state carried in directive lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub table_list: Vec<Table>,
    pub zoom: Option<f64>,
    pub view: Option<Position>,
    pub text_bg_color: Option<String>,
    pub text_color: Option<String>,
    pub diagram_bg_color: Option<String>,
    pub diagram_text_color: Option<String>,
    pub table_bg_color: Option<String>,
    pub table_text_color: Option<String>,
    /// Diagram position and color per table name.
    pub table_positions: BTreeMap<String, TablePosition>,
}

impl ParseResult {
    /// First table with the given name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.table_list.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub field_list: Vec<Field>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_list: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_list.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: Option<String>,
    /// Kept de-duplicated and in canonical order, see [`Field::add_modifier`].
    pub modifiers: Vec<FieldModifier>,
    pub references: Option<Reference>,
    pub comment: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
            modifiers: Vec::new(),
            references: None,
            comment: None,
        }
    }

    /// Insert a modifier keeping the list sorted by canonical rank.
    /// A second `default` replaces the first.
    pub fn add_modifier(&mut self, modifier: FieldModifier) {
        let rank = modifier.rank();
        match self.modifiers.iter().position(|m| m.rank() >= rank) {
            Some(idx) if self.modifiers[idx].rank() == rank => self.modifiers[idx] = modifier,
            Some(idx) => self.modifiers.insert(idx, modifier),
            None => self.modifiers.push(modifier),
        }
    }

    pub fn has_modifier(&self, modifier: &FieldModifier) -> bool {
        self.modifiers.iter().any(|m| m.rank() == modifier.rank())
    }

    pub fn is_primary_key(&self) -> bool {
        self.has_modifier(&FieldModifier::Pk)
    }

    pub fn is_nullable(&self) -> bool {
        self.has_modifier(&FieldModifier::Null)
    }

    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.modifiers.iter().find_map(|m| match m {
            FieldModifier::Default(v) => Some(v.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldModifier {
    Pk,
    Unique,
    Unsigned,
    Null,
    Default(String),
}

impl FieldModifier {
    /// Position in the canonical modifier order.
    pub fn rank(&self) -> u8 {
        match self {
            FieldModifier::Pk => 0,
            FieldModifier::Unique => 1,
            FieldModifier::Unsigned => 2,
            FieldModifier::Null => 3,
            FieldModifier::Default(_) => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: RelationKind,
    pub table: String,
    pub field: String,
}

impl Reference {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::ManyToOne,
            table: table.into(),
            field: field.into(),
        }
    }

    /// The reference a bare `fk` modifier implies for a field name:
    /// `post_id` points at `post.id`.
    pub fn implicit(field_name: &str) -> Self {
        Self::new(strip_id_suffix(field_name), DEFAULT_REFERENCE_FIELD)
    }
}

pub const DEFAULT_REFERENCE_FIELD: &str = "id";

/// Drop one trailing `_id` from a foreign key field name.
///
/// This is the single place the `{table}_id` naming convention lives; both the
/// implicit `fk` rule and join aliasing go through it. Names without the
/// suffix (or consisting only of it) are returned unchanged.
pub fn strip_id_suffix(name: &str) -> &str {
    match name.strip_suffix("_id") {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    ManyToOne,          // >-
    OneToMany,          // -<
    OneToOne,           // -
    ManyToMany,         // >-<
    ManyToZeroOrOne,    // >0
    ZeroOrOneToMany,    // 0<
    OneToZeroOrOne,     // -0
    ZeroOrOneToOne,     // 0-
}

impl RelationKind {
    pub const ALL: [RelationKind; 8] = [
        RelationKind::ManyToOne,
        RelationKind::OneToMany,
        RelationKind::OneToOne,
        RelationKind::ManyToMany,
        RelationKind::ManyToZeroOrOne,
        RelationKind::ZeroOrOneToMany,
        RelationKind::OneToZeroOrOne,
        RelationKind::ZeroOrOneToOne,
    ];

    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_token() == s)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            RelationKind::ManyToOne => ">-",
            RelationKind::OneToMany => "-<",
            RelationKind::OneToOne => "-",
            RelationKind::ManyToMany => ">-<",
            RelationKind::ManyToZeroOrOne => ">0",
            RelationKind::ZeroOrOneToMany => "0<",
            RelationKind::OneToZeroOrOne => "-0",
            RelationKind::ZeroOrOneToOne => "0-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TablePosition {
    pub x: i64,
    pub y: i64,
    pub color: Option<String>,
}
