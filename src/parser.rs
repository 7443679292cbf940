//! Line-grammar parser for the schema DSL.
//!
//! ```text
//! user
//! ----
//! id pk
//! username varchar(64) unique
//!
//! post
//! ----
//! id pk
//! author_id fk >- user.id
//! reply_id null fk          # implicit: reply.id
//! ```
//!
//! Parsing is total. Lines that fit nowhere are dropped rather than reported:
//! standalone comments, field lines before the first table header, words after
//! a table name, a relation token without a target, a `default` without a
//! value and table or field names made only of dashes. Blank lines carry no
//! meaning.

use crate::ast::*;
use crate::lexer::{split_comment, split_words, Lexer, Line};
use crate::meta::{ColorSetting, Directive};
use tracing::{debug, trace};

pub struct Parser<'a> {
    lines: Vec<Line<'a>>,
    /// For each line, the index of the first text or underline line at or after it.
    next_grammar: Vec<Option<usize>>,
    pos: usize,
}

/// Parse a schema text buffer.
pub fn parse(input: &str) -> ParseResult {
    Parser::new(input).parse()
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let lines = Lexer::new(input).tokenize();
        let mut next_grammar = vec![None; lines.len()];
        let mut next = None;
        for (idx, line) in lines.iter().enumerate().rev() {
            if matches!(line, Line::Text(_) | Line::Underline) {
                next = Some(idx);
            }
            next_grammar[idx] = next;
        }
        Self {
            lines,
            next_grammar,
            pos: 0,
        }
    }

    /// Next line that can take part in the table grammar.
    fn peek(&self) -> Option<&Line<'a>> {
        let idx = self.next_grammar.get(self.pos).copied().flatten()?;
        self.lines.get(idx)
    }

    fn advance(&mut self) -> Option<Line<'a>> {
        let line = self.lines.get(self.pos).cloned();
        self.pos += 1;
        line
    }

    pub fn parse(&mut self) -> ParseResult {
        let mut result = ParseResult::default();
        let mut current: Option<Table> = None;

        while let Some(line) = self.advance() {
            match line {
                Line::Blank => {}
                Line::Directive(directive) => apply_directive(&mut result, directive),
                Line::Comment(text) => trace!(line = text, "dropping comment line"),
                Line::Underline => trace!("dropping stray underline"),
                Line::Text(text) => {
                    if matches!(self.peek(), Some(Line::Underline)) {
                        if let Some(table) = current.take() {
                            result.table_list.push(table);
                        }
                        current = parse_header(text);
                    } else if let Some(table) = current.as_mut() {
                        if let Some(field) = parse_field(text) {
                            table.field_list.push(field);
                        }
                    } else {
                        trace!(line = text, "dropping field line outside of a table");
                    }
                }
            }
        }

        if let Some(table) = current.take() {
            result.table_list.push(table);
        }

        debug!(
            tables = result.table_list.len(),
            fields = result
                .table_list
                .iter()
                .map(|t| t.field_list.len())
                .sum::<usize>(),
            "parsed schema"
        );
        result
    }
}

fn apply_directive(result: &mut ParseResult, directive: Directive) {
    match directive {
        Directive::Zoom(zoom) => result.zoom = Some(zoom),
        Directive::View(view) => result.view = Some(view),
        Directive::TablePosition { name, position } => {
            result.table_positions.insert(name, position);
        }
        Directive::Color { setting, color } => {
            let slot = match setting {
                ColorSetting::TextBg => &mut result.text_bg_color,
                ColorSetting::Text => &mut result.text_color,
                ColorSetting::DiagramBg => &mut result.diagram_bg_color,
                ColorSetting::DiagramText => &mut result.diagram_text_color,
                ColorSetting::TableBg => &mut result.table_bg_color,
                ColorSetting::TableText => &mut result.table_text_color,
            };
            *slot = Some(color);
        }
    }
}

/// The header's first word names the table. A name made of dashes would read
/// back as an underline, so such a header opens no table.
fn parse_header(text: &str) -> Option<Table> {
    let (body, _) = split_comment(text);
    let name = split_words(body).first().copied().unwrap_or(body);
    if is_dashes(name) {
        trace!(line = text, "dropping header without a usable table name");
        return None;
    }
    Some(Table::new(name))
}

fn is_dashes(word: &str) -> bool {
    word.chars().all(|c| c == '-')
}

/// `<name> [type...] [pk] [unique] [unsigned] [null] [default <v>] [fk [<rel> <table>[.<field>]]]`
/// with the words after the name in any order.
pub fn parse_field(text: &str) -> Option<Field> {
    let (body, comment) = split_comment(text);
    let words = split_words(body);
    let (name, rest) = words.split_first()?;
    if is_dashes(name) {
        trace!(line = text, "dropping field without a usable name");
        return None;
    }

    let mut field = Field::new(*name);
    field.comment = comment.map(str::to_string);

    let mut type_words: Vec<&str> = Vec::new();
    let mut is_fk = false;
    let mut explicit: Option<Reference> = None;
    let mut iter = rest.iter().copied().peekable();

    while let Some(word) = iter.next() {
        match word {
            "pk" => field.add_modifier(FieldModifier::Pk),
            "unique" => field.add_modifier(FieldModifier::Unique),
            "unsigned" => field.add_modifier(FieldModifier::Unsigned),
            "null" => field.add_modifier(FieldModifier::Null),
            "default" => match iter.next() {
                Some(value) => field.add_modifier(FieldModifier::Default(value.to_string())),
                None => trace!(field = *name, "dropping default without value"),
            },
            "fk" => {
                is_fk = true;
                if let Some(kind) = iter.peek().and_then(|w| RelationKind::from_token(w)) {
                    iter.next();
                    explicit = iter.next().map(|target| parse_target(kind, target)).or(explicit);
                }
            }
            w => match RelationKind::from_token(w) {
                Some(kind) => {
                    is_fk = true;
                    explicit = iter.next().map(|target| parse_target(kind, target)).or(explicit);
                }
                None => type_words.push(w),
            },
        }
    }

    if !type_words.is_empty() {
        field.field_type = Some(type_words.join(" "));
    }
    if is_fk {
        field.references = Some(explicit.unwrap_or_else(|| Reference::implicit(name)));
    }
    Some(field)
}

/// `table.field` or bare `table`, which points at `table.id`.
fn parse_target(kind: RelationKind, target: &str) -> Reference {
    let (table, field) = match target.split_once('.') {
        Some((table, field)) if !field.is_empty() => (table, field),
        Some((table, _)) => (table, DEFAULT_REFERENCE_FIELD),
        None => (target, DEFAULT_REFERENCE_FIELD),
    };
    Reference {
        kind,
        table: table.to_string(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
user
----
id pk
username varchar(64)


post
----
id pk
author_id fk >- user.id
content text
status enum('active','pending')


reply
-----
id pk
# column "{table}_id" ends with "fk" will be interpreted as implicitly referencing to
# "{table}.id" with ">-" relationship
post_id fk # e.g. post_id references to post.id
user_id fk
reply_id null fk # it's fine to include other modifiers in the middle
content text
"#;

    #[test]
    fn test_parse_tables_in_order() {
        let result = parse(EXAMPLE);
        let names: Vec<&str> = result.table_list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["user", "post", "reply"]);

        let reply_fields: Vec<&str> = result.table_list[2]
            .field_list
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            reply_fields,
            vec!["id", "post_id", "user_id", "reply_id", "content"]
        );
    }

    #[test]
    fn test_parse_explicit_reference() {
        let result = parse(EXAMPLE);
        let author = result.table_list[1].field("author_id").unwrap();
        assert_eq!(author.references, Some(Reference::new("user", "id")));
        assert_eq!(author.field_type, None);
    }

    #[test]
    fn test_parse_implicit_reference() {
        let result = parse(EXAMPLE);
        let reply = &result.table_list[2];

        let post_id = reply.field("post_id").unwrap();
        assert_eq!(post_id.references, Some(Reference::new("post", "id")));
        assert_eq!(
            post_id.comment.as_deref(),
            Some("e.g. post_id references to post.id")
        );

        let reply_id = reply.field("reply_id").unwrap();
        assert!(reply_id.is_nullable());
        assert_eq!(reply_id.references, Some(Reference::new("reply", "id")));
    }

    #[test]
    fn test_parse_types() {
        let result = parse(EXAMPLE);
        let post = &result.table_list[1];
        assert_eq!(
            post.field("status").unwrap().field_type.as_deref(),
            Some("enum('active','pending')")
        );
        assert_eq!(
            result.table_list[0].field("username").unwrap().field_type.as_deref(),
            Some("varchar(64)")
        );
        assert!(post.field("id").unwrap().is_primary_key());
    }

    #[test]
    fn test_modifiers_in_any_order() {
        let a = parse_field("price unsigned default 0 null decimal(10,2) pk").unwrap();
        let b = parse_field("price pk decimal(10,2) null unsigned default 0").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.field_type.as_deref(), Some("decimal(10,2)"));
        assert_eq!(a.default_value(), Some("0"));
    }

    #[test]
    fn test_relation_kinds_and_bare_target() {
        let f = parse_field("tag_id fk >-< tag").unwrap();
        assert_eq!(
            f.references,
            Some(Reference {
                kind: RelationKind::ManyToMany,
                table: "tag".into(),
                field: "id".into(),
            })
        );

        let f = parse_field("owner -0 account.uid").unwrap();
        let r = f.references.unwrap();
        assert_eq!(r.kind, RelationKind::OneToZeroOrOne);
        assert_eq!((r.table.as_str(), r.field.as_str()), ("account", "uid"));
    }

    #[test]
    fn test_relation_without_target_falls_back_to_implicit() {
        let f = parse_field("user_id fk >-").unwrap();
        assert_eq!(f.references, Some(Reference::new("user", "id")));
    }

    #[test]
    fn test_multi_word_type() {
        let f = parse_field("ratio double   precision null").unwrap();
        assert_eq!(f.field_type.as_deref(), Some("double precision"));
    }

    #[test]
    fn test_dropped_lines() {
        let input = "orphan int\n# a note\nuser extra words\n---\n----\nid\n\n\nname\n";
        let result = parse(input);
        assert_eq!(result.table_list.len(), 1);
        assert_eq!(result.table_list[0].name, "user");
        let fields: Vec<&str> = result.table_list[0]
            .field_list
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fields, vec!["id", "name"]);
    }

    #[test]
    fn test_header_with_comment_between() {
        let result = parse("user\n# owner of posts\n----\nid pk\n");
        assert_eq!(result.table_list[0].name, "user");
        assert_eq!(result.table_list[0].field_list.len(), 1);
    }

    #[test]
    fn test_underline_length_is_not_checked() {
        let result = parse("account\n--\nid\n");
        assert_eq!(result.table_list[0].name, "account");
    }

    #[test]
    fn test_empty_table() {
        let result = parse("user\n----\n\npost\n----\nid\n");
        assert_eq!(result.table_list.len(), 2);
        assert!(result.table_list[0].field_list.is_empty());
    }

    #[test]
    fn test_parse_directives() {
        let input = "user\n----\nid\n\n# zoom: 1.500\n# view: (10, -5)\n# user (100, 200, #abcdef)\n# text-bg: #222222\n# diagram-text: #eeeeee\n# zoom: 2.000\n";
        let result = parse(input);
        assert_eq!(result.zoom, Some(2.0));
        assert_eq!(result.view, Some(Position { x: 10, y: -5 }));
        assert_eq!(
            result.table_positions.get("user"),
            Some(&TablePosition {
                x: 100,
                y: 200,
                color: Some("#abcdef".into())
            })
        );
        assert_eq!(result.text_bg_color.as_deref(), Some("#222222"));
        assert_eq!(result.diagram_text_color.as_deref(), Some("#eeeeee"));
        assert_eq!(result.table_text_color, None);
        assert_eq!(result.table_list[0].field_list.len(), 1);
    }

    #[test]
    fn test_parse_unicode() {
        let result = parse("ユーザー\n--------\n名前 文字列 null\n");
        assert_eq!(result.table_list[0].name, "ユーザー");
        assert_eq!(result.table_list[0].field_list[0].name, "名前");
    }

    #[test]
    fn test_dash_names_are_dropped() {
        let result = parse("user\n----\nid\n\n- users\n-------\nid pk\n");
        let tables: Vec<&str> = result.table_list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tables, vec!["user"]);
        assert_eq!(result.table_list[0].field_list.len(), 1);

        assert!(parse_field("- default").is_none());
        assert!(parse_field("-- int").is_none());
        assert_eq!(parse_field("-x int").unwrap().name, "-x");
    }

    #[test]
    fn test_long_comment_runs() {
        let mut input = String::from("user\n----\n");
        for _ in 0..20_000 {
            input.push_str("# note\n\n");
        }
        input.push_str("id\n");
        let result = parse(&input);
        assert_eq!(result.table_list[0].field_list[0].name, "id");
    }

    #[test]
    fn test_garbage_never_panics() {
        for input in ["", "\n\n", "----", ">- .", "a\n-\nfk >-\n# (", "x\n-\n  default"] {
            let _ = parse(input);
        }
    }
}
