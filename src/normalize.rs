//! Extract a repeated field into its own table.

use crate::ast::{Field, FieldModifier, Reference, Table};
use crate::parser::parse;
use crate::serializer::serialize;
use tracing::debug;

/// Replace `field` in every table other than `table` with a foreign key
/// `{table}_id` pointing at `table.id`, creating `table` (with `id pk` and
/// `field`) when it does not exist yet. Nullability of the replaced field
/// carries over to the foreign key. Directives are kept. The result is
/// canonical text.
pub fn normalize(text: &str, field: &str, table: &str) -> String {
    let field = field.trim();
    let table = match table.trim() {
        "" => field,
        t => t,
    };
    if field.is_empty() {
        return text.to_string();
    }

    let mut result = parse(text);
    let fk_name = format!("{}_id", table);
    let mut extracted: Option<Field> = None;
    let mut replaced = 0usize;

    for current in result.table_list.iter_mut().filter(|t| t.name != table) {
        let Some(slot) = current.field_list.iter_mut().find(|f| f.name == field) else {
            continue;
        };

        let mut fk = Field::new(fk_name.as_str());
        if slot.is_nullable() {
            fk.add_modifier(FieldModifier::Null);
        }
        fk.references = Some(Reference::new(table, "id"));

        let original = std::mem::replace(slot, fk);
        if extracted.is_none() {
            extracted = Some(original);
        }
        replaced += 1;
    }

    if result.table(table).is_none() {
        let mut id = Field::new("id");
        id.add_modifier(FieldModifier::Pk);

        let mut value = Field::new(field);
        value.field_type = extracted.and_then(|f| f.field_type);

        result.table_list.push(Table {
            name: table.to_string(),
            field_list: vec![id, value],
        });
    }

    debug!(field, table, replaced, "normalized field into table");
    serialize(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_creates_table() {
        let input = "user\n----\nid pk\ncountry varchar(32)\n\nshop\n----\nid pk\ncountry varchar(32) null\n\n# zoom: 1.000\n";
        insta::assert_snapshot!(normalize(input, "country", ""), @r"
        user
        ----
        id pk
        country_id fk

        shop
        ----
        id pk
        country_id null fk

        country
        -------
        id pk
        country varchar(32)

        # zoom: 1.000
        ");
    }

    #[test]
    fn test_normalize_into_existing_table() {
        let input = "user\n----\nid\ncity text\n\nlocation\n--------\nid pk\nname text\n";
        assert_eq!(
            normalize(input, "city", "location"),
            "user\n----\nid\nlocation_id fk\n\nlocation\n--------\nid pk\nname text\n"
        );
    }

    #[test]
    fn test_normalize_empty_field_is_noop() {
        let input = "user\n--\nid\n";
        assert_eq!(normalize(input, "  ", "x"), input);
    }

    #[test]
    fn test_normalize_unknown_field_still_adds_table() {
        let out = normalize("user\n----\nid\n", "tag", "");
        assert_eq!(out, "user\n----\nid\n\ntag\n---\nid pk\ntag\n");
    }
}
