use super::graph::ReferenceGraph;
use super::path::{find_path, Direction, TablePath};
use super::{find_column_index, Column};
use crate::ast::{strip_id_suffix, Table};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Build a `select ... from ... inner join ...` statement for `columns`.
///
/// The first column's table is the base. Columns whose table cannot be
/// reached from the base are left out of the select list.
///
/// ```
/// use erdsketch::parser::parse;
/// use erdsketch::query::{generate_query, Column};
///
/// let schema = parse("user\n----\nid\n\npost\n----\nid\nauthor_id fk >- user.id\ncontent text\n");
/// let sql = generate_query(
///     &[Column::new("post", "content"), Column::new("user", "id")],
///     &schema.table_list,
/// );
/// assert_eq!(
///     sql,
///     "select\n  post.content\n, author.id\nfrom post\ninner join user as author on author.id = post.author_id"
/// );
/// ```
pub fn generate_query(columns: &[Column], table_list: &[Table]) -> String {
    let first = match columns {
        [] => return String::new(),
        [only] => return format!("select {} from {}", only.field, only.table),
        [first, ..] => first,
    };

    let graph = ReferenceGraph::new(table_list);
    let Some(base) = graph.table(&first.table) else {
        warn!(table = %first.table, "base table not found, no query generated");
        return String::new();
    };

    let mut routed: Vec<(&Column, TablePath)> = columns
        .iter()
        .map(|column| (column, find_path(base, column, columns, &graph)))
        .collect();
    // stable: ties keep selection order
    routed.sort_by_key(|(_, path)| path.len());

    let mut aliases = Aliases::new(&base.name);
    let mut select = String::new();
    let mut from = format!("from {}", base.name);

    for (column, path) in &routed {
        debug!(column = %column, hops = path.len(), "resolved column path");
        if path.is_empty() {
            debug!(column = %column, "no route from base table, column skipped");
            continue;
        }

        let mut prev_alias = base.name.clone();
        for pair in path.windows(2) {
            let (prev, step) = (&pair[0], &pair[1]);
            let Some(ref_field) = prev.ref_field.as_deref() else {
                continue;
            };
            let table_name = &step.table_name;
            let (current, fresh) =
                aliases.resolve(&prev_alias, ref_field, prev.direction, table_name);

            if fresh {
                from.push_str("\ninner join ");
                from.push_str(table_name);
                if *table_name != current {
                    from.push_str(" as ");
                    from.push_str(&current);
                }
                let condition = match prev.direction {
                    Direction::Forward => format!(
                        " on {}.{} = {}.{}",
                        current,
                        graph.target_field(&prev.table_name, ref_field),
                        prev_alias,
                        ref_field
                    ),
                    Direction::Reverse => format!(
                        " on {}.{} = {}.{}",
                        current,
                        ref_field,
                        prev_alias,
                        graph.target_field(table_name, ref_field)
                    ),
                };
                from.push_str(&condition);
            }
            prev_alias = current;
        }

        select.push_str(if select.is_empty() { "\n  " } else { "\n, " });
        select.push_str(&prev_alias);
        select.push('.');
        select.push_str(&column.field);
    }

    format!("select{}\n{}", select, from)
}

/// Names the tables of one query are known by.
///
/// A table reached through a foreign key takes the key's name without `_id`,
/// so two relations to the same table get distinct aliases. A table reached
/// against a foreign key keeps its own name. When the wanted alias already
/// stands for another join, the table name is tried, then a numbered alias.
struct Aliases {
    /// (alias joined from, foreign key, direction) -> alias of the joined table
    hops: HashMap<(String, String, Direction), String>,
    /// alias -> table it stands for
    bound: HashMap<String, String>,
}

impl Aliases {
    fn new(base: &str) -> Self {
        Self {
            hops: HashMap::new(),
            bound: HashMap::from([(base.to_string(), base.to_string())]),
        }
    }

    /// Alias for `table` reached from `prev` through `ref_field`, and whether
    /// this hop still needs its join.
    fn resolve(
        &mut self,
        prev: &str,
        ref_field: &str,
        direction: Direction,
        table: &str,
    ) -> (String, bool) {
        let key = (prev.to_string(), ref_field.to_string(), direction);
        if let Some(alias) = self.hops.get(&key) {
            return (alias.clone(), false);
        }

        let wanted = match direction {
            Direction::Forward => strip_id_suffix(ref_field),
            Direction::Reverse => table,
        };
        let alias = self.free_alias(wanted, table);
        self.bound.insert(alias.clone(), table.to_string());
        self.hops.insert(key, alias.clone());
        (alias, true)
    }

    fn free_alias(&self, wanted: &str, table: &str) -> String {
        if let Some(alias) = [wanted, table].into_iter().find(|a| !self.bound.contains_key(*a)) {
            return alias.to_string();
        }
        let mut n = 2;
        loop {
            let alias = format!("{wanted}_{n}");
            if !self.bound.contains_key(&alias) {
                debug!(table, alias = %alias, "numbered alias for repeated relation");
                return alias;
            }
            n += 1;
        }
    }
}

/// Current column selection, in the order columns were picked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    columns: Vec<Column>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn add_column(&mut self, table: &str, field: &str) {
        self.columns.push(Column::new(table, field));
    }

    /// Remove the first matching column; returns whether one was removed.
    pub fn remove_column(&mut self, table: &str, field: &str) -> bool {
        match find_column_index(&self.columns, table, field) {
            Some(idx) => {
                self.columns.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn has_column(&self, table: &str, field: &str) -> bool {
        find_column_index(&self.columns, table, field).is_some()
    }

    pub fn generate(&self, table_list: &[Table]) -> String {
        generate_query(&self.columns, table_list)
    }
}
