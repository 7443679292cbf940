//! Shortest-first search for a foreign key route from a base table to the
//! table of a selected column.

use super::graph::{Edge, ReferenceGraph};
use super::Column;
use crate::ast::Table;
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

/// How a step's `ref_field` leads to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// `ref_field` is declared on this step's table and points at the next.
    #[default]
    Forward,
    /// `ref_field` is declared on the next step's table and points back here.
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub table_name: String,
    pub ref_field: Option<String>,
    pub direction: Direction,
}

impl PathStep {
    fn end(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            ref_field: None,
            direction: Direction::Forward,
        }
    }
}

/// Walk from the base table to a target table; empty when unreachable.
pub type TablePath = Vec<PathStep>;

/// Find the route from `base` to `target.table`.
///
/// Foreign keys are followed in declaration order and the first route found
/// wins. Only when no route exists along foreign keys is the search repeated
/// allowing hops against them (from a table to one that references it).
/// Each table is expanded at most once per search, so cyclic schemas
/// terminate.
pub fn find_path(
    base: &Table,
    target: &Column,
    columns: &[Column],
    graph: &ReferenceGraph<'_>,
) -> TablePath {
    let Some(start) = graph.index(&base.name) else {
        return Vec::new();
    };
    let forward = Search::new(graph, target, columns, false).run(start);
    if !forward.is_empty() {
        return forward;
    }
    Search::new(graph, target, columns, true).run(start)
}

struct Search<'g, 'a> {
    graph: &'g ReferenceGraph<'a>,
    target: &'g Column,
    columns: &'g [Column],
    allow_reverse: bool,
    visited: HashSet<NodeIndex>,
}

impl<'g, 'a> Search<'g, 'a> {
    fn new(
        graph: &'g ReferenceGraph<'a>,
        target: &'g Column,
        columns: &'g [Column],
        allow_reverse: bool,
    ) -> Self {
        Self {
            graph,
            target,
            columns,
            allow_reverse,
            visited: HashSet::new(),
        }
    }

    fn run(mut self, start: NodeIndex) -> TablePath {
        let mut path = Vec::new();
        if self.visit(start, &mut path) {
            path
        } else {
            Vec::new()
        }
    }

    fn visit(&mut self, idx: NodeIndex, path: &mut TablePath) -> bool {
        let table = self.graph.node(idx);
        if table.name == self.target.table {
            path.push(PathStep::end(&table.name));
            return true;
        }
        if !self.visited.insert(idx) {
            return false;
        }

        let graph = self.graph;
        for edge in graph.edges(idx, petgraph::Direction::Outgoing) {
            let Some(field) = preferred_ref_field(&edge, self.columns, graph) else {
                continue;
            };
            if self.step(table, edge.node, field, Direction::Forward, path) {
                return true;
            }
        }

        if self.allow_reverse {
            for edge in graph.edges(idx, petgraph::Direction::Incoming) {
                let Some(field) = edge.fields.first() else {
                    continue;
                };
                if self.step(table, edge.node, field, Direction::Reverse, path) {
                    return true;
                }
            }
        }

        false
    }

    fn step(
        &mut self,
        from: &Table,
        next: NodeIndex,
        field: &str,
        direction: Direction,
        path: &mut TablePath,
    ) -> bool {
        path.push(PathStep {
            table_name: from.name.clone(),
            ref_field: Some(field.to_string()),
            direction,
        });
        if self.visit(next, path) {
            return true;
        }
        path.pop();
        false
    }
}

/// Pick which of several fields referencing the same table to walk through.
///
/// A field whose name is also selected as a column on some table that
/// references the same target wins, so the join reuses the relation the
/// selection already implies. Otherwise the first declared field is used.
pub fn preferred_ref_field<'a>(
    edge: &Edge<'a>,
    columns: &[Column],
    graph: &ReferenceGraph<'a>,
) -> Option<&'a str> {
    let referrers = graph.referrers(edge.table);
    edge.fields
        .iter()
        .copied()
        .find(|name| {
            columns
                .iter()
                .any(|c| c.field == *name && referrers.contains(&c.table.as_str()))
        })
        .or_else(|| edge.fields.first().copied())
}
