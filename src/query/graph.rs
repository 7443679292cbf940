//! Foreign key graph built once per query and read-only afterwards.
//!
//! Nodes are declared tables. There is one edge per ordered pair of tables
//! linked by at least one foreign key; its weight lists every field of the
//! source table that references the target.

use crate::ast::{DEFAULT_REFERENCE_FIELD, Table};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::trace;

/// Fields of one table that point at the same other table, in declaration
/// order, as seen from one end of the relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<'a> {
    /// The table at the other end.
    pub node: NodeIndex,
    pub table: &'a str,
    pub fields: Vec<&'a str>,
}

#[derive(Debug, Clone)]
struct Relation<'a> {
    /// Creation order; petgraph iterates adjacency newest first.
    ordinal: usize,
    fields: Vec<&'a str>,
}

#[derive(Debug, Default)]
pub struct ReferenceGraph<'a> {
    graph: DiGraph<&'a Table, Relation<'a>>,
    node_indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> ReferenceGraph<'a> {
    pub fn new(table_list: &'a [Table]) -> Self {
        let mut graph: DiGraph<&'a Table, Relation<'a>> = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut declared = Vec::new();

        for table in table_list {
            // Duplicate names resolve to the first declaration.
            if node_indices.contains_key(table.name.as_str()) {
                trace!(table = %table.name, "duplicate table ignored in reference graph");
                continue;
            }
            let idx = graph.add_node(table);
            node_indices.insert(table.name.as_str(), idx);
            declared.push((table, idx));
        }

        let mut ordinal = 0;
        for (table, from) in declared {
            for field in &table.field_list {
                let Some(reference) = &field.references else {
                    continue;
                };
                let Some(&to) = node_indices.get(reference.table.as_str()) else {
                    trace!(table = %table.name, field = %field.name, target = %reference.table, "reference to undeclared table");
                    continue;
                };
                match graph.find_edge(from, to) {
                    Some(edge) => graph[edge].fields.push(field.name.as_str()),
                    None => {
                        let relation = Relation {
                            ordinal,
                            fields: vec![field.name.as_str()],
                        };
                        graph.add_edge(from, to, relation);
                        ordinal += 1;
                    }
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn index(&self, name: &str) -> Option<NodeIndex> {
        self.node_indices.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &'a Table {
        self.graph[idx]
    }

    pub fn table(&self, name: &str) -> Option<&'a Table> {
        self.index(name).map(|idx| self.node(idx))
    }

    /// Relations at `idx` in `direction`, in the order they were declared.
    pub fn edges(&self, idx: NodeIndex, direction: Direction) -> Vec<Edge<'a>> {
        let mut relations: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        relations.sort_by_key(|e| e.weight().ordinal);
        relations
            .into_iter()
            .map(|e| {
                let node = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                let table: &'a Table = self.graph[node];
                Edge {
                    node,
                    table: table.name.as_str(),
                    fields: e.weight().fields.clone(),
                }
            })
            .collect()
    }

    /// Tables referenced by `name`.
    pub fn outgoing(&self, name: &str) -> Vec<Edge<'a>> {
        self.index(name)
            .map(|idx| self.edges(idx, Direction::Outgoing))
            .unwrap_or_default()
    }

    /// Tables referencing `name`.
    pub fn incoming(&self, name: &str) -> Vec<Edge<'a>> {
        self.index(name)
            .map(|idx| self.edges(idx, Direction::Incoming))
            .unwrap_or_default()
    }

    /// Names of tables with a field referencing `name`, one entry per field.
    pub fn referrers(&self, name: &str) -> Vec<&'a str> {
        self.incoming(name)
            .into_iter()
            .flat_map(|edge| std::iter::repeat_n(edge.table, edge.fields.len()))
            .collect()
    }

    /// Name of the field `referenced_by.via` points at, `id` when unknown.
    pub fn target_field(&self, referenced_by: &str, via: &str) -> &'a str {
        self.table(referenced_by)
            .and_then(|t| t.field(via))
            .and_then(|f| f.references.as_ref())
            .map(|r| r.field.as_str())
            .unwrap_or(DEFAULT_REFERENCE_FIELD)
    }
}
