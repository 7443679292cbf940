//! Join query generation from a selection of columns.

mod builder;
mod graph;
mod path;

pub use builder::{generate_query, QueryBuilder};
pub use graph::{Edge, ReferenceGraph};
pub use path::{find_path, preferred_ref_field, Direction, PathStep, TablePath};

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A selected `table.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub table: String,
    pub field: String,
}

impl Column {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((table, field)) if !table.is_empty() && !field.is_empty() => {
                Ok(Column::new(table, field))
            }
            _ => Err(Error::InvalidColumn(s.to_string())),
        }
    }
}

/// Index of the column matching `table` and `field` exactly.
pub fn find_column_index(columns: &[Column], table: &str, field: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.table == table && c.field == field)
}
