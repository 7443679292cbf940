//! JSON snapshot of an editor session, as produced by the export dialog.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The schema text, directives included.
    pub input: String,
}

impl Snapshot {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Unknown keys (older exports carried editor preferences) are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_import() {
        let snapshot = Snapshot::new("user\n----\nid\n\n# zoom: 1.000\n");
        let json = snapshot.to_json(false).unwrap();
        assert_eq!(json, r##"{"input":"user\n----\nid\n\n# zoom: 1.000\n"}"##);
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_import_ignores_extra_keys() {
        let snapshot = Snapshot::from_json(r#"{"input":"a\n-\n","zoom":"1.2","input_width":"300px"}"#).unwrap();
        assert_eq!(snapshot.input, "a\n-\n");
    }

    #[test]
    fn test_import_rejects_missing_input() {
        let err = Snapshot::from_json(r#"{"zoom":1}"#).unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
        assert!(err.to_string().starts_with("Invalid snapshot JSON"));
    }
}
