//! Analyzer over a JSON snapshot of an analyzer run.
//!
//! A snapshot is a JSON object keyed by section name. Values keep whatever
//! shape the producing library returned; split-oriented frames
//! (`{"columns": [...], "data": [[...]]}`) are recognized as tables. Accessor
//! failures recorded by the producer live under `"_errors"`:
//!
//! ```json
//! {
//!   "metadata": {"version": "1.28"},
//!   "relationships": null,
//!   "_errors": {"relationships": "AttributeError: no attribute 'relationships'"}
//! }
//! ```

use super::{AccessError, AccessResult, Analyzer, Frame, RawContent};
use crate::detect::strip_utf8_bom;
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Key holding per-section failures.
const ERRORS_KEY: &str = "_errors";

/// Analyzer reading a snapshot document.
#[derive(Debug, Clone)]
pub struct SnapshotAnalyzer {
    sections: Map<String, Value>,
    errors: Map<String, Value>,
}

impl SnapshotAnalyzer {
    /// Parse a snapshot from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(strip_utf8_bom(data))
            .map_err(|e| Error::FileFormat(format!("invalid snapshot JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Build from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut sections) = value else {
            return Err(Error::FileFormat(
                "snapshot must be a JSON object keyed by section".to_string(),
            ));
        };

        let errors = match sections.remove(ERRORS_KEY) {
            Some(Value::Object(errors)) => errors,
            _ => Map::new(),
        };

        Ok(Self { sections, errors })
    }

    fn section(&self, name: &str) -> AccessResult {
        if let Some(error) = self.errors.get(name) {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(AccessError::Failed(message));
        }

        let value = self
            .sections
            .get(name)
            .ok_or_else(|| AccessError::Missing(name.to_string()))?;

        Ok(match Frame::from_split_json(value) {
            Some(frame) => RawContent::Frame(frame),
            None => RawContent::Json(value.clone()),
        })
    }
}

impl Analyzer for SnapshotAnalyzer {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn metadata(&self) -> AccessResult {
        self.section("metadata")
    }

    fn schema(&self) -> AccessResult {
        self.section("schema")
    }

    fn relationships(&self) -> AccessResult {
        self.section("relationships")
    }

    fn power_query(&self) -> AccessResult {
        self.section("power_query")
    }

    fn m_parameters(&self) -> AccessResult {
        self.section("m_parameters")
    }

    fn dax_tables(&self) -> AccessResult {
        self.section("dax_tables")
    }

    fn dax_measures(&self) -> AccessResult {
        self.section("dax_measures")
    }

    fn dax_columns(&self) -> AccessResult {
        self.section("dax_columns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "metadata": {"version": "1.28", "culture": "en-US"},
        "schema": [{"name": "Sales", "columns": [{"name": "OrderID", "dataType": "Int64"}]}],
        "dax_measures": {"columns": ["TableName", "Name", "Expression"],
                         "data": [["Sales", "Total", "SUM(Sales[Amount])"]]},
        "relationships": null,
        "_errors": {"relationships": "AttributeError: 'PBIXRay' object has no attribute 'relationships'"}
    }"#;

    #[test]
    fn test_sections_keep_shape() {
        let analyzer = SnapshotAnalyzer::from_bytes(SNAPSHOT.as_bytes()).unwrap();
        assert!(matches!(analyzer.metadata(), Ok(RawContent::Json(Value::Object(_)))));
        assert!(matches!(analyzer.schema(), Ok(RawContent::Json(Value::Array(_)))));
        assert!(matches!(analyzer.dax_measures(), Ok(RawContent::Frame(_))));
    }

    #[test]
    fn test_recorded_failure() {
        let analyzer = SnapshotAnalyzer::from_bytes(SNAPSHOT.as_bytes()).unwrap();
        let err = analyzer.relationships().unwrap_err();
        assert!(matches!(err, AccessError::Failed(msg) if msg.starts_with("AttributeError")));
    }

    #[test]
    fn test_missing_section() {
        let analyzer = SnapshotAnalyzer::from_bytes(SNAPSHOT.as_bytes()).unwrap();
        assert_eq!(
            analyzer.power_query().unwrap_err(),
            AccessError::Missing("power_query".to_string())
        );
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            SnapshotAnalyzer::from_bytes(b"[1, 2, 3]"),
            Err(Error::FileFormat(_))
        ));
        assert!(matches!(
            SnapshotAnalyzer::from_bytes(b"{ truncated"),
            Err(Error::FileFormat(_))
        ));
    }
}
