//! Section content variants.

use super::{Field, NOT_AVAILABLE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized content of a report section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SectionContent {
    /// Key/value pairs (e.g. file metadata)
    Mapping(Map<String, Value>),
    /// An ordered sequence of records (tables, measures, ...)
    Records(Vec<Record>),
    /// Rows by named columns
    Tabular(Tabular),
}

impl SectionContent {
    /// Number of entries (pairs, records or rows).
    pub fn len(&self) -> usize {
        match self {
            SectionContent::Mapping(map) => map.len(),
            SectionContent::Records(records) => records.len(),
            SectionContent::Tabular(table) => table.row_count(),
        }
    }

    /// Check if the content holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the variant.
    pub fn variant_name(&self) -> &'static str {
        match self {
            SectionContent::Mapping(_) => "mapping",
            SectionContent::Records(_) => "records",
            SectionContent::Tabular(_) => "tabular",
        }
    }
}

/// A single entry within a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create a record from a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Create a record from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Get a value by its literal key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolve a logical field: the first candidate key holding a non-null value.
    pub fn resolve(&self, field: Field) -> Option<&Value> {
        field
            .candidates()
            .iter()
            .find_map(|key| self.0.get(*key).filter(|v| !v.is_null()))
    }

    /// Resolve a logical field to display text, or the `N/A` sentinel.
    pub fn resolve_text(&self, field: Field) -> String {
        self.resolve(field)
            .map(display_value)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Resolve several fields at once.
    pub fn resolve_all(&self, fields: &[Field]) -> Vec<Option<&Value>> {
        fields.iter().map(|f| self.resolve(*f)).collect()
    }

    /// Iterate over literal keys and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Tabular data: rows by named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tabular {
    /// Column names
    pub columns: Vec<String>,
    /// Row values, one inner vector per row
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl Tabular {
    /// Create a table from columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first row whose width differs from the header, if any.
    pub fn first_ragged_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.len() != self.columns.len())
    }

    /// View each row as a record keyed by column name.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(|row| {
            Record(
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect(),
            )
        })
    }
}

/// Render a JSON value as display text.
///
/// Strings are shown verbatim, `null` as `N/A`, nested values as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_legacy_spelling() {
        let legacy = Record::from_pairs([("From Table", "Sales")]);
        let snake = Record::from_pairs([("from_table", "Sales")]);
        assert_eq!(legacy.resolve_text(Field::FromTable), "Sales");
        assert_eq!(
            legacy.resolve_text(Field::FromTable),
            snake.resolve_text(Field::FromTable)
        );
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let record = Record::from_pairs([("Name", "second"), ("name", "first")]);
        assert_eq!(record.resolve_text(Field::Name), "first");
    }

    #[test]
    fn test_resolve_skips_null() {
        let record = Record::new(
            json!({"name": null, "TableName": "Sales"})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert_eq!(record.resolve_text(Field::Name), "Sales");
    }

    #[test]
    fn test_resolve_missing_is_sentinel() {
        let record = Record::from_pairs([("unrelated", 1)]);
        assert_eq!(record.resolve_text(Field::Expression), "N/A");
        assert!(record.resolve(Field::Expression).is_none());
    }

    #[test]
    fn test_resolve_all_order() {
        let record = Record::from_pairs([("ToTableName", "Product"), ("FromTableName", "Sales")]);
        let values = record.resolve_all(&[Field::FromTable, Field::ToTable, Field::Cardinality]);
        assert_eq!(values[0], Some(&json!("Sales")));
        assert_eq!(values[1], Some(&json!("Product")));
        assert_eq!(values[2], None);
    }

    #[test]
    fn test_tabular_records() {
        let table = Tabular::new(
            vec!["TableName".into(), "Expression".into()],
            vec![vec![json!("Sales"), json!("let x = 1 in x")]],
        );
        let records: Vec<Record> = table.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resolve_text(Field::Name), "Sales");
        assert_eq!(records[0].resolve_text(Field::Expression), "let x = 1 in x");
    }

    #[test]
    fn test_ragged_row_detection() {
        let table = Tabular::new(
            vec!["a".into(), "b".into()],
            vec![vec![json!(1), json!(2)], vec![json!(3)]],
        );
        assert_eq!(table.first_ragged_row(), Some(1));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("text")), "text");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "N/A");
        assert_eq!(display_value(&json!(["a", 1])), r#"["a",1]"#);
    }

    #[test]
    fn test_content_len() {
        let mapping = SectionContent::Mapping(json!({"a": 1, "b": 2}).as_object().unwrap().clone());
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.variant_name(), "mapping");
        assert!(SectionContent::Records(vec![]).is_empty());
    }
}
