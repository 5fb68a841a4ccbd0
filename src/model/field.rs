//! Field-resolution table.
//!
//! The same logical field shows up under different literal keys depending on
//! which analyzer (and which version of it) produced a record: `fromTable`,
//! `from_table`, `From Table`, `FromTableName`. Each [`Field`] carries the
//! ordered list of spellings to probe; the first one present wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel substituted when no candidate key is present.
pub const NOT_AVAILABLE: &str = "N/A";

/// A logical record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Table,
    Column,
    Expression,
    Value,
    DataType,
    Columns,
    FromTable,
    FromColumn,
    ToTable,
    ToColumn,
    Cardinality,
    CrossFilter,
    IsActive,
    DisplayFolder,
    Description,
}

impl Field {
    /// Every logical field, in declaration order.
    pub const ALL: [Field; 16] = [
        Field::Name,
        Field::Table,
        Field::Column,
        Field::Expression,
        Field::Value,
        Field::DataType,
        Field::Columns,
        Field::FromTable,
        Field::FromColumn,
        Field::ToTable,
        Field::ToColumn,
        Field::Cardinality,
        Field::CrossFilter,
        Field::IsActive,
        Field::DisplayFolder,
        Field::Description,
    ];

    /// Literal keys to probe, in priority order.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Field::Name => &[
                "name",
                "Name",
                "NAME",
                "ParameterName",
                "parameter_name",
                "Parameter Name",
                "TableName",
                "table_name",
                "Table Name",
            ],
            Field::Table => &["table", "Table", "tableName", "TableName", "table_name", "Table Name"],
            Field::Column => &[
                "column",
                "Column",
                "columnName",
                "ColumnName",
                "column_name",
                "Column Name",
            ],
            Field::Expression => &["expression", "Expression", "EXPRESSION", "formula", "Formula"],
            Field::Value => &[
                "value",
                "Value",
                "currentValue",
                "CurrentValue",
                "expression",
                "Expression",
            ],
            Field::DataType => &[
                "dataType",
                "data_type",
                "DataType",
                "Data Type",
                "PandasDataType",
                "type",
                "Type",
            ],
            Field::Columns => &["columns", "Columns"],
            Field::FromTable => &[
                "fromTable",
                "from_table",
                "FromTable",
                "From Table",
                "FromTableName",
                "from_table_name",
            ],
            Field::FromColumn => &[
                "fromColumn",
                "from_column",
                "FromColumn",
                "From Column",
                "FromColumnName",
                "from_column_name",
            ],
            Field::ToTable => &[
                "toTable",
                "to_table",
                "ToTable",
                "To Table",
                "ToTableName",
                "to_table_name",
            ],
            Field::ToColumn => &[
                "toColumn",
                "to_column",
                "ToColumn",
                "To Column",
                "ToColumnName",
                "to_column_name",
            ],
            Field::Cardinality => &["cardinality", "Cardinality"],
            Field::CrossFilter => &[
                "crossFilteringBehavior",
                "cross_filtering_behavior",
                "CrossFilteringBehavior",
                "Cross Filtering Behavior",
                "crossFilter",
                "cross_filter",
            ],
            Field::IsActive => &["isActive", "is_active", "IsActive", "Is Active", "active", "Active"],
            Field::DisplayFolder => &[
                "displayFolder",
                "display_folder",
                "DisplayFolder",
                "Display Folder",
            ],
            Field::Description => &["description", "Description"],
        }
    }

    /// Logical name (snake_case).
    pub fn name(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Table => "table",
            Field::Column => "column",
            Field::Expression => "expression",
            Field::Value => "value",
            Field::DataType => "data_type",
            Field::Columns => "columns",
            Field::FromTable => "from_table",
            Field::FromColumn => "from_column",
            Field::ToTable => "to_table",
            Field::ToColumn => "to_column",
            Field::Cardinality => "cardinality",
            Field::CrossFilter => "cross_filter",
            Field::IsActive => "is_active",
            Field::DisplayFolder => "display_folder",
            Field::Description => "description",
        }
    }

    /// Human-readable label used in rendered documents.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Table => "Table",
            Field::Column => "Column",
            Field::Expression => "Expression",
            Field::Value => "Value",
            Field::DataType => "Data Type",
            Field::Columns => "Columns",
            Field::FromTable => "From Table",
            Field::FromColumn => "From Column",
            Field::ToTable => "To Table",
            Field::ToColumn => "To Column",
            Field::Cardinality => "Cardinality",
            Field::CrossFilter => "Cross Filter",
            Field::IsActive => "Active",
            Field::DisplayFolder => "Display Folder",
            Field::Description => "Description",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses a logical field name. Case, underscores and spaces are ignored,
/// so `from_table`, `fromTable` and `From Table` all name the same field.
impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name().replace('_', "") == folded)
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_logical_names() {
        assert_eq!("from_table".parse::<Field>().unwrap(), Field::FromTable);
        assert_eq!("fromTable".parse::<Field>().unwrap(), Field::FromTable);
        assert_eq!("From Table".parse::<Field>().unwrap(), Field::FromTable);
        assert_eq!("DATA_TYPE".parse::<Field>().unwrap(), Field::DataType);
        assert!("colour".parse::<Field>().is_err());
    }

    #[test]
    fn test_names_roundtrip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn test_candidates_are_unique_per_field() {
        for field in Field::ALL {
            let keys = field.candidates();
            for (i, key) in keys.iter().enumerate() {
                assert!(!keys[i + 1..].contains(key), "{} repeats {}", field, key);
            }
        }
    }

    #[test]
    fn test_name_prefers_name_over_table_name() {
        let keys = Field::Name.candidates();
        let name = keys.iter().position(|k| *k == "Name").unwrap();
        let table = keys.iter().position(|k| *k == "TableName").unwrap();
        assert!(name < table);
    }
}
