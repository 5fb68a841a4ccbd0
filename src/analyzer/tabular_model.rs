//! Tabular model carried by templates in the `DataModelSchema` part.
//!
//! Only the parts of the model that end up in a report are deserialized.
//! Output shapes follow what analyzer libraries commonly return: the schema
//! as nested records, everything else as frames with PascalCase columns.

use super::{Frame, RawContent};
use crate::error::Result;
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelDocument {
    name: Option<String>,
    compatibility_level: Option<u32>,
    #[serde(default)]
    model: Model,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Model {
    culture: Option<String>,
    #[serde(default)]
    tables: Vec<ModelTable>,
    #[serde(default)]
    relationships: Vec<ModelRelationship>,
    #[serde(default)]
    expressions: Vec<NamedExpression>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelTable {
    name: String,
    #[serde(default)]
    columns: Vec<ModelColumn>,
    #[serde(default)]
    partitions: Vec<Partition>,
    #[serde(default)]
    measures: Vec<Measure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelColumn {
    name: String,
    data_type: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    expression: Option<Expression>,
}

#[derive(Debug, Deserialize)]
struct Partition {
    source: Option<PartitionSource>,
}

#[derive(Debug, Deserialize)]
struct PartitionSource {
    #[serde(rename = "type")]
    kind: Option<String>,
    expression: Option<Expression>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Measure {
    name: String,
    expression: Option<Expression>,
    display_folder: Option<String>,
    description: Option<Expression>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelRelationship {
    from_table: Option<String>,
    from_column: Option<String>,
    to_table: Option<String>,
    to_column: Option<String>,
    is_active: Option<bool>,
    cross_filtering_behavior: Option<String>,
    from_cardinality: Option<String>,
    to_cardinality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedExpression {
    name: String,
    kind: Option<String>,
    expression: Option<Expression>,
    description: Option<Expression>,
}

/// Expressions are stored either as one string or as an array of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expression {
    Text(String),
    Lines(Vec<String>),
}

impl Expression {
    fn text(&self) -> String {
        match self {
            Expression::Text(s) => s.clone(),
            Expression::Lines(lines) => lines.join("\n"),
        }
    }
}

fn expression_value(expr: &Option<Expression>) -> Value {
    expr.as_ref().map(|e| Value::String(e.text())).unwrap_or(Value::Null)
}

fn optional(text: &Option<String>) -> Value {
    text.clone().map(Value::String).unwrap_or(Value::Null)
}

/// Split an M parameter expression into its value when its meta record marks
/// it as a parameter query.
fn parameter_value(expression: &str) -> Option<String> {
    let folded: String = expression
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if !folded.contains("isparameterquery=true") {
        return None;
    }

    let value = expression
        .match_indices("meta")
        .find(|(pos, _)| expression[..*pos].ends_with(char::is_whitespace))
        .map(|(pos, _)| &expression[..pos])
        .unwrap_or(expression);
    Some(value.trim().to_string())
}

fn cardinality_symbol(side: Option<&str>, default: &str) -> &'static str {
    match side.unwrap_or(default) {
        "one" => "1",
        _ => "M",
    }
}

/// Parsed `DataModelSchema`.
#[derive(Debug)]
pub(crate) struct TabularModel {
    document: ModelDocument,
}

impl TabularModel {
    /// Parse the JSON text of a `DataModelSchema` part.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let document: ModelDocument = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
        Ok(Self { document })
    }

    /// Add model-level facts to file metadata.
    pub(crate) fn describe(&self, metadata: &mut Map<String, Value>) {
        let model = &self.document.model;
        if let Some(name) = &self.document.name {
            metadata.insert("model_name".into(), name.clone().into());
        }
        if let Some(level) = self.document.compatibility_level {
            metadata.insert("compatibility_level".into(), level.into());
        }
        if let Some(culture) = &model.culture {
            metadata.insert("culture".into(), culture.clone().into());
        }
        metadata.insert("table_count".into(), model.tables.len().into());
        let measures: usize = model.tables.iter().map(|t| t.measures.len()).sum();
        metadata.insert("measure_count".into(), measures.into());
        metadata.insert("relationship_count".into(), model.relationships.len().into());
    }

    /// Tables as records with nested column lists.
    pub(crate) fn schema(&self) -> RawContent {
        let tables: Vec<Value> = self
            .document
            .model
            .tables
            .iter()
            .map(|table| {
                let columns: Vec<Value> = table
                    .columns
                    .iter()
                    .filter(|c| c.kind.as_deref() != Some("rowNumber"))
                    .map(|c| json!({ "name": c.name, "dataType": optional(&c.data_type) }))
                    .collect();
                json!({ "name": table.name, "columns": columns })
            })
            .collect();
        RawContent::Json(Value::Array(tables))
    }

    pub(crate) fn relationships(&self) -> RawContent {
        let mut frame = Frame::new(&[
            "FromTableName",
            "FromColumnName",
            "ToTableName",
            "ToColumnName",
            "IsActive",
            "Cardinality",
            "CrossFilteringBehavior",
        ]);
        for rel in &self.document.model.relationships {
            let cardinality = format!(
                "{}:{}",
                cardinality_symbol(rel.from_cardinality.as_deref(), "many"),
                cardinality_symbol(rel.to_cardinality.as_deref(), "one"),
            );
            let cross_filter = match rel.cross_filtering_behavior.as_deref() {
                Some("bothDirections") => "Both",
                Some("automatic") => "Automatic",
                _ => "Single",
            };
            frame.push(vec![
                optional(&rel.from_table),
                optional(&rel.from_column),
                optional(&rel.to_table),
                optional(&rel.to_column),
                Value::Bool(rel.is_active.unwrap_or(true)),
                cardinality.into(),
                cross_filter.into(),
            ]);
        }
        frame.into()
    }

    /// M partitions per table, then shared queries that are not parameters.
    pub(crate) fn power_query(&self) -> RawContent {
        let mut frame = Frame::new(&["TableName", "Expression"]);
        for table in &self.document.model.tables {
            for partition in &table.partitions {
                if let Some(source) = &partition.source {
                    if source.kind.as_deref() == Some("m") {
                        frame.push(vec![table.name.clone().into(), expression_value(&source.expression)]);
                    }
                }
            }
        }
        for expr in &self.document.model.expressions {
            let text = expr.expression.as_ref().map(Expression::text).unwrap_or_default();
            let is_m = expr.kind.as_deref().is_none_or(|k| k == "m");
            if is_m && parameter_value(&text).is_none() {
                frame.push(vec![expr.name.clone().into(), text.into()]);
            }
        }
        frame.into()
    }

    pub(crate) fn m_parameters(&self) -> RawContent {
        let mut frame = Frame::new(&["ParameterName", "Description", "Expression"]);
        for expr in &self.document.model.expressions {
            let text = expr.expression.as_ref().map(Expression::text).unwrap_or_default();
            if let Some(value) = parameter_value(&text) {
                frame.push(vec![
                    expr.name.clone().into(),
                    expression_value(&expr.description),
                    value.into(),
                ]);
            }
        }
        frame.into()
    }

    pub(crate) fn dax_tables(&self) -> RawContent {
        let mut frame = Frame::new(&["TableName", "Expression"]);
        for table in &self.document.model.tables {
            for partition in &table.partitions {
                if let Some(source) = &partition.source {
                    if source.kind.as_deref() == Some("calculated") {
                        frame.push(vec![table.name.clone().into(), expression_value(&source.expression)]);
                    }
                }
            }
        }
        frame.into()
    }

    pub(crate) fn dax_measures(&self) -> RawContent {
        let mut frame = Frame::new(&["TableName", "Name", "Expression", "DisplayFolder", "Description"]);
        for table in &self.document.model.tables {
            for measure in &table.measures {
                frame.push(vec![
                    table.name.clone().into(),
                    measure.name.clone().into(),
                    expression_value(&measure.expression),
                    optional(&measure.display_folder),
                    expression_value(&measure.description),
                ]);
            }
        }
        frame.into()
    }

    pub(crate) fn dax_columns(&self) -> RawContent {
        let mut frame = Frame::new(&["TableName", "ColumnName", "Expression"]);
        for table in &self.document.model.tables {
            for column in &table.columns {
                if column.kind.as_deref() == Some("calculated") {
                    frame.push(vec![
                        table.name.clone().into(),
                        column.name.clone().into(),
                        expression_value(&column.expression),
                    ]);
                }
            }
        }
        frame.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "name": "SemanticModel",
        "compatibilityLevel": 1550,
        "model": {
            "culture": "en-US",
            "tables": [
                {
                    "name": "Sales",
                    "columns": [
                        {"name": "OrderID", "dataType": "int64"},
                        {"type": "calculated", "name": "Margin", "dataType": "double",
                         "expression": "Sales[Amount] - Sales[Cost]"},
                        {"type": "rowNumber", "name": "RowNumber-2662979B"}
                    ],
                    "partitions": [
                        {"name": "Sales-1", "source": {"type": "m",
                         "expression": ["let", "    Source = Sql.Database(Server, \"db\")", "in", "    Source"]}}
                    ],
                    "measures": [
                        {"name": "Total Sales", "expression": "SUM(Sales[Amount])", "displayFolder": "KPIs"}
                    ]
                },
                {
                    "name": "Calendar",
                    "columns": [{"name": "Date", "dataType": "dateTime"}],
                    "partitions": [
                        {"name": "Calendar", "source": {"type": "calculated", "expression": "CALENDARAUTO()"}}
                    ]
                }
            ],
            "relationships": [
                {"name": "r1", "fromTable": "Sales", "fromColumn": "OrderDate",
                 "toTable": "Calendar", "toColumn": "Date", "crossFilteringBehavior": "bothDirections"},
                {"name": "r2", "fromTable": "Sales", "fromColumn": "ShipDate",
                 "toTable": "Calendar", "toColumn": "Date", "isActive": false}
            ],
            "expressions": [
                {"name": "Server", "kind": "m",
                 "expression": "\"sql.contoso.com\" meta [IsParameterQuery=true, Type=\"Text\", IsParameterQueryRequired=true]"},
                {"name": "SharedQuery", "kind": "m", "expression": ["let", "    x = 1", "in", "    x"]}
            ]
        }
    }"#;

    fn frame(content: RawContent) -> Frame {
        match content {
            RawContent::Frame(frame) => frame,
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_records() {
        let model = TabularModel::parse(MODEL).unwrap();
        let RawContent::Json(Value::Array(tables)) = model.schema() else {
            panic!("schema should be an array");
        };
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0]["name"], "Sales");
        // Row-number columns are internal
        assert_eq!(tables[0]["columns"].as_array().unwrap().len(), 2);
        assert_eq!(tables[0]["columns"][0]["dataType"], "int64");
    }

    #[test]
    fn test_relationships_frame() {
        let model = TabularModel::parse(MODEL).unwrap();
        let rels = frame(model.relationships());
        assert_eq!(rels.rows.len(), 2);
        assert_eq!(rels.rows[0][0], "Sales");
        assert_eq!(rels.rows[0][4], true);
        assert_eq!(rels.rows[0][5], "M:1");
        assert_eq!(rels.rows[0][6], "Both");
        assert_eq!(rels.rows[1][4], false);
    }

    #[test]
    fn test_power_query_and_parameters() {
        let model = TabularModel::parse(MODEL).unwrap();
        let pq = frame(model.power_query());
        assert_eq!(pq.rows.len(), 2);
        assert_eq!(pq.rows[0][0], "Sales");
        assert!(pq.rows[0][1].as_str().unwrap().contains("Sql.Database"));
        assert_eq!(pq.rows[1][0], "SharedQuery");

        let params = frame(model.m_parameters());
        assert_eq!(params.rows.len(), 1);
        assert_eq!(params.rows[0][0], "Server");
        assert_eq!(params.rows[0][2], "\"sql.contoso.com\"");
    }

    #[test]
    fn test_dax_frames() {
        let model = TabularModel::parse(MODEL).unwrap();
        let tables = frame(model.dax_tables());
        assert_eq!(tables.rows, vec![vec![json!("Calendar"), json!("CALENDARAUTO()")]]);

        let measures = frame(model.dax_measures());
        assert_eq!(measures.rows[0][1], "Total Sales");
        assert_eq!(measures.rows[0][3], "KPIs");
        assert!(measures.rows[0][4].is_null());

        let columns = frame(model.dax_columns());
        assert_eq!(columns.rows[0][1], "Margin");
    }

    #[test]
    fn test_describe() {
        let model = TabularModel::parse(MODEL).unwrap();
        let mut meta = Map::new();
        model.describe(&mut meta);
        assert_eq!(meta["compatibility_level"], 1550);
        assert_eq!(meta["table_count"], 2);
        assert_eq!(meta["measure_count"], 1);
    }

    #[test]
    fn test_parameter_value() {
        assert_eq!(
            parameter_value("42 meta [IsParameterQuery = true]").as_deref(),
            Some("42")
        );
        assert_eq!(parameter_value("let x = 1 in x"), None);
    }
}
