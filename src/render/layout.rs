//! Format-agnostic document outline.
//!
//! Every renderer walks the same outline: a title, then per section a
//! heading followed by blocks. Content-shape decisions (which fields a
//! relationship shows, how schema columns read, what an empty section says)
//! are made here once, so Word, PDF, Excel and text output agree.

use crate::error::{Error, Result};
use crate::model::{
    display_value, Field, Record, ReportSection, SectionContent, SectionKind, Tabular,
};
use serde_json::{Map, Value};

/// A unit of section content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Secondary heading inside a section
    Subheading(String),
    /// Plain paragraph
    Paragraph(String),
    /// `key: value` lines
    Pairs(Vec<(String, String)>),
    /// One record: labelled fields plus an optional code field
    Record(RecordBlock),
    /// Header row plus data rows
    Table(Grid),
    /// Stand-in for an empty section
    Placeholder(String),
    /// Stand-in for a section that failed to render
    Error(String),
}

/// A record resolved against a fixed field layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBlock {
    /// Labelled single-line fields, in layout order
    pub fields: Vec<(String, String)>,
    /// Multi-line code field (M or DAX), rendered verbatim
    pub code: Option<CodeField>,
}

impl RecordBlock {
    /// Field labels, including the code label, in display order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.fields.iter().map(|(l, _)| l.as_str()).collect();
        if let Some(code) = &self.code {
            labels.push(code.label);
        }
        labels
    }
}

/// Labelled code text.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeField {
    /// Label, e.g. "Expression"
    pub label: &'static str,
    /// Full code text with original line breaks
    pub text: String,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Display text
    pub text: String,
    /// Numeric value, for formats with typed cells
    pub number: Option<f64>,
}

impl Cell {
    /// A text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            number: None,
        }
    }

    fn from_value(value: &Value) -> Self {
        Self {
            text: display_value(value),
            number: value.as_f64().filter(|n| n.is_finite()),
        }
    }
}

/// Header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Column names
    pub header: Vec<String>,
    /// Data rows
    pub rows: Vec<Vec<Cell>>,
}

/// A section ready for output.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    /// Section identifier
    pub name: String,
    /// Heading text
    pub title: String,
    /// Content blocks
    pub blocks: Vec<Block>,
}

impl SectionLayout {
    /// Check if this section was replaced by an error note.
    pub fn is_error(&self) -> bool {
        matches!(self.blocks.as_slice(), [Block::Error(_)])
    }
}

/// Lay out every section of a report, in report order.
///
/// Sections that fail are replaced by an error note; the rest are unaffected.
pub fn layout_report(sections: &[ReportSection]) -> Vec<SectionLayout> {
    sections.iter().map(layout_section).collect()
}

/// Lay out one section, replacing its blocks with an error note on failure.
pub fn layout_section(section: &ReportSection) -> SectionLayout {
    let title = section.title();
    let blocks = match section_blocks(section) {
        Ok(blocks) => blocks,
        Err(e) => vec![error_block(&title, &e)],
    };
    SectionLayout {
        name: section.name.clone(),
        title,
        blocks,
    }
}

/// Error note for a section that failed to render.
pub fn error_block(title: &str, err: &Error) -> Block {
    tracing::warn!(section = title, error = %err, "section failed to render");
    let message = match err {
        Error::Render { message, .. } => message.clone(),
        other => other.to_string(),
    };
    Block::Error(format!("Error rendering {}: {}", title, message))
}

/// Blocks for one section.
pub fn section_blocks(section: &ReportSection) -> Result<Vec<Block>> {
    let content = match &section.content {
        Some(content) if !content.is_empty() => content,
        _ => return Ok(vec![Block::Placeholder(section.placeholder())]),
    };

    match content {
        SectionContent::Tabular(tabular) => Ok(vec![Block::Table(grid(&section.name, tabular)?)]),
        SectionContent::Mapping(map) => Ok(vec![Block::Pairs(pairs(map))]),
        SectionContent::Records(records) => match section.kind() {
            Some(SectionKind::Schema) => schema_blocks(&section.name, records),
            kind => Ok(records
                .iter()
                .map(|r| Block::Record(record_block(kind, r)))
                .collect()),
        },
    }
}

fn grid(section: &str, tabular: &Tabular) -> Result<Grid> {
    if let Some(row) = tabular.first_ragged_row() {
        return Err(Error::render(
            section,
            format!(
                "row {} has {} values but the table has {} columns",
                row + 1,
                tabular.rows[row].len(),
                tabular.column_count()
            ),
        ));
    }
    Ok(Grid {
        header: tabular.columns.clone(),
        rows: tabular
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::from_value).collect())
            .collect(),
    })
}

fn pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(k, v)| (k.clone(), display_value(v)))
        .collect()
}

fn schema_blocks(section: &str, records: &[Record]) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    for record in records {
        let name = record.resolve_text(Field::Name);
        blocks.push(Block::Subheading(format!("Table: {}", name)));

        let columns = match record.resolve(Field::Columns) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(column_line).collect(),
            Some(other) => {
                return Err(Error::render(
                    section,
                    format!(
                        "columns of table '{}' is not a list (found {})",
                        name,
                        json_type(other)
                    ),
                ))
            }
        };

        if columns.is_empty() {
            blocks.push(Block::Paragraph("No columns found for this table.".to_string()));
        } else {
            blocks.push(Block::Paragraph("Columns:".to_string()));
            blocks.push(Block::Table(Grid {
                header: vec!["Column".to_string()],
                rows: columns.into_iter().map(|c| vec![Cell::text(c)]).collect(),
            }));
        }
    }
    Ok(blocks)
}

/// `OrderID (Int64)`
fn column_line(column: &Value) -> String {
    match column {
        Value::Object(obj) => {
            let record = Record::new(obj.clone());
            format!(
                "{} ({})",
                record.resolve_text(Field::Name),
                record.resolve_text(Field::DataType)
            )
        }
        other => display_value(other),
    }
}

fn record_block(kind: Option<SectionKind>, record: &Record) -> RecordBlock {
    let (always, optional, code): (&[Field], &[Field], Option<Field>) = match kind {
        Some(SectionKind::Relationships) => (
            &[
                Field::FromTable,
                Field::FromColumn,
                Field::ToTable,
                Field::ToColumn,
            ],
            &[Field::Cardinality, Field::CrossFilter, Field::IsActive],
            None,
        ),
        Some(SectionKind::PowerQuery) | Some(SectionKind::DaxTables) => {
            (&[Field::Name], &[], Some(Field::Expression))
        }
        Some(SectionKind::DaxMeasures) => (
            &[Field::Name],
            &[Field::Table, Field::DisplayFolder],
            Some(Field::Expression),
        ),
        Some(SectionKind::DaxColumns) => {
            (&[Field::Table, Field::Column], &[], Some(Field::Expression))
        }
        Some(SectionKind::MParameters) => (&[Field::Name, Field::Value], &[], None),
        Some(SectionKind::Metadata) | Some(SectionKind::Schema) | None => {
            return RecordBlock {
                fields: pairs(record.as_map()),
                code: None,
            };
        }
    };

    let mut fields: Vec<(String, String)> = always
        .iter()
        .zip(record.resolve_all(always))
        .map(|(field, value)| (field.label().to_string(), resolved_text(value)))
        .collect();

    for (field, value) in optional.iter().zip(record.resolve_all(optional)) {
        if let Some(value) = value {
            fields.push((field.label().to_string(), display_value(value)));
        }
    }

    let code = code.map(|field| CodeField {
        label: field.label(),
        text: record
            .resolve(field)
            .map(code_text)
            .unwrap_or_else(|| crate::model::NOT_AVAILABLE.to_string()),
    });

    RecordBlock { fields, code }
}

fn resolved_text(value: Option<&Value>) -> String {
    value
        .map(display_value)
        .unwrap_or_else(|| crate::model::NOT_AVAILABLE.to_string())
}

/// Code may arrive as one string or as a list of lines.
fn code_text(value: &Value) -> String {
    match value {
        Value::Array(lines) if lines.iter().all(Value::is_string) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        other => display_value(other),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
