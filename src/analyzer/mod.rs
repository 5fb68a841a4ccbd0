//! Analyzer contract and backends.
//!
//! An [`Analyzer`] is the external collaborator that understands a Power BI
//! file. It exposes one accessor per section, and any accessor may fail or be
//! missing entirely depending on the backend. Results come back as
//! [`RawContent`] in whatever shape the backend produced; the extraction
//! adapter normalizes them.
//!
//! Backends:
//!
//! - [`PackageAnalyzer`]: reads the Power BI ZIP package directly
//! - [`SnapshotAnalyzer`]: reads a JSON dump of an analyzer run
//! - [`CommandBackend`]: runs an external analyzer program on a file path
//! - [`AutoBackend`]: picks the package or snapshot analyzer by content

mod command;
mod package;
mod snapshot;
mod tabular_model;

pub use command::CommandBackend;
pub use package::PackageAnalyzer;
pub use snapshot::SnapshotAnalyzer;

use crate::detect::{detect_input, InputKind};
use crate::error::Result;
use crate::model::SectionKind;
use serde_json::Value;
use std::path::Path;

/// Shape-preserving result of a single accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    /// Any JSON value: object, array or scalar
    Json(Value),
    /// A tabular result
    Frame(Frame),
}

/// Tabular analyzer output (columns × rows).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Column names
    pub columns: Vec<String>,
    /// Row values
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Create an empty frame with the given columns.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// Check if the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Interpret a split-oriented JSON frame: `{"columns": [...], "data": [[...]]}`.
    ///
    /// An optional `"index"` key is accepted and ignored. Any other key, or a
    /// column list that is not all strings, means the value is not a frame.
    pub fn from_split_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.keys().any(|k| !matches!(k.as_str(), "columns" | "data" | "index")) {
            return None;
        }

        let columns = obj
            .get("columns")?
            .as_array()?
            .iter()
            .map(|c| c.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()?;

        let rows = obj
            .get("data")?
            .as_array()?
            .iter()
            .map(|row| row.as_array().cloned())
            .collect::<Option<Vec<_>>>()?;

        Some(Self { columns, rows })
    }
}

impl From<Frame> for RawContent {
    fn from(frame: Frame) -> Self {
        RawContent::Frame(frame)
    }
}

impl From<Value> for RawContent {
    fn from(value: Value) -> Self {
        RawContent::Json(value)
    }
}

/// Why an accessor produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The analyzer does not provide this attribute.
    #[error("attribute '{0}' is not provided by this analyzer")]
    Missing(String),

    /// The accessor raised.
    #[error("{0}")]
    Failed(String),
}

/// Result of a single accessor.
pub type AccessResult = std::result::Result<RawContent, AccessError>;

/// A parsed Power BI file with one accessor per section.
///
/// Every accessor defaults to [`AccessError::Missing`], so a backend only
/// implements what it can actually provide.
pub trait Analyzer {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// File-level metadata.
    fn metadata(&self) -> AccessResult {
        Err(AccessError::Missing("metadata".into()))
    }

    /// Tables with their columns.
    fn schema(&self) -> AccessResult {
        Err(AccessError::Missing("schema".into()))
    }

    /// Relationships between tables.
    fn relationships(&self) -> AccessResult {
        Err(AccessError::Missing("relationships".into()))
    }

    /// Power Query (M) source per table.
    fn power_query(&self) -> AccessResult {
        Err(AccessError::Missing("power_query".into()))
    }

    /// M parameters.
    fn m_parameters(&self) -> AccessResult {
        Err(AccessError::Missing("m_parameters".into()))
    }

    /// DAX calculated tables.
    fn dax_tables(&self) -> AccessResult {
        Err(AccessError::Missing("dax_tables".into()))
    }

    /// DAX measures.
    fn dax_measures(&self) -> AccessResult {
        Err(AccessError::Missing("dax_measures".into()))
    }

    /// DAX calculated columns.
    fn dax_columns(&self) -> AccessResult {
        Err(AccessError::Missing("dax_columns".into()))
    }
}

/// Call the accessor for a section kind.
pub fn read_section(analyzer: &dyn Analyzer, kind: SectionKind) -> AccessResult {
    match kind {
        SectionKind::Metadata => analyzer.metadata(),
        SectionKind::Schema => analyzer.schema(),
        SectionKind::Relationships => analyzer.relationships(),
        SectionKind::PowerQuery => analyzer.power_query(),
        SectionKind::MParameters => analyzer.m_parameters(),
        SectionKind::DaxTables => analyzer.dax_tables(),
        SectionKind::DaxMeasures => analyzer.dax_measures(),
        SectionKind::DaxColumns => analyzer.dax_columns(),
    }
}

/// Where a backend reads the upload from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// In-memory content
    Bytes(&'a [u8]),
    /// A file on disk
    Path(&'a Path),
}

/// How a backend wants its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Accepts in-memory bytes
    #[default]
    Bytes,
    /// Needs a file path
    Path,
}

/// Opens analyzers.
pub trait Backend {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Input the backend needs.
    fn input_mode(&self) -> InputMode {
        InputMode::Bytes
    }

    /// Open an analyzer. Fails only when the file cannot be opened at all.
    fn open(&self, source: Source<'_>) -> Result<Box<dyn Analyzer>>;
}

/// Picks the package or snapshot analyzer from the content itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoBackend;

impl Backend for AutoBackend {
    fn name(&self) -> &str {
        "auto"
    }

    fn open(&self, source: Source<'_>) -> Result<Box<dyn Analyzer>> {
        let owned;
        let data = match source {
            Source::Bytes(data) => data,
            Source::Path(path) => {
                owned = std::fs::read(path)?;
                owned.as_slice()
            }
        };

        match detect_input(data)? {
            InputKind::Report | InputKind::Template => {
                Ok(Box::new(PackageAnalyzer::from_bytes(data.to_vec())?))
            }
            InputKind::Snapshot => Ok(Box::new(SnapshotAnalyzer::from_bytes(data)?)),
        }
    }
}
