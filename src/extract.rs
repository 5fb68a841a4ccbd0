//! Extraction adapter.
//!
//! Opens an analyzer for the uploaded bytes, reads every requested section
//! independently, and normalizes whatever shape comes back into
//! [`SectionContent`]. A failing accessor only empties its own section; the
//! request fails only when the file cannot be opened at all.
//!
//! # Example
//!
//! ```no_run
//! use pbidoc::extract::{extract, ExtractOptions};
//! use pbidoc::SectionKind;
//!
//! let data = std::fs::read("sales.pbit")?;
//! let options = ExtractOptions::default().with_section(SectionKind::DaxColumns, true);
//! let report = extract(&data, &options)?;
//! println!("{} sections", report.len());
//! # Ok::<(), pbidoc::Error>(())
//! ```

use crate::analyzer::{read_section, Analyzer, AutoBackend, Backend, Frame, InputMode, RawContent, Source};
use crate::error::{Error, Result};
use crate::model::{CanonicalReport, Record, ReportSection, SectionContent, SectionKind, Tabular};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Which sections to extract, and where to spool uploads for path-based analyzers.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    enabled: Vec<SectionKind>,
    scratch_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            enabled: SectionKind::ALL
                .into_iter()
                .filter(|k| *k != SectionKind::DaxColumns)
                .collect(),
            scratch_dir: None,
        }
    }
}

impl ExtractOptions {
    /// Create options with the default section set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable every known section, including calculated columns.
    pub fn all() -> Self {
        Self {
            enabled: SectionKind::ALL.to_vec(),
            scratch_dir: None,
        }
    }

    /// Extract only the given sections.
    pub fn only(kinds: &[SectionKind]) -> Self {
        let mut options = Self {
            enabled: Vec::new(),
            scratch_dir: None,
        };
        for kind in kinds {
            options = options.with_section(*kind, true);
        }
        options
    }

    /// Toggle one section.
    pub fn with_section(mut self, kind: SectionKind, enabled: bool) -> Self {
        self.enabled.retain(|k| *k != kind);
        if enabled {
            self.enabled.push(kind);
        }
        self
    }

    /// Directory for temporary copies of the upload.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Check if a section is enabled.
    pub fn is_enabled(&self, kind: SectionKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Enabled sections in canonical report order.
    pub fn sections(&self) -> impl Iterator<Item = SectionKind> + '_ {
        SectionKind::ALL.into_iter().filter(|k| self.is_enabled(*k))
    }

    /// Temporary directory override.
    pub fn scratch_dir(&self) -> Option<&PathBuf> {
        self.scratch_dir.as_ref()
    }
}

/// Extract a report, detecting the input kind from the content.
pub fn extract(data: &[u8], options: &ExtractOptions) -> Result<CanonicalReport> {
    extract_with(&AutoBackend, data, options)
}

/// Extract a report using a specific backend.
///
/// Backends that need a file path get a temporary copy of the upload, which
/// is removed before this function returns, whatever the outcome.
pub fn extract_with(
    backend: &dyn Backend,
    data: &[u8],
    options: &ExtractOptions,
) -> Result<CanonicalReport> {
    let spool = match backend.input_mode() {
        InputMode::Path => Some(spool_upload(data, options)?),
        InputMode::Bytes => None,
    };
    let source = match &spool {
        Some(file) => Source::Path(file.path()),
        None => Source::Bytes(data),
    };

    let report = backend.open(source).map(|analyzer| {
        tracing::debug!(backend = backend.name(), analyzer = analyzer.name(), "analyzer opened");
        collect_sections(analyzer.as_ref(), options)
    });

    if let Some(file) = spool {
        let path = file.path().to_path_buf();
        if let Err(e) = file.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary upload");
        }
    }

    let report = report?;
    tracing::info!(
        sections = report.len(),
        populated = report.populated_count(),
        "report extracted"
    );
    Ok(report)
}

/// Write the upload to a named temporary file.
fn spool_upload(data: &[u8], options: &ExtractOptions) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pbidoc-").suffix(".pbix");
    let mut file = match options.scratch_dir() {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}

/// Read every enabled section, isolating failures per section.
fn collect_sections(analyzer: &dyn Analyzer, options: &ExtractOptions) -> CanonicalReport {
    let mut builder = CanonicalReport::builder();

    for kind in options.sections() {
        let section = match read_section(analyzer, kind) {
            Ok(raw) => match normalize(raw) {
                Some(content) => {
                    tracing::debug!(
                        section = kind.name(),
                        variant = content.variant_name(),
                        entries = content.len(),
                        "section extracted"
                    );
                    ReportSection::new(kind.name(), content)
                }
                None => ReportSection::absent(kind.name()),
            },
            Err(access) => {
                let err = Error::SectionUnavailable {
                    section: kind.name().to_string(),
                    reason: access.to_string(),
                };
                tracing::warn!(error = %err, "section skipped");
                ReportSection::unavailable(kind.name(), access.to_string())
            }
        };
        builder.push(section);
    }

    builder.build()
}

/// Normalize raw analyzer output into canonical content.
///
/// Returns `None` for anything that carries no data: `null`, empty
/// containers, empty strings and frames without rows.
pub fn normalize(raw: RawContent) -> Option<SectionContent> {
    match raw {
        RawContent::Frame(frame) => normalize_frame(frame),
        RawContent::Json(value) => normalize_json(value),
    }
}

fn normalize_frame(frame: Frame) -> Option<SectionContent> {
    if frame.is_empty() {
        return None;
    }
    Some(SectionContent::Tabular(Tabular::new(frame.columns, frame.rows)))
}

fn normalize_json(value: Value) -> Option<SectionContent> {
    match value {
        Value::Null => None,
        Value::Object(obj) => {
            if let Some(frame) = Frame::from_split_json(&Value::Object(obj.clone())) {
                return normalize_frame(frame);
            }
            if obj.is_empty() {
                None
            } else {
                Some(SectionContent::Mapping(obj))
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                return None;
            }
            let records = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => Record::new(obj),
                    other => Record::from_pairs([("value", other)]),
                })
                .collect();
            Some(SectionContent::Records(records))
        }
        Value::String(s) if s.is_empty() => None,
        scalar => {
            let mut map = Map::new();
            map.insert("value".to_string(), scalar);
            Some(SectionContent::Mapping(map))
        }
    }
}

/// Build a report straight from a JSON object of section name → content.
///
/// Keys keep their order. Frame-shaped values become tables; an optional
/// `"_errors"` object marks sections as unavailable.
pub fn report_from_json(value: Value) -> Result<CanonicalReport> {
    let Value::Object(mut obj) = value else {
        return Err(Error::FileFormat(
            "report must be a JSON object keyed by section".to_string(),
        ));
    };
    let errors = match obj.remove("_errors") {
        Some(Value::Object(errors)) => errors,
        _ => Map::new(),
    };

    let mut builder = CanonicalReport::builder();
    for (name, value) in obj {
        let section = if let Some(reason) = errors.get(&name) {
            ReportSection::unavailable(name, crate::model::display_value(reason))
        } else {
            match normalize(RawContent::Json(value)) {
                Some(content) => ReportSection::new(name, content),
                None => ReportSection::absent(name),
            }
        };
        builder.push(section);
    }
    Ok(builder.build())
}
