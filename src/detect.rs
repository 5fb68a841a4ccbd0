//! Input detection for uploaded Power BI content.

use crate::error::{Error, Result};
use std::io::{Read, Seek};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// UTF-8 byte order mark.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Part holding the JSON tabular model in templates.
pub(crate) const DATA_MODEL_SCHEMA_PART: &str = "DataModelSchema";

/// Part holding the compressed tabular model in reports.
pub(crate) const DATA_MODEL_PART: &str = "DataModel";

/// Part holding the report page layout.
pub(crate) const REPORT_LAYOUT_PART: &str = "Report/Layout";

/// Kind of uploaded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Power BI report (.pbix) with a compressed data model
    Report,
    /// Power BI template (.pbit) with a JSON data model
    Template,
    /// JSON dump of an analyzer run
    Snapshot,
}

impl InputKind {
    /// Returns the usual file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            InputKind::Report => "pbix",
            InputKind::Template => "pbit",
            InputKind::Snapshot => "json",
        }
    }

    /// Returns a human-readable name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Report => "Power BI Report",
            InputKind::Template => "Power BI Template",
            InputKind::Snapshot => "Analyzer Snapshot",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the input kind from raw bytes.
///
/// # Example
///
/// ```no_run
/// use pbidoc::detect::{detect_input, InputKind};
///
/// let data = std::fs::read("sales.pbit")?;
/// assert_eq!(detect_input(&data)?, InputKind::Template);
/// # Ok::<(), pbidoc::Error>(())
/// ```
pub fn detect_input(data: &[u8]) -> Result<InputKind> {
    if is_zip_file(data) {
        return detect_archive(std::io::Cursor::new(data));
    }

    if is_json_object(data) {
        return Ok(InputKind::Snapshot);
    }

    if data.is_empty() {
        Err(Error::FileFormat("empty upload".to_string()))
    } else {
        Err(Error::FileFormat(
            "content is neither a Power BI package nor an analyzer snapshot".to_string(),
        ))
    }
}

/// Detect the package kind from a ZIP reader.
pub fn detect_archive<R: Read + Seek>(reader: R) -> Result<InputKind> {
    let archive =
        zip::ZipArchive::new(reader).map_err(|e| Error::FileFormat(format!("corrupt archive: {}", e)))?;

    let mut has_model = false;
    let mut has_layout = false;
    for name in archive.file_names() {
        match name {
            DATA_MODEL_SCHEMA_PART => return Ok(InputKind::Template),
            DATA_MODEL_PART => has_model = true,
            REPORT_LAYOUT_PART => has_layout = true,
            _ => {}
        }
    }

    if has_model || has_layout {
        Ok(InputKind::Report)
    } else {
        Err(Error::FileFormat(
            "archive is not a Power BI package".to_string(),
        ))
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Check if data looks like a JSON object (optionally after a UTF-8 BOM).
pub fn is_json_object(data: &[u8]) -> bool {
    strip_utf8_bom(data)
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Drop a leading UTF-8 byte order mark.
pub(crate) fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&UTF8_BOM[..]).unwrap_or(data)
}
