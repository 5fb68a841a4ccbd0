//! Analyzer over the Power BI ZIP package.
//!
//! A package is a ZIP archive. Most text parts (`Version`, `Metadata`,
//! `DataModelSchema`, `Report/Layout`) are UTF-16 LE without a byte order
//! mark. Templates carry the tabular model as JSON in `DataModelSchema`;
//! reports only carry the compressed binary `DataModel`, which is not decoded
//! here, so their data-model accessors fail and only metadata is available.

use super::tabular_model::TabularModel;
use super::{AccessError, AccessResult, Analyzer, RawContent};
use crate::detect::{DATA_MODEL_PART, DATA_MODEL_SCHEMA_PART, REPORT_LAYOUT_PART};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::io::{Cursor, Read};

/// Reason reported for data-model sections of a compressed report.
const COMPRESSED_MODEL: &str =
    "the report's DataModel part is compressed and cannot be decoded; \
     export a template (.pbit) or supply an analyzer snapshot";

/// Where the tabular model comes from.
enum ModelSource {
    /// Parsed `DataModelSchema` JSON
    Schema(TabularModel),
    /// `DataModelSchema` present but unreadable
    Unreadable(String),
    /// Only the compressed `DataModel` part
    Compressed,
    /// No model part at all
    Absent,
}

/// Analyzer reading a .pbix or .pbit package.
pub struct PackageAnalyzer {
    metadata: Map<String, Value>,
    model: ModelSource,
}

impl PackageAnalyzer {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Open a package from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::FileFormat(format!("not a ZIP archive: {}", e)))?;

        let part_names: Vec<String> = archive.file_names().map(String::from).collect();
        let has_part = |name: &str| part_names.iter().any(|n| n == name);

        if !has_part(DATA_MODEL_SCHEMA_PART)
            && !has_part(DATA_MODEL_PART)
            && !has_part(REPORT_LAYOUT_PART)
        {
            return Err(Error::FileFormat(
                "archive is not a Power BI package".to_string(),
            ));
        }

        let model = if has_part(DATA_MODEL_SCHEMA_PART) {
            match read_text_part(&mut archive, DATA_MODEL_SCHEMA_PART)
                .and_then(|text| TabularModel::parse(&text))
            {
                Ok(model) => ModelSource::Schema(model),
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable DataModelSchema part");
                    ModelSource::Unreadable(e.to_string())
                }
            }
        } else if has_part(DATA_MODEL_PART) {
            ModelSource::Compressed
        } else {
            ModelSource::Absent
        };

        let mut metadata = Map::new();
        let kind = if has_part(DATA_MODEL_SCHEMA_PART) {
            "template"
        } else {
            "report"
        };
        metadata.insert("package_kind".into(), kind.into());

        if let Ok(version) = read_text_part(&mut archive, "Version") {
            metadata.insert("version".into(), version.trim().into());
        }

        // Scalar entries of the Metadata part, e.g. CreatedFrom / CreatedFromRelease
        if let Ok(text) = read_text_part(&mut archive, "Metadata") {
            if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&text) {
                for (key, value) in obj {
                    if !value.is_array() && !value.is_object() {
                        metadata.insert(key, value);
                    }
                }
            }
        }

        if let Ok(text) = read_text_part(&mut archive, REPORT_LAYOUT_PART) {
            if let Some(pages) = report_pages(&text) {
                metadata.insert("page_count".into(), pages.len().into());
                metadata.insert("pages".into(), pages.join(", ").into());
            }
        }

        let data_model = match &model {
            ModelSource::Schema(_) | ModelSource::Unreadable(_) => "DataModelSchema (JSON)",
            ModelSource::Compressed => "DataModel (compressed)",
            ModelSource::Absent => "none",
        };
        metadata.insert("data_model".into(), data_model.into());
        metadata.insert("part_count".into(), part_names.len().into());

        if let ModelSource::Schema(model) = &model {
            model.describe(&mut metadata);
        }

        Ok(Self { metadata, model })
    }

    fn with_model(&self, f: impl FnOnce(&TabularModel) -> RawContent) -> AccessResult {
        match &self.model {
            ModelSource::Schema(model) => Ok(f(model)),
            ModelSource::Unreadable(reason) => {
                Err(AccessError::Failed(format!("DataModelSchema unreadable: {}", reason)))
            }
            ModelSource::Compressed => Err(AccessError::Failed(COMPRESSED_MODEL.to_string())),
            ModelSource::Absent => Err(AccessError::Failed(
                "package has no data model part".to_string(),
            )),
        }
    }
}

impl Analyzer for PackageAnalyzer {
    fn name(&self) -> &str {
        "package"
    }

    fn metadata(&self) -> AccessResult {
        Ok(RawContent::Json(Value::Object(self.metadata.clone())))
    }

    fn schema(&self) -> AccessResult {
        self.with_model(|m| m.schema())
    }

    fn relationships(&self) -> AccessResult {
        self.with_model(|m| m.relationships())
    }

    fn power_query(&self) -> AccessResult {
        self.with_model(|m| m.power_query())
    }

    fn m_parameters(&self) -> AccessResult {
        self.with_model(|m| m.m_parameters())
    }

    fn dax_tables(&self) -> AccessResult {
        self.with_model(|m| m.dax_tables())
    }

    fn dax_measures(&self) -> AccessResult {
        self.with_model(|m| m.dax_measures())
    }

    fn dax_columns(&self) -> AccessResult {
        self.with_model(|m| m.dax_columns())
    }
}

/// Read a text part from the archive, decoding its encoding.
fn read_text_part(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| Error::FileFormat(format!("missing part: {}", name)))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    decode_text_part(&bytes)
}

/// Display names of the report pages in `Report/Layout`.
fn report_pages(layout: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(layout).ok()?;
    let sections = value.get("sections")?.as_array()?;
    Some(
        sections
            .iter()
            .filter_map(|s| s.get("displayName").and_then(Value::as_str))
            .map(String::from)
            .collect(),
    )
}

/// Decode package text handling different encodings (UTF-8, UTF-16 LE/BE).
///
/// Power BI writes most parts as UTF-16 LE without a byte order mark, so the
/// null-byte pattern is checked before trying UTF-8 (ASCII text in UTF-16 is
/// also valid UTF-8, just full of NULs).
fn decode_text_part(bytes: &[u8]) -> Result<String> {
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        return decode_utf16_le(&bytes[2..]);
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        return decode_utf16_be(&bytes[2..]);
    }

    // UTF-16 LE typically has null bytes in odd positions for ASCII
    if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 && bytes[0] != 0 {
        return decode_utf16_le(bytes);
    }
    if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 && bytes[1] != 0 {
        return decode_utf16_be(bytes);
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Decode UTF-16 Little Endian bytes to String.
fn decode_utf16_le(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;
    let units = (0..len)
        .step_by(2)
        .map(|i| u16::from_le_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Decode UTF-16 Big Endian bytes to String.
fn decode_utf16_be(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;
    let units = (0..len)
        .step_by(2)
        .map(|i| u16::from_be_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn package(parts: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_decode_utf16_without_bom() {
        let text = decode_text_part(&utf16le("1.28")).unwrap();
        assert_eq!(text, "1.28");
    }

    #[test]
    fn test_decode_boms() {
        assert_eq!(decode_text_part(b"\xEF\xBB\xBFabc").unwrap(), "abc");
        assert_eq!(decode_text_part(b"\xFF\xFEa\x00b\x00").unwrap(), "ab");
        assert_eq!(decode_text_part(b"\xFE\xFF\x00a\x00b").unwrap(), "ab");
        assert_eq!(decode_text_part(b"plain").unwrap(), "plain");
    }

    #[test]
    fn test_compressed_report_metadata_only() {
        let data = package(&[
            ("Version", utf16le("1.28")),
            ("DataModel", vec![0x00, 0x01, 0x02]),
            (
                "Metadata",
                utf16le(r#"{"Version":4,"CreatedFrom":"Cloud","Nested":{"a":1}}"#),
            ),
            (
                "Report/Layout",
                utf16le(r#"{"sections":[{"displayName":"Overview"},{"displayName":"Detail"}]}"#),
            ),
        ]);
        let analyzer = PackageAnalyzer::from_bytes(data).unwrap();

        let RawContent::Json(Value::Object(meta)) = analyzer.metadata().unwrap() else {
            panic!("metadata should be an object");
        };
        assert_eq!(meta["package_kind"], "report");
        assert_eq!(meta["version"], "1.28");
        assert_eq!(meta["CreatedFrom"], "Cloud");
        assert!(!meta.contains_key("Nested"));
        assert_eq!(meta["pages"], "Overview, Detail");
        assert_eq!(meta["data_model"], "DataModel (compressed)");

        let err = analyzer.relationships().unwrap_err();
        assert!(matches!(err, AccessError::Failed(msg) if msg.contains("compressed")));
    }

    #[test]
    fn test_unreadable_model_schema() {
        let data = package(&[("DataModelSchema", utf16le("{ not json"))]);
        let analyzer = PackageAnalyzer::from_bytes(data).unwrap();
        assert!(analyzer.metadata().is_ok());
        assert!(matches!(analyzer.schema(), Err(AccessError::Failed(_))));
    }

    #[test]
    fn test_not_a_package() {
        assert!(matches!(
            PackageAnalyzer::from_bytes(b"nope".to_vec()),
            Err(Error::FileFormat(_))
        ));
        let foreign = package(&[("word/document.xml", b"<w/>".to_vec())]);
        assert!(matches!(
            PackageAnalyzer::from_bytes(foreign),
            Err(Error::FileFormat(_))
        ));
    }
}
