//! Deterministic OOXML package writer shared by the Word and Excel renderers.

use crate::error::{Error, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const RELATIONSHIPS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.relationships+xml";

pub(crate) const CORE_PROPERTIES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.core-properties+xml";

pub(crate) const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

pub(crate) const CORE_PROPERTIES_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// Writes ZIP entries in call order with a fixed timestamp.
pub(crate) struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default()),
        }
    }

    /// Add one part.
    pub(crate) fn add(&mut self, name: &str, contents: &str) -> Result<()> {
        self.zip
            .start_file(name, self.options)
            .map_err(|e| Error::Serialization(format!("{}: {}", name, e)))?;
        self.zip
            .write_all(contents.as_bytes())
            .map_err(|e| Error::Serialization(format!("{}: {}", name, e)))
    }

    /// Write the central directory and return the package bytes.
    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        self.zip
            .finish()
            .map(Cursor::into_inner)
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Escape text for XML content or attribute values.
///
/// Characters XML 1.0 cannot represent are dropped.
pub(crate) fn xml_text(text: &str) -> String {
    if text.chars().any(is_xml_illegal) {
        let cleaned: String = text.chars().filter(|c| !is_xml_illegal(*c)).collect();
        quick_xml::escape::escape(cleaned.as_str()).into_owned()
    } else {
        quick_xml::escape::escape(text).into_owned()
    }
}

fn is_xml_illegal(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// `[Content_Types].xml` with the given part overrides.
pub(crate) fn content_types(overrides: &[(String, &str)]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(&format!(
        r#"<Default Extension="rels" ContentType="{}"/>"#,
        RELATIONSHIPS_CONTENT_TYPE
    ));
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            part, content_type
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// A relationships part from `(id, type, target)` triples.
pub(crate) fn relationships(rels: &[(String, &str, String)]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, rel_type, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// `_rels/.rels` pointing at the main part and the core properties.
pub(crate) fn root_relationships(main_part: &str) -> String {
    relationships(&[
        ("rId1".to_string(), OFFICE_DOCUMENT_REL, main_part.to_string()),
        (
            "rId2".to_string(),
            CORE_PROPERTIES_REL,
            "docProps/core.xml".to_string(),
        ),
    ])
}

/// `docProps/core.xml` carrying title and creator. No dates are written.
pub(crate) fn core_properties(title: &str, creator: &str) -> String {
    format!(
        concat!(
            "{}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:creator>{}</dc:creator></cp:coreProperties>"
        ),
        XML_DECLARATION,
        xml_text(title),
        xml_text(creator)
    )
}
