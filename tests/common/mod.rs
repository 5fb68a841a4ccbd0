//! Shared helpers for integration tests: synthetic Power BI packages and
//! readers for the produced documents.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{Document, Object};
use quick_xml::events::Event;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;

/// Tabular model with two tables, two relationships, M code, a parameter and DAX.
pub const MODEL: &str = r#"{
    "name": "SalesModel",
    "compatibilityLevel": 1567,
    "model": {
        "culture": "en-US",
        "tables": [
            {
                "name": "Sales",
                "columns": [
                    {"name": "OrderID", "dataType": "int64"},
                    {"name": "Amount", "dataType": "decimal"},
                    {"type": "calculated", "name": "Margin", "dataType": "double",
                     "expression": "Sales[Amount] * 0.2"}
                ],
                "partitions": [
                    {"name": "Sales", "source": {"type": "m",
                     "expression": ["let", "    Source = Sql.Database(Server, \"sales\")", "in", "    Source"]}}
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
             "toTable": "Calendar", "toColumn": "Date"}
        ],
        "expressions": [
            {"name": "Server", "kind": "m",
             "expression": "\"sql01\" meta [IsParameterQuery=true, Type=\"Text\", IsParameterQueryRequired=true]"}
        ]
    }
}"#;

pub fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

pub fn package(parts: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A .pbit template carrying [`MODEL`].
pub fn template() -> Vec<u8> {
    package(&[
        ("Version", utf16le("1.28")),
        ("DataModelSchema", utf16le(MODEL)),
        (
            "Report/Layout",
            utf16le(r#"{"sections":[{"displayName":"Overview"},{"displayName":"Details"}]}"#),
        ),
    ])
}

/// A .pbix report whose data model is the compressed binary part.
pub fn compressed_report() -> Vec<u8> {
    package(&[
        ("Version", utf16le("1.28")),
        ("DataModel", vec![0x58, 0x50, 0x52, 0x45, 0x53, 0x53]),
        ("Metadata", utf16le(r#"{"Version":5,"CreatedFrom":"Cloud"}"#)),
    ])
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

/// A Word paragraph: style id (if any) and text with breaks as `\n`.
#[derive(Debug, Clone, PartialEq)]
pub struct WordParagraph {
    pub style: Option<String>,
    pub text: String,
    pub in_table: bool,
}

/// Paragraphs of `word/document.xml`, in document order.
pub fn docx_paragraphs(bytes: &[u8]) -> Vec<WordParagraph> {
    let xml = read_part(bytes, "word/document.xml");
    let mut reader = quick_xml::Reader::from_str(&xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current: Option<WordParagraph> = None;
    let mut in_text = false;
    let mut table_depth = 0usize;

    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => {
                    current = Some(WordParagraph {
                        style: None,
                        text: String::new(),
                        in_table: table_depth > 0,
                    })
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:pStyle" => {
                    if let Some(p) = current.as_mut() {
                        p.style = e
                            .try_get_attribute("w:val")
                            .unwrap()
                            .map(|a| String::from_utf8_lossy(&a.value).into_owned());
                    }
                }
                b"w:br" => {
                    if let Some(p) = current.as_mut() {
                        p.text.push('\n');
                    }
                }
                b"w:p" => paragraphs.push(WordParagraph {
                    style: None,
                    text: String::new(),
                    in_table: table_depth > 0,
                }),
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(p) = current.as_mut() {
                        p.text.push_str(&t.unescape().unwrap());
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                b"w:tbl" => table_depth -= 1,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    paragraphs
}

/// Texts of paragraphs with the given style.
pub fn docx_styled(bytes: &[u8], style: &str) -> Vec<String> {
    docx_paragraphs(bytes)
        .into_iter()
        .filter(|p| p.style.as_deref() == Some(style))
        .map(|p| p.text)
        .collect()
}

/// Worksheet names in workbook order.
pub fn xlsx_sheet_names(bytes: &[u8]) -> Vec<String> {
    let xml = read_part(bytes, "xl/workbook.xml");
    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut names = Vec::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Empty(e) if e.name().as_ref() == b"sheet" => {
                let name = e.try_get_attribute("name").unwrap().unwrap();
                names.push(name.unescape_value().unwrap().into_owned());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    names
}

/// Cells of one worksheet as `(reference, text)` pairs, in row order.
pub fn xlsx_cells(bytes: &[u8], sheet: usize) -> Vec<(String, String)> {
    let xml = read_part(bytes, &format!("xl/worksheets/sheet{}.xml", sheet));
    let mut reader = quick_xml::Reader::from_str(&xml);
    reader.config_mut().trim_text(false);

    let mut cells = Vec::new();
    let mut reference = String::new();
    let mut text = String::new();
    let mut in_value = false;
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => match e.name().as_ref() {
                b"c" => {
                    reference = e
                        .try_get_attribute("r")
                        .unwrap()
                        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
                        .unwrap_or_default();
                    text.clear();
                }
                b"t" | b"v" => in_value = true,
                _ => {}
            },
            Event::Text(t) if in_value => text.push_str(&t.unescape().unwrap()),
            Event::End(e) => match e.name().as_ref() {
                b"t" | b"v" => in_value = false,
                b"c" => cells.push((reference.clone(), text.clone())),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    cells
}

/// Text shown on each PDF page, one string per `Tj`.
pub fn pdf_pages(bytes: &[u8]) -> Vec<Vec<String>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(bytes.iter().map(|b| *b as char).collect()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Position of each needle in the haystack, panicking when one is missing.
pub fn positions(haystack: &[String], needles: &[&str]) -> Vec<usize> {
    needles
        .iter()
        .map(|needle| {
            haystack
                .iter()
                .position(|line| line == needle)
                .unwrap_or_else(|| panic!("{:?} not found in {:?}", needle, haystack))
        })
        .collect()
}
