#![cfg(all(feature = "docx", feature = "pdf", feature = "xlsx"))]

//! End-to-end extraction tests: synthetic packages and snapshots through the
//! adapter, then into every output format.

mod common;

use common::*;
use pbidoc::analyzer::{AccessResult, Analyzer, Backend, InputMode, Source};
use pbidoc::{
    extract, extract_with, generate_documentation, generate_documentation_with, AccessError,
    Error, ExtractOptions, OutputFormat, RenderOptions, SectionContent, SectionKind,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Mutex;

#[test]
fn template_extracts_every_default_section() {
    let report = extract(&template(), &ExtractOptions::default()).unwrap();

    assert_eq!(
        report.names(),
        vec![
            "metadata",
            "schema",
            "relationships",
            "power_query",
            "m_parameters",
            "dax_tables",
            "dax_measures"
        ]
    );
    assert_eq!(report.populated_count(), 7);

    let Some(SectionContent::Mapping(metadata)) = &report.get("metadata").unwrap().content else {
        panic!("metadata should be a mapping");
    };
    assert_eq!(metadata["package_kind"], "template");
    assert_eq!(metadata["version"], "1.28");
    assert_eq!(metadata["page_count"], 2);
    assert_eq!(metadata["model_name"], "SalesModel");

    let Some(SectionContent::Records(tables)) = &report.get("schema").unwrap().content else {
        panic!("schema should be records");
    };
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].get("name"), Some(&json!("Sales")));

    let Some(SectionContent::Tabular(params)) = &report.get("m_parameters").unwrap().content
    else {
        panic!("parameters should be tabular");
    };
    assert_eq!(params.rows[0][0], "Server");
    assert_eq!(params.rows[0][2], "\"sql01\"");
}

#[test]
fn calculated_columns_are_opt_in() {
    let options = ExtractOptions::default().with_section(SectionKind::DaxColumns, true);
    let report = extract(&template(), &options).unwrap();
    assert_eq!(report.names().last(), Some(&"dax_columns"));
    assert!(report.get("dax_columns").unwrap().has_data());
}

#[test]
fn compressed_report_keeps_metadata() {
    let report = extract(&compressed_report(), &ExtractOptions::default()).unwrap();

    let metadata = report.get("metadata").unwrap();
    assert!(metadata.has_data());
    for name in ["schema", "relationships", "dax_measures"] {
        let section = report.get(name).unwrap();
        assert!(!section.has_data(), "{} should be empty", name);
        assert!(section.unavailable.is_some());
    }

    // Every format still renders, with placeholders for the model sections.
    let docx = pbidoc::render::to_docx(&report, &RenderOptions::default()).unwrap();
    let paragraphs: Vec<String> = docx_paragraphs(&docx).into_iter().map(|p| p.text).collect();
    assert!(paragraphs.contains(&"No schema information available.".to_string()));
    assert!(paragraphs.contains(&"No DAX measures available.".to_string()));
}

#[test]
fn snapshot_with_failing_relationships() {
    let snapshot = json!({
        "metadata": {"Name": "Finance"},
        "schema": {"columns": ["TableName", "ColumnName", "PandasDataType"],
                   "data": [["Sales", "OrderID", "int64"]]},
        "_errors": {"relationships": "AttributeError: 'PBIXRay' object has no attribute 'relationships'"}
    });
    let bytes = serde_json::to_vec(&snapshot).unwrap();
    let report = extract(&bytes, &ExtractOptions::default()).unwrap();

    assert!(report.get("metadata").unwrap().has_data());
    assert!(report.get("schema").unwrap().has_data());
    let relationships = report.get("relationships").unwrap();
    assert!(relationships.content.is_none());
    assert!(relationships
        .unavailable
        .as_deref()
        .unwrap()
        .contains("AttributeError"));

    let xlsx = pbidoc::render::to_xlsx(&report, &RenderOptions::default()).unwrap();
    let names = xlsx_sheet_names(&xlsx);
    let index = names.iter().position(|n| n == "relationships").unwrap();
    let cells = xlsx_cells(&xlsx, index + 1);
    assert!(cells.contains(&("A3".to_string(), "No relationships available.".to_string())));
}

#[test]
fn unreadable_input_is_a_file_error() {
    for data in [&b""[..], &b"not a power bi file"[..], &b"PK\x03\x04garbage"[..]] {
        let result = extract(data, &ExtractOptions::default());
        assert!(matches!(result, Err(Error::FileFormat(_))), "{:?}", data);
    }

    let plain_zip = package(&[("readme.txt", b"hello".to_vec())]);
    assert!(matches!(
        extract(&plain_zip, &ExtractOptions::default()),
        Err(Error::FileFormat(_))
    ));
}

/// Backend that needs a path and remembers which one it was given.
struct RecordingBackend {
    seen: Mutex<Option<PathBuf>>,
    fail: bool,
}

struct MeasuresOnly;

impl Analyzer for MeasuresOnly {
    fn name(&self) -> &str {
        "measures-only"
    }

    fn dax_measures(&self) -> AccessResult {
        Ok(json!([{"Name": "Total", "Expression": "SUM(Sales[Amount])"}]).into())
    }

    fn relationships(&self) -> AccessResult {
        Err(AccessError::Failed("boom".into()))
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Path
    }

    fn open(&self, source: Source<'_>) -> pbidoc::Result<Box<dyn Analyzer>> {
        let Source::Path(path) = source else {
            panic!("expected a path");
        };
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pbix"));
        assert_eq!(std::fs::read(path).unwrap(), b"upload bytes");
        *self.seen.lock().unwrap() = Some(path.to_path_buf());
        if self.fail {
            Err(Error::FileFormat("analyzer rejected the file".into()))
        } else {
            Ok(Box::new(MeasuresOnly))
        }
    }
}

#[test]
fn temporary_upload_removed_on_success() {
    let scratch = tempfile::tempdir().unwrap();
    let backend = RecordingBackend {
        seen: Mutex::new(None),
        fail: false,
    };
    let options = ExtractOptions::default().with_scratch_dir(scratch.path());

    let report = extract_with(&backend, b"upload bytes", &options).unwrap();
    assert!(report.get("dax_measures").unwrap().has_data());
    assert_eq!(
        report.get("relationships").unwrap().unavailable.as_deref(),
        Some("boom")
    );

    let path = backend.seen.lock().unwrap().clone().unwrap();
    assert!(path.starts_with(scratch.path()));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn temporary_upload_removed_on_failure() {
    let scratch = tempfile::tempdir().unwrap();
    let backend = RecordingBackend {
        seen: Mutex::new(None),
        fail: true,
    };
    let options = ExtractOptions::default().with_scratch_dir(scratch.path());

    let result = generate_documentation_with(
        &backend,
        "upload.pbix",
        b"upload bytes",
        &options,
        &RenderOptions::default(),
        &[OutputFormat::Pdf],
    );
    assert!(matches!(result, Err(Error::FileFormat(_))));

    let path = backend.seen.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn generate_documentation_names_and_mime_types() {
    let docs = generate_documentation(
        "Sales Model.pbit",
        &template(),
        &ExtractOptions::default(),
        &RenderOptions::default(),
        &OutputFormat::ALL,
    )
    .unwrap();

    let names: Vec<&str> = docs.iter().map(|d| d.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Sales Model_documentation.docx",
            "Sales Model_documentation.pdf",
            "Sales Model_documentation.xlsx"
        ]
    );
    assert_eq!(docs[1].mime_type(), "application/pdf");
    assert!(docs.iter().all(|d| !d.is_empty()));
    assert!(docs[1].data.starts_with(b"%PDF"));
    assert!(docs[0].data.starts_with(b"PK"));
}

#[cfg(unix)]
#[test]
fn command_backend_reads_snapshot_from_program() {
    let scratch = tempfile::tempdir().unwrap();
    let snapshot = json!({"dax_measures": [{"name": "Total", "expression": "1"}]});
    let data = serde_json::to_vec(&snapshot).unwrap();

    // `cat <path>` echoes the spooled upload back as the snapshot.
    let backend = pbidoc::CommandBackend::new("cat");
    let options = ExtractOptions::default().with_scratch_dir(scratch.path());
    let report = extract_with(&backend, &data, &options).unwrap();

    assert!(report.get("dax_measures").unwrap().has_data());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
