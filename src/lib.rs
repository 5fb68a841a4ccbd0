//! # pbidoc
//!
//! Documentation generator for Power BI files.
//!
//! This library reads a Power BI report (`.pbix`), template (`.pbit`) or an
//! analyzer snapshot, gathers its model information into a canonical report
//! (metadata, schema, relationships, Power Query code, M parameters, DAX
//! tables and measures), and renders that report as Word, PDF and Excel
//! documents.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pbidoc::{generate_documentation, ExtractOptions, OutputFormat, RenderOptions};
//!
//! let data = std::fs::read("Sales.pbit")?;
//! let documents = generate_documentation(
//!     "Sales.pbit",
//!     &data,
//!     &ExtractOptions::default(),
//!     &RenderOptions::default(),
//!     &OutputFormat::ALL,
//! )?;
//!
//! for doc in documents {
//!     std::fs::write(&doc.file_name, &doc.data)?;
//! }
//! # Ok::<(), pbidoc::Error>(())
//! ```
//!
//! ## Step by Step
//!
//! ```no_run
//! use pbidoc::{extract, render, ExtractOptions, RenderOptions, SectionKind};
//!
//! let data = std::fs::read("Sales.pbix")?;
//! let options = ExtractOptions::default().with_section(SectionKind::DaxColumns, true);
//! let report = extract(&data, &options)?;
//!
//! for section in report.sections() {
//!     println!("{}: {}", section.title(), section.has_data());
//! }
//!
//! let pdf = render::to_pdf(&report, &RenderOptions::default())?;
//! # Ok::<(), pbidoc::Error>(())
//! ```
//!
//! ## Features
//!
//! - `docx` (default): Word output
//! - `pdf` (default): PDF output via `lopdf`
//! - `xlsx` (default): Excel output

pub mod analyzer;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod render;

// Re-exports
pub use analyzer::{
    AccessError, Analyzer, AutoBackend, Backend, CommandBackend, Frame, PackageAnalyzer,
    RawContent, SnapshotAnalyzer,
};
pub use detect::{detect_input, InputKind};
pub use error::{Error, Result};
pub use extract::{extract, extract_with, report_from_json, ExtractOptions};
pub use model::{
    CanonicalReport, Field, Record, ReportSection, SectionContent, SectionKind, Tabular,
};
pub use output::{OutputFormat, RenderedDocument};
pub use render::{render_all, RenderOptions};

/// Run the whole pipeline: extract once, then render every requested format.
///
/// `upload_name` is the name the file was uploaded under; output files are
/// named `<stem>_documentation.<ext>`.
///
/// # Example
///
/// ```no_run
/// use pbidoc::{generate_documentation, ExtractOptions, OutputFormat, RenderOptions};
///
/// let data = std::fs::read("Finance.pbix")?;
/// let docs = generate_documentation(
///     "Finance.pbix",
///     &data,
///     &ExtractOptions::default(),
///     &RenderOptions::default().with_title("Finance Model"),
///     &[OutputFormat::Pdf],
/// )?;
/// assert_eq!(docs[0].file_name, "Finance_documentation.pdf");
/// # Ok::<(), pbidoc::Error>(())
/// ```
pub fn generate_documentation(
    upload_name: &str,
    data: &[u8],
    extract_options: &ExtractOptions,
    render_options: &RenderOptions,
    formats: &[OutputFormat],
) -> Result<Vec<RenderedDocument>> {
    generate_documentation_with(
        &AutoBackend,
        upload_name,
        data,
        extract_options,
        render_options,
        formats,
    )
}

/// Like [`generate_documentation`], with an explicit analyzer backend.
pub fn generate_documentation_with(
    backend: &dyn Backend,
    upload_name: &str,
    data: &[u8],
    extract_options: &ExtractOptions,
    render_options: &RenderOptions,
    formats: &[OutputFormat],
) -> Result<Vec<RenderedDocument>> {
    let report = extract_with(backend, data, extract_options)?;
    render_all(&report, formats, render_options, upload_name)
}
