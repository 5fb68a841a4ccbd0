//! Output rendering for reports.
//!
//! Every renderer reads the same immutable [`CanonicalReport`] through the
//! shared [`layout`], so several formats can be produced from one report
//! concurrently.
//!
//! # Example
//!
//! ```no_run
//! use pbidoc::extract::{extract, ExtractOptions};
//! use pbidoc::render::{render, RenderOptions};
//! use pbidoc::OutputFormat;
//!
//! let report = extract(&std::fs::read("sales.pbit")?, &ExtractOptions::default())?;
//!
//! // Word document
//! let docx = render(&report, OutputFormat::Docx, &RenderOptions::default())?;
//!
//! // Plain text
//! let text = pbidoc::render::to_text(&report, &RenderOptions::default());
//! # Ok::<(), pbidoc::Error>(())
//! ```

#[cfg(feature = "docx")]
mod docx;
mod json;
pub mod layout;
mod options;
#[cfg(any(feature = "docx", feature = "xlsx"))]
mod package;
#[cfg(feature = "pdf")]
mod pdf;
mod text;
#[cfg(feature = "xlsx")]
mod xlsx;

#[cfg(feature = "docx")]
pub use docx::to_docx;
pub use json::{to_json, JsonFormat};
pub use options::{PageSize, RenderOptions, DEFAULT_TITLE};
#[cfg(feature = "pdf")]
pub use pdf::to_pdf;
pub use text::to_text;
#[cfg(feature = "xlsx")]
pub use xlsx::{sanitize_sheet_name, to_xlsx, MAX_ROWS, MAX_SHEET_NAME};

use crate::error::{Error, Result};
use crate::model::CanonicalReport;
use crate::output::{OutputFormat, RenderedDocument};

/// Render a report into one output format.
pub fn render(
    report: &CanonicalReport,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let data = match format {
        #[cfg(feature = "docx")]
        OutputFormat::Docx => to_docx(report, options)?,
        #[cfg(feature = "pdf")]
        OutputFormat::Pdf => to_pdf(report, options)?,
        #[cfg(feature = "xlsx")]
        OutputFormat::Xlsx => to_xlsx(report, options)?,
        #[allow(unreachable_patterns)]
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "{} output is not enabled in this build",
                other.name()
            )))
        }
    };
    tracing::info!(format = %format, bytes = data.len(), "document rendered");
    Ok(data)
}

/// Render several formats from one report, each on its own thread.
///
/// Documents come back in the order requested; repeated formats are
/// rendered once. Any failure fails the whole call.
pub fn render_all(
    report: &CanonicalReport,
    formats: &[OutputFormat],
    options: &RenderOptions,
    upload_name: &str,
) -> Result<Vec<RenderedDocument>> {
    let mut unique: Vec<OutputFormat> = Vec::with_capacity(formats.len());
    for format in formats {
        if !unique.contains(format) {
            unique.push(*format);
        }
    }

    let results: Vec<Result<Vec<u8>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = unique
            .iter()
            .map(|format| scope.spawn(move || render(report, *format, options)))
            .collect();
        handles
            .into_iter()
            .zip(&unique)
            .map(|(handle, format)| {
                handle.join().unwrap_or_else(|_| {
                    Err(Error::Serialization(format!("{} renderer panicked", format.name())))
                })
            })
            .collect()
    });

    unique
        .into_iter()
        .zip(results)
        .map(|(format, data)| Ok(RenderedDocument::new(format, upload_name, data?)))
        .collect()
}

#[cfg(all(test, feature = "docx", feature = "pdf", feature = "xlsx"))]
mod tests {
    use super::*;
    use crate::model::ReportSection;

    #[test]
    fn test_render_all_order_and_names() {
        let mut builder = CanonicalReport::builder();
        builder.push(ReportSection::absent("metadata"));
        let report = builder.build();

        let docs = render_all(
            &report,
            &[OutputFormat::Xlsx, OutputFormat::Docx, OutputFormat::Xlsx],
            &RenderOptions::default(),
            "sales.pbix",
        )
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].file_name, "sales_documentation.xlsx");
        assert_eq!(docs[1].format, OutputFormat::Docx);
        assert!(docs.iter().all(|d| !d.is_empty()));
    }

    #[test]
    fn test_render_matches_sequential() {
        let report = CanonicalReport::default();
        let options = RenderOptions::default();
        let docs = render_all(&report, &OutputFormat::ALL, &options, "a.pbit").unwrap();
        for doc in docs {
            assert_eq!(doc.data, render(&report, doc.format, &options).unwrap());
        }
    }
}
