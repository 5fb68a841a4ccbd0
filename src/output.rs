//! Output formats and rendered documents.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A downloadable document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    /// Word document (.docx)
    Docx,
    /// Portable Document Format (.pdf)
    Pdf,
    /// Excel workbook (.xlsx)
    Xlsx,
}

impl OutputFormat {
    /// All formats, in the order they are offered for download.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Docx, OutputFormat::Pdf, OutputFormat::Xlsx];

    /// Standard MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "Word",
            OutputFormat::Pdf => "PDF",
            OutputFormat::Xlsx => "Excel",
        }
    }

    /// Check if support for this format was compiled in.
    pub fn is_enabled(&self) -> bool {
        match self {
            OutputFormat::Docx => cfg!(feature = "docx"),
            OutputFormat::Pdf => cfg!(feature = "pdf"),
            OutputFormat::Xlsx => cfg!(feature = "xlsx"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Docx),
            "pdf" => Ok(OutputFormat::Pdf),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            other => Err(crate::Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A finished document ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Output format
    pub format: OutputFormat,
    /// Suggested download name, e.g. `sales_documentation.pdf`
    pub file_name: String,
    /// Complete file contents
    pub data: Vec<u8>,
}

impl RenderedDocument {
    /// Wrap rendered bytes, deriving the file name from the upload name.
    pub fn new(format: OutputFormat, upload_name: &str, data: Vec<u8>) -> Self {
        Self {
            format,
            file_name: documentation_file_name(upload_name, format),
            data,
        }
    }

    /// MIME type of the document.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the document has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// `<upload stem>_documentation.<ext>`
pub fn documentation_file_name(upload_name: &str, format: OutputFormat) -> String {
    let stem = Path::new(upload_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("report");
    format!("{}_documentation.{}", stem, format.extension())
}
