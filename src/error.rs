//! Error types for the pbidoc library.

use std::io;
use thiserror::Error;

/// Result type alias for pbidoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while documenting a Power BI file.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The uploaded content is not a file the analyzer can open.
    #[error("Invalid Power BI file: {0}")]
    FileFormat(String),

    /// One section could not be read from the analyzer.
    #[error("Section '{section}' unavailable: {reason}")]
    SectionUnavailable {
        /// Section name
        section: String,
        /// Why the analyzer could not provide it
        reason: String,
    },

    /// A single section failed while building a document.
    #[error("Render error in '{section}': {message}")]
    Render {
        /// Section name
        section: String,
        /// Underlying message
        message: String,
    },

    /// The finished document could not be written out.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The requested output format is not compiled in.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading or writing JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// Error reading a ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),
}

impl Error {
    /// Build a render error for a section.
    pub fn render(section: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Render {
            section: section.into(),
            message: message.into(),
        }
    }

    /// Whether the error is contained at section scope.
    pub fn is_section_scoped(&self) -> bool {
        matches!(self, Error::SectionUnavailable { .. } | Error::Render { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
