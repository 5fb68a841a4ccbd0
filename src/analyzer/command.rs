//! Backend running an external analyzer program.
//!
//! The program is invoked as `program [args...] <path>` and must print a
//! snapshot (see [`SnapshotAnalyzer`]) on stdout. Because it needs a real file,
//! the extraction adapter spools the upload to a temporary file first.

use super::{Analyzer, Backend, InputMode, SnapshotAnalyzer, Source};
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::process::Command;

/// Runs an external analyzer and reads its snapshot output.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandBackend {
    /// Create a backend for a program.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument passed before the file path.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments passed before the file path.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Backend for CommandBackend {
    fn name(&self) -> &str {
        "command"
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Path
    }

    fn open(&self, source: Source<'_>) -> Result<Box<dyn Analyzer>> {
        let Source::Path(path) = source else {
            return Err(Error::UnsupportedFormat(
                "external analyzer needs a file path".to_string(),
            ));
        };

        tracing::debug!(program = ?self.program, path = %path.display(), "running analyzer");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(Error::FileFormat(if message.is_empty() {
                format!("analyzer exited with {}", output.status)
            } else {
                message.to_string()
            }));
        }

        Ok(Box::new(SnapshotAnalyzer::from_bytes(&output.stdout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_path() {
        let backend = CommandBackend::new("cat");
        assert_eq!(backend.input_mode(), InputMode::Path);
        assert!(matches!(
            backend.open(Source::Bytes(b"{}")),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_program_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"{"metadata": {"version": "2.0"}}"#).unwrap();

        let analyzer = CommandBackend::new("cat").open(Source::Path(&path)).unwrap();
        assert!(analyzer.metadata().is_ok());
        assert!(analyzer.schema().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_file_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pbix");

        // cat fails on a path that does not exist
        let result = CommandBackend::new("cat").open(Source::Path(&path));
        assert!(matches!(result, Err(Error::FileFormat(_))));
    }
}
