use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The glossary document cannot be interpreted; raised before any BOM is touched.
#[derive(Error, Debug)]
pub enum GlossaryFormatError {
    #[error("glossary headers not found: need {required:?}, found {found:?}")]
    MissingHeaders {
        required: Vec<String>,
        found: Vec<String>,
    },

    #[error("glossary sheet not found: {name} (available: {available:?})")]
    MissingSheet { name: String, available: Vec<String> },

    #[error("glossary workbook has no sheets")]
    NoSheets,
}

/// A glossary key that appeared more than once; the last row won.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlossaryDuplicateWarning {
    pub source_term: String,
    pub occurrences: usize,
    pub kept_target: String,
}

impl fmt::Display for GlossaryDuplicateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicate glossary key {:?} ({} rows, kept {:?})",
            self.source_term, self.occurrences, self.kept_target
        )
    }
}

/// Read/parse/write failure for one document. Fatal for that document only.
#[derive(Error, Debug)]
#[error("{}: {:#}", .path.display(), .source)]
pub struct DocumentIoError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

impl DocumentIoError {
    pub fn new(path: &Path, source: anyhow::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn document_name(&self) -> String {
        document_name(&self.path)
    }
}

/// File name for reports and logs; the full path when there is none.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Failure to get a usable glossary at all.
#[derive(Error, Debug)]
pub enum GlossaryLoadError {
    #[error(transparent)]
    Format(#[from] GlossaryFormatError),

    #[error(transparent)]
    Io(#[from] DocumentIoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn document_error_carries_file_name_and_chain() {
        let err = DocumentIoError::new(
            Path::new("/tmp/bom/part list.xlsx"),
            anyhow!("zip entry").context("read xlsx"),
        );
        assert_eq!(err.document_name(), "part list.xlsx");
        let msg = err.to_string();
        assert!(msg.contains("part list.xlsx"));
        assert!(msg.contains("read xlsx"));
        assert!(msg.contains("zip entry"));
    }

    #[test]
    fn missing_headers_lists_what_was_found() {
        let err = GlossaryFormatError::MissingHeaders {
            required: vec!["CN".into(), "EN".into()],
            found: vec!["中文".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"CN\""));
        assert!(msg.contains("中文"));
    }
}
