use std::fmt;
use std::path::PathBuf;

/// Crate-wide error type. Variants line up with the semantic error kinds
/// of the design's error handling section: corpus I/O, index I/O, query
/// syntax, empty-document scoring, and temp-block corruption.
#[derive(Debug)]
pub enum BiblionError {
    CorpusIo {
        path: PathBuf,
        source: std::io::Error,
    },
    IndexIo {
        path: PathBuf,
        source: std::io::Error,
    },
    IndexDecode {
        path: PathBuf,
        source: bincode::Error,
    },
    QuerySyntax(String),
    EmptyDocument {
        doc_id: u32,
        path: PathBuf,
    },
    TempBlockIo {
        path: PathBuf,
        source: std::io::Error,
    },
    TempBlockCorruption {
        path: PathBuf,
    },
}

impl fmt::Display for BiblionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiblionError::CorpusIo { path, source } => {
                write!(f, "corpus I/O failure at {}: {}", path.display(), source)
            }
            BiblionError::IndexIo { path, source } => {
                write!(f, "index not built (expected at {}): {}", path.display(), source)
            }
            BiblionError::IndexDecode { path, source } => {
                write!(f, "index at {} is not a valid biblion index: {}", path.display(), source)
            }
            BiblionError::QuerySyntax(msg) => write!(f, "query syntax error: {}", msg),
            BiblionError::EmptyDocument { doc_id, path } => write!(
                f,
                "document {} ({}) has zero words; tf-idf is undefined for empty documents",
                doc_id,
                path.display()
            ),
            BiblionError::TempBlockIo { path, source } => {
                write!(f, "temp block I/O failure at {}: {}", path.display(), source)
            }
            BiblionError::TempBlockCorruption { path } => {
                write!(f, "temp block at {} is corrupt", path.display())
            }
        }
    }
}

impl std::error::Error for BiblionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BiblionError::CorpusIo { source, .. } => Some(source),
            BiblionError::IndexIo { source, .. } => Some(source),
            BiblionError::IndexDecode { source, .. } => Some(source),
            BiblionError::TempBlockIo { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BiblionError>;
