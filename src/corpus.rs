use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BiblionError, Result};

pub type DocId = u32;

/// Corpus layout: `<root>/<author>/<title>.<ext>`, exactly two path
/// components below root. DocIds are the zero-based position of a
/// document's relative path in the sorted path list -- dense, and stable
/// across runs iff the corpus is unchanged.
pub struct Corpus {
    root: PathBuf,
    relative_paths: Vec<PathBuf>,
    word_counts: Vec<u32>,
}

fn relative_path_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl Corpus {
    /// Walk `root`, collect every file exactly two path components below
    /// it, sort the relative paths ascending, and assign docIds by
    /// position. Word counts are derived eagerly since both the builder
    /// and the scorer need them.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut relative_paths = Vec::new();

        for entry in WalkDir::new(root).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| BiblionError::CorpusIo {
                path: root.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("walkdir entry is under root")
                .to_path_buf();
            relative_paths.push(relative);
        }

        relative_paths.sort_by_key(|p| relative_path_string(p));

        let mut word_counts = Vec::with_capacity(relative_paths.len());
        for relative in &relative_paths {
            word_counts.push(count_words(&root.join(relative))?);
        }

        Ok(Corpus {
            root: root.to_path_buf(),
            relative_paths,
            word_counts,
        })
    }

    /// Rebuild a `Corpus` from a previously-written `docs_list.txt` (the
    /// docId authority) instead of re-walking the filesystem. Word counts
    /// are not recomputed here: opening an index is a query-time
    /// operation (spec.md §7's "index not built" is the only failure mode
    /// it should carry), and the word counts a query needs are already
    /// persisted in the index itself (see `PersistedIndex::word_counts`)
    /// -- re-deriving them from disk would make every `open_index` call
    /// fail on a missing document body it never needed to read.
    pub fn from_docs_list(root: &Path, docs_list_path: &Path) -> Result<Self> {
        let file = File::open(docs_list_path).map_err(|source| BiblionError::IndexIo {
            path: docs_list_path.to_path_buf(),
            source,
        })?;
        let mut relative_paths = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| BiblionError::IndexIo {
                path: docs_list_path.to_path_buf(),
                source,
            })?;
            if !line.is_empty() {
                relative_paths.push(PathBuf::from(line));
            }
        }

        Ok(Corpus {
            root: root.to_path_buf(),
            word_counts: Vec::new(),
            relative_paths,
        })
    }

    pub fn len(&self) -> usize {
        self.relative_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_paths.is_empty()
    }

    pub fn relative_paths(&self) -> &[PathBuf] {
        &self.relative_paths
    }

    pub fn full_paths(&self) -> Vec<PathBuf> {
        self.relative_paths
            .iter()
            .map(|r| self.root.join(r))
            .collect()
    }

    pub fn full_path(&self, doc_id: DocId) -> PathBuf {
        self.root.join(&self.relative_paths[doc_id as usize])
    }

    pub fn relative_path(&self, doc_id: DocId) -> &Path {
        &self.relative_paths[doc_id as usize]
    }

    pub fn word_count(&self, doc_id: DocId) -> u32 {
        self.word_counts[doc_id as usize]
    }

    /// Sidecar `docs_list.txt`: the sorted list of relative paths, one
    /// per line. Line `k` (zero-based) has `docId = k`.
    pub fn write_docs_list(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| BiblionError::IndexIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = std::io::BufWriter::new(file);
        for relative in &self.relative_paths {
            writeln!(writer, "{}", relative_path_string(relative)).map_err(|source| {
                BiblionError::IndexIo {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }
        writer.flush().map_err(|source| BiblionError::IndexIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn count_words(path: &Path) -> Result<u32> {
    let file = File::open(path).map_err(|source| BiblionError::CorpusIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut count = 0u32;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| BiblionError::CorpusIo {
            path: path.to_path_buf(),
            source,
        })?;
        count += line.split_whitespace().count() as u32;
    }
    Ok(count)
}

/// Ensure a directory exists, creating it (and parents) if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| BiblionError::TempBlockIo {
        path: path.to_path_buf(),
        source,
    })
}
