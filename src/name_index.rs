use std::fs::File;
use std::path::{Path, PathBuf};

use crate::corpus::{Corpus, DocId};
use crate::error::{BiblionError, Result};
use crate::index::PersistedIndex;
use crate::query::TermSource;
use crate::scorer;
use crate::spimi::{self, TfMode};
use crate::stemmer::Stemmer;
use crate::tokenizer::name_tokens;

/// Secondary index (4.7) over `"<author> <title>"` tokens derived from
/// each document's relative path. Structurally identical to the main
/// index: same block builder and merger, same on-disk shape, same
/// `TermSource` seam for the query evaluator -- only the tokenizer and
/// the `TfMode` differ (presence, not count).
pub struct NameIndexHandle {
    terms: std::collections::BTreeMap<String, std::collections::BTreeMap<DocId, u32>>,
    doc_count: u32,
}

impl TermSource for NameIndexHandle {
    fn score_term(&self, stemmed_term: &str) -> Result<crate::posting::Postings<f32>> {
        match self.terms.get(stemmed_term) {
            None => Ok(Vec::new()),
            Some(tf) => scorer::score_term(tf, self.doc_count, |_| 1),
        }
    }

    fn doc_count(&self) -> u32 {
        self.doc_count
    }
}

/// Build the name index for every document under `root` and persist it
/// to `index_path`. Every document contributes exactly one occurrence of
/// each of its name tokens, so the block builder runs in presence mode
/// under an effectively unbounded budget -- a corpus's worth of author
/// and title words is tiny next to its body text.
pub fn build_name_index(root: &Path, temp_dir: &Path, index_path: &Path) -> Result<PathBuf> {
    let corpus = Corpus::discover(root)?;
    let stemmer = Stemmer::new();

    let name_tokens_stream = corpus
        .relative_paths()
        .iter()
        .enumerate()
        .flat_map(|(doc_id, relative)| {
            name_tokens(relative)
                .into_iter()
                .map(move |t| Ok((doc_id as DocId, t)))
                .collect::<Vec<_>>()
        });

    let blocks = spimi::build_blocks(name_tokens_stream, &stemmer, temp_dir, usize::MAX, TfMode::Presence)?;
    let terms = spimi::merge_blocks(&blocks)?;

    let word_counts = vec![1u32; corpus.len()];
    let persisted = PersistedIndex { terms, word_counts };

    let file = File::create(index_path).map_err(|source| BiblionError::IndexIo {
        path: index_path.to_path_buf(),
        source,
    })?;
    bincode::serialize_into(file, &persisted).map_err(|source| BiblionError::IndexDecode {
        path: index_path.to_path_buf(),
        source,
    })?;

    Ok(index_path.to_path_buf())
}

/// Open a previously built name index. `doc_count` comes from the main
/// corpus's `docs_list.txt`, keeping docId space in lockstep with the
/// main index without re-walking the filesystem.
pub fn open_name_index(index_path: &Path, doc_count: u32) -> Result<NameIndexHandle> {
    let file = File::open(index_path).map_err(|source| BiblionError::IndexIo {
        path: index_path.to_path_buf(),
        source,
    })?;
    let persisted: PersistedIndex =
        bincode::deserialize_from(file).map_err(|source| BiblionError::IndexDecode {
            path: index_path.to_path_buf(),
            source,
        })?;

    Ok(NameIndexHandle {
        terms: persisted.terms,
        doc_count,
    })
}
