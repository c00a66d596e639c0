use std::collections::{BTreeMap, HashMap};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::corpus::DocId;
use crate::error::{BiblionError, Result};
use crate::stemmer::Stemmer;

/// How a token's occurrence is folded into its posting.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TfMode {
    /// Increment the count at each occurrence (the main index).
    Count,
    /// Pin the value at 1 regardless of repeat occurrences (the name index).
    Presence,
}

/// SPIMI-Invert: accumulate `term -> (docId -> tf)` in memory until the
/// byte budget is exceeded, spill the block sorted by term ascending,
/// and continue. Memory accounting counts token byte length only (the
/// original's `sys.getsizeof(token)` proxy) -- a coarse, monotonically
/// non-decreasing-within-a-block residency estimate, not an exact count.
///
/// Returns the ordered list of spilled block file paths.
pub fn build_blocks<I>(
    tokens: I,
    stemmer: &Stemmer,
    temp_dir: &Path,
    memory_budget: usize,
    mode: TfMode,
) -> Result<Vec<PathBuf>>
where
    I: Iterator<Item = Result<(DocId, String)>>,
{
    crate::corpus::ensure_dir(temp_dir)?;

    let mut dict: HashMap<String, BTreeMap<DocId, u32>> = HashMap::new();
    let mut memory_used = 0usize;
    let mut blocks = Vec::new();

    for item in tokens {
        let (doc_id, token) = item?;
        memory_used += token.len();

        let term = stemmer.stem(&token);
        let postings = dict.entry(term).or_default();
        match mode {
            TfMode::Count => *postings.entry(doc_id).or_insert(0) += 1,
            TfMode::Presence => {
                postings.insert(doc_id, 1);
            }
        }

        if memory_used > memory_budget {
            let block_path = spill(&dict, temp_dir, blocks.len())?;
            blocks.push(block_path);
            dict.clear();
            memory_used = 0;
        }
    }

    if !dict.is_empty() {
        let block_path = spill(&dict, temp_dir, blocks.len())?;
        blocks.push(block_path);
    }

    Ok(blocks)
}

fn spill(
    dict: &HashMap<String, BTreeMap<DocId, u32>>,
    temp_dir: &Path,
    block_index: usize,
) -> Result<PathBuf> {
    let path = temp_dir.join(format!("block_{block_index}.txt"));
    let file = std::fs::File::create(&path).map_err(|source| BiblionError::TempBlockIo {
        path: path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let mut terms: Vec<&String> = dict.keys().collect();
    terms.sort();

    for term in terms {
        let postings = &dict[term];
        let payload = postings
            .iter()
            .map(|(doc_id, tf)| format!("{doc_id}={tf}"))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{term}\t{payload}").map_err(|source| BiblionError::TempBlockIo {
            path: path.clone(),
            source,
        })?;
    }

    writer.flush().map_err(|source| BiblionError::TempBlockIo {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
