use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::corpus::DocId;
use crate::error::{BiblionError, Result};

struct BlockReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl BlockReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| BiblionError::TempBlockIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BlockReader {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
        })
    }

    fn next_entry(&mut self) -> Result<Option<(String, BTreeMap<DocId, u32>)>> {
        match self.lines.next() {
            None => Ok(None),
            Some(Err(source)) => Err(BiblionError::TempBlockIo {
                path: self.path.clone(),
                source,
            }),
            Some(Ok(line)) => parse_line(&self.path, &line).map(Some),
        }
    }
}

fn parse_line(path: &Path, line: &str) -> Result<(String, BTreeMap<DocId, u32>)> {
    let (term, payload) = line
        .split_once('\t')
        .ok_or_else(|| BiblionError::TempBlockCorruption {
            path: path.to_path_buf(),
        })?;

    let mut postings = BTreeMap::new();
    if !payload.is_empty() {
        for entry in payload.split(',') {
            let (doc_id, tf) =
                entry
                    .split_once('=')
                    .ok_or_else(|| BiblionError::TempBlockCorruption {
                        path: path.to_path_buf(),
                    })?;
            let doc_id: DocId = doc_id
                .parse()
                .map_err(|_| BiblionError::TempBlockCorruption {
                    path: path.to_path_buf(),
                })?;
            let tf: u32 = tf.parse().map_err(|_| BiblionError::TempBlockCorruption {
                path: path.to_path_buf(),
            })?;
            postings.insert(doc_id, tf);
        }
    }
    Ok((term.to_string(), postings))
}

fn merge_doc_maps(
    mut into: BTreeMap<DocId, u32>,
    other: BTreeMap<DocId, u32>,
) -> BTreeMap<DocId, u32> {
    for (doc_id, tf) in other {
        *into.entry(doc_id).or_insert(0) += tf;
    }
    into
}

/// K-way merge of sorted block files, driven by a one-slot lookahead
/// buffer per block. Terms sharing a minimum across blocks are summed
/// by docId (posting-merge rule); the result is returned as a
/// `BTreeMap` so ascending term iteration falls out of the type.
///
/// Blocks are deleted on a successful merge. On failure they are left in
/// place to support retry/diagnosis (resource discipline, design §5).
pub fn merge_blocks(block_paths: &[PathBuf]) -> Result<BTreeMap<String, BTreeMap<DocId, u32>>> {
    let mut readers: Vec<BlockReader> = block_paths
        .iter()
        .map(|p| BlockReader::open(p))
        .collect::<Result<_>>()?;
    let mut lookahead: Vec<Option<(String, BTreeMap<DocId, u32>)>> = vec![None; readers.len()];

    let result = merge_inner(&mut readers, &mut lookahead);

    match &result {
        Ok(_) => {
            for path in block_paths {
                // Best-effort: the merge already succeeded, a leftover
                // temp file does not invalidate the result.
                let _ = fs::remove_file(path);
            }
        }
        Err(_) => {
            // Leave blocks in place for diagnosis/retry.
        }
    }
    result
}

fn merge_inner(
    readers: &mut [BlockReader],
    lookahead: &mut [Option<(String, BTreeMap<DocId, u32>)>],
) -> Result<BTreeMap<String, BTreeMap<DocId, u32>>> {
    let mut index: BTreeMap<String, BTreeMap<DocId, u32>> = BTreeMap::new();
    let mut active: Vec<bool> = vec![true; readers.len()];

    loop {
        for i in 0..readers.len() {
            if !active[i] || lookahead[i].is_some() {
                continue;
            }
            match readers[i].next_entry()? {
                Some(entry) => lookahead[i] = Some(entry),
                None => active[i] = false,
            }
        }

        let min_term = active
            .iter()
            .enumerate()
            .filter(|(_, &is_active)| is_active)
            .filter_map(|(i, _)| lookahead[i].as_ref().map(|(term, _)| term.clone()))
            .min();

        let Some(min_term) = min_term else {
            break;
        };

        let mut accumulator: BTreeMap<DocId, u32> = BTreeMap::new();
        for i in 0..readers.len() {
            if !active[i] {
                continue;
            }
            let matches = lookahead[i]
                .as_ref()
                .map(|(term, _)| *term == min_term)
                .unwrap_or(false);
            if matches {
                let (_, postings) = lookahead[i].take().unwrap();
                accumulator = merge_doc_maps(accumulator, postings);
            }
        }

        index.insert(min_term, accumulator);
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spimi::block::{build_blocks, TfMode};
    use crate::stemmer::Stemmer;
    use tempfile::TempDir;

    fn tokens(pairs: &[(DocId, &str)]) -> Vec<Result<(DocId, String)>> {
        pairs
            .iter()
            .map(|(d, t)| Ok((*d, t.to_string())))
            .collect()
    }

    #[test]
    fn merges_two_blocks_summing_shared_docids() {
        let tmp = TempDir::new().unwrap();
        let stemmer = Stemmer::new();
        let input = tokens(&[(0, "red"), (0, "blue"), (0, "red"), (1, "blue"), (1, "green")]);

        // Tiny budget forces a spill after every token, producing many blocks.
        let blocks =
            build_blocks(input.into_iter(), &stemmer, tmp.path(), 1, TfMode::Count).unwrap();
        assert!(blocks.len() > 1);

        let merged = merge_blocks(&blocks).unwrap();
        assert_eq!(merged["red"].get(&0), Some(&2));
        assert_eq!(merged["blue"].get(&0), Some(&1));
        assert_eq!(merged["blue"].get(&1), Some(&1));
        assert_eq!(merged["green"].get(&1), Some(&1));

        for block in &blocks {
            assert!(!block.exists(), "blocks must be deleted after a successful merge");
        }
    }

    #[test]
    fn single_block_merge_equals_unbounded_build() {
        let tmp_a = TempDir::new().unwrap();
        let tmp_b = TempDir::new().unwrap();
        let stemmer = Stemmer::new();
        let pairs: &[(DocId, &str)] = &[(0, "red"), (0, "blue"), (0, "red"), (1, "blue"), (1, "green")];

        let one_block = build_blocks(
            tokens(pairs).into_iter(),
            &stemmer,
            tmp_a.path(),
            usize::MAX,
            TfMode::Count,
        )
        .unwrap();
        let many_blocks = build_blocks(
            tokens(pairs).into_iter(),
            &stemmer,
            tmp_b.path(),
            1,
            TfMode::Count,
        )
        .unwrap();

        assert_eq!(merge_blocks(&one_block).unwrap(), merge_blocks(&many_blocks).unwrap());
    }

    #[test]
    fn corrupt_block_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let bad_path = tmp.path().join("block_0.txt");
        std::fs::write(&bad_path, "not-a-valid-line-without-tab\n").unwrap();

        let err = merge_blocks(&[bad_path.clone()]).unwrap_err();
        assert!(matches!(err, BiblionError::TempBlockCorruption { .. }));
        assert!(bad_path.exists(), "corrupt block is preserved for diagnosis");
    }
}
