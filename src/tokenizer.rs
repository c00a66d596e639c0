use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{BiblionError, Result};

/// ASCII punctuation stripped from every line before splitting on whitespace.
const PUNCTUATION: &[char] = &[
    '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', ':', ';', '<',
    '=', '>', '?', '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}', '~',
];

/// Strip ASCII punctuation, trim trailing whitespace, split on ASCII
/// whitespace. Shared by the body tokenizer (per-line) and the name
/// tokenizer (single in-memory string).
fn tokens_of(line: &str) -> Vec<String> {
    let stripped: String = line.chars().filter(|c| !PUNCTUATION.contains(c)).collect();
    stripped
        .trim_end()
        .split_ascii_whitespace()
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Lazy, one-shot, sequential stream of `(docId, token)` pairs over a list
/// of file paths, in the order given. Bounded memory: one line buffer plus
/// the current line's token backlog.
pub struct BodyTokenStream<'p> {
    paths: &'p [PathBuf],
    file_idx: usize,
    lines: Option<Lines<BufReader<File>>>,
    pending: std::vec::IntoIter<String>,
}

impl<'p> BodyTokenStream<'p> {
    pub fn new(paths: &'p [PathBuf]) -> Self {
        BodyTokenStream {
            paths,
            file_idx: 0,
            lines: None,
            pending: Vec::new().into_iter(),
        }
    }

    fn open_next_file(&mut self) -> Result<bool> {
        while self.file_idx < self.paths.len() {
            let path = &self.paths[self.file_idx];
            let file = File::open(path).map_err(|source| BiblionError::CorpusIo {
                path: path.clone(),
                source,
            })?;
            self.lines = Some(BufReader::new(file).lines());
            self.file_idx += 1;
            return Ok(true);
        }
        Ok(false)
    }
}

impl<'p> Iterator for BodyTokenStream<'p> {
    type Item = Result<(u32, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.next() {
                // file_idx was already advanced past the file this line came from.
                let doc_id = (self.file_idx - 1) as u32;
                return Some(Ok((doc_id, token)));
            }

            if self.lines.is_none() {
                match self.open_next_file() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e)),
                }
            }

            match self.lines.as_mut().unwrap().next() {
                Some(Ok(line)) => {
                    self.pending = tokens_of(&line).into_iter();
                }
                Some(Err(source)) => {
                    let path = self.paths[self.file_idx - 1].clone();
                    return Some(Err(BiblionError::CorpusIo { path, source }));
                }
                None => {
                    // This file is exhausted; move on to the next.
                    self.lines = None;
                }
            }
        }
    }
}

/// Tokenize the `"<author> <title>"` pair derived from a relative path,
/// for the secondary name index (4.7). No line iteration (the whole pair
/// is one in-memory string); the same ASCII punctuation stripping as the
/// body tokenizer applies.
pub fn name_tokens(relative_path: &Path) -> Vec<String> {
    let mut components: Vec<String> = relative_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    // Drop the file extension from the title component, if present.
    if let Some(last) = components.last_mut() {
        if let Some(stem) = Path::new(last.as_str()).file_stem() {
            *last = stem.to_string_lossy().into_owned();
        }
    }
    tokens_of(&components.join(" "))
}
