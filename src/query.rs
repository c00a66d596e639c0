use std::fs;
use std::path::Path;

use crate::error::{BiblionError, Result};
use crate::posting::Postings;
use crate::stemmer::Stemmer;

const SNIPPET_WINDOW: usize = 20;

/// Anything an evaluator needs to resolve a leaf term: a scored posting
/// list (empty if the stemmed term is absent -- not an error) and the
/// document count `NOT` needs for its dense complement.
pub trait TermSource {
    fn score_term(&self, stemmed_term: &str) -> Result<Postings<f32>>;
    fn doc_count(&self) -> u32;
}

/// Whitespace-separated tokenization of the query string. Uppercase
/// `AND`/`OR`/`NOT` are reserved operators (case-sensitive); everything
/// else is a term literal.
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_owned).collect()
}

fn first_index(tokens: &[String], op: &str) -> Option<usize> {
    tokens.iter().position(|t| t == op)
}

/// Recursive-descent evaluation over a token slice. Precedence `OR` <
/// `AND` < `NOT`; the first occurrence of the lowest-precedence operator
/// present splits the slice (left-associative by construction, which is
/// semantically immaterial since `OR`/`AND` are commutative and `NOT` is
/// unary). An empty slice reaching this function is always a syntax
/// error -- the only valid empty input is the whole query, handled by
/// `evaluate` before recursion starts.
fn eval_expr<T: TermSource>(
    tokens: &[String],
    stemmer: &Stemmer,
    source: &T,
) -> Result<Postings<f32>> {
    if let Some(split) = first_index(tokens, "OR") {
        let left = eval_expr(&tokens[..split], stemmer, source)?;
        let right = eval_expr(&tokens[split + 1..], stemmer, source)?;
        return Ok(crate::posting::or_postings(&left, &right));
    }

    if let Some(split) = first_index(tokens, "AND") {
        let left = eval_expr(&tokens[..split], stemmer, source)?;
        let right = eval_expr(&tokens[split + 1..], stemmer, source)?;
        return Ok(crate::posting::and_postings(&left, &right));
    }

    if let Some(split) = first_index(tokens, "NOT") {
        if split != 0 {
            return Err(BiblionError::QuerySyntax(
                "NOT must be the first token of its operand".to_string(),
            ));
        }
        let right = eval_expr(&tokens[1..], stemmer, source)?;
        return Ok(crate::posting::not_postings(&right, source.doc_count()));
    }

    match tokens.len() {
        0 => Err(BiblionError::QuerySyntax(
            "empty operand between operators".to_string(),
        )),
        1 => {
            let term = stemmer.stem(&tokens[0]);
            source.score_term(&term)
        }
        _ => Err(BiblionError::QuerySyntax(format!(
            "terms must be joined by AND/OR/NOT, found adjacent terms: {:?}",
            tokens
        ))),
    }
}

/// Parse and evaluate a full query string. Empty query -> empty result,
/// no error. Otherwise delegates to the recursive-descent evaluator and
/// re-sorts the result by score descending (breaking the docId
/// invariant -- scored results are a distinct output type from internal
/// postings).
pub fn evaluate<T: TermSource>(
    query: &str,
    stemmer: &Stemmer,
    source: &T,
) -> Result<Postings<f32>> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut result = eval_expr(&tokens, stemmer, source)?;
    result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(result)
}

/// A single ranked query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub doc_id: u32,
    pub score: f32,
    pub path: std::path::PathBuf,
    pub snippet: Option<String>,
}

/// Plain-text snippet around the first occurrence of a stemmed query
/// term inside the raw (lowercased) document text. No ANSI highlighting
/// -- that is presentation, left to the caller.
pub fn extract_snippet(path: &Path, query_terms: &[String], stemmer: &Stemmer) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let lowered = text.to_lowercase();

    for token in query_terms {
        if token == "AND" || token == "OR" || token == "NOT" {
            continue;
        }
        let needle = stemmer.stem(token);
        if needle.is_empty() {
            continue;
        }
        if let Some(pos) = lowered.find(&needle) {
            let start = pos.saturating_sub(SNIPPET_WINDOW);
            let end = lowered[pos..]
                .find('\n')
                .map(|rel| pos + rel)
                .unwrap_or(text.len());
            // start/end are byte offsets into `lowered`, which is the
            // same length and char-boundary-compatible as `text` for the
            // ASCII-biased corpora this crate targets.
            let start = floor_char_boundary(&text, start);
            let end = ceil_char_boundary(&text, end);
            return Some(text[start..end].to_string());
        }
    }
    None
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
