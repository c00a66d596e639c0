use std::collections::BTreeMap;

use crate::corpus::DocId;
use crate::error::{BiblionError, Result};
use crate::posting::Postings;

/// Score a term's raw `docId -> tf` posting into a sorted `(docId,
/// tfidf)` list: `tf / wc[d] * log2(N / df)`, where `df` is the number
/// of documents carrying the term and `N` is the total document count.
///
/// Division by a zero-word document is undefined; this is fail-fast per
/// the design's error handling policy, not silently skipped or
/// defaulted to 1.
pub fn score_term<F>(
    tf: &BTreeMap<DocId, u32>,
    doc_count: u32,
    word_count: F,
) -> Result<Postings<f32>>
where
    F: Fn(DocId) -> u32,
{
    let df = tf.len() as f32;
    let idf = (doc_count as f32 / df).log2();

    let mut scored = Vec::with_capacity(tf.len());
    for (&doc_id, &term_freq) in tf.iter() {
        let wc = word_count(doc_id);
        if wc == 0 {
            // The scorer has no notion of paths; callers that do (e.g.
            // `IndexHandle::score_term`) rewrite `path` with the real one.
            return Err(BiblionError::EmptyDocument {
                doc_id,
                path: std::path::PathBuf::new(),
            });
        }
        scored.push((doc_id, term_freq as f32 / wc as f32 * idf));
    }
    Ok(scored)
}
