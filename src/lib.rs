//! Offline boolean/tf-idf search over a corpus of plain-text documents
//! organized as `<root>/<author>/<title>.<ext>`.
//!
//! Three coupled stages: a SPIMI indexer builds a term -> posting map
//! under a bounded memory budget, spilling sorted blocks and merging
//! them on disk ([`spimi`]); a scorer turns raw term frequencies into
//! tf-idf weights ([`scorer`]); and a recursive-descent query evaluator
//! combines scored postings with `AND`/`OR`/`NOT` ([`query`],
//! [`posting`]). [`index`] and [`name_index`] wire the pieces together
//! into buildable, queryable, persisted indexes.

pub mod corpus;
pub mod error;
pub mod index;
pub mod name_index;
pub mod posting;
pub mod query;
pub mod scorer;
pub mod spimi;
pub mod stemmer;
pub mod tokenizer;

pub use corpus::{Corpus, DocId};
pub use error::{BiblionError, Result};
pub use index::{build_index, build_index_parallel, close, open_index, query as run_query, IndexHandle};
pub use name_index::{build_name_index, open_name_index, NameIndexHandle};
pub use query::Hit;
