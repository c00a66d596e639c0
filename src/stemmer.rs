use rust_stemmers::{Algorithm, Stemmer as RustStemmer};

/// Deterministic English Porter stemmer: token -> term.
///
/// Wraps `rust_stemmers` so the rest of the crate depends on this
/// newtype rather than the third-party crate directly.
pub struct Stemmer {
    inner: RustStemmer,
}

impl Stemmer {
    pub fn new() -> Self {
        Stemmer {
            inner: RustStemmer::create(Algorithm::English),
        }
    }

    /// Lowercase, then Porter-stem. Lowercasing lives here (not the
    /// tokenizer) because the source's stemmer does both in one call.
    pub fn stem(&self, token: &str) -> String {
        self.inner.stem(&token.to_lowercase()).into_owned()
    }
}

impl Default for Stemmer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_are_deterministic() {
        let stemmer = Stemmer::new();
        assert_eq!(stemmer.stem("running"), stemmer.stem("running"));
    }

    #[test]
    fn stems_common_suffixes() {
        let stemmer = Stemmer::new();
        assert_eq!(stemmer.stem("red"), "red");
        assert_eq!(stemmer.stem("blue"), "blue");
        assert_eq!(stemmer.stem("greens"), stemmer.stem("green"));
    }

    #[test]
    fn stemming_lowercases() {
        let stemmer = Stemmer::new();
        assert_eq!(stemmer.stem("Hello"), stemmer.stem("hello"));
        assert_eq!(stemmer.stem("RED"), "red");
    }
}
