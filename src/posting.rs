use crate::corpus::DocId;

/// A single `(docId, score)` pair. Score is the raw term frequency in an
/// on-disk posting, or an `f32` tf-idf weight once scored.
pub type Posting<S> = (DocId, S);

/// A postings list: strictly ascending in docId. This invariant is a hard
/// precondition and postcondition of every function in this module.
pub type Postings<S> = Vec<Posting<S>>;

/// Two-pointer intersection. Output score at a shared docId is the sum
/// of the input scores.
pub fn and_postings(a: &Postings<f32>, b: &Postings<f32>) -> Postings<f32> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push((a[i].0, a[i].1 + b[j].1));
                i += 1;
                j += 1;
            }
        }
    }
    result
}

/// Two-pointer union. At a shared docId, output score is the sum
/// (locked-in choice, see design notes); at a docId appearing in only
/// one input, the output carries that input's score unchanged.
pub fn or_postings(a: &Postings<f32>, b: &Postings<f32>) -> Postings<f32> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => {
                result.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                result.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                result.push((a[i].0, a[i].1 + b[j].1));
                i += 1;
                j += 1;
            }
        }
    }
    result.extend_from_slice(&a[i..]);
    result.extend_from_slice(&b[j..]);
    result
}

/// Dense complement over `[0, doc_count)`: every docId not present in
/// `a` gets a zero-score posting.
pub fn not_postings(a: &Postings<f32>, doc_count: u32) -> Postings<f32> {
    let mut result = Vec::new();
    let mut last_doc_id: i64 = -1;
    for &(doc_id, _) in a {
        for missing in (last_doc_id + 1)..(doc_id as i64) {
            result.push((missing as DocId, 0.0));
        }
        last_doc_id = doc_id as i64;
    }
    for missing in (last_doc_id + 1)..(doc_count as i64) {
        result.push((missing as DocId, 0.0));
    }
    result
}

/// `AND(NOT(x, N), y)` produced in one linear pass: emit `y`'s posting
/// iff its docId is not present in `x`. Scores come from `y` only.
pub fn not_and_postings(x: &Postings<f32>, y: &Postings<f32>) -> Postings<f32> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while j < y.len() {
        while i < x.len() && x[i].0 < y[j].0 {
            i += 1;
        }
        if i >= x.len() || x[i].0 != y[j].0 {
            result.push(y[j]);
        }
        j += 1;
    }
    result
}

/// `OR(NOT(x, N), y)`.
pub fn not_or_postings(x: &Postings<f32>, y: &Postings<f32>, doc_count: u32) -> Postings<f32> {
    or_postings(&not_postings(x, doc_count), y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(pairs: &[(u32, f32)]) -> Postings<f32> {
        pairs.to_vec()
    }

    #[test]
    fn and_sums_at_shared_docids() {
        let a = p(&[(0, 1.0), (2, 2.0), (5, 1.0)]);
        let b = p(&[(2, 3.0), (5, 1.0), (7, 9.0)]);
        assert_eq!(and_postings(&a, &b), p(&[(2, 5.0), (5, 2.0)]));
    }

    #[test]
    fn or_sums_at_shared_docids_and_keeps_disjoint() {
        let a = p(&[(0, 1.0), (2, 2.0)]);
        let b = p(&[(2, 3.0), (3, 4.0)]);
        assert_eq!(or_postings(&a, &b), p(&[(0, 1.0), (2, 5.0), (3, 4.0)]));
    }

    #[test]
    fn not_is_dense_complement() {
        let a = p(&[(1, 1.0)]);
        assert_eq!(not_postings(&a, 3), p(&[(0, 0.0), (2, 0.0)]));
    }

    #[test]
    fn and_with_its_own_complement_is_empty() {
        let a = p(&[(0, 2.0), (2, 1.0)]);
        let not_a = not_postings(&a, 3);
        assert_eq!(and_postings(&a, &not_a), Postings::<f32>::new());
    }

    #[test]
    fn or_with_its_own_complement_covers_every_doc() {
        let a = p(&[(0, 2.0), (2, 1.0)]);
        let not_a = not_postings(&a, 3);
        let combined = or_postings(&a, &not_a);
        assert_eq!(combined.len(), 3);
        let mut ids: Vec<u32> = combined.iter().map(|(d, _)| *d).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn and_with_itself_is_itself_doubled() {
        let a = p(&[(0, 1.0), (1, 2.0)]);
        assert_eq!(and_postings(&a, &a), p(&[(0, 2.0), (1, 4.0)]));
    }

    #[test]
    fn double_not_zeroes_scores_but_keeps_docids() {
        let a = p(&[(0, 1.0), (2, 3.0)]);
        let not_a = not_postings(&a, 3);
        let not_not_a = not_postings(&not_a, 3);
        let ids: Vec<u32> = not_not_a.iter().map(|(d, _)| *d).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(not_not_a.iter().all(|(_, s)| *s == 0.0));
    }

    #[test]
    fn not_and_excludes_xs_docids_from_y() {
        let x = p(&[(1, 1.0), (3, 1.0)]);
        let y = p(&[(0, 5.0), (1, 5.0), (2, 5.0), (3, 5.0), (4, 5.0)]);
        assert_eq!(not_and_postings(&x, &y), p(&[(0, 5.0), (2, 5.0), (4, 5.0)]));
        assert_eq!(not_and_postings(&x, &y), and_postings(&not_postings(&x, 5), &y));
    }

    #[test]
    fn not_or_matches_composition() {
        let x = p(&[(1, 1.0)]);
        let y = p(&[(2, 5.0)]);
        assert_eq!(
            not_or_postings(&x, &y, 4),
            or_postings(&not_postings(&x, 4), &y)
        );
    }
}
