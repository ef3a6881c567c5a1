//! Fuzzy make matching for misspelled vehicle makes ("toyoat" -> "Toyota").
//!
//! Hand-rolled Levenshtein rather than a pulled-in spellchecker: the table
//! of candidates is tiny (a few dozen makes) and the match needs a
//! confidence score derived from the distance, not just a boolean.

/// Space-efficient edit distance: two rows instead of a full matrix.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// A fuzzy match against one candidate: distance ≤ 2 and less than half the
/// canonical candidate's length, confidence `0.8 - 0.1 * distance`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub candidate: &'static str,
    pub distance: usize,
    pub confidence: f64,
}

/// Best candidate match for `word` among `candidates`, or `None` if nothing
/// clears the distance/length thresholds.
pub fn best_fuzzy_match(word: &str, candidates: &[&'static str]) -> Option<FuzzyMatch> {
    let word_lower = word.to_lowercase();
    candidates
        .iter()
        .filter_map(|candidate| {
            let candidate_lower = candidate.to_lowercase();
            let distance = levenshtein_distance(&word_lower, &candidate_lower);
            let half_len = candidate_lower.chars().count() / 2;
            if distance <= 2 && distance < half_len.max(1) {
                Some(FuzzyMatch {
                    candidate,
                    distance,
                    confidence: (0.8 - 0.1 * distance as f64).max(0.0),
                })
            } else {
                None
            }
        })
        .min_by_key(|m| m.distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_zero_distance() {
        assert_eq!(levenshtein_distance("bmw", "bmw"), 0);
    }

    #[test]
    fn single_substitution_has_distance_one() {
        assert_eq!(levenshtein_distance("honda", "honta"), 1);
    }

    #[test]
    fn misspelled_make_matches_canonical() {
        let m = best_fuzzy_match("toyoat", &["Toyota", "Tesla", "Honda"]).unwrap();
        assert_eq!(m.candidate, "Toyota");
        assert_eq!(m.distance, 2);
        assert!((m.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn short_candidate_guards_against_nonsense_matches() {
        assert!(best_fuzzy_match("kia", &["BMW"]).is_none());
    }

    #[test]
    fn no_match_beyond_distance_two() {
        assert!(best_fuzzy_match("xyz123", &["Toyota", "Honda", "Mazda"]).is_none());
    }
}
