//! # Greedy longest-first truncation
//!
//! Truncation only ever removes tokens from the end of a sequence, so every function here
//! returns prefixes of its inputs and never mutates them. The same tokenization can be
//! truncated again with a different budget.

use serde::{Deserialize, Serialize};

/// Truncates a sequence pair to a combined maximum length.
///
/// One token at a time is removed from the end of whichever sequence is currently longer,
/// the second sequence losing the token on ties. A short sequence is left untouched as long as
/// truncating the other one is enough to fit the budget.
///
/// # Example
///
/// ```no_run
/// use bert_finetune::features::truncate_seq_pair;
/// let tokens_a = ["a"; 10];
/// let tokens_b = ["b"; 2];
/// let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, 5);
/// assert_eq!((a.len(), b.len()), (3, 2));
/// ```
pub fn truncate_seq_pair<'a, T>(
    tokens_a: &'a [T],
    tokens_b: &'a [T],
    max_length: usize,
) -> (&'a [T], &'a [T]) {
    let (mut len_a, mut len_b) = (tokens_a.len(), tokens_b.len());
    while len_a + len_b > max_length {
        if len_a > len_b {
            len_a -= 1;
        } else {
            len_b -= 1;
        }
    }
    (&tokens_a[..len_a], &tokens_b[..len_b])
}

/// Truncates a single sequence from the end to at most `max_length` tokens
pub fn truncate_single<T>(tokens: &[T], max_length: usize) -> &[T] {
    &tokens[..tokens.len().min(max_length)]
}

/// Longest-first truncation generalized to any number of sequences. The last of the longest
/// sequences loses a token at each step, which reduces to `truncate_seq_pair` for two sequences.
pub fn truncate_longest_first<'a, T>(sequences: &[&'a [T]], max_length: usize) -> Vec<&'a [T]> {
    let mut lengths: Vec<usize> = sequences.iter().map(|sequence| sequence.len()).collect();
    while lengths.iter().sum::<usize>() > max_length {
        let mut longest = 0;
        for (idx, length) in lengths.iter().enumerate() {
            if *length >= lengths[longest] {
                longest = idx;
            }
        }
        lengths[longest] -= 1;
    }
    sequences
        .iter()
        .zip(lengths.iter())
        .map(|(sequence, length)| &sequence[..*length])
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// # Truncation applied to the text fields of one option slot
pub enum MultiFieldTruncation {
    /// Only the first two fields are truncated (pairwise longest-first), any third or fourth
    /// field is kept whole. Matches the encoding of previously trained multiple choice models.
    FirstPair,
    /// Longest-first truncation across every present field
    AllFields,
}

impl Default for MultiFieldTruncation {
    fn default() -> Self {
        MultiFieldTruncation::FirstPair
    }
}

impl MultiFieldTruncation {
    /// Truncates the fields of one option slot to the `max_length` budget. A lone field is
    /// cut from its end whatever the strategy.
    pub fn truncate<'a, T>(&self, fields: &[&'a [T]], max_length: usize) -> Vec<&'a [T]> {
        match fields {
            [] => vec![],
            [single] => vec![truncate_single(*single, max_length)],
            [first, second, rest @ ..] => match self {
                MultiFieldTruncation::FirstPair => {
                    let (first, second) = truncate_seq_pair(*first, *second, max_length);
                    let mut truncated = vec![first, second];
                    truncated.extend(rest.iter().copied());
                    truncated
                }
                MultiFieldTruncation::AllFields => truncate_longest_first(fields, max_length),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|idx| format!("{}{}", prefix, idx)).collect()
    }

    #[test]
    fn longer_sequence_is_truncated_first() {
        let tokens_a = tokens("a", 10);
        let tokens_b = tokens("b", 2);
        let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, 5);
        assert_eq!(a.len() + b.len(), 5);
        assert_eq!(a, &tokens_a[..3]);
        assert_eq!(b, tokens_b.as_slice());
    }

    #[test]
    fn ties_truncate_second_sequence() {
        let tokens_a = tokens("a", 3);
        let tokens_b = tokens("b", 3);
        let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, 5);
        assert_eq!((a.len(), b.len()), (3, 2));
        let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, 4);
        assert_eq!((a.len(), b.len()), (2, 2));
    }

    #[test]
    fn pair_within_budget_is_untouched() {
        let tokens_a = tokens("a", 4);
        let tokens_b = tokens("b", 4);
        let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, 8);
        assert_eq!((a.len(), b.len()), (4, 4));
        let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, 0);
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn combined_length_reaches_budget_exactly() {
        for len_a in 0..12 {
            for len_b in 0..12 {
                let tokens_a = tokens("a", len_a);
                let tokens_b = tokens("b", len_b);
                for budget in 0..20 {
                    let (a, b) = truncate_seq_pair(&tokens_a, &tokens_b, budget);
                    assert_eq!(a.len() + b.len(), (len_a + len_b).min(budget));
                }
            }
        }
    }

    #[test]
    fn single_sequence_truncation() {
        let tokens_a = tokens("a", 10);
        assert_eq!(truncate_single(&tokens_a, 8).len(), 8);
        assert_eq!(truncate_single(&tokens_a, 20).len(), 10);
    }

    #[test]
    fn first_pair_leaves_extra_fields_alone() {
        let a = tokens("a", 6);
        let b = tokens("b", 6);
        let c = tokens("c", 6);
        let truncated =
            MultiFieldTruncation::FirstPair.truncate(&[a.as_slice(), b.as_slice(), c.as_slice()], 8);
        let lengths: Vec<usize> = truncated.iter().map(|field| field.len()).collect();
        assert_eq!(lengths, vec![4, 4, 6]);
    }

    #[test]
    fn all_fields_truncation_respects_budget() {
        let a = tokens("a", 6);
        let b = tokens("b", 2);
        let c = tokens("c", 6);
        let truncated =
            MultiFieldTruncation::AllFields.truncate(&[a.as_slice(), b.as_slice(), c.as_slice()], 8);
        let lengths: Vec<usize> = truncated.iter().map(|field| field.len()).collect();
        assert_eq!(lengths, vec![3, 2, 3]);
    }

    #[test]
    fn generalized_truncation_matches_pairwise_rule() {
        for len_a in 0..8 {
            for len_b in 0..8 {
                let a = tokens("a", len_a);
                let b = tokens("b", len_b);
                for budget in 0..12 {
                    let (pair_a, pair_b) = truncate_seq_pair(&a, &b, budget);
                    let all = truncate_longest_first(&[a.as_slice(), b.as_slice()], budget);
                    assert_eq!(all, vec![pair_a, pair_b]);
                }
            }
        }
    }
}
