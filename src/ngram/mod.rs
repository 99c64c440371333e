//! Positional n-gram synthesis
//!
//! Rebuilds a filtered document into phrases. Every surviving token is a
//! unigram; pairs of surviving tokens whose source positions differ by one
//! become bigrams (`"a b"`), and pairs two positions apart become skip-grams
//! (`"a - b"`) standing in for a trigram whose middle token was removed.
//!
//! The pair walk moves two cursors `(i, j)` over the surviving tokens:
//!
//! ```text
//! gap > 2        -> (i + 1, min(i + 2, last))
//! gap 1 or 2     -> emit, then (i + 1, j) if j is last, else (i, j + 1)
//! i == j         -> stop
//! ```
//!
//! The walk is a flat loop, so document length does not affect stack depth.

use crate::error::{CorpdiffError, Result};
use crate::models::{Phrase, PositionedToken};
use tracing::trace;

/// Largest position gap that still forms a phrase
const MAX_GAP: usize = 2;

/// Synthesize unigrams, bigrams and skip-grams for one document.
///
/// Unigrams come first in source order, followed by the multi-word phrases
/// in walk order. Positions must be strictly increasing.
pub fn synthesize(tokens: &[PositionedToken]) -> Result<Vec<Phrase>> {
    check_positions(tokens)?;

    let mut phrases: Vec<Phrase> = tokens
        .iter()
        .map(|t| Phrase::Unigram(t.token.clone()))
        .collect();

    let Some(last) = tokens.len().checked_sub(1) else {
        return Ok(phrases);
    };

    let (mut i, mut j) = (0usize, 1usize);
    loop {
        let (left, right) = (i.min(last), j.min(last));
        if left == right {
            break;
        }
        let (first, second) = (&tokens[left], &tokens[right]);
        let gap = second.position - first.position;
        trace!(
            "pair ({}, {}): '{}'@{} '{}'@{}",
            i,
            j,
            first.token,
            first.position,
            second.token,
            second.position
        );

        if gap > MAX_GAP {
            i += 1;
            j = (i + 1).min(last);
            continue;
        }

        match gap {
            1 => phrases.push(Phrase::Bigram(first.token.clone(), second.token.clone())),
            2 => phrases.push(Phrase::SkipGram(first.token.clone(), second.token.clone())),
            _ => {
                return Err(CorpdiffError::InvariantViolation {
                    position: second.position,
                    previous: first.position,
                })
            }
        }

        if j >= last {
            i += 1;
        } else {
            j += 1;
        }
    }

    Ok(phrases)
}

/// Reject sequences whose positions are not strictly increasing
fn check_positions(tokens: &[PositionedToken]) -> Result<()> {
    for pair in tokens.windows(2) {
        if pair[1].position <= pair[0].position {
            return Err(CorpdiffError::InvariantViolation {
                position: pair[1].position,
                previous: pair[0].position,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(pairs: &[(&str, usize)]) -> Vec<PositionedToken> {
        pairs.iter().map(|(w, p)| PositionedToken::new(*w, *p)).collect()
    }

    fn render(pairs: &[(&str, usize)]) -> Vec<String> {
        synthesize(&words(pairs))
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_empty_and_single() {
        assert!(synthesize(&[]).unwrap().is_empty());
        assert_eq!(render(&[("oneword", 0)]), vec!["oneword"]);
        assert_eq!(render(&[("oneword", 7)]), vec!["oneword"]);
    }

    #[test]
    fn test_no_multigrams_when_gaps_too_wide() {
        assert_eq!(render(&[("most", 0), ("like", 3)]), vec!["most", "like"]);
        assert_eq!(
            render(&[("most", 0), ("like", 3), ("but", 8)]),
            vec!["most", "like", "but"]
        );
        assert_eq!(
            render(&[("most", 0), ("like", 3), ("but", 8), ("never", 15)]),
            vec!["most", "like", "but", "never"]
        );
    }

    #[test]
    fn test_simple_sentence() {
        assert_eq!(
            render(&[("most", 0), ("cats", 1), ("sleep", 2)]),
            vec!["most", "cats", "sleep", "most cats", "most - sleep", "cats sleep"]
        );
    }

    #[test]
    fn test_longer_sentence() {
        let phrases = render(&[
            ("most", 0),
            ("cats", 1),
            ("sleep", 2),
            ("during", 3),
            ("the", 4),
            ("day", 5),
        ]);
        assert_eq!(
            phrases,
            vec![
                "most", "cats", "sleep", "during", "the", "day",
                "most cats", "most - sleep", "cats sleep", "cats - during",
                "sleep during", "sleep - the", "during the", "during - day",
                "the day",
            ]
        );
    }

    #[test]
    fn test_gaps_from_removed_tokens() {
        assert_eq!(
            render(&[("most", 0), ("sleep", 2), ("during", 3), ("day", 5)]),
            vec!["most", "sleep", "during", "day", "most - sleep", "sleep during", "during - day"]
        );
        assert_eq!(
            render(&[("most", 0), ("sleep", 3), ("during", 4), ("next", 6), ("day", 7)]),
            vec![
                "most",
                "sleep",
                "during",
                "next",
                "day",
                "sleep during",
                "during - next",
                "next day",
            ]
        );
    }

    #[test]
    fn test_gap_semantics() {
        assert_eq!(render(&[("w0", 0), ("w1", 1)]), vec!["w0", "w1", "w0 w1"]);
        assert_eq!(render(&[("w0", 0), ("w2", 2)]), vec!["w0", "w2", "w0 - w2"]);
    }

    #[test]
    fn test_unfiltered_document_counts() {
        let n = 50;
        let tokens: Vec<PositionedToken> =
            (0..n).map(|i| PositionedToken::new(format!("w{}", i), i)).collect();
        let phrases = synthesize(&tokens).unwrap();

        let unigrams = phrases.iter().filter(|p| matches!(p, Phrase::Unigram(_))).count();
        let bigrams = phrases.iter().filter(|p| matches!(p, Phrase::Bigram(..))).count();
        let skips = phrases.iter().filter(|p| matches!(p, Phrase::SkipGram(..))).count();
        assert_eq!(unigrams, n);
        assert_eq!(bigrams, n - 1);
        assert_eq!(skips, n - 2);
    }

    #[test]
    fn test_long_document_does_not_exhaust_stack() {
        let n = 200_000;
        let tokens: Vec<PositionedToken> = (0..n)
            .map(|i| PositionedToken::new("w", i * 2))
            .collect();
        let phrases = synthesize(&tokens).unwrap();
        assert_eq!(phrases.len(), n + (n - 1));
    }

    #[test]
    fn test_invariant_violations() {
        let repeated = words(&[("a", 0), ("b", 0)]);
        assert!(matches!(
            synthesize(&repeated),
            Err(CorpdiffError::InvariantViolation { position: 0, previous: 0 })
        ));

        let backwards = words(&[("a", 4), ("b", 2)]);
        assert!(matches!(
            synthesize(&backwards),
            Err(CorpdiffError::InvariantViolation { position: 2, previous: 4 })
        ));
    }
}
