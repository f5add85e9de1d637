use super::TallyResult;
use std::collections::{BTreeMap, BTreeSet};

/// Counts first preferences among the remaining options until one holds a strict
/// majority of the ballots still in play, eliminating the weakest option each round.
/// Among equally weak options the lowest id goes first and the result is marked
/// tiebroken. Exhausted ballots drop out of the count.
pub fn tally(options: &[String], ballots: &[Vec<String>]) -> Option<TallyResult> {
    let mut remaining: BTreeSet<&str> = options.iter().map(String::as_str).collect();
    let ranks_any = ballots
        .iter()
        .any(|ballot| ballot.iter().any(|o| remaining.contains(o.as_str())));
    if remaining.is_empty() || !ranks_any {
        return None;
    }

    let mut tiebroken = false;
    loop {
        if remaining.len() == 1 {
            let winner = remaining.iter().next()?.to_string();
            return Some(TallyResult { winner, tiebroken });
        }

        let mut counts: BTreeMap<&str, usize> = remaining.iter().map(|o| (*o, 0)).collect();
        let mut total = 0;
        for ballot in ballots {
            let first = ballot
                .iter()
                .map(String::as_str)
                .find(|o| remaining.contains(o));
            if let Some(first) = first {
                *counts.entry(first).or_default() += 1;
                total += 1;
            }
        }

        if let Some((leader, _)) = counts.iter().find(|(_, count)| **count * 2 > total) {
            return Some(TallyResult {
                winner: leader.to_string(),
                tiebroken,
            });
        }

        let fewest = counts.values().copied().min()?;
        let weakest: Vec<&str> = counts
            .iter()
            .filter(|(_, count)| **count == fewest)
            .map(|(option, _)| *option)
            .collect();
        if weakest.len() > 1 {
            tiebroken = true;
        }
        remaining.remove(weakest[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::{ballots, options};

    #[test]
    fn test_first_round_majority() {
        let result = tally(&options("ABC"), &ballots(&["ABC", "ACB", "BAC"])).unwrap();
        assert_eq!(
            result,
            TallyResult {
                winner: "A".into(),
                tiebroken: false
            }
        );
    }

    #[test]
    fn test_elimination_with_three_way_tie() {
        let result = tally(&options("ABC"), &ballots(&["ABC", "BCA", "CBA"])).unwrap();
        assert_eq!(
            result,
            TallyResult {
                winner: "B".into(),
                tiebroken: true
            }
        );
    }

    #[test]
    fn test_unique_weakest_is_not_a_tiebreak() {
        // Round one: A 2, B 2, C 1. C goes, its ballot moves to B.
        let result = tally(&options("ABC"), &ballots(&["AB", "AC", "BA", "BC", "CB"])).unwrap();
        assert_eq!(
            result,
            TallyResult {
                winner: "B".into(),
                tiebroken: false
            }
        );
    }

    #[test]
    fn test_exhausted_ballots_leave_the_count() {
        // D goes alone and its ballot ranks nothing else; A then holds 3 of 5.
        let result = tally(&options("ABD"), &ballots(&["A", "A", "A", "B", "B", "D"])).unwrap();
        assert_eq!(result.winner, "A");
        assert!(!result.tiebroken);
    }

    #[test]
    fn test_unranked_options_are_eliminated_first() {
        let result = tally(&options("ABCD"), &ballots(&["B", "C"])).unwrap();
        // A and D hold nothing; A goes on the lower id, then D, then B loses the B/C tie.
        assert_eq!(result.winner, "C");
        assert!(result.tiebroken);
    }

    #[test]
    fn test_ballots_naming_unknown_options_do_not_count() {
        assert_eq!(tally(&options("AB"), &ballots(&["Z"])), None);
    }
}
