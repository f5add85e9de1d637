//! # Tally
//!
//! Both methods take the event's live option ids and one preference list per voter
//! (most preferred first, unranked options omitted) and return the winner. Ties are
//! always resolved toward the lowest option id, so repeated runs over the same
//! ballots agree.

use crate::models::ElectionMethod;

/// Instant-runoff voting.
pub mod irv;

/// The Schulze method.
pub mod schulze;

/// The winner of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyResult {
    /// The winning option id.
    pub winner: String,
    /// Whether the lowest-id rule decided between otherwise equal options.
    pub tiebroken: bool,
}

/// Runs `method` over `ballots`. `None` when there are no options or no ballot ranks any.
pub fn tally(method: ElectionMethod, options: &[String], ballots: &[Vec<String>]) -> Option<TallyResult> {
    match method {
        ElectionMethod::InstantRunoff => irv::tally(options, ballots),
        ElectionMethod::Schulze => schulze::tally(options, ballots),
    }
}

#[cfg(test)]
pub(crate) fn ballots(raw: &[&str]) -> Vec<Vec<String>> {
    raw.iter()
        .map(|b| b.chars().map(|c| c.to_string()).collect())
        .collect()
}

#[cfg(test)]
pub(crate) fn options(raw: &str) -> Vec<String> {
    raw.chars().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_agree_on_a_clear_favourite() {
        let opts = options("ABC");
        let votes = ballots(&["ABC", "ACB", "BAC"]);
        for method in [ElectionMethod::InstantRunoff, ElectionMethod::Schulze] {
            let result = tally(method, &opts, &votes).unwrap();
            assert_eq!(result.winner, "A", "{}", method);
            assert!(!result.tiebroken);
        }
    }

    #[test]
    fn test_no_ballots_no_winner() {
        for method in [ElectionMethod::InstantRunoff, ElectionMethod::Schulze] {
            assert_eq!(tally(method, &options("AB"), &[]), None);
            assert_eq!(tally(method, &[], &ballots(&["A"])), None);
        }
    }
}
