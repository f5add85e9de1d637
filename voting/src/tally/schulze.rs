use super::TallyResult;

/// Builds the pairwise preference matrix, closes it over widest paths and returns
/// the option whose path strength meets or beats every rival's. When several do, the
/// lowest id wins and the result is marked tiebroken.
///
/// An option a ballot does not rank sits below every option it does rank.
pub fn tally(options: &[String], ballots: &[Vec<String>]) -> Option<TallyResult> {
    let mut candidates: Vec<&str> = options.iter().map(String::as_str).collect();
    candidates.sort_unstable();
    candidates.dedup();
    let n = candidates.len();

    let positions: Vec<Vec<usize>> = ballots
        .iter()
        .map(|ballot| {
            candidates
                .iter()
                .map(|c| {
                    ballot
                        .iter()
                        .position(|o| o == c)
                        .unwrap_or(usize::MAX)
                })
                .collect::<Vec<_>>()
        })
        .filter(|pos| pos.iter().any(|p| *p != usize::MAX))
        .collect();
    if n == 0 || positions.is_empty() {
        return None;
    }

    let mut d = vec![vec![0usize; n]; n];
    for pos in &positions {
        for i in 0..n {
            for j in 0..n {
                if i != j && pos[i] < pos[j] {
                    d[i][j] += 1;
                }
            }
        }
    }

    let mut p = vec![vec![0usize; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && d[i][j] > d[j][i] {
                p[i][j] = d[i][j];
            }
        }
    }
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            for k in 0..n {
                if i != k && j != k {
                    p[j][k] = p[j][k].max(p[j][i].min(p[i][k]));
                }
            }
        }
    }

    let winners: Vec<usize> = (0..n)
        .filter(|&x| (0..n).all(|y| x == y || p[x][y] >= p[y][x]))
        .collect();
    let first = *winners.first()?;
    Some(TallyResult {
        winner: candidates[first].to_string(),
        tiebroken: winners.len() > 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::{ballots, options};

    fn repeat(groups: &[(usize, &str)]) -> Vec<Vec<String>> {
        groups
            .iter()
            .flat_map(|(count, order)| ballots(&[*order]).into_iter().cycle().take(*count))
            .collect()
    }

    #[test]
    fn test_textbook_election() {
        let votes = repeat(&[
            (5, "ACBED"),
            (5, "ADECB"),
            (8, "BEDAC"),
            (3, "CABED"),
            (7, "CAEBD"),
            (2, "CBADE"),
            (7, "DCEBA"),
            (8, "EBADC"),
        ]);
        assert_eq!(votes.len(), 45);
        let result = tally(&options("ABCDE"), &votes).unwrap();
        assert_eq!(
            result,
            TallyResult {
                winner: "E".into(),
                tiebroken: false
            }
        );
    }

    #[test]
    fn test_condorcet_cycle_is_tiebroken() {
        let result = tally(&options("ABC"), &ballots(&["ABC", "BCA", "CAB"])).unwrap();
        assert_eq!(
            result,
            TallyResult {
                winner: "A".into(),
                tiebroken: true
            }
        );
    }

    #[test]
    fn test_partial_rankings() {
        // Unranked options trail ranked ones, so B beats C on every ballot.
        let result = tally(&options("ABC"), &ballots(&["B", "B", "AB"])).unwrap();
        assert_eq!(result.winner, "B");
        assert!(!result.tiebroken);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let votes = ballots(&["CBA", "BCA", "ACB"]);
        let forward = tally(&options("ABC"), &votes);
        let backward = tally(&options("CBA"), &votes);
        assert_eq!(forward, backward);
    }
}
