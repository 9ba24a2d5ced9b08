//! Distribution of ranked teams into named groups
//!
//! A pattern is a list of 1-indexed ranks per group. [`serpentine`] builds the snake pattern
//! that balances group strength, [`split`] builds contiguous blocks. [`distribute`] applies a
//! pattern to a ranking.
use std::collections::HashSet;

use crate::utils::group_name;
use crate::{Error, Result, TeamId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named group of teams.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    pub name: String,
    pub teams: Vec<TeamId>,
}

impl Group {
    #[inline]
    pub fn new<S>(name: S, teams: Vec<TeamId>) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            teams,
        }
    }
}

/// Returns the snake pattern for `teams` ranks over `groups` groups. The group index advances
/// forward, then reverses at the boundary.
///
/// # Examples
///
/// ```
/// # use competition_core::groups::serpentine;
/// assert_eq!(serpentine(2, 8), [vec![1, 4, 5, 8], vec![2, 3, 6, 7]]);
/// ```
pub fn serpentine(groups: usize, teams: usize) -> Vec<Vec<usize>> {
    let mut pattern = vec![Vec::new(); groups];
    if groups == 0 {
        return pattern;
    }

    for index in 0..teams {
        let pass = index / groups;
        let offset = index % groups;

        let group = if pass % 2 == 0 {
            offset
        } else {
            groups - offset - 1
        };

        pattern[group].push(index + 1);
    }

    pattern
}

/// Returns a pattern of contiguous blocks of ranks for `groups` groups. If `teams` is not
/// divisible by `groups`, the first groups receive one more team.
///
/// # Examples
///
/// ```
/// # use competition_core::groups::split;
/// assert_eq!(split(2, 5), [vec![1, 2, 3], vec![4, 5]]);
/// ```
pub fn split(groups: usize, teams: usize) -> Vec<Vec<usize>> {
    if groups == 0 {
        return Vec::new();
    }

    let base = teams / groups;
    let extra = teams % groups;

    let mut next = 1;
    (0..groups)
        .map(|group| {
            let len = if group < extra { base + 1 } else { base };
            let ranks: Vec<usize> = (next..next + len).collect();
            next += len;
            ranks
        })
        .collect()
}

/// Distributes the `ranked` teams into groups named `A`, `B`, ... using `pattern`.
///
/// # Errors
///
/// Returns an [`enum@Error`] if the pattern is empty, contains a rank outside of `ranked` or
/// contains a rank more than once.
pub fn distribute(ranked: &[TeamId], pattern: &[Vec<usize>]) -> Result<Vec<Group>> {
    if pattern.is_empty() {
        return Err(Error::EmptyPattern);
    }

    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(pattern.len());

    for (index, ranks) in pattern.iter().enumerate() {
        let mut teams = Vec::with_capacity(ranks.len());

        for rank in ranks {
            let team = rank
                .checked_sub(1)
                .and_then(|index| ranked.get(index))
                .ok_or(Error::RankOutOfRange {
                    rank: *rank,
                    length: ranked.len(),
                })?;

            if !seen.insert(*rank) {
                return Err(Error::DuplicateRank(*rank));
            }

            teams.push(*team);
        }

        groups.push(Group::new(group_name(index), teams));
    }

    Ok(groups)
}

/// Distributes the `ranked` teams into `groups` groups using the snake pattern.
pub fn snake(ranked: &[TeamId], groups: usize) -> Result<Vec<Group>> {
    distribute(ranked, &serpentine(groups, ranked.len()))
}
