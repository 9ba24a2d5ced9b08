//! Swiss pairing with repeat avoidance
//!
//! Every round of a swiss phase is paired from the current ranking: each team plays the nearest
//! team below it that it has not played yet. Pairings are re-run once per round since they
//! depend on the results of the previous round.
use std::collections::{HashMap, HashSet};

use crate::utils::NumExt;
use crate::{ensure_unique, EntrantSpot, Match, MatchStatus, Pairing, Result, TeamId};

/// A set of unordered pairs of teams that already played each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayedPairs {
    pairs: HashSet<(TeamId, TeamId)>,
}

impl PlayedPairs {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the pairs of all `matches` that were not cancelled.
    pub fn from_matches<'a, I>(matches: I) -> Self
    where
        I: IntoIterator<Item = &'a Match>,
    {
        let mut this = Self::new();
        for m in matches {
            if m.status != MatchStatus::Cancelled {
                this.insert(m.home_team_id, m.away_team_id);
            }
        }

        this
    }

    #[inline]
    fn key(a: TeamId, b: TeamId) -> (TeamId, TeamId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Inserts the pair `a`, `b`. Returns `false` if the pair was already present.
    #[inline]
    pub fn insert(&mut self, a: TeamId, b: TeamId) -> bool {
        self.pairs.insert(Self::key(a, b))
    }

    #[inline]
    pub fn contains(&self, a: TeamId, b: TeamId) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The pairings of a single swiss round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwissRound {
    pub pairings: Vec<Pairing>,
    /// The team sitting out this round, if the number of teams is odd.
    pub bye: Option<TeamId>,
    /// Pairings that repeat an earlier match because no unplayed opponent was left.
    pub repeats: Vec<(TeamId, TeamId)>,
}

/// Pairs `teams` for the given 1-based `round`.
///
/// Teams are ordered by their position in `ranking`, teams missing from `ranking` are placed
/// last in their input order. Each unpaired team is paired with the nearest unpaired team
/// below it that is not in `played`. If no such team exists the nearest unpaired team is taken
/// and the pairing is reported in [`SwissRound::repeats`].
///
/// # Errors
///
/// Returns an [`enum@Error`] if a team appears more than once in `teams`.
///
/// [`enum@Error`]: crate::Error
pub fn pair_round(
    teams: &[TeamId],
    ranking: &[TeamId],
    played: &PlayedPairs,
    round: u32,
) -> Result<SwissRound> {
    ensure_unique(teams)?;

    let positions: HashMap<TeamId, usize> = ranking
        .iter()
        .enumerate()
        .map(|(position, team)| (*team, position))
        .collect();

    let mut order = teams.to_vec();
    // Stable: unranked teams keep their input order.
    order.sort_by_key(|team| positions.get(team).copied().unwrap_or(usize::MAX));

    let mut paired = vec![false; order.len()];
    let mut pairings = Vec::with_capacity(order.len() / 2);
    let mut repeats = Vec::new();

    for index in 0..order.len() {
        if paired[index] {
            continue;
        }

        let team = order[index];

        let mut candidates = (index + 1..order.len()).filter(|other| !paired[*other]);
        let first_available = match candidates.clone().next() {
            Some(other) => other,
            // Nobody left, this team sits out the round.
            None => continue,
        };

        let opponent = match candidates.find(|other| !played.contains(team, order[*other])) {
            Some(other) => other,
            None => {
                log::warn!(
                    "Forced repeat pairing in round {}: {} vs {}",
                    round,
                    team,
                    order[first_available]
                );

                repeats.push((team, order[first_available]));
                first_available
            }
        };

        paired[index] = true;
        paired[opponent] = true;

        let (home, away) = if index % 2 == 0 {
            (team, order[opponent])
        } else {
            (order[opponent], team)
        };

        pairings.push(Pairing::new(
            round,
            EntrantSpot::Entrant(home),
            EntrantSpot::Entrant(away),
        ));
    }

    let bye = order
        .iter()
        .zip(paired.iter())
        .find(|(_, paired)| !**paired)
        .map(|(team, _)| *team);

    log::debug!(
        "Paired swiss round {} with {} pairings ({} repeats)",
        round,
        pairings.len(),
        repeats.len()
    );

    Ok(SwissRound {
        pairings,
        bye,
        repeats,
    })
}

/// Returns the recommended number of swiss rounds for `teams` teams, `⌈log2 teams⌉`.
pub fn recommended_rounds(teams: usize) -> u32 {
    match teams {
        0 | 1 => 0,
        n => n.ilog2_ceil() as u32,
    }
}
