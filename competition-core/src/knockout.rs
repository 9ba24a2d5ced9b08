//! Knockout bracket seeding
//!
//! A knockout phase is generated in two steps: [`seed_order`] places the teams into bracket
//! slots using a [`SeedingMethod`], then [`first_round`] pairs the slots `(2i, 2i + 1)`. The
//! [`Bracket`] type builds the whole bracket from an ordered list of teams and routes winners
//! through all following rounds.
use crate::{ensure_unique, EntrantSpot, Error, Pairing, Result, Team, TeamId};

use rand::seq::SliceRandom;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How teams are placed into bracket slots.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SeedingMethod {
    /// Sort by seed and place using the standard bracket position tables.
    #[default]
    Seeded,
    /// Shuffle the teams using the caller supplied random number generator.
    Random,
    /// Keep the order supplied by the caller.
    Manual,
}

// Index into the seed-sorted teams for every bracket slot. Seed 1 and seed 2 are always in
// opposite halves of the bracket.
const POSITIONS_2: [usize; 2] = [0, 1];
const POSITIONS_4: [usize; 4] = [0, 3, 1, 2];
const POSITIONS_8: [usize; 8] = [0, 7, 4, 3, 2, 5, 6, 1];
const POSITIONS_16: [usize; 16] = [0, 15, 7, 8, 3, 12, 4, 11, 1, 14, 6, 9, 2, 13, 5, 10];
const POSITIONS_32: [usize; 32] = [
    0, 31, 15, 16, 7, 24, 8, 23, 3, 28, 12, 19, 4, 27, 11, 20, 1, 30, 14, 17, 6, 25, 9, 22, 2, 29,
    13, 18, 5, 26, 10, 21,
];

/// Returns the bracket position table for `size` teams. Returns `None` if no table exists for
/// `size`.
pub fn positions(size: usize) -> Option<&'static [usize]> {
    match size {
        2 => Some(&POSITIONS_2),
        4 => Some(&POSITIONS_4),
        8 => Some(&POSITIONS_8),
        16 => Some(&POSITIONS_16),
        32 => Some(&POSITIONS_32),
        _ => None,
    }
}

/// Orders `teams` into bracket slots using the given seeding `method`.
///
/// For [`SeedingMethod::Seeded`] teams are sorted ascending by their seed, a team without a
/// seed uses its position + 1. Ties keep the input order. Sizes without a position table are
/// placed sequentially.
///
/// `rng` is only used by [`SeedingMethod::Random`].
///
/// # Errors
///
/// Returns an [`enum@Error`] if a team appears more than once.
pub fn seed_order<R>(teams: &[Team], method: SeedingMethod, rng: &mut R) -> Result<Vec<TeamId>>
where
    R: Rng + ?Sized,
{
    let mut ids: Vec<TeamId> = teams.iter().map(|team| team.id).collect();
    ensure_unique(&ids)?;

    log::debug!("Seeding {} teams using {:?}", ids.len(), method);

    match method {
        SeedingMethod::Seeded => {
            let mut sorted: Vec<(u64, usize, TeamId)> = teams
                .iter()
                .enumerate()
                .map(|(position, team)| (team.seed_or_position(position), position, team.id))
                .collect();

            // Position as the second key keeps equal seeds in input order.
            sorted.sort_unstable();

            match positions(sorted.len()) {
                Some(table) => Ok(table.iter().map(|index| sorted[*index].2).collect()),
                None => Ok(sorted.into_iter().map(|(_, _, id)| id).collect()),
            }
        }
        SeedingMethod::Random => {
            ids.shuffle(rng);
            Ok(ids)
        }
        SeedingMethod::Manual => Ok(ids),
    }
}

/// Pairs the `ordered` teams as `(2i, 2i + 1)` for the given `round`. If the number of teams is
/// odd, the last team receives a bye.
pub fn first_round(ordered: &[TeamId], round: u32) -> Vec<Pairing> {
    ordered
        .chunks(2)
        .map(|pair| {
            let away = EntrantSpot::new(pair.get(1).copied());
            Pairing::new(round, EntrantSpot::Entrant(pair[0]), away)
        })
        .collect()
}

/// A complete single elimination bracket.
///
/// The first `size / 2` matches are the first round, every following round occupies the next
/// `size / 4`, `size / 8`, ... matches. The final is at `size - 2`. If enabled, the third place
/// match is the last match.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bracket {
    size: usize,
    matches: Vec<[EntrantSpot<TeamId>; 2]>,
    third_place_match: bool,
}

impl Bracket {
    /// Creates a new `Bracket` from teams already placed in bracket order.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if `ordered` contains duplicates or its length is not a power
    /// of two of at least 2.
    pub fn new(ordered: &[TeamId], third_place_match: bool) -> Result<Self> {
        let size = ordered.len();
        if size < 2 || !size.is_power_of_two() {
            return Err(Error::InvalidBracketSize(size));
        }

        ensure_unique(ordered)?;

        // A third place match requires semi-finals.
        let third_place_match = third_place_match && size >= 4;

        let mut num_matches = size - 1;
        if third_place_match {
            num_matches += 1;
        }

        let mut matches = Vec::with_capacity(num_matches);
        for pairing in first_round(ordered, 1) {
            matches.push([pairing.home, pairing.away]);
        }

        while matches.len() < num_matches {
            matches.push([EntrantSpot::TBD, EntrantSpot::TBD]);
        }

        log::debug!(
            "Created new Bracket of size {} with {} matches",
            size,
            matches.len()
        );

        Ok(Self {
            size,
            matches,
            third_place_match,
        })
    }

    /// Returns the number of first round slots.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns all matches of the bracket.
    #[inline]
    pub fn matches(&self) -> &[[EntrantSpot<TeamId>; 2]] {
        &self.matches
    }

    /// Returns the number of rounds, not counting the third place match separately.
    #[inline]
    pub fn rounds(&self) -> u32 {
        self.size.trailing_zeros()
    }

    /// Returns the index of the final.
    #[inline]
    pub fn final_index(&self) -> usize {
        self.size - 2
    }

    /// Returns the index of the third place match, if the bracket has one.
    #[inline]
    pub fn third_place_index(&self) -> Option<usize> {
        if self.third_place_match {
            Some(self.size - 1)
        } else {
            None
        }
    }

    /// Returns the 1-based round of the match at `index`. The third place match is in the same
    /// round as the final.
    pub fn round_of(&self, index: usize) -> Option<u32> {
        if index >= self.matches.len() {
            return None;
        }

        if Some(index) == self.third_place_index() {
            return Some(self.rounds());
        }

        let mut round = 1;
        let mut start = 0;
        let mut len = self.size / 2;
        while index >= start + len {
            start += len;
            len /= 2;
            round += 1;
        }

        Some(round)
    }

    /// Returns the `(index, side)` that the winner of the match at `index` moves to. Returns
    /// `None` for the final and the third place match.
    pub fn next_match(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.final_index() {
            return None;
        }

        Some((self.size / 2 + index / 2, index % 2))
    }

    /// Returns the `(index, side)` that the loser of the match at `index` moves to. Only the
    /// losers of the semi-finals move on, and only with a third place match.
    pub fn loser_match(&self, index: usize) -> Option<(usize, usize)> {
        let third_place = self.third_place_index()?;
        let final_index = self.final_index();

        if index + 2 >= final_index && index < final_index {
            Some((third_place, index % 2))
        } else {
            None
        }
    }

    /// Records that the team in `side` of the match at `index` won. The winner, and the loser
    /// of a semi-final with a third place match, are moved into their next matches.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if there is no match at `index`, `side` is not 0 or 1, or one
    /// of the spots is not decided yet.
    pub fn record_winner(&mut self, index: usize, side: usize) -> Result<()> {
        let spots = *self.matches.get(index).ok_or(Error::InvalidMatch { index })?;
        if side > 1 {
            return Err(Error::UndecidedSpot { index, side });
        }

        let winner = match spots[side] {
            EntrantSpot::Entrant(team) => team,
            _ => return Err(Error::UndecidedSpot { index, side }),
        };

        let loser = match spots[1 - side] {
            EntrantSpot::Entrant(team) => EntrantSpot::Entrant(team),
            EntrantSpot::Empty => EntrantSpot::Empty,
            EntrantSpot::TBD => {
                return Err(Error::UndecidedSpot {
                    index,
                    side: 1 - side,
                })
            }
        };

        if let Some((next, position)) = self.next_match(index) {
            log::debug!("Moving winner {} of match {} to match {}", winner, index, next);
            self.matches[next][position] = EntrantSpot::Entrant(winner);
        }

        if let Some((next, position)) = self.loser_match(index) {
            self.matches[next][position] = loser;
        }

        Ok(())
    }

    /// Returns the `(round, home, away)` of every match where both teams are known.
    pub fn playable(&self) -> Vec<(u32, TeamId, TeamId)> {
        self.matches
            .iter()
            .enumerate()
            .filter_map(|(index, [home, away])| {
                let round = self.round_of(index)?;
                Some((round, home.entrant()?, away.entrant()?))
            })
            .collect()
    }
}
