//! # competition-core
//!
//! This crate contains the building blocks used to run a multi-format competition: the pairing
//! primitives that produce fixtures and the calculator that ranks teams from match results.
//! Everything in here is a pure function of its inputs, no I/O is ever performed.
//!
//! Important types:
//! - [`Team`]: An entrant of a competition, identified by [`TeamId`], optionally seeded.
//! - [`Match`]: A match as it is stored by the host, including its status and score.
//! - [`Fixture`]: A freshly generated match that has not been persisted yet.
//! - [`Pairing`]: A pairing of two [`EntrantSpot`]s produced by a pairing primitive.
//! - [`EntrantSpot`]: A *spot* within a pairing, which can contain a team, be permanently empty
//! (a bye) or contain a to-be-decided spot.
//!
//! Pairing primitives:
//! - [`RoundRobin`]: Circle method scheduling.
//! - [`knockout`]: Bracket seeding and the [`Bracket`] skeleton.
//! - [`swiss`]: Swiss pairing with repeat avoidance.
//! - [`groups`]: Snake seeding into named groups.
//!
//! Standings are calculated by [`Standings`].
//!
//! ## Feature Flags
//!
//! `serde`: Adds `Serialize` and `Deserialize` impls to almost all types.
//!
pub mod groups;
pub mod knockout;
pub mod round_robin;
pub mod standings;
pub mod swiss;

mod utils;

pub use knockout::{Bracket, SeedingMethod};
pub use round_robin::RoundRobin;
pub use standings::{PointsModel, Standings, StandingsOptions, StandingsRow, TieBreaker};
pub use utils::NumExt;

use thiserror::Error;

use std::fmt::{self, Display, Formatter};
use std::result;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! id {
    ($(#[$meta:meta])* $name:ident, $id:ty) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub $id);

        impl Display for $name {
            #[inline]
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<$id> for $name {
            #[inline]
            fn from(id: $id) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = <$id as FromStr>::Err;

            #[inline]
            fn from_str(s: &str) -> result::Result<Self, Self::Err> {
                Ok(Self(s.parse::<$id>()?))
            }
        }
    };
}

id!(
    /// A unique identifier for a [`Team`]. The engine treats it as opaque.
    TeamId,
    u64
);
id!(
    /// A unique identifier for a stored [`Match`].
    MatchId,
    u64
);

/// An `Result<T>` using [`enum@Error`] as an error type.
pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("not enough teams: expected at least {required}, found {found}")]
    NotEnoughTeams { required: usize, found: usize },
    #[error("team {0} appears more than once")]
    DuplicateTeam(TeamId),
    #[error("rank {rank} is out of range for a ranking of {length} teams")]
    RankOutOfRange { rank: usize, length: usize },
    #[error("rank {0} is assigned to more than one group")]
    DuplicateRank(usize),
    #[error("group pattern is empty")]
    EmptyPattern,
    #[error("invalid bracket size {0}: expected a power of two")]
    InvalidBracketSize(usize),
    #[error("invalid match: bracket has no match at {index}")]
    InvalidMatch { index: usize },
    #[error("match at {index} has no entrant in spot {side}")]
    UndecidedSpot { index: usize, side: usize },
}

/// An entrant of a competition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Team {
    pub id: TeamId,
    /// The rank used for bracket and swiss ordering. Absence implies insertion order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: Option<u32>,
}

impl Team {
    #[inline]
    pub const fn new(id: TeamId) -> Self {
        Self { id, seed: None }
    }

    #[inline]
    pub const fn seeded(id: TeamId, seed: u32) -> Self {
        Self {
            id,
            seed: Some(seed),
        }
    }

    /// Returns the seed of the team, defaulting to `position + 1` if it has none.
    #[inline]
    pub fn seed_or_position(&self, position: usize) -> u64 {
        match self.seed {
            Some(seed) => seed as u64,
            None => position as u64 + 1,
        }
    }
}

/// The lifecycle status of a [`Match`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
    Postponed,
    Cancelled,
}

/// A match as it is stored by the host.
///
/// Matches are created by generation, mutated by external result entry and only read by the
/// standings calculation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// The id of the phase this match belongs to.
    pub stage: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub round: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub group: Option<String>,
    pub status: MatchStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub home_score: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub away_score: Option<u32>,
}

impl Match {
    /// Returns `true` if the match is [`Completed`].
    ///
    /// [`Completed`]: MatchStatus::Completed
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Returns the `(home, away)` score if the match is completed and both scores are known.
    #[inline]
    pub fn score(&self) -> Option<(u32, u32)> {
        if !self.is_completed() {
            return None;
        }

        Some((self.home_score?, self.away_score?))
    }

    /// Returns the winner of a completed match. Returns `None` for draws and unfinished
    /// matches.
    pub fn winner(&self) -> Option<TeamId> {
        let (home, away) = self.score()?;

        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Some(self.home_team_id),
            std::cmp::Ordering::Less => Some(self.away_team_id),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Returns the loser of a completed match. Returns `None` for draws and unfinished
    /// matches.
    pub fn loser(&self) -> Option<TeamId> {
        let winner = self.winner()?;

        if winner == self.home_team_id {
            Some(self.away_team_id)
        } else {
            Some(self.home_team_id)
        }
    }

    #[inline]
    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team_id == team || self.away_team_id == team
    }
}

/// A generated match which has not been persisted yet. The host stores it with
/// [`MatchStatus::Scheduled`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fixture {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub stage: String,
    pub round: Option<u32>,
    pub group: Option<String>,
}

impl Fixture {
    /// Converts the `Fixture` into a scheduled [`Match`] with the given `id`.
    pub fn into_match(self, id: MatchId) -> Match {
        Match {
            id,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            stage: self.stage,
            round: self.round,
            group: self.group,
            status: MatchStatus::Scheduled,
            home_score: None,
            away_score: None,
        }
    }
}

/// A spot for a team in a pairing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntrantSpot<T> {
    Entrant(T),
    /// The spot is permanently empty. The opponent has a bye.
    Empty,
    /// The spot is decided by a previous result.
    TBD,
}

impl<T> EntrantSpot<T> {
    /// Creates a new `EntrantSpot` from an [`Option`]. A `Some(T)` value will translate into
    /// a `Entrant(T)` value, a `None` value will translate into a `Empty` value.
    pub fn new(entrant: Option<T>) -> Self {
        match entrant {
            Some(entrant) => Self::Entrant(entrant),
            None => Self::Empty,
        }
    }

    /// Returns `true` if the `EntrantSpot` is [`Entrant`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use competition_core::EntrantSpot;
    /// let spot = EntrantSpot::Entrant(());
    /// assert!(spot.is_entrant());
    /// ```
    /// [`Entrant`]: Self::Entrant
    pub fn is_entrant(&self) -> bool {
        matches!(self, Self::Entrant(_))
    }

    /// Returns `true` if the `EntrantSpot` is [`Empty`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use competition_core::EntrantSpot;
    /// let spot: EntrantSpot<()> = EntrantSpot::Empty;
    /// assert!(spot.is_empty());
    /// ```
    ///
    /// [`Empty`]: Self::Empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if the `EntrantSpot` is [`TBD`].
    ///
    /// [`TBD`]: Self::TBD
    pub fn is_tbd(&self) -> bool {
        matches!(self, Self::TBD)
    }

    /// Converts the spot into an [`Option`], discarding the difference between [`Empty`] and
    /// [`TBD`].
    ///
    /// [`Empty`]: Self::Empty
    /// [`TBD`]: Self::TBD
    pub fn entrant(self) -> Option<T> {
        match self {
            Self::Entrant(entrant) => Some(entrant),
            _ => None,
        }
    }

    /// Converts an `&EntrantSpot<T>` into an `EntrantSpot<&T>`.
    pub fn as_ref(&self) -> EntrantSpot<&T> {
        match *self {
            Self::Entrant(ref entrant) => EntrantSpot::Entrant(entrant),
            Self::Empty => EntrantSpot::Empty,
            Self::TBD => EntrantSpot::TBD,
        }
    }

    /// Maps `EntrantSpot<T>` to `EntrantSpot<U>` by applying `f` on it.
    pub fn map<U, F>(self, f: F) -> EntrantSpot<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Entrant(entrant) => EntrantSpot::Entrant(f(entrant)),
            Self::Empty => EntrantSpot::Empty,
            Self::TBD => EntrantSpot::TBD,
        }
    }
}

/// A pairing of two spots within a round.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pairing {
    /// The 1-based round number.
    pub round: u32,
    pub home: EntrantSpot<TeamId>,
    pub away: EntrantSpot<TeamId>,
}

impl Pairing {
    #[inline]
    pub fn new(round: u32, home: EntrantSpot<TeamId>, away: EntrantSpot<TeamId>) -> Self {
        Self { round, home, away }
    }

    /// Returns `true` if one of the spots is permanently empty.
    #[inline]
    pub fn is_bye(&self) -> bool {
        self.home.is_empty() || self.away.is_empty()
    }

    /// Returns the `(home, away)` teams if both spots are occupied.
    #[inline]
    pub fn teams(&self) -> Option<(TeamId, TeamId)> {
        Some((self.home.entrant()?, self.away.entrant()?))
    }

    /// Converts the pairing into a [`Fixture`] of `stage`. Returns `None` for byes and
    /// undecided pairings.
    pub fn to_fixture(&self, stage: &str, group: Option<&str>) -> Option<Fixture> {
        let (home, away) = self.teams()?;

        Some(Fixture {
            home_team_id: home,
            away_team_id: away,
            stage: stage.to_owned(),
            round: Some(self.round),
            group: group.map(str::to_owned),
        })
    }

    /// Returns the same pairing with home and away swapped.
    #[inline]
    pub fn mirrored(&self, round: u32) -> Self {
        Self {
            round,
            home: self.away,
            away: self.home,
        }
    }
}

/// Checks that every team in `teams` is unique.
pub(crate) fn ensure_unique(teams: &[TeamId]) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(teams.len());
    for team in teams {
        if !seen.insert(*team) {
            return Err(Error::DuplicateTeam(*team));
        }
    }

    Ok(())
}
