//! Standings calculation
//!
//! Standings are always derived from a list of matches, which the caller already filtered to a
//! single phase or group. They are never stored as the source of truth.
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Deref;

use crate::{Match, TeamId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A criterion used to order teams with equal points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TieBreaker {
    /// Higher goal difference is better.
    GoalDifference,
    /// More goals scored is better.
    GoalsScored,
    /// Fewer goals conceded is better.
    GoalsAgainst,
    /// More wins is better.
    Wins,
    /// Points in the matches played among the tied teams. Requires a [`TieBreakContext`].
    HeadToHead,
    /// Fewer disciplinary points is better. Requires a [`TieBreakContext`].
    FairPlay,
    /// Higher sum of the points of all opponents is better.
    Buchholz,
}

/// The points awarded for each result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointsModel {
    pub win: i64,
    pub draw: i64,
    pub loss: i64,
}

impl PointsModel {
    #[inline]
    pub const fn new(win: i64, draw: i64, loss: i64) -> Self {
        Self { win, draw, loss }
    }

    #[inline]
    fn award(&self, goals_for: u32, goals_against: u32) -> i64 {
        match goals_for.cmp(&goals_against) {
            Ordering::Greater => self.win,
            Ordering::Equal => self.draw,
            Ordering::Less => self.loss,
        }
    }
}

impl Default for PointsModel {
    #[inline]
    fn default() -> Self {
        Self::new(3, 1, 0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StandingsOptions {
    pub points: PointsModel,
    /// Tie-breakers applied in order when teams have equal points.
    pub tie_breakers: Vec<TieBreaker>,
}

impl Default for StandingsOptions {
    fn default() -> Self {
        Self {
            points: PointsModel::default(),
            tie_breakers: vec![
                TieBreaker::GoalDifference,
                TieBreaker::GoalsScored,
                TieBreaker::Wins,
            ],
        }
    }
}

/// Additional data required by the [`HeadToHead`] and [`FairPlay`] tie-breakers.
///
/// [`HeadToHead`]: TieBreaker::HeadToHead
/// [`FairPlay`]: TieBreaker::FairPlay
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TieBreakContext {
    /// Disciplinary points per team. Missing teams have 0.
    pub fair_play: HashMap<TeamId, u32>,
}

/// A single row of a standings table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: i64,
}

impl StandingsRow {
    #[inline]
    fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    fn record(&mut self, goals_for: u32, goals_against: u32) {
        self.played += 1;
        self.goals_for += goals_for;
        self.goals_against += goals_against;
        self.goal_difference = self.goals_for as i64 - self.goals_against as i64;

        match goals_for.cmp(&goals_against) {
            Ordering::Greater => self.wins += 1,
            Ordering::Equal => self.draws += 1,
            Ordering::Less => self.losses += 1,
        }
    }
}

/// A ranked standings table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Standings {
    rows: Vec<StandingsRow>,
}

/// A row together with its precomputed sort keys.
#[derive(Clone, Debug)]
struct Entry {
    row: StandingsRow,
    /// Index of first appearance in the input.
    index: usize,
    buchholz: i64,
    head_to_head: (i64, i64),
    fair_play: u32,
}

impl Standings {
    /// Calculates the standings for `matches`. [`TieBreaker::HeadToHead`] and
    /// [`TieBreaker::FairPlay`] have no effect, use [`calculate_with_context`] for them.
    ///
    /// [`calculate_with_context`]: Self::calculate_with_context
    pub fn calculate(matches: &[Match], options: &StandingsOptions) -> Self {
        Self::calculate_inner(matches, options, None)
    }

    /// Calculates the standings for `matches` using the additional `context` for the
    /// [`TieBreaker::HeadToHead`] and [`TieBreaker::FairPlay`] tie-breakers.
    pub fn calculate_with_context(
        matches: &[Match],
        options: &StandingsOptions,
        context: &TieBreakContext,
    ) -> Self {
        Self::calculate_inner(matches, options, Some(context))
    }

    fn calculate_inner(
        matches: &[Match],
        options: &StandingsOptions,
        context: Option<&TieBreakContext>,
    ) -> Self {
        let (mut entries, opponents) = Self::collect(matches);

        for entry in entries.iter_mut() {
            entry.row.points = options.points.win * entry.row.wins as i64
                + options.points.draw * entry.row.draws as i64
                + options.points.loss * entry.row.losses as i64;
        }

        let points: Vec<i64> = entries.iter().map(|entry| entry.row.points).collect();
        for (entry, opponents) in entries.iter_mut().zip(opponents.iter()) {
            entry.buchholz = opponents.iter().map(|index| points[*index]).sum();
        }

        if let Some(context) = context {
            Self::head_to_head(&mut entries, matches, &options.points);

            for entry in entries.iter_mut() {
                entry.fair_play = context
                    .fair_play
                    .get(&entry.row.team_id)
                    .copied()
                    .unwrap_or(0);
            }
        }

        entries.sort_by(|a, b| {
            b.row
                .points
                .cmp(&a.row.points)
                .then_with(|| Self::compare(a, b, &options.tie_breakers))
                .then_with(|| a.index.cmp(&b.index))
        });

        log::debug!(
            "Calculated standings for {} teams from {} matches",
            entries.len(),
            matches.len()
        );

        Self {
            rows: entries.into_iter().map(|entry| entry.row).collect(),
        }
    }

    /// Calculates the standings of a knockout phase. Points are `3 × wins - losses`, rows are
    /// ordered by wins, then goal difference.
    pub fn knockout(matches: &[Match]) -> Self {
        let (mut entries, _) = Self::collect(matches);

        for entry in entries.iter_mut() {
            entry.row.points = 3 * entry.row.wins as i64 - entry.row.losses as i64;
        }

        entries.sort_by(|a, b| {
            b.row
                .wins
                .cmp(&a.row.wins)
                .then_with(|| b.row.goal_difference.cmp(&a.row.goal_difference))
                .then_with(|| a.index.cmp(&b.index))
        });

        Self {
            rows: entries.into_iter().map(|entry| entry.row).collect(),
        }
    }

    /// Builds one entry per team appearing in a counted match, in order of first appearance,
    /// together with the entry indices of the opponents of every team.
    fn collect(matches: &[Match]) -> (Vec<Entry>, Vec<Vec<usize>>) {
        let mut indices: HashMap<TeamId, usize> = HashMap::new();
        let mut entries: Vec<Entry> = Vec::new();
        let mut opponents: Vec<Vec<usize>> = Vec::new();

        let mut index_of = |team, entries: &mut Vec<Entry>, opponents: &mut Vec<Vec<usize>>| {
            *indices.entry(team).or_insert_with(|| {
                let index = entries.len();
                entries.push(Entry {
                    row: StandingsRow::new(team),
                    index,
                    buchholz: 0,
                    head_to_head: (0, 0),
                    fair_play: 0,
                });
                opponents.push(Vec::new());
                index
            })
        };

        for m in matches {
            let (home_score, away_score) = match m.score() {
                Some(score) => score,
                None => continue,
            };

            let home = index_of(m.home_team_id, &mut entries, &mut opponents);
            let away = index_of(m.away_team_id, &mut entries, &mut opponents);

            entries[home].row.record(home_score, away_score);
            entries[away].row.record(away_score, home_score);

            opponents[home].push(away);
            opponents[away].push(home);
        }

        (entries, opponents)
    }

    /// Computes the mini-league among every set of teams level on points.
    fn head_to_head(entries: &mut [Entry], matches: &[Match], points: &PointsModel) {
        let mut levels: HashMap<i64, Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            levels.entry(entry.row.points).or_default().push(index);
        }

        let level_of: HashMap<TeamId, i64> = entries
            .iter()
            .map(|entry| (entry.row.team_id, entry.row.points))
            .collect();

        let position: HashMap<TeamId, usize> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.row.team_id, index))
            .collect();

        for m in matches {
            let (home_score, away_score) = match m.score() {
                Some(score) => score,
                None => continue,
            };

            let (home_level, away_level) = match (
                level_of.get(&m.home_team_id),
                level_of.get(&m.away_team_id),
            ) {
                (Some(home), Some(away)) => (*home, *away),
                _ => continue,
            };

            // Only matches among teams with equal points count.
            if home_level != away_level || levels[&home_level].len() < 2 {
                continue;
            }

            let home = position[&m.home_team_id];
            let away = position[&m.away_team_id];
            let diff = home_score as i64 - away_score as i64;

            entries[home].head_to_head.0 += points.award(home_score, away_score);
            entries[home].head_to_head.1 += diff;
            entries[away].head_to_head.0 += points.award(away_score, home_score);
            entries[away].head_to_head.1 -= diff;
        }
    }

    fn compare(a: &Entry, b: &Entry, tie_breakers: &[TieBreaker]) -> Ordering {
        for tie_breaker in tie_breakers {
            let ordering = match tie_breaker {
                TieBreaker::GoalDifference => b.row.goal_difference.cmp(&a.row.goal_difference),
                TieBreaker::GoalsScored => b.row.goals_for.cmp(&a.row.goals_for),
                TieBreaker::GoalsAgainst => a.row.goals_against.cmp(&b.row.goals_against),
                TieBreaker::Wins => b.row.wins.cmp(&a.row.wins),
                TieBreaker::HeadToHead => b.head_to_head.cmp(&a.head_to_head),
                TieBreaker::FairPlay => a.fair_play.cmp(&b.fair_play),
                TieBreaker::Buchholz => b.buchholz.cmp(&a.buchholz),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }

    /// Reorders teams with equal points using the explicit `order`. Teams missing from `order`
    /// keep their position.
    pub fn reorder_ties(&mut self, order: &[TeamId]) {
        let rank: HashMap<TeamId, usize> = order
            .iter()
            .enumerate()
            .map(|(index, team)| (*team, index))
            .collect();

        let mut start = 0;
        while start < self.rows.len() {
            let points = self.rows[start].points;
            let mut end = start + 1;
            while end < self.rows.len() && self.rows[end].points == points {
                end += 1;
            }

            let slots: Vec<usize> = (start..end)
                .filter(|index| rank.contains_key(&self.rows[*index].team_id))
                .collect();

            if slots.len() > 1 {
                let mut listed: Vec<StandingsRow> =
                    slots.iter().map(|index| self.rows[*index]).collect();
                listed.sort_by_key(|row| rank[&row.team_id]);

                for (slot, row) in slots.into_iter().zip(listed) {
                    self.rows[slot] = row;
                }
            }

            start = end;
        }
    }

    #[inline]
    pub fn rows(&self) -> &[StandingsRow] {
        &self.rows
    }

    #[inline]
    pub fn into_rows(self) -> Vec<StandingsRow> {
        self.rows
    }

    /// Returns the 0-based position of `team`.
    pub fn position(&self, team: TeamId) -> Option<usize> {
        self.rows.iter().position(|row| row.team_id == team)
    }

    pub fn get(&self, team: TeamId) -> Option<&StandingsRow> {
        self.rows.iter().find(|row| row.team_id == team)
    }

    /// Returns all teams in ranked order.
    pub fn teams(&self) -> Vec<TeamId> {
        self.rows.iter().map(|row| row.team_id).collect()
    }
}

impl Deref for Standings {
    type Target = [StandingsRow];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.rows
    }
}

impl From<Vec<StandingsRow>> for Standings {
    #[inline]
    fn from(rows: Vec<StandingsRow>) -> Self {
        Self { rows }
    }
}
