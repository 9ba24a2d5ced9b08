//! Per-format tournament mode settings
use std::collections::BTreeMap;
use std::fmt::Display;

use competition_core::{PointsModel, SeedingMethod, StandingsOptions, TieBreaker};
use serde::{Deserialize, Serialize};

use crate::registry::FormatKind;

/// The settings of a tournament mode. The variant selects the format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Settings {
    LeagueOnly(LeagueSettings),
    Knockout(KnockoutSettings),
    GroupsKnockout(GroupsKnockoutSettings),
    SwissSystem(SwissSettings),
    RoundRobinFinal(RoundRobinFinalSettings),
}

impl Settings {
    /// Returns the default settings of the format `kind`.
    pub fn default_for(kind: FormatKind) -> Self {
        match kind {
            FormatKind::LeagueOnly => Self::LeagueOnly(LeagueSettings::default()),
            FormatKind::Knockout => Self::Knockout(KnockoutSettings::default()),
            FormatKind::GroupsKnockout => Self::GroupsKnockout(GroupsKnockoutSettings::default()),
            FormatKind::SwissSystem => Self::SwissSystem(SwissSettings::default()),
            FormatKind::RoundRobinFinal => {
                Self::RoundRobinFinal(RoundRobinFinalSettings::default())
            }
        }
    }

    pub fn kind(&self) -> FormatKind {
        match self {
            Self::LeagueOnly(_) => FormatKind::LeagueOnly,
            Self::Knockout(_) => FormatKind::Knockout,
            Self::GroupsKnockout(_) => FormatKind::GroupsKnockout,
            Self::SwissSystem(_) => FormatKind::SwissSystem,
            Self::RoundRobinFinal(_) => FormatKind::RoundRobinFinal,
        }
    }

    /// Returns the standings options. Knockout settings carry no scoring and use the default.
    pub fn standings_options(&self) -> StandingsOptions {
        match self {
            Self::LeagueOnly(s) => s.scoring.options(),
            Self::Knockout(_) => StandingsOptions::default(),
            Self::GroupsKnockout(s) => s.scoring.options(),
            Self::SwissSystem(s) => s.scoring.options(),
            Self::RoundRobinFinal(s) => s.scoring.options(),
        }
    }

    /// Returns the double round robin flag used when a phase does not set its own.
    pub fn double_round_robin(&self) -> bool {
        match self {
            Self::LeagueOnly(s) => s.double_round_robin,
            Self::Knockout(_) => false,
            Self::GroupsKnockout(s) => s.double_round_robin,
            Self::SwissSystem(s) => s.poule_double_round_robin,
            Self::RoundRobinFinal(s) => s.double_round_robin,
        }
    }

    /// Returns the seeding method of knockout phases.
    pub fn seeding(&self) -> SeedingMethod {
        match self {
            Self::Knockout(s) => s.seeding,
            Self::GroupsKnockout(s) => s.knockout_seeding,
            Self::RoundRobinFinal(s) => s.playoff_seeding,
            Self::LeagueOnly(_) | Self::SwissSystem(_) => SeedingMethod::Seeded,
        }
    }

    pub fn third_place_match(&self) -> bool {
        match self {
            Self::Knockout(s) => s.third_place_match,
            Self::GroupsKnockout(s) => s.third_place_match,
            Self::RoundRobinFinal(s) => s.third_place_match,
            Self::LeagueOnly(_) | Self::SwissSystem(_) => false,
        }
    }

    /// Returns the seed used for random seeding, if any.
    pub fn random_seed(&self) -> Option<u64> {
        match self {
            Self::Knockout(s) => s.random_seed,
            _ => None,
        }
    }
}

/// Points and tie-breakers shared by every format with a league table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub points_per_win: i64,
    pub points_per_draw: i64,
    pub points_per_loss: i64,
    pub tie_breakers: Vec<TieBreaker>,
}

impl ScoringSettings {
    pub fn options(&self) -> StandingsOptions {
        StandingsOptions {
            points: PointsModel::new(
                self.points_per_win,
                self.points_per_draw,
                self.points_per_loss,
            ),
            tie_breakers: self.tie_breakers.clone(),
        }
    }

    pub(crate) fn validate(&self, report: &mut ValidationReport) {
        if self.points_per_win < self.points_per_draw || self.points_per_draw < self.points_per_loss
        {
            report.error(
                ValidationIssue::new("scoring.points_per_win", "settings.points_order")
                    .param("win", self.points_per_win)
                    .param("draw", self.points_per_draw)
                    .param("loss", self.points_per_loss),
            );
        }

        for (index, tie_breaker) in self.tie_breakers.iter().enumerate() {
            if self.tie_breakers[..index].contains(tie_breaker) {
                report.error(
                    ValidationIssue::new("scoring.tie_breakers", "settings.duplicate_tie_breaker")
                        .param("tie_breaker", format!("{:?}", tie_breaker)),
                );
            }
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points_per_win: 3,
            points_per_draw: 1,
            points_per_loss: 0,
            tie_breakers: vec![
                TieBreaker::GoalDifference,
                TieBreaker::GoalsScored,
                TieBreaker::Wins,
            ],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    pub scoring: ScoringSettings,
    pub double_round_robin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnockoutSettings {
    pub bracket_size: usize,
    pub seeding: SeedingMethod,
    pub third_place_match: bool,
    pub random_seed: Option<u64>,
}

impl Default for KnockoutSettings {
    fn default() -> Self {
        Self {
            bracket_size: 8,
            seeding: SeedingMethod::Seeded,
            third_place_match: false,
            random_seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsKnockoutSettings {
    pub scoring: ScoringSettings,
    pub number_of_groups: usize,
    pub teams_per_group: usize,
    pub advancing_per_group: usize,
    pub double_round_robin: bool,
    pub third_place_match: bool,
    pub knockout_seeding: SeedingMethod,
}

impl Default for GroupsKnockoutSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringSettings::default(),
            number_of_groups: 4,
            teams_per_group: 4,
            advancing_per_group: 2,
            double_round_robin: false,
            third_place_match: false,
            knockout_seeding: SeedingMethod::Seeded,
        }
    }
}

/// How the swiss phase ranking is split into the two poules.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PouleSplit {
    /// Snake seeding, both poules are equally strong.
    #[default]
    Snake,
    /// The top half forms poule A, the bottom half poule B.
    TopBottom,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwissSettings {
    pub scoring: ScoringSettings,
    /// The number of swiss rounds. `0` uses `⌈log2 teams⌉`.
    pub swiss_rounds: u32,
    pub poule_split: PouleSplit,
    /// An explicit pattern of 1-indexed ranks per poule. Takes precedence over `poule_split`.
    pub poule_pattern: Option<Vec<Vec<usize>>>,
    pub poule_double_round_robin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRobinFinalSettings {
    pub scoring: ScoringSettings,
    pub double_round_robin: bool,
    pub playoff_teams: usize,
    pub third_place_match: bool,
    pub playoff_seeding: SeedingMethod,
}

impl Default for RoundRobinFinalSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringSettings::default(),
            double_round_robin: false,
            playoff_teams: 4,
            third_place_match: false,
            playoff_seeding: SeedingMethod::Seeded,
        }
    }
}

/// A single validation problem, rendered by the caller using `message_key` and `params`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message_key: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ValidationIssue {
    pub fn new<F, K>(field: F, message_key: K) -> Self
    where
        F: Into<String>,
        K: Into<String>,
    {
        Self {
            field: field.into(),
            message_key: message_key.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Display,
    {
        self.params.insert(key.into(), value.to_string());
        self
    }
}

/// All errors and warnings found while validating settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    pub fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    #[inline]
    pub fn warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Returns `true` if an error with `message_key` was reported.
    pub fn has_error(&self, message_key: &str) -> bool {
        self.errors.iter().any(|issue| issue.message_key == message_key)
    }

    /// Returns `true` if a warning with `message_key` was reported.
    pub fn has_warning(&self, message_key: &str) -> bool {
        self.warnings
            .iter()
            .any(|issue| issue.message_key == message_key)
    }
}
