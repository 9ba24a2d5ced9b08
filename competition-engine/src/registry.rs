//! The static table of all supported formats
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::MatchGenerationType::{GroupAssignment, Knockout, RoundRobin, SwissPairing};
use crate::phase::{
    AdvancementRule, PhaseConfig, RuleCount, FINAL, GROUP_ASSIGNMENT, GROUP_STAGE, KNOCKOUT,
    POULES, QUARTER_FINAL, REGULAR_SEASON, ROUND_OF_16, ROUND_OF_32, SEMI_FINAL, START,
    SWISS_PHASE_1, THIRD_PLACE_PLAYOFF,
};
use crate::settings::Settings;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    LeagueOnly,
    Knockout,
    GroupsKnockout,
    SwissSystem,
    RoundRobinFinal,
}

impl FormatKind {
    pub const ALL: [Self; 5] = [
        Self::LeagueOnly,
        Self::Knockout,
        Self::GroupsKnockout,
        Self::SwissSystem,
        Self::RoundRobinFinal,
    ];

    pub fn key(self) -> &'static str {
        self.definition().key
    }

    pub fn definition(self) -> &'static FormatDefinition {
        match self {
            Self::LeagueOnly => &LEAGUE_ONLY,
            Self::Knockout => &KNOCKOUT_FORMAT,
            Self::GroupsKnockout => &GROUPS_KNOCKOUT,
            Self::SwissSystem => &SWISS_SYSTEM,
            Self::RoundRobinFinal => &ROUND_ROBIN_FINAL,
        }
    }
}

impl Display for FormatKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FormatKind {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| UnknownFormat(s.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown format: {0}")]
pub struct UnknownFormat(pub String);

/// The phases of a format, ordered by [`PhaseConfig::order`].
#[derive(Debug, Serialize)]
pub struct FormatDefinition {
    pub kind: FormatKind,
    pub key: &'static str,
    pub name: &'static str,
    pub phases: &'static [PhaseConfig],
}

impl FormatDefinition {
    #[inline]
    pub fn default_settings(&self) -> Settings {
        Settings::default_for(self.kind)
    }

    pub fn phase(&self, id: &str) -> Option<&'static PhaseConfig> {
        self.phases.iter().find(|phase| phase.id == id)
    }

    /// Returns the phase with the next-higher order after `id`.
    pub fn next_phase_by_order(&self, id: &str) -> Option<&'static PhaseConfig> {
        let current = self.phase(id)?;

        self.phases
            .iter()
            .filter(|phase| phase.order > current.order)
            .min_by_key(|phase| phase.order)
    }

    /// Returns all phases except `start`.
    pub fn schedulable_phases(&self) -> impl Iterator<Item = &'static PhaseConfig> {
        self.phases.iter().filter(|phase| phase.id != START)
    }

    pub fn terminal_phases(&self) -> impl Iterator<Item = &'static PhaseConfig> {
        self.phases.iter().filter(|phase| phase.is_terminal)
    }
}

/// Returns the definitions of all formats.
pub fn definitions() -> impl Iterator<Item = &'static FormatDefinition> {
    FormatKind::ALL.into_iter().map(FormatKind::definition)
}

/// Looks up the definition of the format with the given `key`.
pub fn lookup(key: &str) -> Result<&'static FormatDefinition, UnknownFormat> {
    key.parse::<FormatKind>().map(FormatKind::definition)
}

const TO_REGULAR_SEASON: &[AdvancementRule] =
    &[AdvancementRule::top(RuleCount::All, REGULAR_SEASON)];

// The first knockout phase is the one matching the bracket size.
const TO_BRACKET: &[AdvancementRule] = &[
    AdvancementRule::top(RuleCount::BracketSize, ROUND_OF_32),
    AdvancementRule::top(RuleCount::BracketSize, ROUND_OF_16),
    AdvancementRule::top(RuleCount::BracketSize, QUARTER_FINAL),
    AdvancementRule::top(RuleCount::BracketSize, SEMI_FINAL),
];
const TO_ROUND_OF_16: &[AdvancementRule] = &[AdvancementRule::top(RuleCount::All, ROUND_OF_16)];
const TO_QUARTER_FINAL: &[AdvancementRule] =
    &[AdvancementRule::top(RuleCount::All, QUARTER_FINAL)];
const TO_SEMI_FINAL: &[AdvancementRule] = &[AdvancementRule::top(RuleCount::All, SEMI_FINAL)];
const TO_FINALS: &[AdvancementRule] = &[
    AdvancementRule::top(RuleCount::Exact(2), FINAL),
    AdvancementRule::bottom(RuleCount::Exact(2), THIRD_PLACE_PLAYOFF),
];

const TO_GROUP_ASSIGNMENT: &[AdvancementRule] =
    &[AdvancementRule::top(RuleCount::All, GROUP_ASSIGNMENT)];
const TO_GROUP_STAGE: &[AdvancementRule] = &[AdvancementRule::top(RuleCount::All, GROUP_STAGE)];
const TO_KNOCKOUT: &[AdvancementRule] =
    &[AdvancementRule::top(RuleCount::AdvancingPerGroup, KNOCKOUT)];

const TO_SWISS_PHASE_1: &[AdvancementRule] =
    &[AdvancementRule::top(RuleCount::All, SWISS_PHASE_1)];
const TO_POULES: &[AdvancementRule] = &[
    AdvancementRule::top(RuleCount::HalfField, POULES),
    AdvancementRule::bottom(RuleCount::HalfField, POULES),
];
const POULE_WINNERS: &[AdvancementRule] = &[
    AdvancementRule::top(RuleCount::Exact(1), FINAL).group("A"),
    AdvancementRule::top(RuleCount::Exact(1), FINAL).group("B"),
];

// The first playoff phase depends on the number of playoff teams.
const TO_PLAYOFFS: &[AdvancementRule] = &[
    AdvancementRule::top(RuleCount::PlayoffTeams, QUARTER_FINAL),
    AdvancementRule::top(RuleCount::PlayoffTeams, SEMI_FINAL),
];

static LEAGUE_ONLY: FormatDefinition = FormatDefinition {
    kind: FormatKind::LeagueOnly,
    key: "league_only",
    name: "League",
    phases: &[
        PhaseConfig::start(TO_REGULAR_SEASON),
        PhaseConfig::new(REGULAR_SEASON, "Regular season", 1, RoundRobin).terminal(),
    ],
};

static KNOCKOUT_FORMAT: FormatDefinition = FormatDefinition {
    kind: FormatKind::Knockout,
    key: "knockout",
    name: "Knockout",
    phases: &[
        PhaseConfig::start(TO_BRACKET),
        PhaseConfig::new(ROUND_OF_32, "Round of 32", 1, Knockout).rules(TO_ROUND_OF_16),
        PhaseConfig::new(ROUND_OF_16, "Round of 16", 2, Knockout).rules(TO_QUARTER_FINAL),
        PhaseConfig::new(QUARTER_FINAL, "Quarter-final", 3, Knockout).rules(TO_SEMI_FINAL),
        PhaseConfig::new(SEMI_FINAL, "Semi-final", 4, Knockout).rules(TO_FINALS),
        PhaseConfig::new(THIRD_PLACE_PLAYOFF, "Third place playoff", 5, Knockout).terminal(),
        PhaseConfig::new(FINAL, "Final", 6, Knockout).terminal(),
    ],
};

static GROUPS_KNOCKOUT: FormatDefinition = FormatDefinition {
    kind: FormatKind::GroupsKnockout,
    key: "groups_knockout",
    name: "Groups and knockout",
    phases: &[
        PhaseConfig::start(TO_GROUP_ASSIGNMENT),
        PhaseConfig::new(GROUP_ASSIGNMENT, "Group assignment", 1, GroupAssignment)
            .rules(TO_GROUP_STAGE),
        PhaseConfig::new(GROUP_STAGE, "Group stage", 2, RoundRobin)
            .grouped()
            .rules(TO_KNOCKOUT),
        PhaseConfig::new(KNOCKOUT, "Knockout", 3, Knockout)
            .multi_round()
            .rules(TO_FINALS),
        PhaseConfig::new(THIRD_PLACE_PLAYOFF, "Third place playoff", 4, Knockout).terminal(),
        PhaseConfig::new(FINAL, "Final", 5, Knockout).terminal(),
    ],
};

static SWISS_SYSTEM: FormatDefinition = FormatDefinition {
    kind: FormatKind::SwissSystem,
    key: "swiss_system",
    name: "Swiss system",
    phases: &[
        PhaseConfig::start(TO_SWISS_PHASE_1),
        PhaseConfig::new(SWISS_PHASE_1, "Swiss phase 1", 1, SwissPairing)
            .multi_round()
            .rules(TO_POULES),
        PhaseConfig::new(POULES, "Poules", 2, RoundRobin)
            .grouped()
            .rules(POULE_WINNERS),
        PhaseConfig::new(FINAL, "Final", 3, Knockout).terminal(),
    ],
};

static ROUND_ROBIN_FINAL: FormatDefinition = FormatDefinition {
    kind: FormatKind::RoundRobinFinal,
    key: "round_robin_final",
    name: "Round robin and playoffs",
    phases: &[
        PhaseConfig::start(TO_REGULAR_SEASON),
        PhaseConfig::new(REGULAR_SEASON, "Regular season", 1, RoundRobin).rules(TO_PLAYOFFS),
        PhaseConfig::new(QUARTER_FINAL, "Quarter-final", 2, Knockout).rules(TO_SEMI_FINAL),
        PhaseConfig::new(SEMI_FINAL, "Semi-final", 3, Knockout).rules(TO_FINALS),
        PhaseConfig::new(THIRD_PLACE_PLAYOFF, "Third place playoff", 4, Knockout).terminal(),
        PhaseConfig::new(FINAL, "Final", 5, Knockout).terminal(),
    ],
};
