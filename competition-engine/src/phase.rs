//! Static phase configuration
//!
//! Phases and their advancement rules are defined once per format in the [`registry`] and
//! never change at runtime.
//!
//! [`registry`]: crate::registry
use serde::Serialize;

pub const START: &str = "start";
pub const REGULAR_SEASON: &str = "regular_season";
pub const ROUND_OF_32: &str = "round_of_32";
pub const ROUND_OF_16: &str = "round_of_16";
pub const QUARTER_FINAL: &str = "quarter-final";
pub const SEMI_FINAL: &str = "semi-final";
pub const THIRD_PLACE_PLAYOFF: &str = "third-place_playoff";
pub const FINAL: &str = "final";
pub const GROUP_ASSIGNMENT: &str = "group_assignment";
pub const GROUP_STAGE: &str = "group_stage";
pub const KNOCKOUT: &str = "knockout";
pub const SWISS_PHASE_1: &str = "swiss_phase_1";
pub const POULES: &str = "poules";

/// The pairing primitive used to generate the matches of a phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGenerationType {
    RoundRobin,
    Knockout,
    SwissPairing,
    GroupAssignment,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MatchGeneration {
    pub kind: MatchGenerationType,
    /// Overrides the double round robin flag of the settings if set.
    pub include_return_games: Option<bool>,
}

/// Which end of a ranked list a rule selects from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankFrom {
    Top,
    Bottom,
}

/// The number of teams selected by an [`AdvancementRule`]. All variants except [`Exact`] are
/// resolved against the active settings when the phase closes.
///
/// [`Exact`]: Self::Exact
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCount {
    Exact(usize),
    /// Every ranked team.
    All,
    /// The top half rounded up, or the bottom half rounded down.
    HalfField,
    /// `advancing_per_group` of the settings, taken from every group.
    AdvancingPerGroup,
    /// `playoff_teams` of the settings.
    PlayoffTeams,
    /// `bracket_size` of the settings.
    BracketSize,
}

/// Declares how many teams move from the ranked list of a phase into `to_phase`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AdvancementRule {
    pub count: RuleCount,
    pub from: RankFrom,
    pub to_phase: &'static str,
    /// Only rank the teams of this group. Without it every group of a grouped phase is ranked
    /// separately.
    pub from_group: Option<&'static str>,
}

impl AdvancementRule {
    pub const fn top(count: RuleCount, to_phase: &'static str) -> Self {
        Self {
            count,
            from: RankFrom::Top,
            to_phase,
            from_group: None,
        }
    }

    pub const fn bottom(count: RuleCount, to_phase: &'static str) -> Self {
        Self {
            count,
            from: RankFrom::Bottom,
            to_phase,
            from_group: None,
        }
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.from_group = Some(group);
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PhaseConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub order: u32,
    /// `None` for the non-playable `start` phase.
    pub match_generation: Option<MatchGeneration>,
    pub grouped: bool,
    /// The phase is played over several rounds, each generated once the previous one
    /// completed.
    pub multi_round: bool,
    pub advancement_rules: &'static [AdvancementRule],
    pub is_terminal: bool,
}

impl PhaseConfig {
    /// Creates the non-playable `start` phase.
    pub const fn start(rules: &'static [AdvancementRule]) -> Self {
        Self {
            id: START,
            name: "Start",
            order: 0,
            match_generation: None,
            grouped: false,
            multi_round: false,
            advancement_rules: rules,
            is_terminal: false,
        }
    }

    pub const fn new(
        id: &'static str,
        name: &'static str,
        order: u32,
        kind: MatchGenerationType,
    ) -> Self {
        Self {
            id,
            name,
            order,
            match_generation: Some(MatchGeneration {
                kind,
                include_return_games: None,
            }),
            grouped: false,
            multi_round: false,
            advancement_rules: &[],
            is_terminal: false,
        }
    }

    pub const fn rules(mut self, rules: &'static [AdvancementRule]) -> Self {
        self.advancement_rules = rules;
        self
    }

    pub const fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }

    pub const fn multi_round(mut self) -> Self {
        self.multi_round = true;
        self
    }

    pub const fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }

    /// Returns the pairing primitive of the phase. Returns `None` for `start`.
    #[inline]
    pub fn kind(&self) -> Option<MatchGenerationType> {
        self.match_generation.map(|generation| generation.kind)
    }

    #[inline]
    pub fn is_playable(&self) -> bool {
        self.match_generation.is_some()
    }

    #[inline]
    pub fn is_knockout(&self) -> bool {
        self.kind() == Some(MatchGenerationType::Knockout)
    }

    /// Returns the advancement rules leading into `to_phase`.
    pub fn rules_to(&self, to_phase: &str) -> Vec<AdvancementRule> {
        self.advancement_rules
            .iter()
            .filter(|rule| rule.to_phase == to_phase)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AdvancementRule, MatchGenerationType, PhaseConfig, RankFrom, RuleCount, FINAL,
        THIRD_PLACE_PLAYOFF,
    };

    const RULES: &[AdvancementRule] = &[
        AdvancementRule::top(RuleCount::Exact(2), FINAL),
        AdvancementRule::bottom(RuleCount::Exact(2), THIRD_PLACE_PLAYOFF),
    ];

    #[test]
    fn test_phase_config() {
        let start = PhaseConfig::start(&[]);
        assert!(!start.is_playable());
        assert_eq!(start.kind(), None);

        let semi = PhaseConfig::new("semi-final", "Semi-final", 4, MatchGenerationType::Knockout)
            .rules(RULES);
        assert!(semi.is_knockout());
        assert!(!semi.is_terminal);
        assert_eq!(semi.rules_to(FINAL)[0].from, RankFrom::Top);
        assert_eq!(semi.rules_to(THIRD_PLACE_PLAYOFF)[0].from, RankFrom::Bottom);
        assert!(semi.rules_to("poules").is_empty());

        let group = AdvancementRule::top(RuleCount::Exact(1), FINAL).group("A");
        assert_eq!(group.from_group, Some("A"));
    }
}
