//! Format handlers
//!
//! Every format implements [`FormatSystem`]. Most of the behavior only depends on the kind of
//! phase and is shared through the provided methods, the per-format implementations override
//! what is specific to their format: settings validation, phase routing and multi-round
//! phases. [`Handler`] dispatches to the implementation selected by a [`FormatKind`].
mod groups_knockout;
mod knockout;
mod league;
mod round_robin_final;
mod swiss;

pub use groups_knockout::GroupsKnockout;
pub use knockout::Knockout;
pub use league::League;
pub use round_robin_final::RoundRobinFinal;
pub use swiss::SwissSystem;

use competition_core::groups::{self, Group};
use competition_core::knockout::seed_order;
use competition_core::standings::TieBreakContext;
use competition_core::swiss::{pair_round, PlayedPairs};
use competition_core::{
    Bracket, Fixture, Match, RoundRobin, SeedingMethod, Standings, Team, TeamId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::phase::{
    AdvancementRule, MatchGenerationType, PhaseConfig, RankFrom, RuleCount, FINAL,
    THIRD_PLACE_PLAYOFF,
};
use crate::registry::{FormatDefinition, FormatKind};
use crate::settings::{Settings, ValidationIssue, ValidationReport};

/// The output of a successful generation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub fixtures: Vec<Fixture>,
    /// The groups of a grouped phase.
    pub groups: Vec<Group>,
    pub warnings: Vec<ValidationIssue>,
}

/// Generation failed. All problems found are returned at once.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("match generation failed with {} error(s)", .errors.len())]
pub struct GenerationError {
    pub errors: Vec<ValidationIssue>,
}

impl GenerationError {
    pub fn new(issue: ValidationIssue) -> Self {
        Self {
            errors: vec![issue],
        }
    }

    /// Returns `true` if an error with `message_key` was reported.
    pub fn has_error(&self, message_key: &str) -> bool {
        self.errors.iter().any(|issue| issue.message_key == message_key)
    }
}

impl From<ValidationReport> for GenerationError {
    fn from(report: ValidationReport) -> Self {
        Self {
            errors: report.errors,
        }
    }
}

impl From<competition_core::Error> for GenerationError {
    fn from(err: competition_core::Error) -> Self {
        use competition_core::Error;

        let issue = match err {
            Error::NotEnoughTeams { required, found } => {
                ValidationIssue::new("teams", "teams.not_enough")
                    .param("required", required)
                    .param("found", found)
            }
            Error::DuplicateTeam(team) => {
                ValidationIssue::new("teams", "teams.duplicate").param("team", team)
            }
            Error::RankOutOfRange { rank, length } => {
                ValidationIssue::new("groups", "groups.rank_out_of_range")
                    .param("rank", rank)
                    .param("length", length)
            }
            Error::DuplicateRank(rank) => {
                ValidationIssue::new("groups", "groups.duplicate_rank").param("rank", rank)
            }
            Error::EmptyPattern => ValidationIssue::new("groups", "groups.empty_pattern"),
            Error::InvalidBracketSize(size) => {
                ValidationIssue::new("teams", "knockout.invalid_bracket_size").param("size", size)
            }
            Error::InvalidMatch { index } | Error::UndecidedSpot { index, .. } => {
                ValidationIssue::new("matches", "knockout.invalid_match").param("index", index)
            }
        };

        Self::new(issue)
    }
}

/// The input of [`FormatSystem::generate_matches`] and [`FormatSystem::next_round`].
#[derive(Copy, Clone, Debug)]
pub struct GenerationContext<'a> {
    pub phase: &'static PhaseConfig,
    pub settings: &'a Settings,
    /// The teams entering the phase, already ranked by the previous phase.
    pub teams: &'a [Team],
    /// Explicit groups of a grouped phase. Derived by the handler if absent.
    pub groups: Option<&'a [Group]>,
    /// The matches of the phase generated so far.
    pub matches: &'a [Match],
    pub random_seed: Option<u64>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(phase: &'static PhaseConfig, settings: &'a Settings, teams: &'a [Team]) -> Self {
        Self {
            phase,
            settings,
            teams,
            groups: None,
            matches: &[],
            random_seed: None,
        }
    }

    pub fn groups(mut self, groups: &'a [Group]) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn matches(mut self, matches: &'a [Match]) -> Self {
        self.matches = matches;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.random_seed.or_else(|| self.settings.random_seed()) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Returns the ids of the teams ordered by seed. Teams without a seed use their position.
    fn ranked_ids(&self) -> Vec<TeamId> {
        ranked_ids(self.teams)
    }

    /// Returns the round following the last generated round of the phase.
    fn next_round_number(&self) -> u32 {
        self.matches
            .iter()
            .filter_map(|m| m.round)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// The input of the operations on a phase that already has matches.
#[derive(Copy, Clone, Debug)]
pub struct PhaseContext<'a> {
    pub phase: &'static PhaseConfig,
    pub settings: &'a Settings,
    /// The teams of the season.
    pub teams: &'a [Team],
    /// The matches of the phase, with all manual overrides applied.
    pub matches: &'a [Match],
    /// The operator supplied order of teams with equal points.
    pub tie_order: &'a [TeamId],
    pub tie_break: Option<&'a TieBreakContext>,
}

impl<'a> PhaseContext<'a> {
    pub fn new(
        phase: &'static PhaseConfig,
        settings: &'a Settings,
        teams: &'a [Team],
        matches: &'a [Match],
    ) -> Self {
        Self {
            phase,
            settings,
            teams,
            matches,
            tie_order: &[],
            tie_break: None,
        }
    }

    pub fn tie_order(mut self, order: &'a [TeamId]) -> Self {
        self.tie_order = order;
        self
    }

    pub fn tie_break(mut self, context: &'a TieBreakContext) -> Self {
        self.tie_break = Some(context);
        self
    }

    /// Returns the matches of the phase, optionally restricted to a single `group`.
    fn phase_matches(&self, group: Option<&str>) -> Vec<Match> {
        self.matches
            .iter()
            .filter(|m| m.stage == self.phase.id)
            .filter(|m| group.map_or(true, |group| m.group.as_deref() == Some(group)))
            .cloned()
            .collect()
    }
}

/// The behavior of a competition format.
pub trait FormatSystem {
    fn kind(&self) -> FormatKind;

    #[inline]
    fn definition(&self) -> &'static FormatDefinition {
        self.kind().definition()
    }

    /// Validates `settings`, optionally against the number of teams in the season. Problems are
    /// collected, never raised.
    fn validate_settings(
        &self,
        settings: &Settings,
        team_count: Option<usize>,
    ) -> ValidationReport;

    /// Generates the first round of matches of `ctx.phase`.
    fn generate_matches(&self, ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
        check_format(self.kind(), ctx.settings)?;

        match phase_kind(ctx.phase)? {
            MatchGenerationType::RoundRobin => {
                let groups = if ctx.phase.grouped {
                    match ctx.groups {
                        Some(groups) => Some(groups.to_vec()),
                        None => Some(self.derive_groups(ctx)?),
                    }
                } else {
                    None
                };

                round_robin(ctx, groups)
            }
            MatchGenerationType::Knockout => {
                let seeding = self.seeding(ctx.settings, ctx.phase);
                knockout_round(ctx, seeding, 1)
            }
            MatchGenerationType::SwissPairing => swiss_round(ctx),
            MatchGenerationType::GroupAssignment => {
                let groups = match ctx.groups {
                    Some(groups) => groups.to_vec(),
                    None => self.derive_groups(ctx)?,
                };

                Ok(Generation {
                    groups,
                    ..Default::default()
                })
            }
        }
    }

    /// Generates the next round of a multi-round phase that is not finished yet.
    fn next_round(&self, ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
        Err(GenerationError::new(
            ValidationIssue::new("phase", "generation.single_round_phase")
                .param("phase", ctx.phase.id),
        ))
    }

    /// Derives the groups of a grouped phase from the ranked teams.
    fn derive_groups(&self, ctx: &GenerationContext<'_>) -> Result<Vec<Group>, GenerationError> {
        Err(GenerationError::new(
            ValidationIssue::new("groups", "groups.not_supported").param("phase", ctx.phase.id),
        ))
    }

    /// Builds the complete bracket of the knockout phase `ctx.phase` from the teams of `ctx`,
    /// using the seeding of the phase. Only the first round is decided.
    fn bracket_preview(&self, ctx: &GenerationContext<'_>) -> Result<Bracket, GenerationError> {
        check_format(self.kind(), ctx.settings)?;

        if phase_kind(ctx.phase)? != MatchGenerationType::Knockout {
            return Err(GenerationError::new(
                ValidationIssue::new("phase", "generation.not_knockout")
                    .param("phase", ctx.phase.id),
            ));
        }

        let seeding = self.seeding(ctx.settings, ctx.phase);
        bracket(ctx, seeding, ctx.settings.third_place_match())
    }

    /// Returns the seeding method used for the knockout `phase`.
    fn seeding(&self, settings: &Settings, _phase: &PhaseConfig) -> SeedingMethod {
        settings.seeding()
    }

    /// Calculates the standings of the phase, optionally for a single `group`. Knockout phases
    /// use the knockout variant.
    fn calculate_standings(&self, ctx: &PhaseContext<'_>, group: Option<&str>) -> Standings {
        let matches = ctx.phase_matches(group);

        let mut standings = if ctx.phase.is_knockout() {
            Standings::knockout(&matches)
        } else {
            let options = ctx.settings.standings_options();
            match ctx.tie_break {
                Some(context) => Standings::calculate_with_context(&matches, &options, context),
                None => Standings::calculate(&matches, &options),
            }
        };

        if !ctx.tie_order.is_empty() {
            standings.reorder_ties(ctx.tie_order);
        }

        standings
    }

    /// Returns the phases following `current` in generation order. Returns two phases when the
    /// third place playoff and the final are generated together.
    fn next_phases(&self, settings: &Settings, current: &str) -> Vec<&'static PhaseConfig> {
        let definition = self.definition();

        let phase = match definition.phase(current) {
            Some(phase) => phase,
            None => return Vec::new(),
        };

        if phase.is_terminal {
            return Vec::new();
        }

        if phase.rules_to(THIRD_PLACE_PLAYOFF).is_empty() {
            definition.next_phase_by_order(current).into_iter().collect()
        } else {
            finals(definition, settings.third_place_match())
        }
    }

    /// Returns the phase following `current`.
    fn next_phase(&self, settings: &Settings, current: &str) -> Option<&'static PhaseConfig> {
        self.next_phases(settings, current).into_iter().next()
    }

    /// Returns `true` if all rounds of the phase have been generated.
    fn phase_finished(&self, _ctx: &PhaseContext<'_>) -> bool {
        true
    }

    /// Returns the teams selected by `rules` in rule order, without duplicates.
    fn advancing_teams(&self, ctx: &PhaseContext<'_>, rules: &[AdvancementRule]) -> Vec<TeamId> {
        let mut advancing = Vec::new();

        for rule in rules {
            let selected = match ctx.phase.kind() {
                None | Some(MatchGenerationType::GroupAssignment) => {
                    let ranking = ranked_ids(ctx.teams);
                    let count = resolve_count(ctx.settings, rule, ranking.len());
                    select(&ranking, rule.from, count)
                }
                Some(MatchGenerationType::Knockout) => {
                    let decided = last_round_results(ctx.matches, rule.from);
                    let count = resolve_count(ctx.settings, rule, decided.len());
                    decided.into_iter().take(count).collect()
                }
                Some(_) if ctx.phase.grouped => self.advancing_from_groups(ctx, rule),
                Some(_) => {
                    let mut ranking = self.calculate_standings(ctx, None).teams();

                    // Teams without a completed match rank last, in seed order.
                    for team in ranked_ids(ctx.teams) {
                        if !ranking.contains(&team) {
                            ranking.push(team);
                        }
                    }

                    let count = resolve_count(ctx.settings, rule, ranking.len());
                    select(&ranking, rule.from, count)
                }
            };

            for team in selected {
                if !advancing.contains(&team) {
                    advancing.push(team);
                }
            }
        }

        log::debug!(
            "{} teams advance from {} ({} rules)",
            advancing.len(),
            ctx.phase.id,
            rules.len()
        );

        advancing
    }

    /// Selects the teams of `rule` from a grouped phase. Without `from_group` the teams of all
    /// groups are interleaved by position: all group winners first, then all runners-up.
    fn advancing_from_groups(&self, ctx: &PhaseContext<'_>, rule: &AdvancementRule) -> Vec<TeamId> {
        let names: Vec<String> = match rule.from_group {
            Some(group) => vec![group.to_owned()],
            None => group_names(ctx.matches),
        };

        let selections: Vec<Vec<TeamId>> = names
            .iter()
            .map(|name| {
                let ranking = self.calculate_standings(ctx, Some(name)).teams();
                let count = resolve_count(ctx.settings, rule, ranking.len());
                select(&ranking, rule.from, count)
            })
            .collect();

        let longest = selections.iter().map(Vec::len).max().unwrap_or(0);

        let mut teams = Vec::new();
        for position in 0..longest {
            for selection in &selections {
                if let Some(team) = selection.get(position) {
                    teams.push(*team);
                }
            }
        }

        teams
    }
}

/// A handler for any [`FormatKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Handler {
    LeagueOnly(League),
    Knockout(Knockout),
    GroupsKnockout(GroupsKnockout),
    SwissSystem(SwissSystem),
    RoundRobinFinal(RoundRobinFinal),
}

impl Handler {
    pub fn new(kind: FormatKind) -> Self {
        match kind {
            FormatKind::LeagueOnly => Self::LeagueOnly(League),
            FormatKind::Knockout => Self::Knockout(Knockout),
            FormatKind::GroupsKnockout => Self::GroupsKnockout(GroupsKnockout),
            FormatKind::SwissSystem => Self::SwissSystem(SwissSystem),
            FormatKind::RoundRobinFinal => Self::RoundRobinFinal(RoundRobinFinal),
        }
    }

    /// Returns the handler of the format selected by `settings`.
    #[inline]
    pub fn for_settings(settings: &Settings) -> Self {
        Self::new(settings.kind())
    }
}

macro_rules! dispatch {
    ($self:expr, $handler:ident => $e:expr) => {
        match $self {
            Handler::LeagueOnly($handler) => $e,
            Handler::Knockout($handler) => $e,
            Handler::GroupsKnockout($handler) => $e,
            Handler::SwissSystem($handler) => $e,
            Handler::RoundRobinFinal($handler) => $e,
        }
    };
}

impl FormatSystem for Handler {
    fn kind(&self) -> FormatKind {
        dispatch!(self, h => h.kind())
    }

    fn validate_settings(
        &self,
        settings: &Settings,
        team_count: Option<usize>,
    ) -> ValidationReport {
        dispatch!(self, h => h.validate_settings(settings, team_count))
    }

    fn generate_matches(&self, ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
        dispatch!(self, h => h.generate_matches(ctx))
    }

    fn next_round(&self, ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
        dispatch!(self, h => h.next_round(ctx))
    }

    fn derive_groups(&self, ctx: &GenerationContext<'_>) -> Result<Vec<Group>, GenerationError> {
        dispatch!(self, h => h.derive_groups(ctx))
    }

    fn bracket_preview(&self, ctx: &GenerationContext<'_>) -> Result<Bracket, GenerationError> {
        dispatch!(self, h => h.bracket_preview(ctx))
    }

    fn seeding(&self, settings: &Settings, phase: &PhaseConfig) -> SeedingMethod {
        dispatch!(self, h => h.seeding(settings, phase))
    }

    fn calculate_standings(&self, ctx: &PhaseContext<'_>, group: Option<&str>) -> Standings {
        dispatch!(self, h => h.calculate_standings(ctx, group))
    }

    fn next_phases(&self, settings: &Settings, current: &str) -> Vec<&'static PhaseConfig> {
        dispatch!(self, h => h.next_phases(settings, current))
    }

    fn next_phase(&self, settings: &Settings, current: &str) -> Option<&'static PhaseConfig> {
        dispatch!(self, h => h.next_phase(settings, current))
    }

    fn phase_finished(&self, ctx: &PhaseContext<'_>) -> bool {
        dispatch!(self, h => h.phase_finished(ctx))
    }

    fn advancing_teams(&self, ctx: &PhaseContext<'_>, rules: &[AdvancementRule]) -> Vec<TeamId> {
        dispatch!(self, h => h.advancing_teams(ctx, rules))
    }

    fn advancing_from_groups(&self, ctx: &PhaseContext<'_>, rule: &AdvancementRule) -> Vec<TeamId> {
        dispatch!(self, h => h.advancing_from_groups(ctx, rule))
    }
}

/// Fails if `settings` belong to a format other than `kind`.
fn check_format(kind: FormatKind, settings: &Settings) -> Result<(), GenerationError> {
    match wrong_format(kind, settings) {
        Some(issue) => Err(GenerationError::new(issue)),
        None => Ok(()),
    }
}

fn wrong_format(kind: FormatKind, settings: &Settings) -> Option<ValidationIssue> {
    if settings.kind() == kind {
        None
    } else {
        Some(
            ValidationIssue::new("format", "settings.wrong_format")
                .param("expected", kind)
                .param("found", settings.kind()),
        )
    }
}

/// Returns a report containing only the wrong format error, if `settings` belong to another
/// format.
pub(crate) fn validate_format(kind: FormatKind, settings: &Settings) -> Option<ValidationReport> {
    wrong_format(kind, settings).map(|issue| ValidationReport {
        errors: vec![issue],
        warnings: Vec::new(),
    })
}

fn phase_kind(phase: &PhaseConfig) -> Result<MatchGenerationType, GenerationError> {
    phase.kind().ok_or_else(|| {
        GenerationError::new(
            ValidationIssue::new("phase", "generation.start_phase").param("phase", phase.id),
        )
    })
}

fn ensure_teams(teams: usize, required: usize) -> Result<(), GenerationError> {
    if teams < required {
        Err(competition_core::Error::NotEnoughTeams {
            required,
            found: teams,
        }
        .into())
    } else {
        Ok(())
    }
}

pub(crate) fn validate_team_count(report: &mut ValidationReport, found: usize, required: usize) {
    if found < required {
        report.error(
            ValidationIssue::new("teams", "teams.not_enough")
                .param("required", required)
                .param("found", found),
        );
    }
}

pub(crate) fn warn_power_of_two(report: &mut ValidationReport, teams: usize) {
    if !teams.is_power_of_two() {
        report.warning(
            ValidationIssue::new("teams", "teams.not_power_of_two").param("teams", teams),
        );
    }
}

/// Maximum number of league matches before a warning is issued.
pub(crate) const LARGE_LEAGUE: usize = 200;

pub(crate) fn warn_large_league(report: &mut ValidationReport, teams: usize, double: bool) {
    let mut matches = teams * teams.saturating_sub(1) / 2;
    if double {
        matches *= 2;
    }

    if matches > LARGE_LEAGUE {
        report.warning(
            ValidationIssue::new("teams", "league.large_match_count")
                .param("matches", matches)
                .param("limit", LARGE_LEAGUE),
        );
    }
}

fn ranked_ids(teams: &[Team]) -> Vec<TeamId> {
    let mut ranked: Vec<(u64, usize, TeamId)> = teams
        .iter()
        .enumerate()
        .map(|(position, team)| (team.seed_or_position(position), position, team.id))
        .collect();

    ranked.sort_unstable();
    ranked.into_iter().map(|(_, _, id)| id).collect()
}

/// Returns the third place playoff (if enabled) followed by the final.
fn finals(definition: &'static FormatDefinition, third_place: bool) -> Vec<&'static PhaseConfig> {
    let mut phases = Vec::with_capacity(2);

    if third_place {
        phases.extend(definition.phase(THIRD_PLACE_PLAYOFF));
    }

    phases.extend(definition.phase(FINAL));
    phases
}

fn resolve_count(settings: &Settings, rule: &AdvancementRule, field: usize) -> usize {
    let count = match rule.count {
        RuleCount::Exact(count) => count,
        RuleCount::All => field,
        RuleCount::HalfField => match rule.from {
            RankFrom::Top => (field + 1) / 2,
            RankFrom::Bottom => field / 2,
        },
        RuleCount::AdvancingPerGroup => match settings {
            Settings::GroupsKnockout(s) => s.advancing_per_group,
            _ => field,
        },
        RuleCount::PlayoffTeams => match settings {
            Settings::RoundRobinFinal(s) => s.playoff_teams,
            _ => field,
        },
        RuleCount::BracketSize => match settings {
            Settings::Knockout(s) => s.bracket_size,
            _ => field,
        },
    };

    count.min(field)
}

fn select(ranking: &[TeamId], from: RankFrom, count: usize) -> Vec<TeamId> {
    match from {
        RankFrom::Top => ranking.iter().take(count).copied().collect(),
        RankFrom::Bottom => ranking[ranking.len() - count..].to_vec(),
    }
}

/// Returns the distinct group names of `matches` in order.
fn group_names(matches: &[Match]) -> Vec<String> {
    let mut names: Vec<String> = matches.iter().filter_map(|m| m.group.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Returns the matches of the last round in bracket order. Hosts assign ids in insertion order,
/// see [`MatchStore::insert_batch`].
///
/// [`MatchStore::insert_batch`]: crate::store::MatchStore::insert_batch
fn last_round(matches: &[Match]) -> Vec<&Match> {
    let last = matches.iter().filter_map(|m| m.round).max();

    let mut round: Vec<&Match> = matches.iter().filter(|m| m.round == last).collect();
    round.sort_by_key(|m| m.id);
    round
}

/// Returns the winners (`Top`) or losers (`Bottom`) of the last round in bracket order.
/// Undecided matches are skipped.
fn last_round_results(matches: &[Match], from: RankFrom) -> Vec<TeamId> {
    last_round(matches)
        .into_iter()
        .filter_map(|m| match from {
            RankFrom::Top => m.winner(),
            RankFrom::Bottom => m.loser(),
        })
        .collect()
}

/// Generates a single or double round robin, per group if `groups` is given.
fn round_robin(
    ctx: &GenerationContext<'_>,
    groups: Option<Vec<Group>>,
) -> Result<Generation, GenerationError> {
    let return_games = ctx
        .phase
        .match_generation
        .and_then(|generation| generation.include_return_games)
        .unwrap_or_else(|| ctx.settings.double_round_robin());

    let mut generation = Generation::default();

    match groups {
        Some(groups) => {
            for group in &groups {
                ensure_teams(group.teams.len(), 2)?;

                let schedule =
                    RoundRobin::new_with_return_games(group.teams.iter().copied(), return_games);
                generation
                    .fixtures
                    .extend(schedule.fixtures(ctx.phase.id, Some(&group.name)));
            }

            generation.groups = groups;
        }
        None => {
            ensure_teams(ctx.teams.len(), 2)?;

            let schedule = RoundRobin::new_with_return_games(
                ctx.teams.iter().map(|team| team.id),
                return_games,
            );
            generation.fixtures = schedule.fixtures(ctx.phase.id, None);
        }
    }

    log::debug!(
        "Generated {} round robin fixtures for {}",
        generation.fixtures.len(),
        ctx.phase.id
    );

    Ok(generation)
}

/// Seeds the teams of `ctx` into a new bracket.
fn bracket(
    ctx: &GenerationContext<'_>,
    seeding: SeedingMethod,
    third_place_match: bool,
) -> Result<Bracket, GenerationError> {
    ensure_teams(ctx.teams.len(), 2)?;

    if !ctx.teams.len().is_power_of_two() {
        return Err(GenerationError::new(
            ValidationIssue::new("teams", "knockout.team_count")
                .param("teams", ctx.teams.len()),
        ));
    }

    let ordered = seed_order(ctx.teams, seeding, &mut ctx.rng())?;
    Ok(Bracket::new(&ordered, third_place_match)?)
}

/// Generates a knockout round from the teams of `ctx`. Only the first round of the bracket
/// is played within the phase, later rounds are separate phases or continuations.
fn knockout_round(
    ctx: &GenerationContext<'_>,
    seeding: SeedingMethod,
    round: u32,
) -> Result<Generation, GenerationError> {
    let bracket = bracket(ctx, seeding, false)?;

    let fixtures: Vec<Fixture> = bracket
        .playable()
        .into_iter()
        .map(|(_, home, away)| Fixture {
            home_team_id: home,
            away_team_id: away,
            stage: ctx.phase.id.to_owned(),
            round: Some(round),
            group: None,
        })
        .collect();

    log::debug!(
        "Generated {} knockout fixtures for {} round {}",
        fixtures.len(),
        ctx.phase.id,
        round
    );

    Ok(Generation {
        fixtures,
        ..Default::default()
    })
}

/// Generates the next round of a multi-round knockout phase from the winners of its last round.
fn knockout_next_round(ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
    let round = last_round(ctx.matches);

    if let Some(m) = round.iter().find(|m| m.winner().is_none()) {
        return Err(GenerationError::new(
            ValidationIssue::new("matches", "knockout.undecided_match").param("match", m.id),
        ));
    }

    let winners: Vec<Team> = round
        .iter()
        .filter_map(|m| m.winner())
        .enumerate()
        .map(|(position, team)| Team::seeded(team, position as u32 + 1))
        .collect();

    let next = GenerationContext { teams: &winners, ..*ctx };
    knockout_round(&next, SeedingMethod::Manual, ctx.next_round_number())
}

/// Pairs the next swiss round from the current standings of the phase.
fn swiss_round(ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
    ensure_teams(ctx.teams.len(), 2)?;

    let round = ctx.next_round_number();
    let standings = Standings::calculate(ctx.matches, &ctx.settings.standings_options());
    let played = PlayedPairs::from_matches(ctx.matches);

    let swiss = pair_round(&ctx.ranked_ids(), &standings.teams(), &played, round)?;

    let warnings = swiss
        .repeats
        .iter()
        .map(|(home, away)| {
            ValidationIssue::new("swiss_rounds", "swiss.forced_repeat")
                .param("round", round)
                .param("home", home)
                .param("away", away)
        })
        .collect();

    if let Some(team) = swiss.bye {
        log::debug!("Team {} has a bye in swiss round {}", team, round);
    }

    Ok(Generation {
        fixtures: swiss
            .pairings
            .iter()
            .filter_map(|pairing| pairing.to_fixture(ctx.phase.id, None))
            .collect(),
        groups: Vec::new(),
        warnings,
    })
}

/// Distributes the ranked teams of `ctx` into `number` groups using snake seeding.
fn snake_groups(ctx: &GenerationContext<'_>, number: usize) -> Result<Vec<Group>, GenerationError> {
    if number == 0 {
        return Err(competition_core::Error::EmptyPattern.into());
    }

    Ok(groups::snake(&ctx.ranked_ids(), number)?)
}
