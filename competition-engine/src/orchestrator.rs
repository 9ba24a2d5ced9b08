//! Phase transitions
//!
//! A transition closes the current phase of a season and generates the matches of the phases
//! that follow it. It is split into [`Orchestrator::plan`], which is a pure function of its
//! inputs and can be used for previews, and [`Orchestrator::commit`], which hands the planned
//! fixtures to the host's store.
use std::collections::BTreeMap;

use chrono::Utc;
use competition_core::groups::Group;
use competition_core::standings::TieBreakContext;
use competition_core::{Match, MatchId, MatchStatus, Standings, Team, TeamId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::handler::{
    FormatSystem, Generation, GenerationContext, GenerationError, Handler, PhaseContext,
};
use crate::phase::PhaseConfig;
use crate::registry::FormatKind;
use crate::settings::{Settings, ValidationIssue};
use crate::store::{MatchStore, SeasonId, Snapshot, SnapshotSink, StoreError};

/// How an operator resolves a match that is not completed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The match is removed from consideration.
    Cancel,
    /// The match stays unresolved but no longer blocks the phase.
    Freeze,
    /// The match is completed with the given scores.
    Result,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedMatch {
    pub resolution: Resolution,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
}

/// The operator order of teams with equal points.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieOrder {
    pub points: Vec<TeamId>,
}

/// Operator input for a phase that cannot close on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOverride {
    pub resolved_matches: BTreeMap<MatchId, ResolvedMatch>,
    pub tie_breakers: TieOrder,
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("{} matches of the phase are still open", .matches.len())]
    OpenMatches { matches: Vec<MatchId> },
    #[error("phase {0} is terminal")]
    TerminalPhase(&'static str),
    #[error("unknown phase {0}")]
    UnknownPhase(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// A knockout match or a result override has no winner.
    #[error("match {0} has no result")]
    UndecidedMatch(MatchId),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// The matches of a phase with all overrides applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseStatus {
    /// Matches that are neither completed, cancelled nor resolved by an override.
    pub open: Vec<MatchId>,
    pub matches: Vec<Match>,
}

impl PhaseStatus {
    #[inline]
    pub fn can_close(&self) -> bool {
        self.open.is_empty()
    }
}

/// The input of [`Orchestrator::plan`].
#[derive(Copy, Clone, Debug)]
pub struct PlanRequest<'a> {
    pub season: SeasonId,
    pub settings: &'a Settings,
    /// The id of the phase to close.
    pub phase: &'a str,
    /// All teams of the season.
    pub teams: &'a [Team],
    /// The matches of the phase.
    pub matches: &'a [Match],
    pub overrides: Option<&'a ManualOverride>,
    /// Explicit groups for a grouped target phase.
    pub groups: Option<&'a [Group]>,
    pub random_seed: Option<u64>,
    pub tie_break: Option<&'a TieBreakContext>,
}

impl<'a> PlanRequest<'a> {
    pub fn new(
        season: SeasonId,
        settings: &'a Settings,
        phase: &'a str,
        teams: &'a [Team],
        matches: &'a [Match],
    ) -> Self {
        Self {
            season,
            settings,
            phase,
            teams,
            matches,
            overrides: None,
            groups: None,
            random_seed: None,
            tie_break: None,
        }
    }

    pub fn overrides(mut self, overrides: &'a ManualOverride) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn groups(mut self, groups: &'a [Group]) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn tie_break(mut self, context: &'a TieBreakContext) -> Self {
        self.tie_break = Some(context);
        self
    }
}

/// The generated matches of a single phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedPhase {
    pub phase: &'static str,
    /// The teams entering the phase in ranked order.
    pub teams: Vec<TeamId>,
    pub generation: Generation,
}

/// A planned but not yet committed transition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transition {
    pub season: SeasonId,
    pub from: &'static str,
    /// The phase continues with another round instead of closing.
    pub continuation: bool,
    pub snapshot: Snapshot,
    pub phases: Vec<PlannedPhase>,
    pub warnings: Vec<ValidationIssue>,
}

impl Transition {
    /// Returns the number of planned matches over all phases.
    pub fn match_count(&self) -> usize {
        self.phases
            .iter()
            .map(|phase| phase.generation.fixtures.len())
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub inserted: Vec<MatchId>,
    /// The error of the snapshot sink. The transition is committed regardless.
    pub snapshot_error: Option<String>,
    pub phases: Vec<&'static str>,
}

/// Drives the phase state machine of a single format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Orchestrator {
    handler: Handler,
}

impl Orchestrator {
    pub fn new(kind: FormatKind) -> Self {
        Self {
            handler: Handler::new(kind),
        }
    }

    #[inline]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Applies `overrides` to the matches of `phase` and collects the matches still blocking
    /// the phase.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::UndecidedMatch`] if a result override lacks a score.
    pub fn status(
        &self,
        phase: &str,
        matches: &[Match],
        overrides: Option<&ManualOverride>,
    ) -> Result<PhaseStatus, TransitionError> {
        let mut open = Vec::new();
        let mut effective = Vec::new();

        for m in matches.iter().filter(|m| m.stage == phase) {
            let mut m = m.clone();

            match overrides.and_then(|o| o.resolved_matches.get(&m.id)) {
                Some(resolved) => match resolved.resolution {
                    Resolution::Cancel => m.status = MatchStatus::Cancelled,
                    Resolution::Freeze => (),
                    Resolution::Result => match (resolved.home_score, resolved.away_score) {
                        (Some(home), Some(away)) => {
                            m.status = MatchStatus::Completed;
                            m.home_score = Some(home);
                            m.away_score = Some(away);
                        }
                        _ => return Err(TransitionError::UndecidedMatch(m.id)),
                    },
                },
                None => {
                    if !matches!(m.status, MatchStatus::Completed | MatchStatus::Cancelled) {
                        open.push(m.id);
                    }
                }
            }

            effective.push(m);
        }

        Ok(PhaseStatus {
            open,
            matches: effective,
        })
    }

    /// Plans the transition out of `request.phase`.
    ///
    /// # Errors
    ///
    /// Fails without side effects if the phase is unknown or terminal, if open matches remain,
    /// or if the following phases cannot be generated.
    pub fn plan(&self, request: &PlanRequest<'_>) -> Result<Transition, TransitionError> {
        let phase = self
            .handler
            .definition()
            .phase(request.phase)
            .ok_or_else(|| TransitionError::UnknownPhase(request.phase.to_owned()))?;

        if phase.is_terminal {
            return Err(TransitionError::TerminalPhase(phase.id));
        }

        let report = self
            .handler
            .validate_settings(request.settings, Some(request.teams.len()));
        if !report.is_valid() {
            return Err(GenerationError::from(report).into());
        }

        let mut warnings = report.warnings;

        let status = self.status(phase.id, request.matches, request.overrides)?;
        if !status.can_close() {
            return Err(TransitionError::OpenMatches {
                matches: status.open,
            });
        }

        if phase.is_knockout() {
            if let Some(m) = status
                .matches
                .iter()
                .find(|m| m.is_completed() && m.winner().is_none())
            {
                return Err(TransitionError::UndecidedMatch(m.id));
            }
        }

        let tie_order = request
            .overrides
            .map(|o| o.tie_breakers.points.as_slice())
            .unwrap_or_default();

        let mut ctx = PhaseContext::new(phase, request.settings, request.teams, &status.matches)
            .tie_order(tie_order);
        if let Some(context) = request.tie_break {
            ctx = ctx.tie_break(context);
        }

        let snapshot = self.snapshot(&ctx, &status.matches);

        if phase.is_playable() && !self.handler.phase_finished(&ctx) {
            let mut gen_ctx = GenerationContext::new(phase, request.settings, request.teams)
                .matches(&status.matches);
            if let Some(seed) = request.random_seed {
                gen_ctx = gen_ctx.random_seed(seed);
            }

            let generation = self.handler.next_round(&gen_ctx)?;
            warnings.extend(generation.warnings.iter().cloned());

            log::debug!(
                "Season {}: {} continues with {} matches",
                request.season,
                phase.id,
                generation.fixtures.len()
            );

            return Ok(Transition {
                season: request.season,
                from: phase.id,
                continuation: true,
                snapshot,
                phases: vec![PlannedPhase {
                    phase: phase.id,
                    teams: request.teams.iter().map(|team| team.id).collect(),
                    generation,
                }],
                warnings,
            });
        }

        let targets = self.handler.next_phases(request.settings, phase.id);
        if targets.is_empty() {
            return Err(GenerationError::new(
                ValidationIssue::new("phase", "phase.no_next_phase").param("phase", phase.id),
            )
            .into());
        }

        let mut phases = Vec::with_capacity(targets.len());
        for target in targets {
            let planned = self.plan_phase(request, &ctx, phase, target)?;
            warnings.extend(planned.generation.warnings.iter().cloned());
            phases.push(planned);
        }

        Ok(Transition {
            season: request.season,
            from: phase.id,
            continuation: false,
            snapshot,
            phases,
            warnings,
        })
    }

    /// Selects the teams advancing from `phase` into `target` and generates `target`.
    fn plan_phase(
        &self,
        request: &PlanRequest<'_>,
        ctx: &PhaseContext<'_>,
        phase: &'static PhaseConfig,
        target: &'static PhaseConfig,
    ) -> Result<PlannedPhase, TransitionError> {
        let rules = phase.rules_to(target.id);
        let advancing = self.handler.advancing_teams(ctx, &rules);

        // Teams entering from the start phase keep their seeds, all others are seeded by
        // their rank.
        let teams: Vec<Team> = advancing
            .iter()
            .enumerate()
            .map(|(position, id)| {
                if phase.is_playable() {
                    Team::seeded(*id, position as u32 + 1)
                } else {
                    request
                        .teams
                        .iter()
                        .find(|team| team.id == *id)
                        .copied()
                        .unwrap_or(Team::new(*id))
                }
            })
            .collect();

        let mut gen_ctx = GenerationContext::new(target, request.settings, &teams);
        if let (true, Some(groups)) = (target.grouped, request.groups) {
            gen_ctx = gen_ctx.groups(groups);
        }
        if let Some(seed) = request.random_seed {
            gen_ctx = gen_ctx.random_seed(seed);
        }

        let generation = self.handler.generate_matches(&gen_ctx)?;

        log::debug!(
            "Season {}: {} teams advance from {} to {}, {} matches",
            request.season,
            advancing.len(),
            phase.id,
            target.id,
            generation.fixtures.len()
        );

        Ok(PlannedPhase {
            phase: target.id,
            teams: advancing,
            generation,
        })
    }

    fn snapshot(&self, ctx: &PhaseContext<'_>, matches: &[Match]) -> Snapshot {
        let standings = self.handler.calculate_standings(ctx, None);

        let mut groups: BTreeMap<&str, Standings> = BTreeMap::new();
        if ctx.phase.grouped {
            for name in matches.iter().filter_map(|m| m.group.as_deref()) {
                if !groups.contains_key(name) {
                    groups.insert(name, self.handler.calculate_standings(ctx, Some(name)));
                }
            }
        }

        Snapshot {
            phase_name: ctx.phase.id.to_owned(),
            snapshot_data: json!({
                "format": self.handler.kind(),
                "standings": standings,
                "groups": groups,
            }),
            taken_at: Utc::now(),
        }
    }

    /// Commits a planned transition. The snapshot is recorded first, a failing sink is logged
    /// and reported. All fixtures are inserted in a single batch.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Persistence`] if the batch is rejected. Nothing of the
    /// transition's matches is stored in that case.
    pub fn commit<S, K>(
        &self,
        transition: &Transition,
        store: &S,
        sink: &K,
    ) -> Result<CommitReport, TransitionError>
    where
        S: MatchStore + ?Sized,
        K: SnapshotSink + ?Sized,
    {
        let snapshot_error = match sink.record(transition.season, &transition.snapshot) {
            Ok(()) => None,
            Err(err) => {
                log::warn!(
                    "Failed to record the {} snapshot of season {}: {}",
                    transition.from,
                    transition.season,
                    err
                );
                Some(err.to_string())
            }
        };

        let fixtures: Vec<_> = transition
            .phases
            .iter()
            .flat_map(|phase| phase.generation.fixtures.iter().cloned())
            .collect();

        let inserted = store.insert_batch(transition.season, &fixtures)?;
        let phases: Vec<&'static str> = transition.phases.iter().map(|phase| phase.phase).collect();

        log::info!(
            "Season {}: {} -> {} ({} matches)",
            transition.season,
            transition.from,
            phases.join(", "),
            inserted.len()
        );

        Ok(CommitReport {
            inserted,
            snapshot_error,
            phases,
        })
    }

    /// Plans and commits the transition out of `phase` using the teams and matches in `store`.
    pub fn advance<S>(
        &self,
        season: SeasonId,
        settings: &Settings,
        phase: &str,
        store: &S,
        overrides: Option<&ManualOverride>,
    ) -> Result<CommitReport, TransitionError>
    where
        S: MatchStore + SnapshotSink + ?Sized,
    {
        let teams = store.teams(season)?;
        let matches = store.matches(season, Some(phase))?;

        let mut request = PlanRequest::new(season, settings, phase, &teams, &matches);
        if let Some(overrides) = overrides {
            request = request.overrides(overrides);
        }

        let transition = self.plan(&request)?;
        self.commit(&transition, store, store)
    }
}

#[cfg(test)]
mod tests {
    use competition_core::{Match, MatchId, MatchStatus, TeamId};

    use super::{ManualOverride, Orchestrator, PlanRequest, Resolution, TransitionError};
    use crate::handler::tests::result;
    use crate::phase::{FINAL, QUARTER_FINAL, REGULAR_SEASON, SEMI_FINAL, START};
    use crate::registry::FormatKind;
    use crate::seeded_teams;
    use crate::settings::{KnockoutSettings, Settings};
    use crate::store::{
        MatchStore, MemoryStore, SeasonId, Snapshot, SnapshotSink, StoreError,
    };

    fn scheduled(id: u64, stage: &str, home: u64, away: u64) -> Match {
        let mut m = result(id, stage, 1, home, 0, 0, away);
        m.status = MatchStatus::Scheduled;
        m.home_score = None;
        m.away_score = None;
        m
    }

    #[test]
    fn test_manual_override_json() {
        let input = r#"{
            "resolved_matches": {
                "7": { "resolution": "cancel" },
                "8": { "resolution": "result", "home_score": 2, "away_score": 1 }
            },
            "tie_breakers": { "points": [3, 1] }
        }"#;

        let overrides: ManualOverride = serde_json::from_str(input).unwrap();
        assert_eq!(
            overrides.resolved_matches[&MatchId(7)].resolution,
            Resolution::Cancel
        );
        assert_eq!(overrides.resolved_matches[&MatchId(8)].home_score, Some(2));
        assert_eq!(overrides.tie_breakers.points, [TeamId(3), TeamId(1)]);

        let empty: ManualOverride = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ManualOverride::default());
    }

    #[test]
    fn test_status() {
        let orchestrator = Orchestrator::new(FormatKind::LeagueOnly);
        let matches = [
            result(1, REGULAR_SEASON, 1, 1, 1, 0, 2),
            scheduled(2, REGULAR_SEASON, 3, 4),
            scheduled(3, REGULAR_SEASON, 1, 3),
            scheduled(4, REGULAR_SEASON, 2, 4),
            scheduled(5, "other", 2, 4),
        ];

        let status = orchestrator.status(REGULAR_SEASON, &matches, None).unwrap();
        assert_eq!(status.open, [MatchId(2), MatchId(3), MatchId(4)]);
        assert_eq!(status.matches.len(), 4);

        let input = r#"{ "resolved_matches": {
            "2": { "resolution": "cancel" },
            "3": { "resolution": "freeze" },
            "4": { "resolution": "result", "home_score": 0, "away_score": 2 }
        } }"#;
        let overrides: ManualOverride = serde_json::from_str(input).unwrap();

        let status = orchestrator
            .status(REGULAR_SEASON, &matches, Some(&overrides))
            .unwrap();
        assert!(status.can_close());
        assert_eq!(status.matches[1].status, MatchStatus::Cancelled);
        assert_eq!(status.matches[2].status, MatchStatus::Scheduled);
        assert_eq!(status.matches[3].winner(), Some(TeamId(4)));

        let input = r#"{ "resolved_matches": { "2": { "resolution": "result" } } }"#;
        let overrides: ManualOverride = serde_json::from_str(input).unwrap();
        assert!(matches!(
            orchestrator.status(REGULAR_SEASON, &matches, Some(&overrides)),
            Err(TransitionError::UndecidedMatch(MatchId(2)))
        ));
    }

    #[test]
    fn test_plan_errors() {
        let orchestrator = Orchestrator::new(FormatKind::LeagueOnly);
        let settings = Settings::default_for(FormatKind::LeagueOnly);
        let teams = seeded_teams![1, 2, 3, 4];

        let request = PlanRequest::new(SeasonId(1), &settings, "playoffs", &teams, &[]);
        assert!(matches!(
            orchestrator.plan(&request),
            Err(TransitionError::UnknownPhase(_))
        ));

        let request = PlanRequest::new(SeasonId(1), &settings, REGULAR_SEASON, &teams, &[]);
        assert!(matches!(
            orchestrator.plan(&request),
            Err(TransitionError::TerminalPhase(REGULAR_SEASON))
        ));

        let wrong = Settings::default_for(FormatKind::Knockout);
        let request = PlanRequest::new(SeasonId(1), &wrong, START, &teams, &[]);
        match orchestrator.plan(&request) {
            Err(TransitionError::Generation(err)) => {
                assert!(err.has_error("settings.wrong_format"))
            }
            res => panic!("unexpected result: {:?}", res.map(|t| t.phases)),
        }
    }

    #[test]
    fn test_open_matches_block() {
        let orchestrator = Orchestrator::new(FormatKind::Knockout);
        let settings = Settings::Knockout(KnockoutSettings {
            bracket_size: 4,
            ..Default::default()
        });
        let teams = seeded_teams![1, 2, 3, 4];
        let matches = [
            result(1, SEMI_FINAL, 1, 1, 2, 0, 4),
            scheduled(2, SEMI_FINAL, 2, 3),
        ];

        let request = PlanRequest::new(SeasonId(1), &settings, SEMI_FINAL, &teams, &matches);
        match orchestrator.plan(&request) {
            Err(TransitionError::OpenMatches { matches }) => assert_eq!(matches, [MatchId(2)]),
            res => panic!("unexpected result: {:?}", res.map(|t| t.phases)),
        }

        // A drawn knockout match cannot be resolved.
        let matches = [
            result(1, SEMI_FINAL, 1, 1, 2, 0, 4),
            result(2, SEMI_FINAL, 1, 2, 1, 1, 3),
        ];
        let request = PlanRequest::new(SeasonId(1), &settings, SEMI_FINAL, &teams, &matches);
        assert!(matches!(
            orchestrator.plan(&request),
            Err(TransitionError::UndecidedMatch(MatchId(2)))
        ));
    }

    #[test]
    fn test_plan_is_pure() {
        let orchestrator = Orchestrator::new(FormatKind::Knockout);
        let settings = Settings::default_for(FormatKind::Knockout);
        let teams = seeded_teams![1, 2, 3, 4, 5, 6, 7, 8];

        let request = PlanRequest::new(SeasonId(1), &settings, START, &teams, &[]);
        let a = orchestrator.plan(&request).unwrap();
        let b = orchestrator.plan(&request).unwrap();

        assert_eq!(a.phases, b.phases);
        assert_eq!(a.phases[0].phase, QUARTER_FINAL);
        assert_eq!(a.match_count(), 4);
        assert!(!a.continuation);
    }

    struct FailingSink;

    impl SnapshotSink for FailingSink {
        fn record(&self, _season: SeasonId, _snapshot: &Snapshot) -> Result<(), StoreError> {
            Err(StoreError::Backend(String::from("audit log unavailable")))
        }
    }

    #[test]
    fn test_commit() {
        let orchestrator = Orchestrator::new(FormatKind::Knockout);
        let settings = Settings::Knockout(KnockoutSettings {
            bracket_size: 4,
            third_place_match: true,
            ..Default::default()
        });
        let store = MemoryStore::new();
        let season = SeasonId(1);
        store.add_season(season, seeded_teams![1, 2, 3, 4]);

        let report = orchestrator
            .advance(season, &settings, START, &store, None)
            .unwrap();
        assert_eq!(report.phases, [SEMI_FINAL]);
        assert_eq!(report.inserted.len(), 2);
        assert_eq!(store.snapshots(season).len(), 1);

        store.set_result(season, report.inserted[0], 1, 0).unwrap();
        store.set_result(season, report.inserted[1], 0, 1).unwrap();

        // The snapshot sink fails, the matches are stored anyway.
        let teams = store.teams(season).unwrap();
        let matches = store.matches(season, Some(SEMI_FINAL)).unwrap();
        let request = PlanRequest::new(season, &settings, SEMI_FINAL, &teams, &matches);
        let transition = orchestrator.plan(&request).unwrap();

        let report = orchestrator
            .commit(&transition, &store, &FailingSink)
            .unwrap();
        assert!(report.snapshot_error.is_some());
        assert_eq!(report.phases, ["third-place_playoff", FINAL]);
        assert_eq!(report.inserted.len(), 2);

        // Committing the same transition twice is rejected as a whole.
        assert!(matches!(
            orchestrator.commit(&transition, &store, &store),
            Err(TransitionError::Persistence(StoreError::Conflict { .. }))
        ));
        assert_eq!(store.matches(season, None).unwrap().len(), 4);
    }
}
