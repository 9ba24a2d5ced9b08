use competition_core::{MatchStatus, Team, TeamId};
use competition_engine::phase::{
    FINAL, GROUP_ASSIGNMENT, GROUP_STAGE, KNOCKOUT, POULES, QUARTER_FINAL, REGULAR_SEASON,
    SEMI_FINAL, START, SWISS_PHASE_1, THIRD_PLACE_PLAYOFF,
};
use competition_engine::settings::{KnockoutSettings, RoundRobinFinalSettings};
use competition_engine::store::{MatchStore, MemoryStore, SeasonId};
use competition_engine::{FormatKind, Orchestrator, Settings, TransitionError};

const SEASON: SeasonId = SeasonId(1);

fn teams(count: u64) -> Vec<Team> {
    (1..=count)
        .map(|id| Team::seeded(TeamId(id), id as u32))
        .collect()
}

/// A finished season.
struct Season {
    store: MemoryStore,
    /// The phases entered by every transition in order. A continued phase appears once per
    /// round.
    phases: Vec<&'static str>,
    /// The number of matches inserted by every transition.
    inserted: Vec<usize>,
}

impl Season {
    fn winner(&self, phase: &str) -> TeamId {
        let matches = self.store.matches(SEASON, Some(phase)).unwrap();
        assert_eq!(matches.len(), 1, "{} has more than one match", phase);
        matches[0].winner().unwrap()
    }
}

/// Plays a season from `start` until only terminal phases are left. Every match is won by the
/// home team.
fn play(kind: FormatKind, settings: &Settings, count: u64) -> Season {
    let store = MemoryStore::new();
    store.add_season(SEASON, teams(count));

    let orchestrator = Orchestrator::new(kind);
    let definition = kind.definition();

    let mut season = Season {
        store,
        phases: Vec::new(),
        inserted: Vec::new(),
    };

    let mut phase = START;
    for _ in 0..16 {
        let report = orchestrator
            .advance(SEASON, settings, phase, &season.store, None)
            .unwrap();

        for id in &report.inserted {
            season.store.set_result(SEASON, *id, 2, 1).unwrap();
        }

        season.phases.extend(report.phases.iter().copied());
        season.inserted.push(report.inserted.len());

        let next = report
            .phases
            .iter()
            .copied()
            .find(|id| !definition.phase(id).unwrap().is_terminal);

        match next {
            Some(next) => phase = next,
            None => return season,
        }
    }

    panic!("{} did not reach a terminal phase", kind);
}

#[test]
fn test_league_only() {
    let settings = Settings::default_for(FormatKind::LeagueOnly);
    let season = play(FormatKind::LeagueOnly, &settings, 6);

    assert_eq!(season.phases, [REGULAR_SEASON]);
    assert_eq!(season.inserted, [15]);
    assert_eq!(season.store.snapshots(SEASON).len(), 1);

    // The regular season ends the league.
    let orchestrator = Orchestrator::new(FormatKind::LeagueOnly);
    assert!(matches!(
        orchestrator.advance(SEASON, &settings, REGULAR_SEASON, &season.store, None),
        Err(TransitionError::TerminalPhase(REGULAR_SEASON))
    ));
}

#[test]
fn test_knockout() {
    let settings = Settings::Knockout(KnockoutSettings {
        bracket_size: 8,
        third_place_match: true,
        ..Default::default()
    });
    let season = play(FormatKind::Knockout, &settings, 8);

    assert_eq!(
        season.phases,
        [QUARTER_FINAL, SEMI_FINAL, THIRD_PLACE_PLAYOFF, FINAL]
    );
    assert_eq!(season.inserted, [4, 2, 2]);

    // 1-8, 5-4, 3-6, 7-2 → 1-5, 3-7 → 1-3
    assert_eq!(season.winner(FINAL), TeamId(1));
    assert_eq!(season.winner(THIRD_PLACE_PLAYOFF), TeamId(5));
}

#[test]
fn test_knockout_without_third_place() {
    let settings = Settings::Knockout(KnockoutSettings {
        bracket_size: 4,
        ..Default::default()
    });
    let season = play(FormatKind::Knockout, &settings, 4);

    assert_eq!(season.phases, [SEMI_FINAL, FINAL]);
    assert_eq!(season.inserted, [2, 1]);
    assert!(season
        .store
        .matches(SEASON, Some(THIRD_PLACE_PLAYOFF))
        .unwrap()
        .is_empty());
}

#[test]
fn test_groups_knockout() {
    let settings = Settings::default_for(FormatKind::GroupsKnockout);
    let season = play(FormatKind::GroupsKnockout, &settings, 16);

    assert_eq!(
        season.phases,
        [GROUP_ASSIGNMENT, GROUP_STAGE, KNOCKOUT, KNOCKOUT, FINAL]
    );
    // Group assignment has no matches, 4 groups of 4 play 6 matches each.
    assert_eq!(season.inserted, [0, 24, 4, 2, 1]);

    let group_stage = season.store.matches(SEASON, Some(GROUP_STAGE)).unwrap();
    assert!(group_stage.iter().all(|m| m.group.is_some()));

    let knockout = season.store.matches(SEASON, Some(KNOCKOUT)).unwrap();
    assert_eq!(knockout.iter().filter(|m| m.round == Some(2)).count(), 2);
    assert!(knockout.iter().all(|m| m.status == MatchStatus::Completed));
}

#[test]
fn test_swiss_system() {
    let settings = Settings::default_for(FormatKind::SwissSystem);
    let season = play(FormatKind::SwissSystem, &settings, 8);

    // ⌈log2 8⌉ swiss rounds
    assert_eq!(
        season.phases,
        [SWISS_PHASE_1, SWISS_PHASE_1, SWISS_PHASE_1, POULES, FINAL]
    );
    assert_eq!(season.inserted, [4, 4, 4, 12, 1]);

    let poules = season.store.matches(SEASON, Some(POULES)).unwrap();
    for group in ["A", "B"] {
        assert_eq!(
            poules
                .iter()
                .filter(|m| m.group.as_deref() == Some(group))
                .count(),
            6
        );
    }

    let finalists = &season.store.matches(SEASON, Some(FINAL)).unwrap()[0];
    assert_ne!(finalists.home_team_id, finalists.away_team_id);

    // One snapshot per closed phase round.
    assert_eq!(season.store.snapshots(SEASON).len(), 5);
}

#[test]
fn test_round_robin_final() {
    let settings = Settings::RoundRobinFinal(RoundRobinFinalSettings {
        third_place_match: true,
        ..Default::default()
    });
    let season = play(FormatKind::RoundRobinFinal, &settings, 6);

    assert_eq!(
        season.phases,
        [REGULAR_SEASON, SEMI_FINAL, THIRD_PLACE_PLAYOFF, FINAL]
    );
    assert_eq!(season.inserted, [15, 2, 2]);

    let semis = season.store.matches(SEASON, Some(SEMI_FINAL)).unwrap();
    let mut playoff_teams: Vec<TeamId> = semis
        .iter()
        .flat_map(|m| [m.home_team_id, m.away_team_id])
        .collect();
    playoff_teams.sort();
    playoff_teams.dedup();
    assert_eq!(playoff_teams.len(), 4);
}
