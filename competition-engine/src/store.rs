//! Persistence seams used by the [`Orchestrator`]
//!
//! The engine never talks to a database itself. Hosts implement [`MatchStore`],
//! [`SettingsStore`] and [`SnapshotSink`] on top of their storage, [`MemoryStore`] is a
//! complete in-process implementation.
//!
//! [`Orchestrator`]: crate::Orchestrator
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use competition_core::{Fixture, Match, MatchId, MatchStatus, Team};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::registry::FormatKind;
use crate::settings::Settings;

/// A unique identifier for a season.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonId(pub u64);

impl Display for SeasonId {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Matches for the same phase round already exist.
    #[error("matches for {stage} round {round:?} already exist in season {season}")]
    Conflict {
        season: SeasonId,
        stage: String,
        round: Option<u32>,
    },
    #[error("unknown season {0}")]
    UnknownSeason(SeasonId),
    #[error("unknown match {0}")]
    UnknownMatch(MatchId),
    #[error("store backend error: {0}")]
    Backend(String),
}

pub trait MatchStore {
    fn teams(&self, season: SeasonId) -> Result<Vec<Team>, StoreError>;

    /// Returns the matches of `season`, optionally only those of `stage`.
    fn matches(&self, season: SeasonId, stage: Option<&str>) -> Result<Vec<Match>, StoreError>;

    /// Stores all `fixtures` as scheduled matches or none of them.
    ///
    /// Ids must increase in the order of `fixtures` and across batches. The bracket order of a
    /// knockout round is taken from the ids of its matches.
    fn insert_batch(
        &self,
        season: SeasonId,
        fixtures: &[Fixture],
    ) -> Result<Vec<MatchId>, StoreError>;
}

pub trait SettingsStore {
    /// Returns the stored settings of the tournament `mode`.
    fn settings(&self, mode: &str) -> Option<Settings>;

    /// Returns the stored settings of `mode`, or the defaults of `kind`.
    fn settings_or_default(&self, mode: &str, kind: FormatKind) -> Settings {
        match self.settings(mode) {
            Some(settings) if settings.kind() == kind => settings,
            Some(settings) => {
                log::warn!(
                    "Settings of mode {} are for {}, using the {} defaults",
                    mode,
                    settings.kind(),
                    kind
                );
                Settings::default_for(kind)
            }
            None => Settings::default_for(kind),
        }
    }
}

/// The standings of a phase at the moment it closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase_name: String,
    pub snapshot_data: Value,
    pub taken_at: DateTime<Utc>,
}

/// Receives the audit snapshot of every committed transition.
pub trait SnapshotSink {
    fn record(&self, season: SeasonId, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// An in-memory [`MatchStore`] and [`SnapshotSink`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    seasons: HashMap<SeasonId, Vec<Team>>,
    matches: Vec<(SeasonId, Match)>,
    snapshots: Vec<(SeasonId, Snapshot)>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a season with the given teams. An existing season is replaced.
    pub fn add_season(&self, season: SeasonId, teams: Vec<Team>) {
        let mut inner = self.inner.write();
        inner.matches.retain(|(id, _)| *id != season);
        inner.seasons.insert(season, teams);
    }

    /// Records the result of a match and marks it as completed.
    pub fn set_result(
        &self,
        season: SeasonId,
        id: MatchId,
        home_score: u32,
        away_score: u32,
    ) -> Result<(), StoreError> {
        self.update(season, id, |m| {
            m.status = MatchStatus::Completed;
            m.home_score = Some(home_score);
            m.away_score = Some(away_score);
        })
    }

    pub fn set_status(
        &self,
        season: SeasonId,
        id: MatchId,
        status: MatchStatus,
    ) -> Result<(), StoreError> {
        self.update(season, id, |m| m.status = status)
    }

    /// Returns all snapshots recorded for `season` in order.
    pub fn snapshots(&self, season: SeasonId) -> Vec<Snapshot> {
        self.inner
            .read()
            .snapshots
            .iter()
            .filter(|(id, _)| *id == season)
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }

    fn update<F>(&self, season: SeasonId, id: MatchId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Match),
    {
        let mut inner = self.inner.write();

        match inner
            .matches
            .iter_mut()
            .find(|(s, m)| *s == season && m.id == id)
        {
            Some((_, m)) => {
                f(m);
                Ok(())
            }
            None => Err(StoreError::UnknownMatch(id)),
        }
    }
}

impl MatchStore for MemoryStore {
    fn teams(&self, season: SeasonId) -> Result<Vec<Team>, StoreError> {
        self.inner
            .read()
            .seasons
            .get(&season)
            .cloned()
            .ok_or(StoreError::UnknownSeason(season))
    }

    fn matches(&self, season: SeasonId, stage: Option<&str>) -> Result<Vec<Match>, StoreError> {
        let inner = self.inner.read();

        if !inner.seasons.contains_key(&season) {
            return Err(StoreError::UnknownSeason(season));
        }

        Ok(inner
            .matches
            .iter()
            .filter(|(id, m)| *id == season && stage.map_or(true, |stage| m.stage == stage))
            .map(|(_, m)| m.clone())
            .collect())
    }

    fn insert_batch(
        &self,
        season: SeasonId,
        fixtures: &[Fixture],
    ) -> Result<Vec<MatchId>, StoreError> {
        let mut inner = self.inner.write();

        if !inner.seasons.contains_key(&season) {
            return Err(StoreError::UnknownSeason(season));
        }

        // Check the whole batch before inserting anything.
        for fixture in fixtures {
            let exists = inner.matches.iter().any(|(id, m)| {
                *id == season && m.stage == fixture.stage && m.round == fixture.round
            });

            if exists {
                return Err(StoreError::Conflict {
                    season,
                    stage: fixture.stage.clone(),
                    round: fixture.round,
                });
            }
        }

        let mut ids = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            inner.next_id += 1;
            let id = MatchId(inner.next_id);

            inner.matches.push((season, fixture.clone().into_match(id)));
            ids.push(id);
        }

        log::debug!("Inserted {} matches into season {}", ids.len(), season);

        Ok(ids)
    }
}

impl SnapshotSink for MemoryStore {
    fn record(&self, season: SeasonId, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.inner.write().snapshots.push((season, snapshot.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use competition_core::{Fixture, MatchStatus, Team, TeamId};
    use serde_json::json;

    use super::{
        MatchStore, MemoryStore, SeasonId, SettingsStore, Snapshot, SnapshotSink, StoreError,
    };
    use crate::registry::FormatKind;
    use crate::settings::Settings;

    fn fixture(home: u64, away: u64, stage: &str, round: u32) -> Fixture {
        Fixture {
            home_team_id: TeamId(home),
            away_team_id: TeamId(away),
            stage: stage.to_owned(),
            round: Some(round),
            group: None,
        }
    }

    #[test]
    fn test_insert_batch() {
        let store = MemoryStore::new();
        let season = SeasonId(1);
        store.add_season(season, vec![Team::new(TeamId(1)), Team::new(TeamId(2))]);

        let ids = store
            .insert_batch(season, &[fixture(1, 2, "final", 1)])
            .unwrap();
        assert_eq!(ids.len(), 1);

        let matches = store.matches(season, Some("final")).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].status, MatchStatus::Scheduled);
        assert!(store.matches(season, Some("semi-final")).unwrap().is_empty());

        store.set_result(season, ids[0], 2, 1).unwrap();
        let matches = store.matches(season, None).unwrap();
        assert_eq!(matches[0].winner(), Some(TeamId(1)));
    }

    #[test]
    fn test_insert_batch_ids_increase() {
        let store = MemoryStore::new();
        let season = SeasonId(1);
        store.add_season(season, Vec::new());

        let first = store
            .insert_batch(
                season,
                &[fixture(1, 8, "quarter-final", 1), fixture(5, 4, "quarter-final", 1)],
            )
            .unwrap();
        let second = store
            .insert_batch(season, &[fixture(1, 5, "semi-final", 1)])
            .unwrap();

        let ids: Vec<_> = first.iter().chain(&second).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

        // Stored matches keep the order of their fixtures.
        let matches = store.matches(season, Some("quarter-final")).unwrap();
        assert_eq!(matches[0].id, first[0]);
        assert_eq!(matches[0].home_team_id, TeamId(1));
        assert_eq!(matches[1].home_team_id, TeamId(5));
    }

    #[test]
    fn test_insert_batch_conflict() {
        let store = MemoryStore::new();
        let season = SeasonId(1);
        store.add_season(season, Vec::new());

        store
            .insert_batch(season, &[fixture(1, 2, "final", 1)])
            .unwrap();

        let err = store
            .insert_batch(
                season,
                &[fixture(3, 4, "semi-final", 1), fixture(1, 2, "final", 1)],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Nothing of the rejected batch was stored.
        assert_eq!(store.matches(season, None).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_season() {
        let store = MemoryStore::new();

        assert_eq!(
            store.teams(SeasonId(3)).unwrap_err(),
            StoreError::UnknownSeason(SeasonId(3))
        );
        assert!(store.insert_batch(SeasonId(3), &[]).is_err());
    }

    fn snapshot(phase: &str) -> Snapshot {
        Snapshot {
            phase_name: phase.to_owned(),
            snapshot_data: json!({ "standings": [] }),
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshots() {
        let store = MemoryStore::new();
        store.record(SeasonId(1), &snapshot("start")).unwrap();
        store.record(SeasonId(2), &snapshot("final")).unwrap();

        let snapshots = store.snapshots(SeasonId(1));
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].phase_name, "start");
    }

    struct Modes;

    impl SettingsStore for Modes {
        fn settings(&self, mode: &str) -> Option<Settings> {
            match mode {
                "cup" => Some(Settings::default_for(FormatKind::Knockout)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_settings_or_default() {
        assert_eq!(
            Modes.settings_or_default("cup", FormatKind::Knockout),
            Settings::default_for(FormatKind::Knockout)
        );
        assert_eq!(
            Modes.settings_or_default("league", FormatKind::LeagueOnly),
            Settings::default_for(FormatKind::LeagueOnly)
        );
        // Stored settings of another format fall back to the defaults.
        assert_eq!(
            Modes.settings_or_default("cup", FormatKind::SwissSystem),
            Settings::default_for(FormatKind::SwissSystem)
        );
    }
}
