//! # competition-engine
//!
//! The format engine of a multi-format competition. It binds the pairing primitives and the
//! standings calculator of [`competition_core`] to five competition formats and drives a season
//! from its `start` phase to a terminal phase.
//!
//! - [`registry`]: The static phase graph of every [`FormatKind`].
//! - [`Settings`]: Per-format tournament mode settings and their validation.
//! - [`handler`]: The [`FormatSystem`] implementations, dispatched through [`Handler`].
//! - [`Orchestrator`]: Plans and commits phase transitions.
//! - [`store`]: The persistence seams implemented by the host.
//!
//! ```
//! use competition_core::{Team, TeamId};
//! use competition_engine::phase::START;
//! use competition_engine::store::{MatchStore, MemoryStore, SeasonId};
//! use competition_engine::{FormatKind, Orchestrator, Settings};
//!
//! let store = MemoryStore::new();
//! let season = SeasonId(1);
//! store.add_season(season, (1..=4).map(|id| Team::new(TeamId(id))).collect());
//!
//! let settings = Settings::default_for(FormatKind::LeagueOnly);
//! let orchestrator = Orchestrator::new(FormatKind::LeagueOnly);
//!
//! let report = orchestrator.advance(season, &settings, START, &store, None).unwrap();
//! assert_eq!(report.phases, ["regular_season"]);
//! assert_eq!(store.matches(season, None).unwrap().len(), 6);
//! ```
pub mod config;
pub mod handler;
pub mod logger;
pub mod orchestrator;
pub mod phase;
pub mod registry;
pub mod settings;
pub mod store;

pub use config::Config;
pub use handler::{FormatSystem, Generation, GenerationContext, GenerationError, Handler};
pub use orchestrator::{ManualOverride, Orchestrator, PlanRequest, Transition, TransitionError};
pub use registry::{FormatDefinition, FormatKind};
pub use settings::{Settings, ValidationIssue, ValidationReport};
