use competition_core::SeedingMethod;

use super::{finals, validate_format, validate_team_count, warn_large_league, FormatSystem};
use crate::phase::{PhaseConfig, QUARTER_FINAL, REGULAR_SEASON, SEMI_FINAL, THIRD_PLACE_PLAYOFF};
use crate::registry::FormatKind;
use crate::settings::{Settings, ValidationIssue, ValidationReport};

/// The supported numbers of playoff teams.
pub const PLAYOFF_TEAMS: [usize; 2] = [4, 8];

/// A regular season followed by playoffs for the best teams.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundRobinFinal;

impl RoundRobinFinal {
    fn opening_phase(settings: &Settings) -> &'static str {
        match settings {
            Settings::RoundRobinFinal(s) if s.playoff_teams == 8 => QUARTER_FINAL,
            _ => SEMI_FINAL,
        }
    }
}

impl FormatSystem for RoundRobinFinal {
    fn kind(&self) -> FormatKind {
        FormatKind::RoundRobinFinal
    }

    fn validate_settings(
        &self,
        settings: &Settings,
        team_count: Option<usize>,
    ) -> ValidationReport {
        if let Some(report) = validate_format(self.kind(), settings) {
            return report;
        }

        let mut report = ValidationReport::default();

        if let Settings::RoundRobinFinal(settings) = settings {
            settings.scoring.validate(&mut report);

            if !PLAYOFF_TEAMS.contains(&settings.playoff_teams) {
                report.error(
                    ValidationIssue::new("playoff_teams", "playoffs.invalid_team_count")
                        .param("playoff_teams", settings.playoff_teams),
                );
            }

            if let Some(teams) = team_count {
                validate_team_count(&mut report, teams, settings.playoff_teams.max(2));
                warn_large_league(&mut report, teams, settings.double_round_robin);
            }
        }

        report
    }

    fn seeding(&self, settings: &Settings, phase: &PhaseConfig) -> SeedingMethod {
        if phase.id == RoundRobinFinal::opening_phase(settings) {
            settings.seeding()
        } else {
            SeedingMethod::Manual
        }
    }

    fn next_phases(&self, settings: &Settings, current: &str) -> Vec<&'static PhaseConfig> {
        let definition = self.definition();

        if current == REGULAR_SEASON {
            return definition
                .phase(RoundRobinFinal::opening_phase(settings))
                .into_iter()
                .collect();
        }

        match definition.phase(current) {
            Some(phase) if !phase.rules_to(THIRD_PLACE_PLAYOFF).is_empty() => {
                finals(definition, settings.third_place_match())
            }
            Some(phase) if !phase.is_terminal => {
                definition.next_phase_by_order(current).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}
