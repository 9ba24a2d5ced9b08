use competition_core::SeedingMethod;

use super::{finals, validate_format, validate_team_count, warn_power_of_two, FormatSystem};
use crate::phase::{
    PhaseConfig, QUARTER_FINAL, ROUND_OF_16, ROUND_OF_32, SEMI_FINAL, START, THIRD_PLACE_PLAYOFF,
};
use crate::registry::FormatKind;
use crate::settings::{Settings, ValidationIssue, ValidationReport};

/// The supported bracket sizes.
pub const BRACKET_SIZES: [usize; 4] = [4, 8, 16, 32];

/// A single elimination bracket. Every bracket round is its own phase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Knockout;

impl Knockout {
    /// Returns the id of the first phase of a bracket with `size` teams.
    pub fn opening_phase(size: usize) -> Option<&'static str> {
        match size {
            32 => Some(ROUND_OF_32),
            16 => Some(ROUND_OF_16),
            8 => Some(QUARTER_FINAL),
            4 => Some(SEMI_FINAL),
            _ => None,
        }
    }
}

impl FormatSystem for Knockout {
    fn kind(&self) -> FormatKind {
        FormatKind::Knockout
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

        if let Settings::Knockout(settings) = settings {
            if !BRACKET_SIZES.contains(&settings.bracket_size) {
                report.error(
                    ValidationIssue::new("bracket_size", "knockout.invalid_bracket_size")
                        .param("size", settings.bracket_size),
                );
            }

            if let Some(teams) = team_count {
                validate_team_count(&mut report, teams, settings.bracket_size);
                warn_power_of_two(&mut report, teams);

                if teams > settings.bracket_size {
                    report.warning(
                        ValidationIssue::new("teams", "knockout.teams_exceed_bracket")
                            .param("teams", teams)
                            .param("bracket_size", settings.bracket_size),
                    );
                }
            }
        }

        report
    }

    /// Only the opening round uses the configured seeding, later rounds keep the bracket order.
    fn seeding(&self, settings: &Settings, phase: &PhaseConfig) -> SeedingMethod {
        match settings {
            Settings::Knockout(s) if Knockout::opening_phase(s.bracket_size) == Some(phase.id) => {
                s.seeding
            }
            _ => SeedingMethod::Manual,
        }
    }

    fn next_phases(&self, settings: &Settings, current: &str) -> Vec<&'static PhaseConfig> {
        if current == START {
            let size = match settings {
                Settings::Knockout(s) => s.bracket_size,
                _ => return Vec::new(),
            };

            return Knockout::opening_phase(size)
                .and_then(|id| self.definition().phase(id))
                .into_iter()
                .collect();
        }

        let definition = self.definition();
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
