use competition_core::groups::Group;
use competition_core::SeedingMethod;

use super::{
    knockout_next_round, last_round, snake_groups, validate_format, validate_team_count,
    FormatSystem, Generation, GenerationContext, GenerationError, PhaseContext,
};
use crate::handler::knockout::BRACKET_SIZES;
use crate::phase::{PhaseConfig, KNOCKOUT};
use crate::registry::FormatKind;
use crate::settings::{Settings, ValidationIssue, ValidationReport};

/// A group stage followed by a knockout bracket. The bracket rounds up to the semi-finals are
/// played as a single multi-round phase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupsKnockout;

impl FormatSystem for GroupsKnockout {
    fn kind(&self) -> FormatKind {
        FormatKind::GroupsKnockout
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

        if let Settings::GroupsKnockout(settings) = settings {
            settings.scoring.validate(&mut report);

            if settings.number_of_groups == 0 {
                report.error(ValidationIssue::new(
                    "number_of_groups",
                    "groups.no_groups",
                ));
            }

            if settings.advancing_per_group == 0
                || settings.advancing_per_group > settings.teams_per_group
            {
                report.error(
                    ValidationIssue::new("advancing_per_group", "groups.advancing_per_group")
                        .param("advancing", settings.advancing_per_group)
                        .param("teams_per_group", settings.teams_per_group),
                );
            }

            let bracket = settings.number_of_groups * settings.advancing_per_group;
            if !BRACKET_SIZES.contains(&bracket) {
                report.error(
                    ValidationIssue::new("advancing_per_group", "knockout.invalid_bracket_size")
                        .param("size", bracket),
                );
            }

            if let Some(teams) = team_count {
                validate_team_count(&mut report, teams, settings.number_of_groups * 2);

                if settings.number_of_groups > 0 && teams % settings.number_of_groups != 0 {
                    report.warning(
                        ValidationIssue::new("number_of_groups", "groups.uneven")
                            .param("teams", teams)
                            .param("groups", settings.number_of_groups),
                    );
                }

                if teams != settings.number_of_groups * settings.teams_per_group {
                    report.warning(
                        ValidationIssue::new("teams_per_group", "groups.teams_per_group")
                            .param("teams", teams)
                            .param(
                                "expected",
                                settings.number_of_groups * settings.teams_per_group,
                            ),
                    );
                }
            }
        }

        report
    }

    fn derive_groups(&self, ctx: &GenerationContext<'_>) -> Result<Vec<Group>, GenerationError> {
        let number = match ctx.settings {
            Settings::GroupsKnockout(s) => s.number_of_groups,
            _ => 0,
        };

        snake_groups(ctx, number)
    }

    /// The first knockout round is seeded from the group results, the finals keep the bracket
    /// order.
    fn seeding(&self, settings: &Settings, phase: &PhaseConfig) -> SeedingMethod {
        if phase.id == KNOCKOUT {
            settings.seeding()
        } else {
            SeedingMethod::Manual
        }
    }

    fn next_round(&self, ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
        if ctx.phase.id != KNOCKOUT {
            return Err(GenerationError::new(
                ValidationIssue::new("phase", "generation.single_round_phase")
                    .param("phase", ctx.phase.id),
            ));
        }

        knockout_next_round(ctx)
    }

    /// The knockout phase ends with the semi-finals, the finals are phases of their own.
    fn phase_finished(&self, ctx: &PhaseContext<'_>) -> bool {
        if ctx.phase.id != KNOCKOUT {
            return true;
        }

        last_round(ctx.matches).len() <= 2
    }
}
