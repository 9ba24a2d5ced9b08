use competition_core::groups::{self, Group};
use competition_core::swiss::recommended_rounds;

use super::{
    snake_groups, swiss_round, validate_format, validate_team_count, warn_power_of_two,
    FormatSystem, Generation, GenerationContext, GenerationError, PhaseContext,
};
use crate::phase::SWISS_PHASE_1;
use crate::registry::FormatKind;
use crate::settings::{PouleSplit, Settings, SwissSettings, ValidationIssue, ValidationReport};

/// Swiss rounds followed by two poules. The poule winners play the final.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwissSystem;

impl SwissSystem {
    /// Returns the number of swiss rounds played by `teams` teams.
    pub fn rounds(settings: &SwissSettings, teams: usize) -> u32 {
        match settings.swiss_rounds {
            0 => recommended_rounds(teams),
            rounds => rounds,
        }
    }
}

impl FormatSystem for SwissSystem {
    fn kind(&self) -> FormatKind {
        FormatKind::SwissSystem
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

        if let Settings::SwissSystem(settings) = settings {
            settings.scoring.validate(&mut report);

            if let Some(pattern) = &settings.poule_pattern {
                if pattern.len() != 2 {
                    report.error(
                        ValidationIssue::new("poule_pattern", "swiss.poule_count")
                            .param("poules", pattern.len()),
                    );
                }
            }

            let teams = match team_count {
                Some(teams) => teams,
                None => return report,
            };

            validate_team_count(&mut report, teams, 4);
            warn_power_of_two(&mut report, teams);

            let rounds = SwissSystem::rounds(settings, teams);
            if rounds as usize > teams.saturating_sub(1) {
                report.warning(
                    ValidationIssue::new("swiss_rounds", "swiss.forced_repeats_likely")
                        .param("rounds", rounds)
                        .param("teams", teams),
                );
            }

            if let Some(pattern) = &settings.poule_pattern {
                let mut ranks: Vec<usize> = pattern.iter().flatten().copied().collect();
                ranks.sort_unstable();

                if ranks != (1..=teams).collect::<Vec<_>>() {
                    report.error(
                        ValidationIssue::new("poule_pattern", "swiss.poule_pattern_coverage")
                            .param("teams", teams),
                    );
                }
            }
        }

        report
    }

    fn next_round(&self, ctx: &GenerationContext<'_>) -> Result<Generation, GenerationError> {
        if ctx.phase.id != SWISS_PHASE_1 {
            return Err(GenerationError::new(
                ValidationIssue::new("phase", "generation.single_round_phase")
                    .param("phase", ctx.phase.id),
            ));
        }

        swiss_round(ctx)
    }

    /// Splits the swiss ranking into the poules A and B.
    fn derive_groups(&self, ctx: &GenerationContext<'_>) -> Result<Vec<Group>, GenerationError> {
        let settings = match ctx.settings {
            Settings::SwissSystem(settings) => settings,
            _ => return snake_groups(ctx, 2),
        };

        if let Some(pattern) = &settings.poule_pattern {
            return Ok(groups::distribute(&ctx.ranked_ids(), pattern)?);
        }

        match settings.poule_split {
            PouleSplit::Snake => snake_groups(ctx, 2),
            PouleSplit::TopBottom => {
                let pattern = groups::split(2, ctx.teams.len());
                Ok(groups::distribute(&ctx.ranked_ids(), &pattern)?)
            }
        }
    }

    fn phase_finished(&self, ctx: &PhaseContext<'_>) -> bool {
        let settings = match ctx.settings {
            Settings::SwissSystem(settings) if ctx.phase.id == SWISS_PHASE_1 => settings,
            _ => return true,
        };

        let played = ctx
            .matches
            .iter()
            .filter(|m| m.stage == SWISS_PHASE_1)
            .filter_map(|m| m.round)
            .max()
            .unwrap_or(0);

        played >= SwissSystem::rounds(settings, ctx.teams.len())
    }
}

#[cfg(test)]
mod tests {
    use competition_core::groups::Group;
    use competition_core::{Match, TeamId};

    use super::SwissSystem;
    use crate::handler::tests::result;
    use crate::handler::{FormatSystem, GenerationContext, PhaseContext};
    use crate::phase::{FINAL, POULES, START, SWISS_PHASE_1};
    use crate::registry::FormatKind;
    use crate::seeded_teams;
    use crate::settings::{PouleSplit, Settings, SwissSettings};

    fn settings(rounds: u32) -> Settings {
        Settings::SwissSystem(SwissSettings {
            swiss_rounds: rounds,
            ..Default::default()
        })
    }

    fn in_group(mut m: Match, group: &str) -> Match {
        m.group = Some(group.to_owned());
        m
    }

    #[test]
    fn test_validate_settings() {
        let report = SwissSystem.validate_settings(&settings(3), Some(8));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());

        let report = SwissSystem.validate_settings(&settings(3), Some(3));
        assert!(report.has_error("teams.not_enough"));

        let report = SwissSystem.validate_settings(&settings(6), Some(6));
        assert!(report.is_valid());
        assert!(report.has_warning("teams.not_power_of_two"));
        assert!(report.has_warning("swiss.forced_repeats_likely"));

        let pattern = Settings::SwissSystem(SwissSettings {
            poule_pattern: Some(vec![vec![1, 3], vec![2]]),
            ..Default::default()
        });
        let report = SwissSystem.validate_settings(&pattern, Some(4));
        assert!(report.has_error("swiss.poule_pattern_coverage"));
    }

    #[test]
    fn test_next_phases() {
        let settings = settings(3);

        let next = |current| SwissSystem.next_phase(&settings, current).unwrap().id;
        assert_eq!(next(START), SWISS_PHASE_1);
        assert_eq!(next(SWISS_PHASE_1), POULES);
        assert_eq!(next(POULES), FINAL);
        assert!(SwissSystem.next_phase(&settings, FINAL).is_none());
    }

    #[test]
    fn test_swiss_rounds() {
        let settings = settings(2);
        let phase = SwissSystem.definition().phase(SWISS_PHASE_1).unwrap();
        let teams = seeded_teams![1, 2, 3, 4];

        let first = SwissSystem
            .generate_matches(&GenerationContext::new(phase, &settings, &teams))
            .unwrap();
        let pairs: Vec<(u64, u64)> = first
            .fixtures
            .iter()
            .map(|f| (f.home_team_id.0, f.away_team_id.0))
            .collect();
        assert_eq!(pairs, [(1, 2), (3, 4)]);

        let matches = [
            result(1, SWISS_PHASE_1, 1, 1, 2, 0, 2),
            result(2, SWISS_PHASE_1, 1, 3, 0, 1, 4),
        ];
        let ctx = PhaseContext::new(phase, &settings, &teams, &matches);
        assert!(!SwissSystem.phase_finished(&ctx));

        // 1 and 4 lead, 3 lost by fewer goals than 2.
        let second = SwissSystem
            .next_round(&GenerationContext::new(phase, &settings, &teams).matches(&matches))
            .unwrap();
        let pairs: Vec<(u64, u64, Option<u32>)> = second
            .fixtures
            .iter()
            .map(|f| (f.home_team_id.0, f.away_team_id.0, f.round))
            .collect();
        assert_eq!(pairs, [(1, 4, Some(2)), (3, 2, Some(2))]);
        assert!(second.warnings.is_empty());

        let mut matches = matches.to_vec();
        matches.push(result(3, SWISS_PHASE_1, 2, 1, 1, 0, 4));
        matches.push(result(4, SWISS_PHASE_1, 2, 3, 0, 1, 2));
        let ctx = PhaseContext::new(phase, &settings, &teams, &matches);
        assert!(SwissSystem.phase_finished(&ctx));

        // Both halves of the field move on to the poules.
        let advancing = SwissSystem.advancing_teams(&ctx, phase.advancement_rules);
        assert_eq!(advancing, [TeamId(1), TeamId(4), TeamId(2), TeamId(3)]);
    }

    #[test]
    fn test_forced_repeat() {
        let settings = settings(3);
        let phase = SwissSystem.definition().phase(SWISS_PHASE_1).unwrap();
        let teams = seeded_teams![1, 2];
        let matches = [result(1, SWISS_PHASE_1, 1, 1, 1, 0, 2)];

        let generation = SwissSystem
            .next_round(&GenerationContext::new(phase, &settings, &teams).matches(&matches))
            .unwrap();

        assert_eq!(generation.fixtures.len(), 1);
        assert_eq!(generation.warnings.len(), 1);
        assert_eq!(generation.warnings[0].message_key, "swiss.forced_repeat");
    }

    #[test]
    fn test_poules() {
        let phase = SwissSystem.definition().phase(POULES).unwrap();
        let teams = seeded_teams![1, 2, 3, 4, 5, 6];

        let generation = SwissSystem
            .generate_matches(&GenerationContext::new(phase, &settings(3), &teams))
            .unwrap();
        assert_eq!(
            generation.groups,
            [
                Group::new("A", vec![TeamId(1), TeamId(4), TeamId(5)]),
                Group::new("B", vec![TeamId(2), TeamId(3), TeamId(6)]),
            ]
        );
        assert_eq!(generation.fixtures.len(), 6);

        let top_bottom = Settings::SwissSystem(SwissSettings {
            poule_split: PouleSplit::TopBottom,
            ..Default::default()
        });
        let generation = SwissSystem
            .generate_matches(&GenerationContext::new(phase, &top_bottom, &teams))
            .unwrap();
        assert_eq!(
            generation.groups,
            [
                Group::new("A", vec![TeamId(1), TeamId(2), TeamId(3)]),
                Group::new("B", vec![TeamId(4), TeamId(5), TeamId(6)]),
            ]
        );

        let pattern = Settings::SwissSystem(SwissSettings {
            poule_pattern: Some(vec![vec![1, 6, 3], vec![2, 5, 4]]),
            ..Default::default()
        });
        let generation = SwissSystem
            .generate_matches(&GenerationContext::new(phase, &pattern, &teams))
            .unwrap();
        assert_eq!(
            generation.groups[0],
            Group::new("A", vec![TeamId(1), TeamId(6), TeamId(3)])
        );
    }

    #[test]
    fn test_poule_winners() {
        let settings = settings(3);
        let phase = SwissSystem.definition().phase(POULES).unwrap();
        let teams = seeded_teams![1, 2, 3, 4];
        let matches = [
            in_group(result(1, POULES, 1, 1, 0, 2, 4), "A"),
            in_group(result(2, POULES, 1, 2, 3, 0, 3), "B"),
        ];

        let ctx = PhaseContext::new(phase, &settings, &teams, &matches);
        assert_eq!(
            SwissSystem.advancing_teams(&ctx, phase.advancement_rules),
            [TeamId(4), TeamId(2)]
        );
    }
}
