use super::{validate_format, validate_team_count, warn_large_league, FormatSystem};
use crate::registry::FormatKind;
use crate::settings::{Settings, ValidationReport};

/// A single league table, played as a round robin.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct League;

impl FormatSystem for League {
    fn kind(&self) -> FormatKind {
        FormatKind::LeagueOnly
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

        if let Settings::LeagueOnly(settings) = settings {
            settings.scoring.validate(&mut report);

            if let Some(teams) = team_count {
                validate_team_count(&mut report, teams, 2);
                warn_large_league(&mut report, teams, settings.double_round_robin);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use competition_core::TeamId;

    use super::League;
    use crate::handler::tests::result;
    use crate::handler::{FormatSystem, GenerationContext, PhaseContext};
    use crate::phase::REGULAR_SEASON;
    use crate::registry::FormatKind;
    use crate::seeded_teams;
    use crate::settings::{LeagueSettings, Settings};

    #[test]
    fn test_validate_settings() {
        let settings = Settings::default_for(FormatKind::LeagueOnly);

        let report = League.validate_settings(&settings, Some(8));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());

        let report = League.validate_settings(&settings, Some(1));
        assert!(report.has_error("teams.not_enough"));

        // 21 teams play 210 matches.
        let report = League.validate_settings(&settings, Some(21));
        assert!(report.is_valid());
        assert!(report.has_warning("league.large_match_count"));

        let mut league = LeagueSettings::default();
        league.scoring.points_per_draw = 4;
        let report = League.validate_settings(&Settings::LeagueOnly(league), None);
        assert!(report.has_error("settings.points_order"));
    }

    #[test]
    fn test_generate_matches() {
        let settings = Settings::default_for(FormatKind::LeagueOnly);
        let phase = League.definition().phase(REGULAR_SEASON).unwrap();
        let teams = seeded_teams![1, 2, 3, 4, 5];

        let generation = League
            .generate_matches(&GenerationContext::new(phase, &settings, &teams))
            .unwrap();

        assert_eq!(generation.fixtures.len(), 10);
        assert!(generation.groups.is_empty());
        assert!(generation.fixtures.iter().all(|f| f.stage == REGULAR_SEASON));

        let settings = Settings::LeagueOnly(LeagueSettings {
            double_round_robin: true,
            ..Default::default()
        });
        let generation = League
            .generate_matches(&GenerationContext::new(phase, &settings, &teams))
            .unwrap();
        assert_eq!(generation.fixtures.len(), 20);
    }

    #[test]
    fn test_not_enough_teams() {
        let settings = Settings::default_for(FormatKind::LeagueOnly);
        let phase = League.definition().phase(REGULAR_SEASON).unwrap();
        let teams = seeded_teams![1];

        let err = League
            .generate_matches(&GenerationContext::new(phase, &settings, &teams))
            .unwrap_err();
        assert!(err.has_error("teams.not_enough"));
    }

    #[test]
    fn test_terminal() {
        let settings = Settings::default_for(FormatKind::LeagueOnly);
        assert!(League.next_phases(&settings, REGULAR_SEASON).is_empty());
        assert_eq!(League.next_phase(&settings, "start").unwrap().id, REGULAR_SEASON);
        assert!(League.next_phase(&settings, "unknown").is_none());
    }

    #[test]
    fn test_calculate_standings() {
        let settings = Settings::default_for(FormatKind::LeagueOnly);
        let phase = League.definition().phase(REGULAR_SEASON).unwrap();
        let teams = seeded_teams![1, 2, 3];
        let matches = [
            result(1, REGULAR_SEASON, 1, 1, 1, 1, 2),
            result(2, REGULAR_SEASON, 2, 3, 0, 2, 1),
            result(3, REGULAR_SEASON, 3, 2, 1, 1, 3),
        ];

        let ctx = PhaseContext::new(phase, &settings, &teams, &matches);
        let standings = League.calculate_standings(&ctx, None);

        assert_eq!(standings.teams(), [TeamId(1), TeamId(2), TeamId(3)]);
        assert_eq!(standings[0].points, 4);
        assert_eq!(standings[1].points, 2);
        assert_eq!(standings[2].points, 1);
    }
}
