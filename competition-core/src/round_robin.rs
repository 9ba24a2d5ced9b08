use crate::{EntrantSpot, Fixture, Pairing, TeamId};

/// A round robin schedule built with the circle method.
///
/// The order of the teams is significant and never changed: the first team is pinned while all
/// other teams rotate around it. If the number of teams is odd an empty spot is added, every
/// pairing against it is a bye.
#[derive(Clone, Debug)]
pub struct RoundRobin {
    teams: Vec<TeamId>,
    pairings: Vec<Pairing>,
    rounds: u32,
}

impl RoundRobin {
    /// Creates a new single `RoundRobin` schedule for the given `teams`.
    pub fn new<I>(teams: I) -> Self
    where
        I: IntoIterator<Item = TeamId>,
    {
        Self::new_with_return_games(teams, false)
    }

    /// Creates a new `RoundRobin` schedule for the given `teams`. If `return_games` is `true`
    /// every pairing is played a second time with home and away swapped.
    pub fn new_with_return_games<I>(teams: I, return_games: bool) -> Self
    where
        I: IntoIterator<Item = TeamId>,
    {
        let teams: Vec<TeamId> = teams.into_iter().collect();

        log::debug!(
            "Creating new RoundRobin schedule with {} teams (return games: {})",
            teams.len(),
            return_games
        );

        // teams.len() if even, teams.len() + 1 if odd.
        let teams_even = if teams.len() % 2 == 0 {
            teams.len()
        } else {
            teams.len() + 1
        };

        let num_rounds = teams_even.saturating_sub(1);
        let pairings_per_round = teams_even / 2;

        let capacity = num_rounds * pairings_per_round * if return_games { 2 } else { 1 };
        let mut pairings = Vec::with_capacity(capacity);

        // Pin team 0 for every round. Position `index` is paired with position `n - index - 1`.
        // Between rounds all positions except 0 rotate once to the right, moving the last team
        // to position 1.
        for round in 0..num_rounds {
            for index in 0..pairings_per_round {
                let home = Self::circle_entrant(teams_even, round, index);
                let away = Self::circle_entrant(teams_even, round, teams_even - index - 1);

                pairings.push(Pairing::new(
                    round as u32 + 1,
                    Self::spot(&teams, home),
                    Self::spot(&teams, away),
                ));
            }
        }

        let mut rounds = num_rounds as u32;

        if return_games {
            let offset = num_rounds as u32;

            for index in 0..pairings.len() {
                let pairing = pairings[index];
                pairings.push(pairing.mirrored(pairing.round + offset));
            }

            rounds *= 2;
        }

        Self {
            teams,
            pairings,
            rounds,
        }
    }

    #[inline]
    fn spot(teams: &[TeamId], index: usize) -> EntrantSpot<TeamId> {
        EntrantSpot::new(teams.get(index).copied())
    }

    /// Returns the team index at slot `index` of a circle with `n` slots in `round`. Slot 0
    /// is fixed, all other teams rotate clockwise by one slot per round.
    #[inline]
    fn circle_entrant(n: usize, round: usize, index: usize) -> usize {
        debug_assert!(n % 2 == 0);

        if index == 0 {
            return 0;
        }

        let rotating = n - 1;
        (index - 1 + rotating - round % rotating) % rotating + 1
    }

    /// Returns the teams in the order they were given.
    #[inline]
    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }

    /// Returns all pairings including byes, ordered by round.
    #[inline]
    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }

    /// Returns the total number of rounds, including return rounds.
    #[inline]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Returns the pairings of the given 1-based `round`.
    pub fn round(&self, round: u32) -> impl Iterator<Item = &Pairing> + '_ {
        self.pairings.iter().filter(move |p| p.round == round)
    }

    /// Returns the `(round, team)` of every bye.
    pub fn byes(&self) -> impl Iterator<Item = (u32, TeamId)> + '_ {
        self.pairings.iter().filter_map(|p| match (p.home, p.away) {
            (EntrantSpot::Entrant(team), EntrantSpot::Empty)
            | (EntrantSpot::Empty, EntrantSpot::Entrant(team)) => Some((p.round, team)),
            _ => None,
        })
    }

    /// Converts the schedule into [`Fixture`]s of `stage`, dropping all byes.
    pub fn fixtures(&self, stage: &str, group: Option<&str>) -> Vec<Fixture> {
        self.pairings
            .iter()
            .filter_map(|p| p.to_fixture(stage, group))
            .collect()
    }
}
