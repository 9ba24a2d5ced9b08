use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;
use crate::store::SettingsStore;

macro_rules! from_environment {
    ($config:expr, $($key:expr, $name:tt),*$(,)?) => {{
        $(
            {
                if let Ok(value) = env::var($key) {
                    if let Ok(value) = value.parse() {
                        $config.$name = value;
                    }
                }
            }
        )*
    }};
}

macro_rules! from_environment_error {
    ($config:expr, $($key:expr, $name:tt),*$(,)?) => {{
        $(
            let value = env::var($key).map_err(|_| ConfigError::MissingField($key))?;
            $config.$name = value.parse().map_err(|_| ConfigError::MissingField($key))?;
        )*
    }};
}

/// The engine configuration.
///
/// ```toml
/// loglevel = "debug"
///
/// [modes.cup]
/// format = "knockout"
/// bracket_size = 16
/// third_place_match = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: LevelFilter,
    /// Tournament mode settings keyed by mode id.
    pub modes: HashMap<String, Settings>,
}

impl Config {
    pub fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let buf = fs::read_to_string(path)?;

        Ok(toml::from_str(&buf)?)
    }

    /// Creates a [`Config`] from the environment. Tournament modes can only be configured in
    /// a file.
    pub fn from_environment() -> Result<Self, ConfigError> {
        let mut this = Self::default();

        from_environment_error!(this, "CE_LOGLEVEL", loglevel);

        Ok(this)
    }

    pub fn with_environment(mut self) -> Self {
        from_environment!(self, "CE_LOGLEVEL", loglevel);

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: LevelFilter::Info,
            modes: HashMap::new(),
        }
    }
}

impl SettingsStore for Config {
    fn settings(&self, mode: &str) -> Option<Settings> {
        self.modes.get(mode).cloned()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("missing config field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use competition_core::{SeedingMethod, TieBreaker};
    use log::LevelFilter;

    use super::{Config, ConfigError};
    use crate::registry::FormatKind;
    use crate::settings::Settings;
    use crate::store::SettingsStore;

    const CONFIG: &str = r#"
        loglevel = "debug"

        [modes.cup]
        format = "knockout"
        bracket_size = 16
        seeding = "random"
        third_place_match = true

        [modes.league]
        format = "league_only"
        double_round_robin = true

        [modes.league.scoring]
        points_per_win = 2
        tie_breakers = ["head_to_head", "goal_difference"]
    "#;

    #[test]
    fn test_config_parse() {
        let config: Config = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.loglevel, LevelFilter::Debug);

        match config.settings("cup") {
            Some(Settings::Knockout(settings)) => {
                assert_eq!(settings.bracket_size, 16);
                assert_eq!(settings.seeding, SeedingMethod::Random);
                assert!(settings.third_place_match);
                assert_eq!(settings.random_seed, None);
            }
            settings => panic!("unexpected settings: {:?}", settings),
        }

        match config.settings("league") {
            Some(Settings::LeagueOnly(settings)) => {
                assert!(settings.double_round_robin);
                assert_eq!(settings.scoring.points_per_win, 2);
                assert_eq!(settings.scoring.points_per_draw, 1);
                assert_eq!(
                    settings.scoring.tie_breakers,
                    [TieBreaker::HeadToHead, TieBreaker::GoalDifference]
                );
            }
            settings => panic!("unexpected settings: {:?}", settings),
        }

        assert_eq!(config.settings("unknown"), None);
        assert_eq!(
            config.settings_or_default("unknown", FormatKind::SwissSystem),
            Settings::default_for(FormatKind::SwissSystem)
        );
    }

    #[test]
    fn test_config_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.modes.is_empty());
    }

    #[test]
    fn test_config_from_file() {
        let path = env::temp_dir().join(format!("competition-engine-{}.toml", std::process::id()));
        fs::write(&path, CONFIG).unwrap();

        let config = Config::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.modes.len(), 2);

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_config_invalid() {
        let err = toml::from_str::<Config>("[modes.cup]\nformat = \"bowling\"").unwrap_err();
        assert!(err.to_string().contains("bowling"));
    }
}
