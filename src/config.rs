//! Application-level configuration: canonical team names and the optional admin token.

use std::{collections::HashSet, env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::dto::validation::RESERVED_NAMES;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREBOARD_CONFIG_PATH";
/// Environment variable holding the shared admin token.
const ADMIN_TOKEN_ENV: &str = "SCOREBOARD_ADMIN_TOKEN";
/// The registry always holds exactly this many teams.
pub const TEAM_COUNT: usize = 4;
/// Built-in team roster used when no configuration overrides it.
pub(crate) const DEFAULT_TEAMS: [&str; TEAM_COUNT] = [
    "Blue Victorians",
    "Green Gladiators",
    "Red Romans",
    "White Napoleans",
];

/// Reasons a configuration file is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file is not valid JSON for [`RawConfig`].
    #[error("invalid configuration JSON")]
    Parse(#[source] serde_json::Error),
    /// The roster does not hold exactly [`TEAM_COUNT`] names.
    #[error("expected {TEAM_COUNT} default teams, got {0}")]
    TeamCount(usize),
    /// A roster entry is empty once trimmed.
    #[error("default team names must not be blank")]
    BlankName,
    /// The same name appears twice.
    #[error("duplicate default team name `{0}`")]
    DuplicateName(String),
    /// The name collides with a fixed key of the history output.
    #[error("default team name `{0}` is reserved")]
    ReservedName(String),
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_teams: Vec<String>,
    admin_token: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk and environment, falling back to the built-in roster.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let default_teams = match fs::read_to_string(&path) {
            Ok(contents) => match parse_default_teams(&contents) {
                Ok(teams) => {
                    info!(path = %path.display(), "loaded default teams from config");
                    teams
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "invalid config; falling back to built-in teams"
                    );
                    builtin_teams()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                builtin_teams()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                builtin_teams()
            }
        };

        let admin_token = env::var(ADMIN_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());
        if admin_token.is_none() {
            info!("no admin token configured; admin routes are open");
        }

        Self {
            default_teams,
            admin_token,
        }
    }

    /// Require `token` on every admin route.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// The canonical team names the registry heals back to.
    pub fn default_teams(&self) -> &[String] {
        &self.default_teams
    }

    /// Shared secret expected in the admin token header, if any.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_teams: builtin_teams(),
            admin_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_teams: Vec<String>,
}

/// Parse and check the roster: exactly four distinct, non-blank, non-reserved names.
fn parse_default_teams(contents: &str) -> Result<Vec<String>, ConfigError> {
    let raw: RawConfig = serde_json::from_str(contents).map_err(ConfigError::Parse)?;
    if raw.default_teams.len() != TEAM_COUNT {
        return Err(ConfigError::TeamCount(raw.default_teams.len()));
    }

    let mut seen = HashSet::new();
    let mut teams = Vec::with_capacity(TEAM_COUNT);
    for name in raw.default_teams {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(ConfigError::BlankName);
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(ConfigError::ReservedName(name));
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::DuplicateName(name));
        }
        teams.push(name);
    }
    Ok(teams)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn builtin_teams() -> Vec<String> {
    DEFAULT_TEAMS.iter().map(|name| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_four_distinct_teams_and_no_token() {
        let config = AppConfig::default();
        let names: HashSet<&String> = config.default_teams().iter().collect();
        assert_eq!(names.len(), TEAM_COUNT);
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn roster_from_file_is_trimmed() {
        let teams =
            parse_default_teams(r#"{"defaultTeams": [" Owls ", "Foxes", "Bears", "Hawks"]}"#)
                .unwrap();
        assert_eq!(teams, ["Owls", "Foxes", "Bears", "Hawks"]);
    }

    #[test]
    fn roster_must_hold_exactly_four_names() {
        let err = parse_default_teams(r#"{"defaultTeams": ["A", "B", "C"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::TeamCount(3)));
    }

    #[test]
    fn roster_rejects_blank_and_duplicate_names() {
        assert!(matches!(
            parse_default_teams(r#"{"defaultTeams": ["A", " ", "C", "D"]}"#),
            Err(ConfigError::BlankName)
        ));
        assert!(matches!(
            parse_default_teams(r#"{"defaultTeams": ["A", "B", "A", "D"]}"#),
            Err(ConfigError::DuplicateName(name)) if name == "A"
        ));
    }

    #[test]
    fn roster_rejects_history_keys() {
        assert!(matches!(
            parse_default_teams(r#"{"defaultTeams": ["A", "time", "C", "D"]}"#),
            Err(ConfigError::ReservedName(name)) if name == "time"
        ));
        assert!(matches!(
            parse_default_teams(r#"{"defaultTeams": ["A", "B", " isRevealed", "D"]}"#),
            Err(ConfigError::ReservedName(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_default_teams("{defaultTeams"),
            Err(ConfigError::Parse(_))
        ));
    }
}
