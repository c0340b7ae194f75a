use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DB: &str = "clash_scoreboard";
const BASE_URL_ENV: &str = "COUCH_BASE_URL";
const DB_ENV: &str = "COUCH_DB";
const USERNAME_ENV: &str = "COUCH_USERNAME";
const PASSWORD_ENV: &str = "COUCH_PASSWORD";

/// Connection settings for the CouchDB scoreboard database.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, such as `http://localhost:5984`.
    pub base_url: String,
    /// Database holding teams, rounds and scores.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
}

impl CouchConfig {
    /// Target `database` on the server at `base_url`, or the default scoreboard database.
    pub fn new(base_url: impl Into<String>, database: Option<String>) -> Self {
        let database = database
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_DB.to_owned());

        Self {
            base_url: base_url.into(),
            database,
            username: None,
            password: None,
        }
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` (defaults to `clash_scoreboard`)
    /// and the optional `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var(BASE_URL_ENV)
            .map_err(|_| CouchDaoError::MissingEnvVar { var: BASE_URL_ENV })?;
        let config = Self::new(base_url, env::var(DB_ENV).ok());

        match (env::var(USERNAME_ENV).ok(), env::var(PASSWORD_ENV).ok()) {
            (Some(username), Some(password)) => Ok(config.with_credentials(username, password)),
            _ => Ok(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_database_falls_back_to_default() {
        assert_eq!(CouchConfig::new("http://couch:5984", None).database, DEFAULT_DB);
        assert_eq!(
            CouchConfig::new("http://couch:5984", Some("  ".into())).database,
            DEFAULT_DB
        );
    }

    #[test]
    fn explicit_database_is_kept() {
        let config = CouchConfig::new("http://couch:5984", Some(" finals ".into()))
            .with_credentials("admin", "pw");
        assert_eq!(config.database, "finals");
        assert_eq!(config.username.as_deref(), Some("admin"));
    }
}
