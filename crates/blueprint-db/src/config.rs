use std::env;

/// Environment variable holding the database URL.
pub const DATABASE_URL_ENV: &str = "BLUEPRINT_DATABASE_URL";

/// Database configuration.
///
/// Reads from `BLUEPRINT_DATABASE_URL`, falling back to
/// `postgresql://localhost:5432/blueprint` when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/blueprint";

    /// Build a config from the environment, falling back to [`Self::DEFAULT_URL`].
    pub fn from_env() -> Self {
        let database_url =
            env::var(DATABASE_URL_ENV).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (CLI flags, tests).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The database name: the last path segment of the URL, without any
    /// query string.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(head, _)| head);
        without_query.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Point the same server at a different database.
    pub fn with_database(&self, name: &str) -> Self {
        match self.database_url.rfind('/') {
            Some(pos) => Self::new(format!("{}/{name}", &self.database_url[..pos])),
            None => self.clone(),
        }
    }

    /// URL of the `postgres` maintenance database on the same server, used to
    /// issue `CREATE DATABASE` when the target does not exist yet.
    pub fn maintenance_url(&self) -> String {
        self.with_database("postgres").database_url
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
