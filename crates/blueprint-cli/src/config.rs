//! Configuration file management for blueprint.
//!
//! Provides a TOML-based config file at `~/.config/blueprint/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use blueprint_core::budget::DEFAULT_DAILY_LIMIT;
use blueprint_core::cache;
use blueprint_core::endpoint::DEFAULT_TIMEOUT;
use blueprint_core::plan::cost::DEFAULT_HOURLY_RATE;
use blueprint_db::config::{DATABASE_URL_ENV, DbConfig};

pub const ENDPOINT_URL_ENV: &str = "BLUEPRINT_ENDPOINT_URL";
pub const API_KEY_ENV: &str = "BLUEPRINT_API_KEY";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DAILY_TOKEN_LIMIT_ENV: &str = "BLUEPRINT_DAILY_TOKEN_LIMIT";
pub const CACHE_DIR_ENV: &str = "BLUEPRINT_CACHE_DIR";

const DEFAULT_TTL_HOURS: u64 = 24;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub generation: GenerationSection,
    pub cache: CacheSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    /// `edge`, `anthropic` or `local`. Inferred from the other keys when
    /// absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_token_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_hours: Option<u64>,
}

/// Which remote service produces plan text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// The generate-app-plan edge function (`{businessData, options}`).
    Edge,
    /// The Anthropic Messages API.
    Anthropic,
    /// No remote service; plans come from the industry templates.
    Local,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the blueprint config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/blueprint` or
/// `~/.config/blueprint`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("blueprint");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("blueprint")
}

/// Return the path to the blueprint config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns `Ok(None)` if it does not exist.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: EndpointKind,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    pub daily_token_limit: u64,
    pub hourly_rate: u64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `None` when no cache directory could be determined.
    pub dir: Option<PathBuf>,
    pub ttl: Duration,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct BlueprintConfig {
    pub db_config: DbConfig,
    pub generation: GenerationConfig,
    pub cache: CacheConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl BlueprintConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `BLUEPRINT_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Endpoint URL: `BLUEPRINT_ENDPOINT_URL` > `generation.url`
    /// - API key: `BLUEPRINT_API_KEY` > `ANTHROPIC_API_KEY` (anthropic only) > `generation.api_key`
    /// - Token limit: `BLUEPRINT_DAILY_TOKEN_LIMIT` > `generation.daily_token_limit` > 100k
    /// - Cache dir: `BLUEPRINT_CACHE_DIR` > `cache.dir` > `$XDG_CACHE_HOME/blueprint`
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file = load_config()?.unwrap_or_default();
        Self::resolve_with(cli_db_url, file)
    }

    pub fn resolve_with(cli_db_url: Option<&str>, file: ConfigFile) -> Result<Self> {
        let ConfigFile {
            database,
            generation,
            cache: cache_section,
        } = file;

        // DB URL resolution.
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Some(url) = env_var(DATABASE_URL_ENV) {
            url
        } else {
            database.url
        };
        let db_config = DbConfig::new(db_url);

        // Endpoint resolution.
        let url = env_var(ENDPOINT_URL_ENV).or(generation.url);
        let anthropic_key = env_var(ANTHROPIC_API_KEY_ENV);
        let endpoint = match generation.endpoint {
            Some(kind) => kind,
            None if url.is_some() => EndpointKind::Edge,
            None if anthropic_key.is_some() => EndpointKind::Anthropic,
            None => EndpointKind::Local,
        };
        let api_key = match endpoint {
            EndpointKind::Anthropic => env_var(API_KEY_ENV)
                .or(anthropic_key)
                .or(generation.api_key),
            _ => env_var(API_KEY_ENV).or(generation.api_key),
        };
        match endpoint {
            EndpointKind::Edge if url.is_none() => bail!(
                "edge endpoint selected but no URL configured; set {ENDPOINT_URL_ENV} or generation.url"
            ),
            EndpointKind::Anthropic if api_key.is_none() => bail!(
                "anthropic endpoint selected but no API key configured; set {ANTHROPIC_API_KEY_ENV} or generation.api_key"
            ),
            _ => {}
        }

        let daily_token_limit = match env_var(DAILY_TOKEN_LIMIT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("{DAILY_TOKEN_LIMIT_ENV} must be a whole number, got {raw:?}")
            })?,
            None => generation.daily_token_limit.unwrap_or(DEFAULT_DAILY_LIMIT),
        };

        let generation = GenerationConfig {
            endpoint,
            url,
            api_key,
            model: generation.model,
            timeout: generation
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            daily_token_limit,
            hourly_rate: generation.hourly_rate.unwrap_or(DEFAULT_HOURLY_RATE),
        };

        // Cache resolution.
        let cache = CacheConfig {
            dir: env_var(CACHE_DIR_ENV)
                .map(PathBuf::from)
                .or(cache_section.dir)
                .or_else(cache::default_dir),
            ttl: Duration::from_secs(
                cache_section.ttl_hours.unwrap_or(DEFAULT_TTL_HOURS) * 60 * 60,
            ),
        };

        Ok(Self {
            db_config,
            generation,
            cache,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[&str] = &[
        DATABASE_URL_ENV,
        ENDPOINT_URL_ENV,
        API_KEY_ENV,
        ANTHROPIC_API_KEY_ENV,
        DAILY_TOKEN_LIMIT_ENV,
        CACHE_DIR_ENV,
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = crate::test_util::lock_env();
        for var in ALL_VARS {
            unsafe { std::env::remove_var(var) };
        }
        guard
    }

    fn parse(toml_src: &str) -> ConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn partial_file_fills_defaults() {
        let file = parse("[generation]\nhourly_rate = 90\n");
        assert_eq!(file.database.url, DbConfig::DEFAULT_URL);
        assert_eq!(file.generation.hourly_rate, Some(90));
        assert!(file.cache.dir.is_none());
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            generation: GenerationSection {
                endpoint: Some(EndpointKind::Edge),
                url: Some("https://edge.example/functions/v1/generate-app-plan".to_string()),
                ..Default::default()
            },
            cache: CacheSection::default(),
        };
        let saved = save_config(&original);
        let loaded = load_config();

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        saved.unwrap();
        let loaded = loaded.unwrap().unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.generation.endpoint, Some(EndpointKind::Edge));
        assert_eq!(loaded.generation.url, original.generation.url);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let loaded = load_config();

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        assert!(loaded.unwrap().is_none());
    }

    #[test]
    fn cli_flag_overrides_env_and_file() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DATABASE_URL_ENV, "postgresql://env:5432/envdb") };

        let config = BlueprintConfig::resolve_with(
            Some("postgresql://cli:5432/clidb"),
            parse("[database]\nurl = \"postgresql://file:5432/filedb\"\n"),
        )
        .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
    }

    #[test]
    fn env_overrides_file() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DATABASE_URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(DAILY_TOKEN_LIMIT_ENV, "500") };

        let config = BlueprintConfig::resolve_with(
            None,
            parse(
                "[database]\nurl = \"postgresql://file:5432/filedb\"\n\
                 [generation]\ndaily_token_limit = 9000\n",
            ),
        )
        .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.generation.daily_token_limit, 500);

        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
        unsafe { std::env::remove_var(DAILY_TOKEN_LIMIT_ENV) };
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_env();
        let config = BlueprintConfig::resolve_with(None, ConfigFile::default()).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.generation.endpoint, EndpointKind::Local);
        assert_eq!(config.generation.daily_token_limit, DEFAULT_DAILY_LIMIT);
        assert_eq!(config.generation.hourly_rate, DEFAULT_HOURLY_RATE);
        assert_eq!(config.generation.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.cache.ttl, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn endpoint_kind_is_inferred() {
        let _lock = lock_env();

        unsafe { std::env::set_var(ENDPOINT_URL_ENV, "http://localhost:54321/functions/v1/generate-app-plan") };
        let edge = BlueprintConfig::resolve_with(None, ConfigFile::default()).unwrap();
        assert_eq!(edge.generation.endpoint, EndpointKind::Edge);
        unsafe { std::env::remove_var(ENDPOINT_URL_ENV) };

        unsafe { std::env::set_var(ANTHROPIC_API_KEY_ENV, "sk-test") };
        let anthropic = BlueprintConfig::resolve_with(None, ConfigFile::default()).unwrap();
        assert_eq!(anthropic.generation.endpoint, EndpointKind::Anthropic);
        assert_eq!(anthropic.generation.api_key.as_deref(), Some("sk-test"));
        unsafe { std::env::remove_var(ANTHROPIC_API_KEY_ENV) };
    }

    #[test]
    fn explicit_edge_without_url_is_an_error() {
        let _lock = lock_env();
        let err = BlueprintConfig::resolve_with(None, parse("[generation]\nendpoint = \"edge\"\n"))
            .unwrap_err();
        assert!(err.to_string().contains("no URL configured"), "got: {err}");
    }

    #[test]
    fn bad_token_limit_is_an_error() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DAILY_TOKEN_LIMIT_ENV, "lots") };
        let result = BlueprintConfig::resolve_with(None, ConfigFile::default());
        unsafe { std::env::remove_var(DAILY_TOKEN_LIMIT_ENV) };
        assert!(result.is_err());
    }

    #[test]
    fn cache_dir_env_wins() {
        let _lock = lock_env();
        unsafe { std::env::set_var(CACHE_DIR_ENV, "/tmp/bp-cache") };
        let config = BlueprintConfig::resolve_with(
            None,
            parse("[cache]\ndir = \"/var/cache/bp\"\nttl_hours = 2\n"),
        )
        .unwrap();
        unsafe { std::env::remove_var(CACHE_DIR_ENV) };

        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/bp-cache")));
        assert_eq!(config.cache.ttl, Duration::from_secs(2 * 60 * 60));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("blueprint/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
