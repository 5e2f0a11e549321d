use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

use crate::roster::{MAX_ROSTER_SIZE, Nominee, sanitize_nominee};

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub voting: VotingConfig,
    /// Nominees loaded into an empty roster at start-up.
    #[serde(default)]
    pub roster: Vec<Nominee>,
}

impl ApiConfig {
    pub fn load() -> Result<Self> {
        let configured_path =
            std::env::var("CLASSVOTE_CONFIG").unwrap_or_else(|_| "config/api.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("CLASSVOTE_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/api.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        Self::from_settings(settings)
    }

    /// Parses configuration from an in-memory TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .context("Failed to parse API configuration")?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        ensure!(
            !self.database.url.is_empty(),
            "Database URL must be specified"
        );
        ensure!(self.server.port > 0, "Server port must be greater than zero");
        self.database.ensure_bounds()?;
        self.cache.ensure_bounds()?;
        ensure!(
            self.roster.len() <= MAX_ROSTER_SIZE,
            "Roster seed exceeds {MAX_ROSTER_SIZE} nominees"
        );

        let mut sanitized = Vec::with_capacity(self.roster.len());
        for nominee in &self.roster {
            let clean = sanitize_nominee(nominee)
                .map_err(|err| anyhow!("Invalid roster entry: {err}"))?;
            ensure!(
                !sanitized.iter().any(|n: &Nominee| n.name == clean.name),
                "Roster lists {} more than once",
                clean.name
            );
            sanitized.push(clean);
        }
        self.roster = sanitized;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<IpAddr>,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(self.port != 0, "HTTP port cannot be zero");
        SocketAddr::new(host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
    pub min_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }

    fn ensure_bounds(&self) -> Result<()> {
        ensure!(
            self.max_connections >= self.min_connections.unwrap_or(1),
            "Max connections must be >= min connections"
        );
        ensure!(self.max_connections <= 128, "Connection pool oversized");
        Ok(())
    }

    const fn default_max_connections() -> u32 {
        8
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub summary_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            summary_ttl_seconds: 30,
        }
    }
}

impl CacheConfig {
    pub fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_ttl_seconds)
    }

    fn ensure_bounds(&self) -> Result<()> {
        ensure!(
            self.summary_ttl_seconds >= 1,
            "Summary cache TTL must be at least one second"
        );
        ensure!(
            self.summary_ttl_seconds <= 3_600,
            "Summary cache TTL cannot exceed one hour"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VotingConfig {
    /// Reject ballots that leave any of the six rank slots empty.
    #[serde(default = "default_true")]
    pub require_complete_ballot: bool,
    /// Reject picks that are not on the roster or do not fit its stance.
    #[serde(default = "default_true")]
    pub enforce_roster: bool,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            require_complete_ballot: true,
            enforce_roster: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}
