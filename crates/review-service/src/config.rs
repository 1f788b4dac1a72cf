//! Service configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Storage topology behind the review API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyKind {
    /// One review database.
    Single,
    /// Master database plus a default (replica) database.
    Replicated,
    /// Reviews spread over several partition databases.
    Sharded,
}

impl FromStr for TopologyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "replicated" | "master-slave" => Ok(Self::Replicated),
            "sharded" => Ok(Self::Sharded),
            other => Err(format!("unknown topology: {other}")),
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Replicated => "replicated",
            Self::Sharded => "sharded",
        })
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Directory holding the review databases (default: "/data/reviews").
    pub data_dir: String,

    /// Path to the product catalog database (default: "/data/catalog").
    pub catalog_data_dir: String,

    /// Storage topology (default: single).
    pub topology: TopologyKind,

    /// Replica database path for the replicated topology.
    ///
    /// When unset the default alias reads from the master handle.
    pub replica_data_dir: Option<String>,

    /// Seconds a user's reads stay on the master after their write (default: 60).
    pub write_bind_seconds: i64,

    /// Number of partitions for the sharded topology (default: 2).
    pub shard_count: u32,

    /// Explicit partition paths, in partition order. Overrides `shard_count`.
    pub shard_dirs: Vec<String>,

    /// How long cached product choices stay valid (default: 300).
    pub product_cache_ttl_seconds: i64,

    /// Idle lifetime of a session (default: 3600).
    pub session_ttl_seconds: i64,

    /// Upper bound on live sessions held in memory (default: 100000).
    pub max_sessions: usize,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Partition list file structure.
#[derive(Debug, Deserialize)]
struct ShardsFile {
    partitions: Vec<String>,
}

/// Longest window or TTL accepted, one hundred years.
pub const MAX_DURATION_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// Errors raised while loading configuration.
///
/// Any of these stops the service at startup; set variables never fall back
/// to their defaults.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value is unusable.
    #[error("invalid {name}={value:?}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The partitions file could not be read.
    #[error("failed to read partitions file {path}: {source}")]
    ShardsFileRead {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The partitions file is not valid JSON of the expected shape.
    #[error("failed to parse partitions file {path}: {source}")]
    ShardsFileParse {
        /// File path.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables and the partitions file.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an unusable value or the
    /// partitions file cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = Env(lookup);

        let topology = match env.get("TOPOLOGY") {
            Some(raw) => raw
                .parse::<TopologyKind>()
                .map_err(|e| ConfigError::invalid("TOPOLOGY", &raw, e))?,
            None => defaults.topology,
        };

        let shard_count: u32 = env.parse("SHARD_COUNT", defaults.shard_count)?;
        if shard_count == 0 {
            return Err(ConfigError::invalid(
                "SHARD_COUNT",
                "0",
                "at least one partition is required",
            ));
        }

        Ok(Self {
            listen_addr: env.get("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: env.get("DATA_DIR").unwrap_or(defaults.data_dir),
            catalog_data_dir: env.get("CATALOG_DATA_DIR").unwrap_or(defaults.catalog_data_dir),
            topology,
            replica_data_dir: env.get("REPLICA_DATA_DIR"),
            write_bind_seconds: env.seconds("WRITE_BIND_SECONDS", defaults.write_bind_seconds)?,
            shard_count,
            shard_dirs: load_shard_dirs(&env)?,
            product_cache_ttl_seconds: env.seconds(
                "PRODUCT_CACHE_TTL_SECONDS",
                defaults.product_cache_ttl_seconds,
            )?,
            session_ttl_seconds: env.seconds("SESSION_TTL_SECONDS", defaults.session_ttl_seconds)?,
            max_sessions: env.parse("MAX_SESSIONS", defaults.max_sessions)?,
            cors_origins: env
                .get("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env.parse("MAX_BODY_BYTES", defaults.max_body_bytes)?,
            request_timeout_seconds: env.parse(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            )?,
        })
    }

    /// Database paths of the partitions, in partition order.
    #[must_use]
    pub fn partition_paths(&self) -> Vec<PathBuf> {
        if self.shard_dirs.is_empty() {
            (0..self.shard_count)
                .map(|index| Path::new(&self.data_dir).join(format!("reviews-{index}")))
                .collect()
        } else {
            self.shard_dirs.iter().map(PathBuf::from).collect()
        }
    }

    /// Database path of the master store.
    #[must_use]
    pub fn master_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("reviews")
    }
}

/// Variable source used while loading.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    /// Parse a variable, using `default` only when it is unset.
    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(name, &raw, e)),
            None => Ok(default),
        }
    }

    /// Parse a non-negative number of seconds that fits a `chrono::Duration`.
    fn seconds(&self, name: &'static str, default: i64) -> Result<i64, ConfigError> {
        let seconds: i64 = self.parse(name, default)?;
        if seconds < 0 {
            return Err(ConfigError::invalid(name, &seconds.to_string(), "must not be negative"));
        }
        if seconds > MAX_DURATION_SECONDS {
            return Err(ConfigError::invalid(
                name,
                &seconds.to_string(),
                format!("must be at most {MAX_DURATION_SECONDS}"),
            ));
        }
        Ok(seconds)
    }
}

/// Load partition paths from `SHARDS_FILE`, then `SHARD_DIRS`.
fn load_shard_dirs<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Vec<String>, ConfigError> {
    if let Some(path) = env.get("SHARDS_FILE") {
        let file = load_shards_file(&path)?;
        if file.partitions.is_empty() {
            return Err(ConfigError::invalid("SHARDS_FILE", &path, "lists no partitions"));
        }
        tracing::info!(path = %path, partitions = file.partitions.len(), "Loaded partitions file");
        return Ok(file.partitions);
    }

    match env.get("SHARD_DIRS") {
        Some(raw) => {
            let dirs: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if dirs.is_empty() {
                return Err(ConfigError::invalid("SHARD_DIRS", &raw, "lists no partitions"));
            }
            Ok(dirs)
        }
        None => Ok(Vec::new()),
    }
}

/// Load the partition list from a JSON file.
fn load_shards_file(path: &str) -> Result<ShardsFile, ConfigError> {
    let contents =
        std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::ShardsFileRead {
            path: path.to_string(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::ShardsFileParse {
        path: path.to_string(),
        source,
    })
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/reviews".into(),
            catalog_data_dir: "/data/catalog".into(),
            topology: TopologyKind::Single,
            replica_data_dir: None,
            write_bind_seconds: 60,
            shard_count: 2,
            shard_dirs: Vec::new(),
            product_cache_ttl_seconds: 300,
            session_ttl_seconds: 3600,
            max_sessions: 100_000,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
