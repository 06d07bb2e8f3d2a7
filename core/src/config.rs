//! Environment-driven configuration and the fixed endpoint map.
//!
//! # Design
//! `Config` is resolved once at startup and never mutated. Resolution is a
//! pure function of a variable lookup, so it cannot fail: every missing or
//! unusable value falls back to a literal default. `from_lookup` takes the
//! lookup as a closure so tests never touch the process environment.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_ENVIRONMENT: &str = "development";

pub const BASE_URL_VAR: &str = "API_BASE_URL";
pub const TIMEOUT_VAR: &str = "API_TIMEOUT";
pub const ENVIRONMENT_VAR: &str = "APP_ENV";
pub const MODE_VAR: &str = "MODE";
pub const LOGGING_VAR: &str = "ENABLE_LOGGING";
pub const DEBUG_VAR: &str = "ENABLE_DEBUG";

/// Client configuration resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub environment: String,
    pub logging_enabled: bool,
    pub debug_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            logging_enabled: false,
            debug_enabled: false,
        }
    }
}

impl Config {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let timeout_ms = get(TIMEOUT_VAR)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_millis(timeout_ms),
            environment: get(ENVIRONMENT_VAR)
                .or_else(|| get(MODE_VAR))
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            logging_enabled: get(LOGGING_VAR).is_some_and(|v| v == "true"),
            debug_enabled: get(DEBUG_VAR).is_some_and(|v| v == "true"),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

pub const ENV_FILE: &str = ".env";

/// Load `.env` from the working directory (if any), then resolve.
///
/// Variables already present in the process environment win over the file.
pub fn load() -> Config {
    load_from(Path::new(ENV_FILE), |key| std::env::var(key).ok())
}

/// Resolve from `lookup`, falling back to the entries of the env file at
/// `path`. A missing file is the same as an empty one.
pub fn load_from<F>(path: &Path, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let file = read_env_file(path);
    Config::from_lookup(|key| lookup(key).or_else(|| file.get(key).cloned()))
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable environment file");
            return HashMap::new();
        }
    };

    let vars: HashMap<String, String> = entries
        .filter_map(|entry| match entry {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed environment line");
                None
            }
        })
        .collect();
    tracing::debug!(path = %path.display(), count = vars.len(), "loaded environment file");
    vars
}

/// Named API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    Users,
    Courses,
    Profile,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Login,
        Endpoint::Register,
        Endpoint::Users,
        Endpoint::Courses,
        Endpoint::Profile,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/check",
            Endpoint::Register => "/register",
            Endpoint::Users => "/users",
            Endpoint::Courses => "/courses",
            Endpoint::Profile => "/profile",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Login => "LOGIN",
            Endpoint::Register => "REGISTER",
            Endpoint::Users => "USERS",
            Endpoint::Courses => "COURSES",
            Endpoint::Profile => "PROFILE",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Returned when a symbolic endpoint name is not in the map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown endpoint `{0}`")]
pub struct UnknownEndpoint(pub String);

impl FromStr for Endpoint {
    type Err = UnknownEndpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == s)
            .ok_or_else(|| UnknownEndpoint(s.to_string()))
    }
}
