//! Application-level configuration loading, including the gameplay rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LOVESYNC_BACK_CONFIG_PATH";

const DEFAULT_MAX_FAILED_TASKS: u8 = 3;
const DEFAULT_INITIAL_SKIPS: u8 = 3;
const DEFAULT_DRAW_CANDIDATE_LIMIT: usize = 10;
const DEFAULT_EXPIRY_GRACE_MS: u64 = 100;

/// Tunable gameplay thresholds shared by every session.
#[derive(Debug, Clone, Copy)]
pub struct GameRules {
    /// Expired turns a participant may accumulate before losing.
    pub max_failed_tasks: u8,
    /// Skips each participant starts the match with.
    pub initial_skips: u8,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_failed_tasks: DEFAULT_MAX_FAILED_TASKS,
            initial_skips: DEFAULT_INITIAL_SKIPS,
        }
    }
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    rules: GameRules,
    draw_candidate_limit: usize,
    expiry_grace: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Gameplay thresholds applied to every session.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Upper bound on the number of cards fetched per draw.
    pub fn draw_candidate_limit(&self) -> usize {
        self.draw_candidate_limit
    }

    /// Delay between a countdown reaching zero and the expiry signal.
    pub fn expiry_grace(&self) -> Duration {
        self.expiry_grace
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            draw_candidate_limit: DEFAULT_DRAW_CANDIDATE_LIMIT,
            expiry_grace: Duration::from_millis(DEFAULT_EXPIRY_GRACE_MS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file; missing fields keep their defaults.
struct RawConfig {
    max_failed_tasks: Option<u8>,
    initial_skips: Option<u8>,
    draw_candidate_limit: Option<usize>,
    expiry_grace_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            rules: GameRules {
                max_failed_tasks: value
                    .max_failed_tasks
                    .unwrap_or(defaults.rules.max_failed_tasks),
                initial_skips: value.initial_skips.unwrap_or(defaults.rules.initial_skips),
            },
            draw_candidate_limit: value
                .draw_candidate_limit
                .unwrap_or(defaults.draw_candidate_limit),
            expiry_grace: value
                .expiry_grace_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.expiry_grace),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
