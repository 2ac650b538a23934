//! Application-level configuration loading: jackpot economy, answer deadlines and storage location.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::jackpot::JackpotSettings;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ARENA_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Jackpot economy applied to every new match.
    pub jackpot: JackpotSettings,
    /// Seconds added to a question's response time before it is force-advanced.
    pub answer_grace_secs: u64,
    /// Whether unanswered questions are force-advanced at all.
    pub question_deadline: bool,
    /// Size of the match id space.
    pub max_matches: u32,
    /// Directory holding the JSON record files.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        max_matches = config.max_matches,
                        data_dir = %config.data_dir.display(),
                        "loaded configuration"
                    );
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

    fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }

    /// Time a question stays open before the match moves on without the missing answers.
    ///
    /// `None` when deadlines are disabled.
    pub fn question_deadline(&self, response_time_secs: u64) -> Option<Duration> {
        self.question_deadline.then(|| {
            Duration::from_secs(response_time_secs.saturating_add(self.answer_grace_secs))
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jackpot: JackpotSettings::default(),
            answer_grace_secs: 5,
            question_deadline: true,
            max_matches: 1000,
            data_dir: PathBuf::from("data"),
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
