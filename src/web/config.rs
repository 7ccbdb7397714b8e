use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::orbit::{TrackWindow, MAX_TRACK_STEPS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub sources: SourcesConfig,
    pub broadcast: BroadcastConfig,
    pub track: TrackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_position_url")]
    pub position_url: String,
    #[serde(default = "default_elements_url")]
    pub elements_url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            position_url: default_position_url(),
            elements_url: default_elements_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_position_url() -> String {
    "https://api.wheretheiss.at/v1/satellites/25544".to_string()
}

fn default_elements_url() -> String {
    "https://celestrak.org/NORAD/elements/gp.php?CATNR=25544&FORMAT=tle".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default = "default_interval", deserialize_with = "deserialize_duration")]
    pub interval: Duration,
    #[serde(
        default = "default_elements_refresh",
        deserialize_with = "deserialize_duration"
    )]
    pub elements_refresh: Duration,
    #[serde(default = "default_crew_count")]
    pub crew_count: u32,
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    #[serde(default = "default_send_timeout", deserialize_with = "deserialize_duration")]
    pub send_timeout: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            elements_refresh: default_elements_refresh(),
            crew_count: default_crew_count(),
            subscriber_buffer: default_subscriber_buffer(),
            send_timeout: default_send_timeout(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_elements_refresh() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

fn default_crew_count() -> u32 {
    7
}

fn default_subscriber_buffer() -> usize {
    16
}

fn default_send_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackConfig {
    #[serde(default = "default_track_steps")]
    pub steps: u32,
    #[serde(default = "default_track_step", deserialize_with = "deserialize_duration")]
    pub step: Duration,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            steps: default_track_steps(),
            step: default_track_step(),
        }
    }
}

fn default_track_steps() -> u32 {
    90
}

fn default_track_step() -> Duration {
    Duration::from_secs(60)
}

impl TrackConfig {
    pub fn window(&self) -> Result<TrackWindow, ConfigError> {
        if self.steps > MAX_TRACK_STEPS {
            return Err(ConfigError::Invalid(format!(
                "track.steps must be at most {}, got {}",
                MAX_TRACK_STEPS, self.steps
            )));
        }
        if self.step.is_zero() {
            return Err(ConfigError::Invalid("track.step must be non-zero".into()));
        }
        let step = chrono::Duration::from_std(self.step).map_err(|_| {
            ConfigError::Invalid(format!("track.step out of range: {:?}", self.step))
        })?;
        if step > chrono::Duration::days(1) {
            return Err(ConfigError::Invalid(format!(
                "track.step must be at most 1 day, got {:?}",
                self.step
            )));
        }
        Ok(TrackWindow {
            steps: self.steps,
            step,
        })
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive the relay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("broadcast.interval", self.broadcast.interval),
            ("broadcast.elements_refresh", self.broadcast.elements_refresh),
            ("broadcast.send_timeout", self.broadcast.send_timeout),
            ("sources.timeout", self.sources.timeout),
        ];
        for (name, value) in periods {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }
        if self.broadcast.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(
                "broadcast.subscriber_buffer must be at least 1".into(),
            ));
        }
        self.track.window()?;
        Ok(())
    }
}
