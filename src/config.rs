use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::simulator::RunSettings;

const DEFAULT_REPETITIONS: usize = 20;
const DEFAULT_MAX_STEPS: usize = 500;
const DEFAULT_MAX_TIME: f64 = 5.0;
const DEFAULT_TIMEBOXES: usize = 50;
const DEFAULT_OUTPUT: &str = "runs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of a repeated experiment, read from a TOML file. Every field may be omitted.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,

    /// Most transitions fired per run, or `"unlimited"`.
    #[serde(default = "default_max_steps", deserialize_with = "deserialize_max_steps")]
    pub max_steps: Option<usize>,

    #[serde(default = "default_max_time")]
    pub max_time: f64,

    /// Seed of the first repetition; the others derive their own from it.
    #[serde(default)]
    pub seed: u64,

    /// Number of timeboxes of the summary.
    #[serde(default = "default_timeboxes")]
    pub timeboxes: usize,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_repetitions() -> usize {
    DEFAULT_REPETITIONS
}

fn default_max_steps() -> Option<usize> {
    Some(DEFAULT_MAX_STEPS)
}

fn deserialize_max_steps<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StepLimit {
        Count(usize),
        Keyword(String),
    }

    match StepLimit::deserialize(deserializer)? {
        StepLimit::Count(count) => Ok(Some(count)),
        StepLimit::Keyword(keyword) if keyword == "unlimited" => Ok(None),
        StepLimit::Keyword(keyword) => Err(serde::de::Error::custom(format!(
            "expected a step count or \"unlimited\", found \"{}\"",
            keyword
        ))),
    }
}

fn default_max_time() -> f64 {
    DEFAULT_MAX_TIME
}

fn default_timeboxes() -> usize {
    DEFAULT_TIMEBOXES
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            repetitions: default_repetitions(),
            max_steps: default_max_steps(),
            max_time: default_max_time(),
            seed: 0,
            timeboxes: default_timeboxes(),
            output: default_output(),
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            max_steps: self.max_steps,
            max_time: self.max_time,
        }
    }
}
