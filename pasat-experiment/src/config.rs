use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_NUMBERS_PER_TRIAL: usize = 2;
pub const MIN_INTERVAL_SECS: u64 = 2;
pub const MIN_PAIRS_IN_DEMO: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: u64,
        value: u64,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Interface language. It picks the audio directory and the digit script, never the scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fa,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fa => "fa",
        }
    }

    pub fn asset_dir(&self, root: &Path) -> PathBuf {
        root.join(self.code())
    }

    /// Rewrites ASCII digits in the script of this language.
    pub fn localize_digits(&self, text: &str) -> String {
        match self {
            Language::En => text.to_owned(),
            Language::Fa => text
                .chars()
                .map(|c| match c {
                    '0' => '۰',
                    '1' => '١',
                    '2' => '٢',
                    '3' => '۳',
                    '4' => '۴',
                    '5' => '۵',
                    '6' => '۶',
                    '7' => '۷',
                    '8' => '۸',
                    '9' => '۹',
                    other => other,
                })
                .collect(),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fa" => Ok(Language::Fa),
            other => Err(format!("unsupported language `{other}` (expected en or fa)")),
        }
    }
}

/// Settings read once at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub numbers_per_trial: usize,
    pub interval_secs: u64,
    pub pairs_in_demo: usize,
    pub show_timer: bool,
    pub show_demo: bool,
    pub language: Language,
    /// Step of the pause-aware wait loops.
    pub poll_granularity_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            numbers_per_trial: 10,
            interval_secs: 3,
            pairs_in_demo: 2,
            show_timer: true,
            show_demo: true,
            language: Language::En,
            poll_granularity_ms: 10,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("numbers_per_trial", MIN_NUMBERS_PER_TRIAL as u64, self.numbers_per_trial as u64)?;
        check("interval_secs", MIN_INTERVAL_SECS, self.interval_secs)?;
        check("pairs_in_demo", MIN_PAIRS_IN_DEMO as u64, self.pairs_in_demo as u64)?;
        check("poll_granularity_ms", 1, self.poll_granularity_ms)?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn granularity(&self) -> Duration {
        Duration::from_millis(self.poll_granularity_ms)
    }

    pub fn trial_length(&self) -> Duration {
        self.interval() * self.numbers_per_trial as u32
    }

    pub fn demo_length(&self) -> Duration {
        self.interval() * self.pairs_in_demo as u32
    }
}

fn check(field: &'static str, min: u64, value: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::BelowMinimum { field, min, value });
    }
    Ok(())
}
