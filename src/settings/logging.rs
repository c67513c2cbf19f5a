use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use tracing::Level;
use super::{server::parse_env_var, SettingsError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 로그 출력 대상. `stdout`이 아니면 파일 경로로 취급합니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogOutput {
    #[default]
    Stdout,
    File(String),
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("stdout") {
            Ok(LogOutput::Stdout)
        } else {
            Ok(LogOutput::File(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for LogOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_level", deserialize_with = "deserialize_level")]
    pub level: Level,
    #[serde(default)]
    pub output: LogOutput,
}

impl LogSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            format: parse_env_var("PROXY_LOG_FORMAT", LogFormat::default)?,
            level: parse_env_var("PROXY_LOG_LEVEL", default_level)?,
            output: parse_env_var("PROXY_LOG_OUTPUT", LogOutput::default)?,
        })
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
            output: LogOutput::default(),
        }
    }
}

fn default_level() -> Level {
    Level::INFO
}

fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(|_| serde::de::Error::custom(format!("유효하지 않은 로그 레벨: {}", raw)))
}
