use serde::Deserialize;
use std::env;
use super::SettingsError;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    /// 수신 포트 (기본값: 3000)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 { 3000 }

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            port: parse_env_var("PROXY_PORT", default_port)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.port == 0 {
            return Err(SettingsError::EnvVarInvalid {
                var_name: "PROXY_PORT".to_string(),
                value: self.port.to_string(),
                reason: "포트는 0이 될 수 없습니다".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: default_port() }
    }
}
