use std::{collections::BTreeMap, env, path::Path};
use serde::Deserialize;
use tracing::debug;

use crate::routing::Target;

mod server;
pub mod logging;
mod error;

pub use server::ServerSettings;
pub use logging::LogSettings;
pub use error::SettingsError;

pub type Result<T> = std::result::Result<T, SettingsError>;
pub use server::parse_env_var;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    /// 경로 접두사 -> 백엔드 URL
    #[serde(default)]
    pub routes: BTreeMap<String, String>,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,
}

impl Settings {
    /// `PROXY_CONFIG_FILE`이 있으면 TOML 파일에서, 없으면 환경 변수에서 읽습니다.
    pub async fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("PROXY_CONFIG_FILE") {
            Self::from_toml_file(&config_path).await
        } else {
            Self::from_env()
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        debug!(path = %path.as_ref().display(), "설정 파일 로드");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        settings.validate()?;
        Ok(settings)
    }

    /// 환경 변수에서 설정을 읽습니다.
    ///
    /// `PROXY_ROUTES`는 `/prefix=http://host:port` 항목을 쉼표로 구분한 목록입니다.
    pub fn from_env() -> Result<Self> {
        let routes = match env::var("PROXY_ROUTES") {
            Ok(raw) => parse_routes(&raw)?,
            Err(_) => return Err(SettingsError::EnvVarMissing {
                var_name: "PROXY_ROUTES".to_string(),
            }),
        };

        let settings = Self {
            server: ServerSettings::from_env()?,
            routes,
            logging: LogSettings::from_env()?,
        };

        // 설정 생성 시점에 바로 검증
        settings.validate()?;
        Ok(settings)
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        if self.routes.is_empty() {
            return Err(SettingsError::NoRoutes);
        }

        for (prefix, url) in &self.routes {
            if prefix.is_empty() {
                return Err(SettingsError::InvalidRoute {
                    prefix: prefix.clone(),
                    reason: "빈 접두사".to_string(),
                });
            }
            Target::parse(url).map_err(|e| SettingsError::InvalidRoute {
                prefix: prefix.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

fn parse_routes(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut routes = BTreeMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (prefix, url) = entry.split_once('=').ok_or_else(|| SettingsError::EnvVarInvalid {
            var_name: "PROXY_ROUTES".to_string(),
            value: entry.to_string(),
            reason: "'접두사=URL' 형식이어야 합니다".to_string(),
        })?;
        routes.insert(prefix.trim().to_string(), url.trim().to_string());
    }

    Ok(routes)
}
