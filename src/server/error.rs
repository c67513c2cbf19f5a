use crate::routing::RoutingError;
use crate::settings::SettingsError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    RoutingError(RoutingError),
    SettingsError(SettingsError),
    IoError(std::io::Error),
    AlreadyRunning,
    NotRunning,
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<RoutingError> for Error {
    fn from(err: RoutingError) -> Self {
        Error::RoutingError(err)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Error::SettingsError(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(Box::new(err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RoutingError(e) => write!(f, "Routing Error: {}", e),
            Error::SettingsError(e) => write!(f, "Settings Error: {}", e),
            Error::IoError(e) => write!(f, "IO Error: {}", e),
            Error::AlreadyRunning => write!(f, "프록시가 이미 실행 중입니다"),
            Error::NotRunning => write!(f, "프록시가 실행 중이 아닙니다"),
            Error::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::RoutingError(e) => Some(e),
            Error::SettingsError(e) => Some(e),
            Error::IoError(e) => Some(e),
            Error::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
