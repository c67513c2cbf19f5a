use std::fmt;

/// 라우팅 관련 에러를 표현하는 열거형입니다.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// 백엔드 URL 파싱 실패
    InvalidTarget {
        url: String,
        reason: String,
    },
    /// 빈 접두사
    InvalidPrefix {
        prefix: String,
    },
    /// 매칭되는 라우트 없음
    NotFound {
        path: String,
    },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidTarget { url, reason } =>
                write!(f, "유효하지 않은 백엔드 URL {}: {}", url, reason),
            RoutingError::InvalidPrefix { prefix } =>
                write!(f, "유효하지 않은 라우트 접두사: {:?}", prefix),
            RoutingError::NotFound { path } =>
                write!(f, "이 URL과 매칭되는 프록시가 없습니다 ({})", path),
        }
    }
}

impl std::error::Error for RoutingError {}
