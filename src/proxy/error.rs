use std::fmt;

use hyper::{Response, StatusCode};
use tracing::error;

use super::{full, ProxyBody};

/// 백엔드 전달 중 발생하는 에러입니다.
#[derive(Debug)]
pub enum ProxyError {
    /// 백엔드 TCP 연결 실패
    Dial {
        target: String,
        error: std::io::Error,
    },
    /// 클라이언트 전송 계층을 원시 I/O용으로 가져올 수 없음
    NotHijackable,
    /// 전달 요청 생성 실패
    Request(hyper::http::Error),
    /// 백엔드 요청 실패
    Backend(hyper_util::client::legacy::Error),
    Io(std::io::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Dial { .. } | ProxyError::NotHijackable | ProxyError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Request(_) => StatusCode::BAD_REQUEST,
            ProxyError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// 클라이언트에게 보여줄 본문
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::Dial { .. } => "Error contacting backend server.",
            ProxyError::NotHijackable => "Connection cannot be upgraded.",
            ProxyError::Request(_) => "Bad Request",
            ProxyError::Backend(_) => "Bad Gateway",
            ProxyError::Io(_) => "Internal Server Error",
        }
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Dial { target, error } => write!(f, "백엔드 {} 연결 실패: {}", target, error),
            ProxyError::NotHijackable => write!(f, "원시 연결을 가져올 수 없음"),
            ProxyError::Request(e) => write!(f, "전달 요청 생성 실패: {}", e),
            ProxyError::Backend(e) => write!(f, "백엔드 요청 실패: {}", e),
            ProxyError::Io(e) => write!(f, "I/O 에러: {}", e),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Dial { error, .. } => Some(error),
            ProxyError::Request(e) => Some(e),
            ProxyError::Backend(e) => Some(e),
            ProxyError::Io(e) => Some(e),
            ProxyError::NotHijackable => None,
        }
    }
}

impl From<hyper::http::Error> for ProxyError {
    fn from(err: hyper::http::Error) -> Self {
        ProxyError::Request(err)
    }
}

impl From<hyper_util::client::legacy::Error> for ProxyError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        ProxyError::Backend(err)
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(err)
    }
}

/// 에러를 일반 텍스트 응답으로 변환합니다.
pub fn error_response(err: &ProxyError) -> Response<ProxyBody> {
    Response::builder()
        .status(err.status())
        .header(hyper::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full(err.public_message()))
        .unwrap_or_else(|e| {
            error!(error = %e, "에러 응답 생성 실패");
            Response::new(full("Internal Server Error"))
        })
}
