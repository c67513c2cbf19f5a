use hyper::header::{HeaderMap, HeaderName, ACCEPT, UPGRADE};

/// 요청을 어떤 경로로 처리할지에 대한 분류 결과입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 일반 리버스 프록시 전달
    Forward,
    /// 원시 양방향 바이트 터널 (WebSocket, SSE)
    Tunnel,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Forward => "forward",
            Classification::Tunnel => "tunnel",
        }
    }
}

/// `Upgrade: websocket` 또는 `Accept: text/event-stream` 이면 터널로 분류합니다.
///
/// 두 헤더 모두 대소문자를 구분하지 않으며 첫 번째 값만 검사합니다.
///
/// # 예제
///
/// ```
/// use gin_proxy::proxy::{classify, Classification};
/// use hyper::header::{HeaderMap, HeaderValue, UPGRADE};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(UPGRADE, HeaderValue::from_static("WebSocket"));
/// assert_eq!(classify(&headers), Classification::Tunnel);
/// ```
pub fn classify(headers: &HeaderMap) -> Classification {
    let header_is = |name: HeaderName, expected: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.trim().eq_ignore_ascii_case(expected))
    };

    if header_is(UPGRADE, "websocket") || header_is(ACCEPT, "text/event-stream") {
        Classification::Tunnel
    } else {
        Classification::Forward
    }
}
