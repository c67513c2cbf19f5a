use url::Url;

use crate::routing::RoutingError;

/// 백엔드 오리진 정보를 담는 불변 데이터 구조입니다.
///
/// # 필드
///
/// * `url` - 원본 설정 값을 파싱한 URL
/// * `authority` - 다이얼에 사용할 `host:port` 문자열
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    url: Url,
    authority: String,
}

impl Target {
    /// 설정 문자열에서 `Target`을 생성합니다.
    ///
    /// 절대 URL이어야 하며 호스트가 있어야 합니다. `ws` 스킴은 `http`와
    /// 동일하게 취급합니다.
    ///
    /// # 예제
    ///
    /// ```
    /// use gin_proxy::routing::Target;
    ///
    /// let target = Target::parse("http://localhost:3001/app").unwrap();
    /// assert_eq!(target.authority(), "localhost:3001");
    /// assert_eq!(target.base_path(), "/app");
    ///
    /// assert!(Target::parse("::not a url::").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: String| RoutingError::InvalidTarget {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

        match url.scheme() {
            "http" | "ws" => {}
            other => return Err(invalid(format!("지원하지 않는 스킴: {}", other))),
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("호스트가 없음".to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("포트를 결정할 수 없음".to_string()))?;

        let authority = format!("{}:{}", host, port);
        Ok(Self { url, authority })
    }

    /// 다이얼 및 `Host` 헤더에 사용하는 `host:port`
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn base_path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}
