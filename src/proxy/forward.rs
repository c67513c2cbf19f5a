use std::net::SocketAddr;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Request, Response, Uri};
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, instrument};

use super::{ProxyBody, ProxyError};
use crate::routing::Target;

/// 요청/응답 사이에서 전달하지 않는 hop-by-hop 헤더
const HOP_HEADERS: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// 일반 요청을 백엔드로 전달하는 리버스 프록시입니다.
///
/// 모든 요청이 하나의 커넥션 풀을 공유합니다.
#[derive(Clone)]
pub struct Forwarder {
    client: legacy::Client<HttpConnector, Incoming>,
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Forwarder {
    pub fn new() -> Self {
        let connector = HttpConnector::new();
        let client = legacy::Client::builder(TokioExecutor::new())
            .build::<_, Incoming>(connector);

        Self { client }
    }

    /// 요청을 대상 오리진으로 보내고 응답을 그대로 스트리밍합니다.
    ///
    /// 연결 실패는 재시도하지 않고 `ProxyError::Backend`로 반환합니다.
    #[instrument(skip(self, target, req), fields(target = %target))]
    pub async fn forward(
        &self,
        target: &Target,
        req: Request<Incoming>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<ProxyBody>, ProxyError> {
        let proxied_req = build_forward_request(target, req, client_addr)?;
        debug!(uri = %proxied_req.uri(), "백엔드로 요청 전달");

        let res = self.client.request(proxied_req).await?;
        debug!(status = %res.status(), "백엔드 응답 수신");

        let (mut parts, body) = res.into_parts();
        remove_hop_headers(&mut parts.headers);
        Ok(Response::from_parts(parts, body.boxed()))
    }
}

/// 원본 요청을 대상 오리진용 요청으로 다시 씁니다.
///
/// 메서드, 헤더, 본문은 유지하고 URI와 `Host`만 대상 기준으로 바꾸며
/// hop-by-hop 헤더를 제거하고 `X-Forwarded-*` 헤더를 추가합니다.
pub fn build_forward_request<B>(
    target: &Target,
    req: Request<B>,
    client_addr: Option<SocketAddr>,
) -> Result<Request<B>, ProxyError> {
    let (mut parts, body) = req.into_parts();

    let path = join_paths(target.base_path(), parts.uri.path());
    let query = merge_queries(target.query(), parts.uri.query());
    let uri: Uri = match query {
        Some(q) => format!("http://{}{}?{}", target.authority(), path, q),
        None => format!("http://{}{}", target.authority(), path),
    }
    .parse()
    .map_err(hyper::http::Error::from)?;

    let original_host = parts.headers.get(header::HOST).cloned();

    remove_hop_headers(&mut parts.headers);

    if let Some(addr) = client_addr {
        let ip = addr.ip().to_string();
        let forwarded_for = match parts.headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{}, {}", prior, ip),
            None => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            parts.headers.insert(X_FORWARDED_FOR, value);
        }
    }
    if let Some(host) = original_host {
        parts.headers.insert(X_FORWARDED_HOST, host);
    }
    parts.headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

    let host = HeaderValue::from_str(target.authority()).map_err(hyper::http::Error::from)?;
    parts.headers.insert(header::HOST, host);

    parts.uri = uri;
    Ok(Request::from_parts(parts, body))
}

fn remove_hop_headers(headers: &mut HeaderMap) {
    // Connection 헤더에 나열된 헤더도 hop-by-hop
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_HEADERS.iter()) {
        headers.remove(name);
    }
}

/// 두 경로를 슬래시 하나로 연결합니다.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn merge_queries(target: Option<&str>, request: Option<&str>) -> Option<String> {
    match (target.filter(|q| !q.is_empty()), request.filter(|q| !q.is_empty())) {
        (Some(t), Some(r)) => Some(format!("{}&{}", t, r)),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    }
}
