//! 백엔드로 요청을 전달하는 두 가지 경로(일반 HTTP 전달, 원시 터널)를 제공합니다.

mod classify;
mod error;
mod forward;
mod tunnel;

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};

pub use classify::{classify, Classification};
pub use error::{error_response, ProxyError};
pub use forward::{build_forward_request, Forwarder};
pub use tunnel::{dial, run_tunnel, RawTransport, Side, TunnelOutcome};

/// 프록시가 클라이언트에게 돌려주는 응답 본문 타입
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// 고정 텍스트 본문을 만듭니다.
pub fn full<T: Into<Bytes>>(chunk: T) -> ProxyBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}
