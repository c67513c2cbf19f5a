use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::BytesMut;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::gate::{GateRejection, Gates};
use super::io::{decode_path, read_request_head, HeadError, PrefixedStream, RequestHead};
use crate::logging::{log_request, RequestLog};
use crate::proxy::{
    self, classify, error_response, Classification, Forwarder, ProxyBody, ProxyError, RawTransport,
};
use crate::routing::{Route, RouteTable};

/// 게이트나 라우팅 단계에서 요청을 거절할 때의 응답 내용
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub status: StatusCode,
    pub body: String,
}

impl Rejection {
    pub fn into_response(self) -> Response<ProxyBody> {
        Response::builder()
            .status(self.status)
            .header(hyper::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(proxy::full(self.body))
            .unwrap_or_else(|e| {
                error!(error = %e, "거절 응답 생성 실패");
                Response::new(proxy::full("Internal Server Error"))
            })
    }
}

pub struct RequestHandler {
    routing_table: Arc<RouteTable>,
    gates: Gates,
    forwarder: Forwarder,
}

impl RequestHandler {
    pub fn new(routing_table: Arc<RouteTable>, gates: Gates) -> Self {
        Self {
            routing_table,
            gates,
            forwarder: Forwarder::new(),
        }
    }

    /// 게이트를 통과한 뒤 경로에 해당하는 라우트를 찾습니다.
    ///
    /// 빌드 에러와 라우팅 실패는 상태 코드 200에 본문 텍스트로만 전달합니다.
    pub async fn admit(&self, path: &str) -> Result<&Route, Rejection> {
        match self.gates.check().await {
            Ok(()) => {}
            Err(GateRejection::BuildErrors(text)) => {
                return Err(Rejection { status: StatusCode::OK, body: text });
            }
            Err(GateRejection::Failed(reason)) => {
                error!(reason = %reason, "게이트 확인 실패");
                return Err(Rejection {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "Internal Server Error".to_string(),
                });
            }
        }

        self.routing_table.resolve(path).map_err(|e| Rejection {
            status: StatusCode::OK,
            body: e.to_string(),
        })
    }

    /// 수락된 연결의 첫 요청 헤드를 읽어 터널 또는 HTTP 전달로 보냅니다.
    pub async fn handle_connection(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut buf = BytesMut::with_capacity(4096);
        let head = match read_request_head(&mut stream, &mut buf).await {
            Ok(Some(head)) => head,
            Ok(None) => {
                debug!(peer = %peer, "요청 없이 연결 종료");
                return Ok(());
            }
            Err(HeadError::Io(e)) => return Err(e.into()),
            Err(e) => {
                warn!(peer = %peer, error = %e, "요청 헤드 거절");
                let status = match e {
                    HeadError::TooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                let reason = status.canonical_reason().unwrap_or_default();
                RawTransport::new(stream, buf.freeze()).respond(status, reason).await?;
                return Ok(());
            }
        };

        let buffered = buf.freeze();
        match classify(&head.headers) {
            Classification::Tunnel => {
                self.handle_tunnel(head, RawTransport::new(stream, buffered)).await;
                Ok(())
            }
            Classification::Forward => {
                // 한 연결에서 한 요청만 처리해 모든 요청 헤드가 분류를 거치도록 함
                let io = TokioIo::new(PrefixedStream::new(buffered, stream));
                http1::Builder::new()
                    .keep_alive(false)
                    .serve_connection(io, service_fn(|req| self.handle_request(req, peer)))
                    .await
                    .map_err(|e| e.into())
            }
        }
    }

    /// 일반 요청 경로: 게이트, 라우팅 후 백엔드로 전달합니다.
    pub async fn handle_request(
        &self,
        req: Request<Incoming>,
        peer: SocketAddr,
    ) -> Result<Response<ProxyBody>, Infallible> {
        let start_time = Instant::now();
        let mut log = RequestLog::new(Uuid::new_v4().to_string());
        log.with_request(&req);

        let response = match self.admit(&decode_path(req.uri().path())).await {
            Err(rejection) => {
                log.with_mode("rejected");
                rejection.into_response()
            }
            Ok(route) => {
                let classification = classify(req.headers());
                log.with_mode(classification.as_str());
                log.with_target(&route.target);
                if classification == Classification::Tunnel {
                    // handle_connection은 Forward로 분류된 헤드만 hyper에 넘기므로 이 분기는
                    // handle_request를 hyper 연결에서 직접 쓸 때만 도달함. 원시 연결은 이미 hyper 소유
                    let err = ProxyError::NotHijackable;
                    log.with_error(&err);
                    error_response(&err)
                } else {
                    match self.forwarder.forward(&route.target, req, Some(peer)).await {
                        Ok(response) => response,
                        Err(e) => {
                            log.with_error(&e);
                            error_response(&e)
                        }
                    }
                }
            }
        };

        log.with_response(response.status());
        log.duration_ms = start_time.elapsed().as_millis() as u64;
        log_request(&log);

        Ok(response)
    }

    /// 업그레이드 요청 경로: 원시 연결의 소유권을 터널로 넘깁니다.
    async fn handle_tunnel(&self, head: RequestHead, transport: RawTransport) {
        let start_time = Instant::now();
        let mut log = RequestLog::new(Uuid::new_v4().to_string());
        log.with_mode(Classification::Tunnel.as_str());
        log.with_parts(&head.method, &head.path, &head.headers);

        match self.open_tunnel(&head, transport, &mut log).await {
            Ok(status) => log.with_response(status),
            Err(e) => log.with_error(&e),
        }

        log.duration_ms = start_time.elapsed().as_millis() as u64;
        log_request(&log);
    }

    async fn open_tunnel(
        &self,
        head: &RequestHead,
        transport: RawTransport,
        log: &mut RequestLog,
    ) -> Result<StatusCode, ProxyError> {
        let route = match self.admit(&head.path).await {
            Ok(route) => route,
            Err(rejection) => {
                log.with_mode("rejected");
                transport.respond(rejection.status, &rejection.body).await?;
                return Ok(rejection.status);
            }
        };
        log.with_target(&route.target);

        let backend = match proxy::dial(&route.target).await {
            Ok(backend) => backend,
            Err(e) => {
                if let Err(write_err) = transport.respond(e.status(), e.public_message()).await {
                    debug!(error = %write_err, "에러 응답 전송 실패");
                }
                return Err(e);
            }
        };

        let outcome = proxy::run_tunnel(transport, backend).await?;
        if let Some(e) = &outcome.error {
            // 복사 에러는 연결 종료로만 드러남
            debug!(error = %e, first_closed = ?outcome.first_closed, "터널 복사 중 에러");
        }
        Ok(StatusCode::SWITCHING_PROTOCOLS)
    }
}
