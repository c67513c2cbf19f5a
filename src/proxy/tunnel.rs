use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use hyper::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use super::ProxyError;
use crate::routing::Target;

/// 상위 요청/응답 추상화에서 분리된 클라이언트 원시 연결입니다.
///
/// `buffered`는 요청 헤드를 분류하는 동안 소켓에서 이미 읽은 바이트이며
/// 터널이 백엔드로 그대로 재전송합니다.
#[derive(Debug)]
pub struct RawTransport {
    stream: TcpStream,
    buffered: Bytes,
}

impl RawTransport {
    pub fn new(stream: TcpStream, buffered: Bytes) -> Self {
        Self { stream, buffered }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// 터널을 열지 않고 일반 텍스트 응답을 직접 쓴 뒤 연결을 닫습니다.
    pub async fn respond(mut self, status: StatusCode, body: &str) -> io::Result<()> {
        let head = encode_response_head(status, body.len())?;
        self.stream.write_all(&head).await?;
        self.stream.write_all(body.as_bytes()).await?;
        self.stream.shutdown().await
    }
}

/// 원시 연결에 쓸 HTTP/1.1 응답 헤드를 만듭니다.
fn encode_response_head(status: StatusCode, content_length: usize) -> io::Result<Vec<u8>> {
    let response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, content_length)
        .header(CONNECTION, "close")
        .body(())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut head = Vec::with_capacity(128);
    head.extend_from_slice(b"HTTP/1.1 ");
    head.extend_from_slice(response.status().as_str().as_bytes());
    head.push(b' ');
    head.extend_from_slice(response.status().canonical_reason().unwrap_or("").as_bytes());
    head.extend_from_slice(b"\r\n");
    for (name, value) in response.headers() {
        head.extend_from_slice(name.as_str().as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    head.extend_from_slice(b"\r\n");
    Ok(head)
}

/// 터널에서 먼저 닫힌 쪽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Backend,
}

/// 먼저 종료된 복사 작업의 결과입니다. 나머지 쪽의 결과는 버립니다.
#[derive(Debug)]
pub struct TunnelOutcome {
    pub first_closed: Side,
    pub bytes: u64,
    pub error: Option<io::Error>,
}

/// 대상 오리진에 새 TCP 연결을 엽니다. 재시도하지 않습니다.
pub async fn dial(target: &Target) -> Result<TcpStream, ProxyError> {
    TcpStream::connect(target.authority())
        .await
        .map_err(|error| ProxyError::Dial {
            target: target.authority().to_string(),
            error,
        })
}

/// 원본 요청 바이트를 백엔드로 재전송한 뒤 양방향으로 바이트를 복사합니다.
///
/// 어느 한쪽 복사가 끝나면(EOF 또는 에러) 터널이 종료되고 두 연결 모두
/// 닫힙니다.
#[instrument(skip_all, fields(client = ?client.peer_addr().ok(), backend = ?backend.peer_addr().ok()))]
pub async fn run_tunnel(client: RawTransport, mut backend: TcpStream) -> Result<TunnelOutcome, ProxyError> {
    let RawTransport { stream: client, buffered } = client;

    backend.write_all(&buffered).await?;
    debug!(bytes = buffered.len(), "원본 요청을 백엔드로 재전송");

    let (mut client_read, mut client_write) = client.into_split();
    let (mut backend_read, mut backend_write) = backend.into_split();

    let mut upstream = tokio::spawn(async move {
        tokio::io::copy(&mut client_read, &mut backend_write).await
    });
    let mut downstream = tokio::spawn(async move {
        tokio::io::copy(&mut backend_read, &mut client_write).await
    });

    let (first_closed, joined) = tokio::select! {
        res = &mut upstream => (Side::Client, res),
        res = &mut downstream => (Side::Backend, res),
    };

    // 남은 복사 작업을 중단하고 소켓 반쪽이 해제될 때까지 기다림
    let remaining = match first_closed {
        Side::Client => downstream,
        Side::Backend => upstream,
    };
    remaining.abort();
    let _ = remaining.await;

    let outcome = match joined {
        Ok(Ok(bytes)) => TunnelOutcome { first_closed, bytes, error: None },
        Ok(Err(e)) => TunnelOutcome { first_closed, bytes: 0, error: Some(e) },
        Err(e) => TunnelOutcome {
            first_closed,
            bytes: 0,
            error: Some(io::Error::new(io::ErrorKind::Other, e.to_string())),
        },
    };

    debug!(
        first_closed = ?outcome.first_closed,
        bytes = outcome.bytes,
        error = ?outcome.error,
        "터널 종료"
    );
    Ok(outcome)
}
