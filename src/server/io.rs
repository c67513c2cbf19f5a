use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::Uri;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

/// 요청 헤드 최대 크기 (64 KiB)
pub const MAX_HEAD_SIZE: usize = 64 * 1024;
const MAX_HEADERS: usize = 100;

/// 분류와 라우팅에 필요한 요청 헤드 정보
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
}

#[derive(Debug)]
pub enum HeadError {
    Io(io::Error),
    Malformed(String),
    TooLarge,
}

impl std::fmt::Display for HeadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadError::Io(e) => write!(f, "요청 헤드 읽기 실패: {}", e),
            HeadError::Malformed(reason) => write!(f, "잘못된 요청 헤드: {}", reason),
            HeadError::TooLarge => write!(f, "요청 헤드가 {} 바이트를 초과함", MAX_HEAD_SIZE),
        }
    }
}

impl std::error::Error for HeadError {}

/// 첫 요청 헤드가 완성될 때까지 읽습니다.
///
/// 읽은 바이트는 모두 `buf`에 남아 있어 이후 그대로 재전송할 수 있습니다.
/// 아무것도 보내지 않고 닫힌 연결은 `Ok(None)`을 반환합니다.
pub async fn read_request_head<R>(stream: &mut R, buf: &mut BytesMut) -> Result<Option<RequestHead>, HeadError>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Some(head) = parse_head(buf)? {
            return Ok(Some(head));
        }
        if buf.len() >= MAX_HEAD_SIZE {
            return Err(HeadError::TooLarge);
        }

        buf.reserve(4096);
        let n = stream.read_buf(buf).await.map_err(HeadError::Io)?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(HeadError::Io(io::ErrorKind::UnexpectedEof.into()));
        }
    }
}

fn parse_head(buf: &[u8]) -> Result<Option<RequestHead>, HeadError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    match req.parse(buf) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(HeadError::Malformed(e.to_string())),
    }

    let target = req.path.unwrap_or("/");
    let uri: Uri = target
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| HeadError::Malformed(e.to_string()))?;

    let mut map = HeaderMap::with_capacity(req.headers.len());
    for header in req.headers.iter() {
        // 표현할 수 없는 헤더는 분류에 영향이 없으므로 건너뜀
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(header.name.as_bytes()),
            HeaderValue::from_bytes(header.value),
        ) {
            map.append(name, value);
        }
    }

    Ok(Some(RequestHead {
        method: req.method.unwrap_or_default().to_string(),
        path: decode_path(uri.path()),
        headers: map,
    }))
}

/// 라우팅에 사용할 수 있도록 퍼센트 인코딩된 경로를 디코딩합니다.
///
/// UTF-8로 디코딩할 수 없으면 원래 경로를 그대로 돌려줍니다.
pub fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// 이미 읽은 바이트를 먼저 돌려준 뒤 내부 스트림에서 읽는 래퍼입니다.
#[derive(Debug)]
pub struct PrefixedStream<S> {
    prefix: Bytes,
    inner: S,
}

impl<S> PrefixedStream<S> {
    pub fn new(prefix: Bytes, inner: S) -> Self {
        Self { prefix, inner }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PrefixedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.prefix.is_empty() {
            let n = self.prefix.len().min(buf.remaining());
            buf.put_slice(&self.prefix[..n]);
            self.prefix.advance(n);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PrefixedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::UPGRADE;

    #[tokio::test]
    async fn test_reads_complete_head_in_pieces() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let raw = b"GET /ws/chat?room=1 HTTP/1.1\r\nHost: localhost\r\nUpgrade: websocket\r\n\r\nextra";

        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            for chunk in raw.chunks(7) {
                client.write_all(chunk).await.unwrap();
            }
            client
        });

        let mut buf = BytesMut::new();
        let head = read_request_head(&mut server, &mut buf).await.unwrap().unwrap();
        let _client = writer.await.unwrap();

        assert_eq!(head.method, "GET");
        assert_eq!(head.path, "/ws/chat");
        assert_eq!(head.headers[UPGRADE], "websocket");
        assert!(buf.starts_with(b"GET /ws/chat?room=1 HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_head_path_is_decoded() {
        let mut input: &[u8] = b"GET /%61pi/hello%20world?q=%61 HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let mut buf = BytesMut::new();
        let head = read_request_head(&mut input, &mut buf).await.unwrap().unwrap();

        assert_eq!(head.path, "/api/hello world");
        // 재전송할 원본 바이트는 그대로 유지
        assert!(buf.starts_with(b"GET /%61pi/hello%20world?q=%61 "));
    }

    #[test]
    fn test_decode_path_keeps_invalid_utf8() {
        assert_eq!(decode_path("/%61pi"), "/api");
        assert_eq!(decode_path("/plain"), "/plain");
        assert_eq!(decode_path("/bad%FF"), "/bad%FF");
    }

    #[tokio::test]
    async fn test_closed_without_request() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);

        let mut buf = BytesMut::new();
        assert!(read_request_head(&mut server, &mut buf).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_head() {
        let mut input: &[u8] = b"NOT AN HTTP REQUEST\r\n\r\n";
        let mut buf = BytesMut::new();
        let result = read_request_head(&mut input, &mut buf).await;
        assert!(matches!(result, Err(HeadError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_head_too_large() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_HEAD_SIZE));
        let mut input: &[u8] = &raw;

        let mut buf = BytesMut::new();
        let result = read_request_head(&mut input, &mut buf).await;
        assert!(matches!(result, Err(HeadError::TooLarge)));
    }

    #[tokio::test]
    async fn test_prefixed_stream_replays_prefix() {
        let mut stream = PrefixedStream::new(Bytes::from_static(b"hello "), &b"world"[..]);
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }
}
