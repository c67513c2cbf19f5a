use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info};
use super::handler::RequestHandler;
use super::Result;

pub struct ServerListener {
    http_listener: TcpListener,
}

impl ServerListener {
    pub async fn bind(port: u16) -> Result<Self> {
        let http_listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| {
                error!(error = %e, port, "HTTP 포트 바인딩 실패");
                e
            })?;

        info!(addr = ?http_listener.local_addr().ok(), "HTTP 리스너 시작");
        Ok(Self { http_listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.http_listener.local_addr()?)
    }

    /// 종료 신호를 받거나 송신 측이 사라질 때까지 연결을 수락합니다.
    ///
    /// 반환 시점에 리스너 소켓이 닫힙니다. 이미 수락된 연결은 계속 처리됩니다.
    pub async fn run(self, handler: Arc<RequestHandler>, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("HTTP 리스너 종료");
                    break;
                }

                result = self.http_listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "연결 수락");
                            let handler = handler.clone();
                            tokio::spawn(async move {
                                if let Err(err) = handler.handle_connection(stream, peer).await {
                                    error!(error = %err, peer = %peer, "HTTP 연결 처리 실패");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "HTTP 연결 수락 실패");
                        }
                    }
                }
            }
        }
    }
}
