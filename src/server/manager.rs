use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use super::error::Error;
use super::gate::{Builder, Gates, Runner};
use super::handler::RequestHandler;
use super::listener::ServerListener;
use super::Result;
use crate::routing::RouteTable;
use crate::settings::Settings;

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    accept_task: JoinHandle<()>,
}

/// 리스너와 라우팅 테이블을 소유하는 프록시 서버입니다.
///
/// ```no_run
/// use std::sync::Arc;
/// use gin_proxy::server::{AlwaysRunning, NoBuildErrors, ProxyServer};
/// use gin_proxy::settings::Settings;
///
/// # async fn example() -> gin_proxy::server::Result<()> {
/// let mut settings = Settings::default();
/// settings.routes.insert("/".to_string(), "http://localhost:3001".to_string());
///
/// let mut server = ProxyServer::new(Arc::new(NoBuildErrors), Arc::new(AlwaysRunning));
/// let addr = server.run(&settings).await?;
/// println!("listening on {}", addr);
/// server.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct ProxyServer {
    gates: Gates,
    running: Option<Running>,
}

impl ProxyServer {
    pub fn new(builder: Arc<dyn Builder>, runner: Arc<dyn Runner>) -> Self {
        Self {
            gates: Gates::new(builder, runner),
            running: None,
        }
    }

    /// 라우팅 테이블을 만들고 리스너를 바인딩한 뒤 백그라운드에서 연결 수락을 시작합니다.
    ///
    /// 잘못된 백엔드 URL이 하나라도 있으면 바인딩 전에 실패합니다.
    #[instrument(skip_all, fields(port = settings.server.port), err)]
    pub async fn run(&mut self, settings: &Settings) -> Result<SocketAddr> {
        if self.running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let routing_table = RouteTable::from_routes(&settings.routes)?;
        let listener = ServerListener::bind(settings.server.port).await?;
        let local_addr = listener.local_addr()?;

        let handler = Arc::new(RequestHandler::new(Arc::new(routing_table), self.gates.clone()));
        let (shutdown, shutdown_rx) = oneshot::channel();
        let accept_task = tokio::spawn(listener.run(handler, shutdown_rx));

        info!(addr = %local_addr, routes = settings.routes.len(), "프록시 시작");
        self.running = Some(Running {
            local_addr,
            shutdown,
            accept_task,
        });
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// 리스너를 닫고 연결 수락 루프가 끝날 때까지 기다립니다.
    ///
    /// 진행 중인 요청과 터널은 강제로 끊지 않습니다.
    pub async fn close(&mut self) -> Result<()> {
        let running = self.running.take().ok_or(Error::NotRunning)?;

        // 수신 측이 이미 사라졌다면 루프도 이미 끝난 상태
        let _ = running.shutdown.send(());
        running.accept_task.await?;

        info!(addr = %running.local_addr, "프록시 종료");
        Ok(())
    }
}
