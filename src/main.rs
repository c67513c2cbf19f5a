use std::process::ExitCode;
use std::sync::Arc;

use gin_proxy::logging::init_logging;
use gin_proxy::server::{AlwaysRunning, NoBuildErrors, ProxyServer};
use gin_proxy::settings::Settings;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = init_logging(&settings.logging);
    info!(port = settings.server.port, routes = ?settings.routes, "설정 로드 완료");

    let mut server = ProxyServer::new(Arc::new(NoBuildErrors), Arc::new(AlwaysRunning));
    if let Err(e) = server.run(&settings).await {
        error!(error = %e, "프록시 시작 실패");
        return ExitCode::FAILURE;
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "종료 신호 대기 실패");
    }
    info!("종료 신호 수신");

    match server.close().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "프록시 종료 실패");
            ExitCode::FAILURE
        }
    }
}
