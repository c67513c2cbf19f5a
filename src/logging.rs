use std::ffi::OsStr;
use std::path::Path;

use hyper::header::{HeaderMap, HOST};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, span, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::settings::logging::{LogFormat, LogOutput, LogSettings};

/// 전역 tracing 구독자를 설정합니다.
///
/// `RUST_LOG`가 있으면 설정 레벨보다 우선합니다. 반환된 가드는 프로세스가
/// 끝날 때까지 유지해야 버퍼된 로그가 모두 기록됩니다.
pub fn init_logging(settings: &LogSettings) -> WorkerGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level).into())
        .from_env_lossy();

    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| OsStr::new("gin_proxy.log"));
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    match settings.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    guard
}

#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub host: String,
    pub mode: &'static str,
    pub status_code: u16,
    pub duration_ms: u64,
    pub target: Option<String>,
    pub error: Option<String>,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            host: String::new(),
            mode: "forward",
            status_code: 0,
            duration_ms: 0,
            target: None,
            error: None,
        }
    }

    pub fn with_request<B>(&mut self, req: &hyper::Request<B>) {
        self.with_parts(req.method().as_str(), req.uri().path(), req.headers());
    }

    pub fn with_parts(&mut self, method: &str, path: &str, headers: &HeaderMap) {
        self.method = method.to_string();
        self.path = path.to_string();
        if let Some(host) = headers.get(HOST) {
            self.host = host.to_str().unwrap_or_default().to_string();
        }

        info!(
            request_id = %self.request_id,
            method = %self.method,
            path = %self.path,
            host = %self.host,
            "요청 수신"
        );
    }

    pub fn with_mode(&mut self, mode: &'static str) {
        self.mode = mode;
    }

    pub fn with_target(&mut self, target: impl std::fmt::Display) {
        let target = target.to_string();
        info!(request_id = %self.request_id, target = %target, mode = self.mode, "백엔드 선택");
        self.target = Some(target);
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        let error_msg = error.to_string();
        error!(
            request_id = %self.request_id,
            error = %error_msg,
            "요청 처리 중 에러 발생"
        );
        self.error = Some(error_msg);
    }
}

pub fn log_request(log: &RequestLog) {
    let level = if log.error.is_some() {
        Level::ERROR
    } else if log.status_code >= 400 {
        Level::WARN
    } else {
        Level::INFO
    };

    let span = span!(
        Level::INFO,
        "request",
        request_id = %log.request_id,
        method = %log.method,
        path = %log.path,
        host = %log.host,
        mode = log.mode,
        status = log.status_code,
        duration_ms = log.duration_ms
    );
    let _enter = span.enter();

    match level {
        Level::ERROR => error!(target_url = ?log.target, error = ?log.error, "요청 실패"),
        Level::WARN => warn!(target_url = ?log.target, "요청이 경고 상태로 완료됨"),
        _ => info!(target_url = ?log.target, "요청 완료"),
    }
}
