//! 매 요청마다 프록시 전에 확인하는 외부 협력자(빌더, 러너)입니다.

use std::sync::Arc;

use tracing::{debug, error};

/// 백엔드 빌드 결과를 알려주는 협력자
pub trait Builder: Send + Sync {
    /// 빌드 에러 텍스트. 빈 문자열이면 에러 없음
    fn errors(&self) -> String;
}

/// 백엔드 프로세스 실행을 보장하는 협력자
pub trait Runner: Send + Sync {
    /// 백엔드가 응답 가능할 때까지 블록할 수 있습니다. 여러 번 호출해도 안전해야 합니다.
    fn ensure_running(&self);
}

/// 항상 빌드 에러가 없다고 보고하는 빌더
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuildErrors;

impl Builder for NoBuildErrors {
    fn errors(&self) -> String {
        String::new()
    }
}

/// 백엔드가 이미 실행 중이라고 가정하는 러너
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysRunning;

impl Runner for AlwaysRunning {
    fn ensure_running(&self) {}
}

/// 게이트 통과 실패 사유
#[derive(Debug, Clone, PartialEq)]
pub enum GateRejection {
    /// 빌더가 보고한 에러 텍스트 그대로
    BuildErrors(String),
    /// 협력자 호출 자체가 실패함 (패닉 등)
    Failed(String),
}

/// 빌더와 러너를 묶어 순서대로 확인합니다.
#[derive(Clone)]
pub struct Gates {
    builder: Arc<dyn Builder>,
    runner: Arc<dyn Runner>,
}

impl Gates {
    pub fn new(builder: Arc<dyn Builder>, runner: Arc<dyn Runner>) -> Self {
        Self { builder, runner }
    }

    /// 빌드 에러가 없으면 백엔드 실행을 보장한 뒤 통과시킵니다.
    ///
    /// 협력자는 동기적으로 블록할 수 있으므로 블로킹 스레드 풀에서 호출합니다.
    pub async fn check(&self) -> Result<(), GateRejection> {
        let builder = self.builder.clone();
        let errors = tokio::task::spawn_blocking(move || builder.errors())
            .await
            .map_err(|e| {
                error!(error = %e, "빌더 호출 실패");
                GateRejection::Failed(e.to_string())
            })?;

        if !errors.is_empty() {
            debug!(length = errors.len(), "빌드 에러 보고됨");
            return Err(GateRejection::BuildErrors(errors));
        }

        let runner = self.runner.clone();
        tokio::task::spawn_blocking(move || runner.ensure_running())
            .await
            .map_err(|e| {
                error!(error = %e, "러너 호출 실패");
                GateRejection::Failed(e.to_string())
            })
    }
}
