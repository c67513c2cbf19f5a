use tracing::{debug, info, warn};

use crate::routing::{RoutingError, Target};

/// 경로 접두사와 백엔드 오리진의 연결입니다.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub prefix: String,
    pub target: Target,
}

/// 라우팅 테이블을 관리하는 구조체입니다.
///
/// 라우트는 접두사 길이의 내림차순으로 정렬되어 있어 여러 접두사가
/// 동시에 매칭될 때 항상 가장 구체적인 라우트가 선택됩니다.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// 새로운 라우팅 테이블을 생성합니다.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// (접두사, 백엔드 URL) 목록으로 테이블을 생성합니다.
    ///
    /// 첫 번째 잘못된 항목에서 즉시 실패합니다.
    pub fn from_routes<I, P, U>(routes: I) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = (P, U)>,
        P: AsRef<str>,
        U: AsRef<str>,
    {
        let mut table = Self::new();
        for (prefix, url) in routes {
            table.register(prefix.as_ref(), url.as_ref())?;
        }
        Ok(table)
    }

    /// 라우팅 테이블에 새로운 라우트를 추가합니다.
    ///
    /// 같은 접두사가 이미 있으면 대상을 교체합니다.
    pub fn register(&mut self, prefix: &str, target_url: &str) -> Result<(), RoutingError> {
        if prefix.is_empty() {
            return Err(RoutingError::InvalidPrefix {
                prefix: prefix.to_string(),
            });
        }

        let target = Target::parse(target_url)?;
        info!(prefix = %prefix, target = %target, "라우트 등록");

        match self.routes.iter_mut().find(|r| r.prefix == prefix) {
            Some(existing) => {
                warn!(prefix = %prefix, previous = %existing.target, "기존 라우트 교체");
                existing.target = target;
            }
            None => {
                self.routes.push(Route {
                    prefix: prefix.to_string(),
                    target,
                });
                // 길이가 같으면 사전순으로 정렬해 순서를 고정
                self.routes.sort_by(|a, b| {
                    b.prefix.len().cmp(&a.prefix.len()).then_with(|| a.prefix.cmp(&b.prefix))
                });
            }
        }
        Ok(())
    }

    /// 요청 경로에 해당하는 라우트를 찾습니다.
    ///
    /// # 반환
    ///
    /// 경로가 접두사로 시작하는 라우트 중 가장 긴 접두사를 가진 라우트를
    /// 반환하고, 없으면 `RoutingError::NotFound`를 반환합니다.
    pub fn resolve(&self, path: &str) -> Result<&Route, RoutingError> {
        match self.routes.iter().find(|r| path.starts_with(r.prefix.as_str())) {
            Some(route) => {
                debug!(path = %path, prefix = %route.prefix, target = %route.target, "라우트 매칭");
                Ok(route)
            }
            None => {
                warn!(
                    path = %path,
                    available_routes = ?self.routes.iter().map(|r| r.prefix.as_str()).collect::<Vec<_>>(),
                    "매칭되는 라우트 없음"
                );
                Err(RoutingError::NotFound {
                    path: path.to_string(),
                })
            }
        }
    }

    /// 매칭 순서대로 정렬된 라우트 목록
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
