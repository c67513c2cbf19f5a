//! Gin Proxy는 개발용 백엔드 앞에서 동작하는 경로 접두사 기반 리버스 프록시입니다.
//!
//! # 주요 기능
//!
//! - 가장 긴 접두사 우선의 정적 경로 라우팅
//! - 일반 요청의 리버스 프록시 전달 (응답 스트리밍)
//! - WebSocket, SSE 요청의 원시 양방향 바이트 터널
//! - 매 요청 전 빌드 에러 확인과 백엔드 실행 보장
//!
//! # 예제
//!
//! ```
//! use gin_proxy::routing::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.register("/", "http://localhost:3001").unwrap();
//! table.register("/api", "http://localhost:4000").unwrap();
//!
//! // 겹치는 접두사는 더 긴 쪽이 우선
//! let route = table.resolve("/api/users").unwrap();
//! assert_eq!(route.prefix, "/api");
//!
//! let route = table.resolve("/index.html").unwrap();
//! assert_eq!(route.prefix, "/");
//! ```

pub mod logging;
pub mod proxy;
pub mod routing;
pub mod server;
pub mod settings;
