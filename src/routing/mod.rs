//! 경로 접두사 기반 라우팅을 위한 핵심 기능을 제공하는 모듈입니다.

mod error;
mod target;
mod table;

pub use error::RoutingError;
pub use target::Target;
pub use table::{Route, RouteTable};
