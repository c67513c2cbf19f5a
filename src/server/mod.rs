pub mod handler;
pub mod listener;
pub mod error;
pub mod gate;
pub mod io;
mod manager;

pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use gate::{AlwaysRunning, Builder, NoBuildErrors, Runner};
pub use manager::ProxyServer;
