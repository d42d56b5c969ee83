pub mod config;
pub mod error;
pub mod games;
pub mod grid;
pub mod logging;
pub mod session;
pub mod terminal;
pub mod timer;

pub use config::SessionConfig;
pub use error::GameError;
