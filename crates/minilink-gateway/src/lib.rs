//! HTTP front end and operator commands for minilink.

pub mod app;
pub mod cli;
pub mod dump;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
