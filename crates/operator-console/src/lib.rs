pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod stream;
pub mod ws;

pub use config::ConsoleConfig;
pub use error::ApiError;
pub use state::AppState;
pub use stream::{HttpStreamControl, StreamControl};
