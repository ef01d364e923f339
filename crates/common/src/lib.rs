pub mod overlays;
pub mod streams;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
