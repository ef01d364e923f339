use anyhow::{Context, Result};
use reqwest::Url;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub bind_addr: SocketAddr,
    pub api_base_url: Url,
    pub frontend_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: env::var("CONSOLE_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8090".to_string())
                .parse()
                .context("invalid CONSOLE_ADDR")?,
            api_base_url: parse_base_url(
                &env::var("OVERLAY_API_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:5000/api".to_string()),
            )
            .context("invalid OVERLAY_API_URL")?,
            frontend_dir: env::var("FRONTEND_DIR")
                .unwrap_or_else(|_| "./frontend/dist".to_string())
                .into(),
        })
    }
}

/// `Url::join` drops the last path segment unless the base ends with a
/// slash, so the configured base is normalized before any client sees it.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/")).context("failed to parse base url")
}
