use anyhow::{Context, Result};
use async_trait::async_trait;
use common::streams::{StreamMessage, StreamRequest};
use reqwest::Url;
use std::time::Duration;
use tracing::instrument;

/// The backend endpoints that start, stop and restart the live pipeline.
/// The console forwards the operator's intent and relays the status
/// message back; it never interprets pipeline state itself.
#[async_trait]
pub trait StreamControl: Send + Sync {
    async fn start(&self, request: &StreamRequest) -> Result<StreamMessage>;
    async fn stop(&self) -> Result<StreamMessage>;
    async fn restart(&self, request: &StreamRequest) -> Result<StreamMessage>;
}

pub struct HttpStreamControl {
    base: Url,
    client: reqwest::Client,
}

impl HttpStreamControl {
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { base, client })
    }

    async fn post_command(&self, path: &str, body: Option<&StreamRequest>) -> Result<StreamMessage> {
        let url = self.base.join(path).context("invalid stream endpoint")?;
        let mut req = self.client.post(url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("stream command '{path}' failed"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("stream command '{path}' returned error status"))?;
        Ok(resp
            .json()
            .await
            .with_context(|| format!("failed to parse stream command '{path}' response"))?)
    }
}

#[async_trait]
impl StreamControl for HttpStreamControl {
    #[instrument(skip_all, fields(rtsp = %request.rtsp_url))]
    async fn start(&self, request: &StreamRequest) -> Result<StreamMessage> {
        self.post_command("stream/start", Some(request)).await
    }

    #[instrument(skip_all)]
    async fn stop(&self) -> Result<StreamMessage> {
        self.post_command("stream/stop", None).await
    }

    #[instrument(skip_all, fields(rtsp = %request.rtsp_url))]
    async fn restart(&self, request: &StreamRequest) -> Result<StreamMessage> {
        self.post_command("stream/restart", Some(request)).await
    }
}
