use anyhow::{Context, Result};
use async_trait::async_trait;
use common::overlays::{OverlayPayload, OverlayRecord, Position, PositionPatch};
use reqwest::Url;
use std::time::Duration;
use tracing::instrument;

/// The external CRUD service that owns overlay persistence and id
/// assignment.
#[async_trait]
pub trait OverlayStore: Send + Sync {
    async fn list(&self) -> Result<Vec<OverlayRecord>>;
    async fn create(&self, payload: &OverlayPayload) -> Result<OverlayRecord>;
    async fn update(&self, id: &str, payload: &OverlayPayload) -> Result<OverlayRecord>;
    async fn patch_position(&self, id: &str, position: Position) -> Result<OverlayRecord>;
    async fn delete(&self, id: &str) -> Result<()>;
}

pub struct HttpOverlayStore {
    base: Url,
    client: reqwest::Client,
}

impl HttpOverlayStore {
    /// `base` must end with a slash or `join` drops its last path segment.
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).context("invalid overlay store endpoint")
    }
}

#[async_trait]
impl OverlayStore for HttpOverlayStore {
    #[instrument(skip_all)]
    async fn list(&self) -> Result<Vec<OverlayRecord>> {
        let url = self.endpoint("overlays")?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("overlay list request failed")?;
        let resp = resp
            .error_for_status()
            .context("overlay list returned error status")?;
        Ok(resp.json().await.context("failed to parse overlay list")?)
    }

    #[instrument(skip_all, fields(kind = ?payload.kind))]
    async fn create(&self, payload: &OverlayPayload) -> Result<OverlayRecord> {
        let url = self.endpoint("overlays")?;
        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("overlay create request failed")?;
        let resp = resp
            .error_for_status()
            .context("overlay create returned error status")?;
        Ok(resp.json().await.context("failed to parse created overlay")?)
    }

    #[instrument(skip_all, fields(overlay = id))]
    async fn update(&self, id: &str, payload: &OverlayPayload) -> Result<OverlayRecord> {
        let url = self.endpoint(&format!("overlays/{id}"))?;
        let resp = self
            .client
            .put(url)
            .json(payload)
            .send()
            .await
            .context("overlay update request failed")?;
        let resp = resp
            .error_for_status()
            .context("overlay update returned error status")?;
        Ok(resp.json().await.context("failed to parse updated overlay")?)
    }

    #[instrument(skip_all, fields(overlay = id, x = position.x, y = position.y))]
    async fn patch_position(&self, id: &str, position: Position) -> Result<OverlayRecord> {
        let url = self.endpoint(&format!("overlays/{id}"))?;
        let patch = PositionPatch { position };
        let resp = self
            .client
            .put(url)
            .json(&patch)
            .send()
            .await
            .context("overlay position patch request failed")?;
        let resp = resp
            .error_for_status()
            .context("overlay position patch returned error status")?;
        Ok(resp.json().await.context("failed to parse patched overlay")?)
    }

    #[instrument(skip_all, fields(overlay = id))]
    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&format!("overlays/{id}"))?;
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .context("overlay delete request failed")?;
        resp.error_for_status()
            .context("overlay delete returned error status")?;
        Ok(())
    }
}
