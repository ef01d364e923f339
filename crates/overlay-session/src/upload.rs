use crate::draft::StagedAsset;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::time::Duration;
use tracing::instrument;

/// Pushes a staged logo file to the backend and hands back the path the
/// overlay content should reference.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, asset: &StagedAsset) -> Result<String>;
}

pub struct HttpAssetUploader {
    base: Url,
    client: reqwest::Client,
}

impl HttpAssetUploader {
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).context("invalid upload endpoint")
    }
}

#[async_trait]
impl AssetUploader for HttpAssetUploader {
    #[instrument(skip_all, fields(filename = %asset.filename, bytes = asset.bytes.len()))]
    async fn upload(&self, asset: &StagedAsset) -> Result<String> {
        let url = self.endpoint("upload")?;
        let part = Part::bytes(asset.bytes.clone()).file_name(asset.filename.clone());
        let form = Form::new().part("logo", part);
        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("logo upload request failed")?;
        let resp = resp
            .error_for_status()
            .context("logo upload returned error status")?;
        let body: common::overlays::UploadResponse =
            resp.json().await.context("failed to parse upload response")?;
        Ok(body.file_path)
    }
}
