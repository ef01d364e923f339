use serde::{Deserialize, Serialize};

/// Body for `POST /stream/start` and `POST /stream/restart`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamRequest {
  #[serde(rename = "rtspUrl")]
  pub rtsp_url: String,
}

/// Human-readable status message returned by every stream command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamMessage {
  #[serde(default)]
  pub message: String,
}
