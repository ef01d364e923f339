use serde::{Deserialize, Serialize};

/// Pixel offsets relative to the bounded render surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
  pub x: i32,
  pub y: i32,
}

/// For text overlays `height` doubles as the font size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Size {
  pub width: i32,
  pub height: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
  Text,
  Logo,
}

impl OverlayKind {
  pub fn is_text(&self) -> bool {
    matches!(self, OverlayKind::Text)
  }

  pub fn is_logo(&self) -> bool {
    matches!(self, OverlayKind::Logo)
  }
}

/// A persisted overlay as the store serves it. The store assigns `_id` on
/// creation; `content` is literal text for text overlays and an uploaded
/// asset path for logos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlayRecord {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "type")]
  pub kind: OverlayKind,
  pub content: String,
  pub position: Position,
  pub size: Size,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
}

/// Create/update body sent to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverlayPayload {
  #[serde(rename = "type")]
  pub kind: OverlayKind,
  pub content: String,
  pub position: Position,
  pub size: Size,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
}

/// Partial update body carrying only a new position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionPatch {
  pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
  #[serde(rename = "filePath")]
  pub file_path: String,
}
