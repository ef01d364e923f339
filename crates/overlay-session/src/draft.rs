use common::overlays::{OverlayKind, OverlayRecord, Position, Size};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#ffffff";

/// A file selected in the form but not yet uploaded. It is held in memory
/// until the next submit sends it to the asset uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The in-progress create/edit form. Exactly one draft exists per session;
/// `editing_id` is set while the draft represents an edit of an existing
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub editing_id: Option<String>,
    pub kind: OverlayKind,
    pub content: String,
    pub pending_asset: Option<StagedAsset>,
    pub position: Position,
    pub size: Size,
    pub color: String,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            editing_id: None,
            kind: OverlayKind::Text,
            content: String::new(),
            pending_asset: None,
            position: Position { x: 50, y: 50 },
            size: Size { width: 150, height: 32 },
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl FormDraft {
    /// Seed the draft from an existing record. `content` is copied only for
    /// text records; a logo draft leaves it blank so an untouched submit can
    /// fall back to the stored asset path instead of clobbering it.
    pub fn for_record(record: &OverlayRecord) -> Self {
        Self {
            editing_id: Some(record.id.clone()),
            kind: record.kind,
            content: if record.kind.is_text() {
                record.content.clone()
            } else {
                String::new()
            },
            pending_asset: None,
            position: record.position,
            size: record.size,
            color: record
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        }
    }

    pub fn apply(&mut self, update: DraftUpdate) {
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(x) = update.x {
            self.position.x = x;
        }
        if let Some(y) = update.y {
            self.position.y = y;
        }
        if let Some(width) = update.width {
            self.size.width = width;
        }
        if let Some(height) = update.height {
            self.size.height = height;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
    }

    pub fn view(&self) -> DraftView {
        DraftView {
            editing_id: self.editing_id.clone(),
            kind: self.kind,
            content: self.content.clone(),
            x: self.position.x,
            y: self.position.y,
            width: self.size.width,
            height: self.size.height,
            color: self.color.clone(),
            pending_asset: self
                .pending_asset
                .as_ref()
                .map(|asset| asset.filename.clone()),
        }
    }
}

/// Partial assignment of draft fields. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftUpdate {
    pub kind: Option<OverlayKind>,
    pub content: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub color: Option<String>,
}

/// Flat form-state view of the draft as published in snapshots. Only the
/// staged file's name crosses the wire, never its bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftView {
    pub editing_id: Option<String>,
    pub kind: OverlayKind,
    pub content: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub color: String,
    pub pending_asset: Option<String>,
}
