pub mod draft;
pub mod error;
pub mod session;
pub mod store;
pub mod upload;

pub use draft::{DraftUpdate, DraftView, FormDraft, StagedAsset};
pub use error::{ErrorKind, LastError, SessionError};
pub use session::{SessionManager, SessionSnapshot};
pub use store::{HttpOverlayStore, OverlayStore};
pub use upload::{AssetUploader, HttpAssetUploader};
