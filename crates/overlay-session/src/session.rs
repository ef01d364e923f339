use crate::draft::{DraftUpdate, DraftView, FormDraft, StagedAsset};
use crate::error::{LastError, SessionError};
use crate::store::OverlayStore;
use crate::upload::AssetUploader;
use common::overlays::{OverlayKind, OverlayPayload, OverlayRecord, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Read-only view of the session as published to rendering surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub overlays: Vec<OverlayRecord>,
    pub draft: DraftView,
    pub last_error: Option<LastError>,
}

struct SessionState {
    overlays: Vec<OverlayRecord>,
    draft: FormDraft,
    last_error: Option<LastError>,
    drag_seq: HashMap<String, u64>,
}

/// Owns the overlay mirror, the single form draft and the last surfaced
/// error. All mutation goes through the one write lock, and every mutation
/// publishes a fresh snapshot on the broadcast channel.
pub struct SessionManager {
    store: Arc<dyn OverlayStore>,
    uploader: Arc<dyn AssetUploader>,
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionSnapshot>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn OverlayStore>, uploader: Arc<dyn AssetUploader>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            uploader,
            state: RwLock::new(SessionState {
                overlays: Vec::new(),
                draft: FormDraft::default(),
                last_error: None,
                drag_seq: HashMap::new(),
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        Self::snapshot_of(&state)
    }

    fn snapshot_of(state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            overlays: state.overlays.clone(),
            draft: state.draft.view(),
            last_error: state.last_error.clone(),
        }
    }

    fn publish(&self, state: &SessionState) {
        // Surfaces come and go; a mutation never fails for lack of listeners.
        let _ = self.events.send(Self::snapshot_of(state));
    }

    /// Re-reads the overlay list from the store. A failed read keeps the
    /// stale list in place.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let result = self.refresh_locked(&mut state).await;
        self.publish(&state);
        result
    }

    async fn refresh_locked(&self, state: &mut SessionState) -> Result<(), SessionError> {
        match self.store.list().await {
            Ok(overlays) => {
                state
                    .drag_seq
                    .retain(|id, _| overlays.iter().any(|record| record.id == *id));
                state.overlays = overlays;
                debug!(count = state.overlays.len(), "overlay list refreshed");
                Ok(())
            }
            Err(err) => {
                let err = SessionError::Fetch(err);
                warn!(error = %err, "overlay list fetch failed; keeping stale list");
                state.last_error = Some(LastError::from(&err));
                Err(err)
            }
        }
    }

    /// Seeds the draft from a record in the current mirror.
    pub async fn begin_edit(&self, id: &str) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let record = state
            .overlays
            .iter()
            .find(|record| record.id == id)
            .cloned();
        let Some(record) = record else {
            let err = SessionError::Validation(format!("unknown overlay id '{id}'"));
            state.last_error = Some(LastError::from(&err));
            self.publish(&state);
            return Err(err);
        };
        state.draft = FormDraft::for_record(&record);
        self.publish(&state);
        Ok(())
    }

    pub async fn begin_create(&self) {
        let mut state = self.state.write().await;
        state.draft = FormDraft::default();
        self.publish(&state);
    }

    pub async fn update_draft(&self, update: DraftUpdate) {
        let mut state = self.state.write().await;
        state.draft.apply(update);
        self.publish(&state);
    }

    pub async fn stage_asset(&self, filename: String, bytes: Vec<u8>) {
        let mut state = self.state.write().await;
        debug!(filename = %filename, size = bytes.len(), "logo file staged");
        state.draft.pending_asset = Some(StagedAsset { filename, bytes });
        self.publish(&state);
    }

    /// Persists the draft: a staged logo file is uploaded first, then the
    /// record is created or updated depending on `editing_id`. On success
    /// the list is re-read best-effort and the draft resets to create mode;
    /// on failure the draft survives so the operator can retry.
    pub async fn submit_draft(&self) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let result = self.submit_locked(&mut state).await;
        if let Err(err) = &result {
            state.last_error = Some(LastError::from(err));
        }
        self.publish(&state);
        result
    }

    async fn submit_locked(&self, state: &mut SessionState) -> Result<(), SessionError> {
        let draft = state.draft.clone();
        let content = match draft.kind {
            OverlayKind::Logo => {
                if let Some(asset) = &draft.pending_asset {
                    let path = self
                        .uploader
                        .upload(asset)
                        .await
                        .map_err(SessionError::Upload)?;
                    info!(path = %path, "logo uploaded");
                    path
                } else if let Some(editing_id) = &draft.editing_id {
                    // An edit without a replacement file keeps the asset
                    // path already stored on the record.
                    let existing = state
                        .overlays
                        .iter()
                        .find(|record| record.id == *editing_id);
                    let Some(existing) = existing else {
                        return Err(SessionError::Validation(format!(
                            "unknown overlay id '{editing_id}'"
                        )));
                    };
                    existing.content.clone()
                } else {
                    return Err(SessionError::Validation("logo file required".into()));
                }
            }
            OverlayKind::Text => {
                if draft.content.trim().is_empty() {
                    return Err(SessionError::Validation("text content required".into()));
                }
                draft.content.clone()
            }
        };
        let payload = OverlayPayload {
            kind: draft.kind,
            content,
            position: draft.position,
            size: draft.size,
            color: Some(draft.color.clone()),
        };
        match &draft.editing_id {
            Some(id) => {
                self.store
                    .update(id, &payload)
                    .await
                    .map_err(SessionError::Save)?;
                info!(overlay = %id, "overlay updated");
            }
            None => {
                let created = self
                    .store
                    .create(&payload)
                    .await
                    .map_err(SessionError::Save)?;
                info!(overlay = %created.id, "overlay created");
            }
        }
        // A failed re-read here leaves the mirror stale; the save itself
        // already went through.
        let _ = self.refresh_locked(state).await;
        state.draft = FormDraft::default();
        Ok(())
    }

    /// Deletes a record, re-reads the list best-effort and resets the draft
    /// if it was editing the deleted record.
    pub async fn delete_record(&self, id: &str) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        if let Err(err) = self.store.delete(id).await {
            let err = SessionError::Delete(err);
            warn!(overlay = id, error = %err, "overlay delete failed");
            state.last_error = Some(LastError::from(&err));
            self.publish(&state);
            return Err(err);
        }
        info!(overlay = id, "overlay deleted");
        state.drag_seq.remove(id);
        let _ = self.refresh_locked(&mut state).await;
        if state.draft.editing_id.as_deref() == Some(id) {
            state.draft = FormDraft::default();
        }
        self.publish(&state);
        Ok(())
    }

    /// Persists a drag-stop position without refreshing the list. The
    /// mirror is updated at issuance; each issuance takes a per-record
    /// sequence number and only the outcome of the newest commit may
    /// surface, so an out-of-order response can neither revert the mirror
    /// nor raise a stale error.
    pub async fn commit_drag(&self, id: &str, position: Position) -> Result<(), SessionError> {
        let seq = {
            let mut state = self.state.write().await;
            let next = state.drag_seq.entry(id.to_string()).or_insert(0);
            *next += 1;
            let seq = *next;
            if let Some(record) = state.overlays.iter_mut().find(|record| record.id == id) {
                record.position = position;
            }
            self.publish(&state);
            seq
        };
        // The store call runs without the session lock so overlapping drags
        // issue independent requests.
        let result = self.store.patch_position(id, position).await;
        let mut state = self.state.write().await;
        if state.drag_seq.get(id).copied() != Some(seq) {
            debug!(overlay = id, seq, "drag commit superseded; dropping outcome");
            return Ok(());
        }
        match result {
            Ok(_) => {
                debug!(overlay = id, x = position.x, y = position.y, "drag commit persisted");
                Ok(())
            }
            Err(err) => {
                let err = SessionError::Save(err);
                warn!(overlay = id, error = %err, "drag commit failed; keeping local position");
                state.last_error = Some(LastError::from(&err));
                self.publish(&state);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use common::overlays::Size;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct PatchPlan {
        delay: Duration,
        fail: bool,
    }

    #[derive(Default)]
    struct StubStore {
        overlays: Mutex<Vec<OverlayRecord>>,
        list_calls: Mutex<u32>,
        created: Mutex<Vec<OverlayPayload>>,
        updated: Mutex<Vec<(String, OverlayPayload)>>,
        patches: Mutex<Vec<(String, Position)>>,
        patch_plan: Mutex<VecDeque<PatchPlan>>,
        deleted: Mutex<Vec<String>>,
        fail_list: Mutex<bool>,
        fail_save: Mutex<bool>,
        fail_delete: Mutex<bool>,
    }

    impl StubStore {
        fn with_records(records: Vec<OverlayRecord>) -> Arc<Self> {
            Arc::new(Self {
                overlays: Mutex::new(records),
                ..Default::default()
            })
        }
    }

    #[async_trait::async_trait]
    impl OverlayStore for StubStore {
        async fn list(&self) -> anyhow::Result<Vec<OverlayRecord>> {
            *self.list_calls.lock().await += 1;
            if *self.fail_list.lock().await {
                anyhow::bail!("stub list failure");
            }
            Ok(self.overlays.lock().await.clone())
        }

        async fn create(&self, payload: &OverlayPayload) -> anyhow::Result<OverlayRecord> {
            self.created.lock().await.push(payload.clone());
            if *self.fail_save.lock().await {
                anyhow::bail!("stub create failure");
            }
            let mut overlays = self.overlays.lock().await;
            let record = OverlayRecord {
                id: format!("ov-{}", overlays.len() + 1),
                kind: payload.kind,
                content: payload.content.clone(),
                position: payload.position,
                size: payload.size,
                color: payload.color.clone(),
            };
            overlays.push(record.clone());
            Ok(record)
        }

        async fn update(
            &self,
            id: &str,
            payload: &OverlayPayload,
        ) -> anyhow::Result<OverlayRecord> {
            self.updated
                .lock()
                .await
                .push((id.to_string(), payload.clone()));
            if *self.fail_save.lock().await {
                anyhow::bail!("stub update failure");
            }
            let mut overlays = self.overlays.lock().await;
            let record = overlays.iter_mut().find(|record| record.id == id);
            let Some(record) = record else {
                anyhow::bail!("no overlay '{id}'");
            };
            record.kind = payload.kind;
            record.content = payload.content.clone();
            record.position = payload.position;
            record.size = payload.size;
            record.color = payload.color.clone();
            Ok(record.clone())
        }

        async fn patch_position(&self, id: &str, position: Position) -> anyhow::Result<OverlayRecord> {
            self.patches.lock().await.push((id.to_string(), position));
            let plan = self.patch_plan.lock().await.pop_front();
            if let Some(plan) = plan {
                tokio::time::sleep(plan.delay).await;
                if plan.fail {
                    anyhow::bail!("stub patch failure");
                }
            }
            let mut overlays = self.overlays.lock().await;
            if let Some(record) = overlays.iter_mut().find(|record| record.id == id) {
                record.position = position;
                Ok(record.clone())
            } else {
                anyhow::bail!("no overlay '{id}'")
            }
        }

        async fn delete(&self, id: &str) -> anyhow::Result<()> {
            self.deleted.lock().await.push(id.to_string());
            if *self.fail_delete.lock().await {
                anyhow::bail!("stub delete failure");
            }
            self.overlays.lock().await.retain(|record| record.id != id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubUploader {
        uploads: Mutex<Vec<String>>,
        path: Mutex<String>,
        fail: Mutex<bool>,
    }

    impl StubUploader {
        fn returning(path: &str) -> Arc<Self> {
            Arc::new(Self {
                path: Mutex::new(path.to_string()),
                ..Default::default()
            })
        }
    }

    #[async_trait::async_trait]
    impl AssetUploader for StubUploader {
        async fn upload(&self, asset: &StagedAsset) -> anyhow::Result<String> {
            self.uploads.lock().await.push(asset.filename.clone());
            if *self.fail.lock().await {
                anyhow::bail!("stub upload failure");
            }
            Ok(self.path.lock().await.clone())
        }
    }

    fn text_record(id: &str, content: &str) -> OverlayRecord {
        OverlayRecord {
            id: id.into(),
            kind: OverlayKind::Text,
            content: content.into(),
            position: Position { x: 50, y: 50 },
            size: Size { width: 150, height: 32 },
            color: Some("#ffffff".into()),
        }
    }

    fn logo_record(id: &str, path: &str) -> OverlayRecord {
        OverlayRecord {
            id: id.into(),
            kind: OverlayKind::Logo,
            content: path.into(),
            position: Position { x: 10, y: 10 },
            size: Size { width: 120, height: 60 },
            color: None,
        }
    }

    #[tokio::test]
    async fn edit_preserves_untouched_logo_content() {
        let store = StubStore::with_records(vec![logo_record("ov-7", "/uploads/a.png")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader.clone());

        manager.refresh().await.unwrap();
        manager.begin_edit("ov-7").await.unwrap();
        manager.submit_draft().await.unwrap();

        let updated = store.updated.lock().await;
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0, "ov-7");
        assert_eq!(updated[0].1.content, "/uploads/a.png");
        assert!(store.created.lock().await.is_empty());
        assert!(uploader.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn new_logo_submit_requires_file() {
        let store = Arc::new(StubStore::default());
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader.clone());

        manager
            .update_draft(DraftUpdate {
                kind: Some(OverlayKind::Logo),
                ..Default::default()
            })
            .await;
        let err = manager.submit_draft().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.created.lock().await.is_empty());
        assert!(store.updated.lock().await.is_empty());
        assert!(uploader.uploads.lock().await.is_empty());
        let last = manager.snapshot().await.last_error.unwrap();
        assert_eq!(last.message, "logo file required");
    }

    #[tokio::test]
    async fn submit_text_requires_content() {
        let store = Arc::new(StubStore::default());
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager
            .update_draft(DraftUpdate {
                content: Some("   ".into()),
                ..Default::default()
            })
            .await;
        let err = manager.submit_draft().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.created.lock().await.is_empty());
    }

    #[tokio::test]
    async fn create_then_refresh_resets_draft() {
        let store = StubStore::with_records(vec![text_record("ov-1", "hello")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager.refresh().await.unwrap();
        manager
            .update_draft(DraftUpdate {
                content: Some("BREAKING".into()),
                ..Default::default()
            })
            .await;
        manager.submit_draft().await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.overlays.len(), 2);
        assert_eq!(snapshot.draft, FormDraft::default().view());
        assert_eq!(*store.list_calls.lock().await, 2);
    }

    #[tokio::test]
    async fn logo_with_staged_file_uploads_and_submits_path() {
        let store = Arc::new(StubStore::default());
        let uploader = StubUploader::returning("/uploads/logo-1.png");
        let manager = SessionManager::new(store.clone(), uploader.clone());

        manager
            .update_draft(DraftUpdate {
                kind: Some(OverlayKind::Logo),
                ..Default::default()
            })
            .await;
        manager.stage_asset("banner.png".into(), vec![0xff; 16]).await;
        manager.submit_draft().await.unwrap();

        assert_eq!(*uploader.uploads.lock().await, vec!["banner.png".to_string()]);
        let created = store.created.lock().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].content, "/uploads/logo-1.png");
        let snapshot = manager.snapshot().await;
        assert!(snapshot.draft.pending_asset.is_none());
        assert_eq!(snapshot.draft.content, "");
    }

    #[tokio::test]
    async fn upload_failure_aborts_submit_and_keeps_draft() {
        let store = Arc::new(StubStore::default());
        let uploader = Arc::new(StubUploader::default());
        *uploader.fail.lock().await = true;
        let manager = SessionManager::new(store.clone(), uploader.clone());

        manager
            .update_draft(DraftUpdate {
                kind: Some(OverlayKind::Logo),
                ..Default::default()
            })
            .await;
        manager.stage_asset("logo.png".into(), vec![1, 2, 3]).await;
        let err = manager.submit_draft().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UploadFailed);
        assert!(store.created.lock().await.is_empty());
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.draft.pending_asset.as_deref(), Some("logo.png"));
    }

    #[tokio::test]
    async fn save_failure_keeps_draft_for_retry() {
        let store = Arc::new(StubStore::default());
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager
            .update_draft(DraftUpdate {
                content: Some("BREAKING".into()),
                ..Default::default()
            })
            .await;
        *store.fail_save.lock().await = true;
        let err = manager.submit_draft().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SaveFailed);
        assert_eq!(manager.snapshot().await.draft.content, "BREAKING");

        *store.fail_save.lock().await = false;
        manager.submit_draft().await.unwrap();
        assert_eq!(manager.snapshot().await.draft.content, "");
        assert_eq!(store.created.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn logo_edit_of_vanished_record_is_validation_error() {
        let store = StubStore::with_records(vec![logo_record("ov-1", "/uploads/a.png")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager.refresh().await.unwrap();
        manager.begin_edit("ov-1").await.unwrap();
        // The record disappears server-side between edit and submit.
        store.overlays.lock().await.clear();
        manager.refresh().await.unwrap();
        let err = manager.submit_draft().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.updated.lock().await.is_empty());
    }

    #[tokio::test]
    async fn delete_resets_editing_draft() {
        let store = StubStore::with_records(vec![text_record("ov-1", "hello")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager.refresh().await.unwrap();
        manager.begin_edit("ov-1").await.unwrap();
        manager.delete_record("ov-1").await.unwrap();

        let snapshot = manager.snapshot().await;
        assert!(snapshot.overlays.is_empty());
        assert_eq!(snapshot.draft, FormDraft::default().view());
        assert_eq!(*store.deleted.lock().await, vec!["ov-1".to_string()]);
    }

    #[tokio::test]
    async fn delete_of_other_record_keeps_draft() {
        let store = StubStore::with_records(vec![
            text_record("ov-1", "hello"),
            text_record("ov-2", "world"),
        ]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store, uploader);

        manager.refresh().await.unwrap();
        manager.begin_edit("ov-1").await.unwrap();
        manager.delete_record("ov-2").await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.draft.editing_id.as_deref(), Some("ov-1"));
        assert_eq!(snapshot.draft.content, "hello");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_overlays() {
        let store = StubStore::with_records(vec![text_record("ov-1", "hello")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager.refresh().await.unwrap();
        *store.fail_list.lock().await = true;
        let err = manager.refresh().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FetchFailed);
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.overlays.len(), 1);
        assert_eq!(snapshot.last_error.unwrap().kind, ErrorKind::FetchFailed);
    }

    #[tokio::test]
    async fn begin_edit_blanks_logo_content_field() {
        let store = StubStore::with_records(vec![logo_record("ov-1", "/uploads/a.png")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store, uploader);

        manager.refresh().await.unwrap();
        manager.begin_edit("ov-1").await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.draft.editing_id.as_deref(), Some("ov-1"));
        assert_eq!(snapshot.draft.content, "");
        assert_eq!(snapshot.draft.color, "#ffffff");
        assert_eq!(snapshot.draft.x, 10);
    }

    #[tokio::test]
    async fn begin_edit_unknown_id_is_rejected() {
        let store = Arc::new(StubStore::default());
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store, uploader);

        let err = manager.begin_edit("ov-404").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        let snapshot = manager.snapshot().await;
        assert!(snapshot.draft.editing_id.is_none());
        assert_eq!(snapshot.last_error.unwrap().kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn drag_commit_updates_without_refresh() {
        let store = StubStore::with_records(vec![text_record("ov-1", "hello")]);
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store.clone(), uploader);

        manager.refresh().await.unwrap();
        manager
            .commit_drag("ov-1", Position { x: 320, y: 12 })
            .await
            .unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.overlays[0].position, Position { x: 320, y: 12 });
        assert_eq!(
            *store.patches.lock().await,
            vec![("ov-1".to_string(), Position { x: 320, y: 12 })]
        );
        assert_eq!(*store.list_calls.lock().await, 1);
        assert!(store.updated.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_drag_response_is_dropped() {
        let store = StubStore::with_records(vec![text_record("ov-1", "hello")]);
        store.patch_plan.lock().await.push_back(PatchPlan {
            delay: Duration::from_secs(5),
            fail: true,
        });
        store.patch_plan.lock().await.push_back(PatchPlan {
            delay: Duration::from_millis(10),
            fail: false,
        });
        let uploader = Arc::new(StubUploader::default());
        let manager = Arc::new(SessionManager::new(store.clone(), uploader));

        manager.refresh().await.unwrap();
        let slow = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.commit_drag("ov-1", Position { x: 5, y: 5 }).await })
        };
        // Let the first commit reach its in-flight request before the second
        // one is issued.
        tokio::task::yield_now().await;
        let fast = {
            let manager = manager.clone();
            tokio::spawn(
                async move { manager.commit_drag("ov-1", Position { x: 90, y: 90 }).await },
            )
        };

        fast.await.unwrap().unwrap();
        slow.await.unwrap().unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.overlays[0].position, Position { x: 90, y: 90 });
        assert!(
            snapshot.last_error.is_none(),
            "superseded failure must not surface"
        );
        assert_eq!(store.patches.lock().await.len(), 2);
        assert_eq!(*store.list_calls.lock().await, 1);
    }

    #[tokio::test]
    async fn latest_drag_failure_surfaces() {
        let store = StubStore::with_records(vec![text_record("ov-1", "hello")]);
        store.patch_plan.lock().await.push_back(PatchPlan {
            delay: Duration::ZERO,
            fail: true,
        });
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store, uploader);

        manager.refresh().await.unwrap();
        let err = manager
            .commit_drag("ov-1", Position { x: 7, y: 8 })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SaveFailed);
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.overlays[0].position, Position { x: 7, y: 8 });
        assert_eq!(snapshot.last_error.unwrap().kind, ErrorKind::SaveFailed);
    }

    #[tokio::test]
    async fn mutations_broadcast_snapshots() {
        let store = Arc::new(StubStore::default());
        let uploader = Arc::new(StubUploader::default());
        let manager = SessionManager::new(store, uploader);

        let mut events = manager.subscribe();
        manager
            .update_draft(DraftUpdate {
                content: Some("LIVE".into()),
                ..Default::default()
            })
            .await;

        let snapshot = events.recv().await.unwrap();
        assert_eq!(snapshot.draft.content, "LIVE");
    }
}
