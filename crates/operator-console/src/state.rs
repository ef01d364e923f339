use crate::config::ConsoleConfig;
use crate::stream::StreamControl;
use overlay_session::SessionManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: ConsoleConfig,
    pub session: Arc<SessionManager>,
    pub stream: Arc<dyn StreamControl>,
}

impl AppState {
    pub fn new(
        config: ConsoleConfig,
        session: Arc<SessionManager>,
        stream: Arc<dyn StreamControl>,
    ) -> Self {
        Self {
            config,
            session,
            stream,
        }
    }
}
