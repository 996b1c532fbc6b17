use std::sync::Arc;

use docent_chat::ChatSession;
use docent_persist::PersistenceClient;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The session controller holds no per-request state, so one instance
/// serves every connection.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<ChatSession>,
    pub persist: Arc<dyn PersistenceClient>,
}

impl AppState {
    pub fn new(config: Config, session: ChatSession, persist: Arc<dyn PersistenceClient>) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(session),
            persist,
        }
    }
}
