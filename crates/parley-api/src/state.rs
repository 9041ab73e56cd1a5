use std::sync::Arc;

use parley::{MessageService, PersistenceClient, ThreadService};

use crate::config::Config;
use crate::middleware::auth::JwtVerifier;

/// Shared application state passed to all handlers
///
/// Everything is cheap to clone; the store handle is the only shared
/// mutable resource.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub threads: ThreadService,
    pub messages: MessageService,
    /// `None` when authentication is disabled
    pub jwt: Option<Arc<JwtVerifier>>,
}

impl AppState {
    pub fn new(config: Config, persist: Arc<dyn PersistenceClient>) -> Self {
        let threads = ThreadService::new(persist.clone(), config.threads.dedup);
        let messages = MessageService::new(persist.clone(), config.messages);
        let jwt = config
            .auth
            .enabled
            .then(|| Arc::new(JwtVerifier::new(&config.auth.jwt_secret)));

        Self {
            config: Arc::new(config),
            persist,
            threads,
            messages,
            jwt,
        }
    }
}
