pub mod client;
pub mod config;
pub mod devtime;
pub mod lifecycle;
pub mod model;
pub mod session;
pub mod snapshot;
pub mod templates;
pub mod transport;
pub mod tree;
pub mod uri;

use std::sync::Arc;

use client::BuilderClient;
use config::WorkbenchConfig;
use session::{FileSecretStore, SessionState};
use transport::Transport;

/// Shared application state passed to every command handler.
#[derive(Clone)]
pub struct WorkbenchContext {
    pub config: Arc<WorkbenchConfig>,
    /// Workspace connection state, read through from the secret store
    /// before every authenticated call.
    pub session: Arc<SessionState>,
    pub client: Arc<BuilderClient>,
}

impl WorkbenchContext {
    /// Wire up the transport, session store, and client façade from config.
    pub fn new(config: WorkbenchConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let store = FileSecretStore::new(config.data_dir.join("secrets.json"));
        let session = Arc::new(SessionState::new(store));
        let transport = Transport::new(config.timeout_ms)?;
        let client = Arc::new(BuilderClient::new(transport, Arc::clone(&session)));
        Ok(Self {
            config,
            session,
            client,
        })
    }
}
