//! Credential store: the two persisted keys, `token` and `login`.
//!
//! Backed by a small JSON object file when a path is configured, otherwise
//! memory only. Writes go straight to disk; there is no other client state.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

pub const TOKEN_KEY: &str = "token";
pub const LOGIN_KEY: &str = "login";

#[derive(Clone, Default)]
pub struct CredentialStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
}

impl CredentialStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store. A missing or unreadable file starts empty.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn open(path: PathBuf) -> Self {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(s) => serde_json::from_str::<BTreeMap<String, String>>(&s).unwrap_or_else(|e| {
                warn!(target: "session", error = %e, "Credential file is not a JSON object; starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        // Anything beyond the two known keys is dropped.
        let entries = entries
            .into_iter()
            .filter(|(k, _)| k == TOKEN_KEY || k == LOGIN_KEY)
            .collect();
        Self { entries: Arc::new(RwLock::new(entries)), path: Some(path) }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).await
    }

    /// Login identifier remembered for the sign-in form.
    pub async fn remembered_login(&self) -> Option<String> {
        self.get(LOGIN_KEY).await
    }

    pub async fn is_signed_in(&self) -> bool {
        self.token().await.is_some()
    }

    pub async fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await;
    }

    /// Remove both keys.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.remove(TOKEN_KEY);
        entries.remove(LOGIN_KEY);
        self.persist(&entries).await;
        debug!(target: "session", "Credentials cleared");
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) {
        let Some(path) = &self.path else { return };
        let body = match serde_json::to_string_pretty(entries) {
            Ok(b) => b,
            Err(e) => {
                warn!(target: "session", error = %e, "Failed to serialize credentials");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(path, body).await {
            warn!(target: "session", path = %path.display(), error = %e, "Failed to write credential file");
        }
    }
}
