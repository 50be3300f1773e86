//! Application state shared by every connection: config, credential store and
//! the backend client.
//!
//! Per-tab screen state (catalog, quiz, library, pomodoro) lives in `Screen`,
//! one per WebSocket connection.

use std::time::Duration;

use tracing::{info, instrument};

use crate::backend::Backend;
use crate::catalog::CatalogState;
use crate::config::AppConfig;
use crate::domain::{Question, Skill};
use crate::error::ApiError;
use crate::library::Library;
use crate::pomodoro::Cycles;
use crate::quiz::QuizSession;
use crate::storage::CredentialStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub backend: Backend,
}

impl AppState {
    /// Open the credential store and build the backend client from config.
    #[instrument(level = "info", skip_all, fields(base_url = %config.backend.base_url))]
    pub async fn new(config: AppConfig) -> Result<Self, ApiError> {
        let store = match &config.storage.credentials_path {
            Some(p) => CredentialStore::open(p.clone()).await,
            None => CredentialStore::in_memory(),
        };
        let signed_in = store.is_signed_in().await;
        let backend = Backend::new(
            &config.backend.base_url,
            Duration::from_secs(config.backend.timeout_secs),
            store,
        )?;
        info!(target: "skillshelf", persistent = config.storage.credentials_path.is_some(), signed_in, "Application state ready");
        Ok(Self { config, backend })
    }

    pub fn store(&self) -> &CredentialStore {
        self.backend.store()
    }

    pub fn new_screen(&self) -> Screen {
        Screen {
            catalog: CatalogState::new(self.config.catalog.page_size),
            quiz: None,
            library: Library::default(),
            cycles: Cycles::default(),
            managed_skills: Vec::new(),
            managed_questions: Vec::new(),
        }
    }
}

/// What one tab is looking at.
#[derive(Debug)]
pub struct Screen {
    pub catalog: CatalogState,
    pub quiz: Option<QuizSession>,
    pub library: Library,
    pub cycles: Cycles,
    /// Management tables; deletes filter these in place.
    pub managed_skills: Vec<Skill>,
    pub managed_questions: Vec<Question>,
}
