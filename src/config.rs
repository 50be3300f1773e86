//! Application configuration loaded from TOML, with a few environment overrides.
//!
//! Every field has a default, so a missing or broken file still yields a
//! working config (errors are logged, defaults used).
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8080"
//! timeout_secs = 20
//!
//! [storage]
//! credentials_path = "./credentials.json"
//!
//! [catalog]
//! page_size = 10
//! debounce_ms = 500
//!
//! [quiz]
//! advance = "always"   # or "on_correct"
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)] pub backend: BackendConfig,
  #[serde(default)] pub storage: StorageConfig,
  #[serde(default)] pub catalog: CatalogConfig,
  #[serde(default)] pub quiz: QuizConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
  pub base_url: String,
  pub timeout_secs: u64,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self { base_url: "http://localhost:8080".into(), timeout_secs: 20 }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
  /// Where the token/login pair is kept. `None` keeps it in memory only.
  pub credentials_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  pub page_size: u32,
  pub debounce_ms: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self { page_size: 10, debounce_ms: 500 }
  }
}

/// When the quiz moves to the next question.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
  /// Advance after every answered question, right or wrong.
  #[default]
  Always,
  /// Stay on the question until it is answered correctly.
  OnCorrect,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct QuizConfig {
  pub advance: AdvancePolicy,
}

impl AppConfig {
  pub fn from_toml_str(s: &str, path: &str) -> Result<Self, ConfigError> {
    toml::from_str(s).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
  }

  pub fn from_file(path: &str) -> Result<Self, ConfigError> {
    let s = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
    Self::from_toml_str(&s, path)
  }

  /// Load from APP_CONFIG_PATH (defaults on any error), then apply
  /// BACKEND_BASE_URL and CREDENTIALS_PATH overrides.
  pub fn load_from_env() -> Self {
    let mut cfg = match std::env::var("APP_CONFIG_PATH") {
      Ok(path) => match Self::from_file(&path) {
        Ok(cfg) => {
          info!(target: "skillshelf", %path, "Loaded app config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "skillshelf", %path, error = %e, "Failed to load config; using defaults");
          Self::default()
        }
      },
      Err(_) => Self::default(),
    };

    if let Ok(url) = std::env::var("BACKEND_BASE_URL") {
      cfg.backend.base_url = url;
    }
    if let Ok(p) = std::env::var("CREDENTIALS_PATH") {
      cfg.storage.credentials_path = Some(PathBuf::from(p));
    }
    cfg.backend.base_url = cfg.backend.base_url.trim_end_matches('/').to_string();
    cfg
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = AppConfig::from_toml_str("", "inline").unwrap();
    assert_eq!(cfg.backend.base_url, "http://localhost:8080");
    assert_eq!(cfg.catalog.page_size, 10);
    assert_eq!(cfg.catalog.debounce_ms, 500);
    assert_eq!(cfg.quiz.advance, AdvancePolicy::Always);
    assert!(cfg.storage.credentials_path.is_none());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = AppConfig::from_toml_str(
      "[catalog]\ndebounce_ms = 250\n[quiz]\nadvance = \"on_correct\"\n",
      "inline",
    ).unwrap();
    assert_eq!(cfg.catalog.debounce_ms, 250);
    assert_eq!(cfg.catalog.page_size, 10);
    assert_eq!(cfg.quiz.advance, AdvancePolicy::OnCorrect);
  }

  #[test]
  fn bad_toml_reports_path() {
    let err = AppConfig::from_toml_str("[quiz]\nadvance = \"sometimes\"", "app.toml").unwrap_err();
    assert!(err.to_string().contains("app.toml"));
  }
}
