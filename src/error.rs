//! Error types for talking to the remote backend and loading configuration.
//!
//! Screens never propagate these past their boundary: `logic` turns them into a
//! toast, and `Unauthorized` additionally ends the session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// The backend answered 401. Credentials have already been cleared.
  #[error("session expired")]
  Unauthorized,

  #[error("backend HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("transport error: {0}")]
  Transport(String),

  #[error("unexpected response body: {0}")]
  Decode(String),
}

impl ApiError {
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized)
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::Status { status: 404, .. })
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ApiError::Decode(e.to_string())
    } else {
      ApiError::Transport(e.to_string())
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
}
