//! App Data Cache Management
//!
//! Handles the locally cached session token.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bearer token for the ledger service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    /// `None` means the token does not expire
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    pub fn new(token: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            token: token.into(),
            expires_at: expires_in.map(|d| Utc::now() + d),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Get the application data directory
/// Creates directory if it doesn't exist
pub fn get_app_data_dir() -> Option<PathBuf> {
    use std::sync::OnceLock;
    static APP_DATA_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

    APP_DATA_DIR
        .get_or_init(|| {
            let app_dir = dirs::data_dir()?.join("scanpay");

            if let Err(e) = std::fs::create_dir_all(&app_dir) {
                error!("Failed to create app data directory: {}", e);
            }

            Some(app_dir)
        })
        .clone()
}

// ============================================================
// Session Token Cache
// ============================================================

pub fn token_path() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join("auth.json"))
}

pub fn load_token() -> Option<SessionToken> {
    load_token_from(&token_path()?)
}

pub fn save_token(token: &SessionToken) -> Result<()> {
    let path = token_path().ok_or_else(|| anyhow!("No data directory for the token cache"))?;
    save_token_to(&path, token)
}

pub fn clear_token() {
    if let Some(path) = token_path() {
        clear_token_at(&path);
    }
}

/// Read a token, discarding it (and the file) once expired
pub fn load_token_from(path: &Path) -> Option<SessionToken> {
    let content = std::fs::read_to_string(path).ok()?;
    let token: SessionToken = match serde_json::from_str(&content) {
        Ok(token) => token,
        Err(e) => {
            warn!("Ignoring unreadable token cache {:?}: {}", path, e);
            return None;
        }
    };

    if token.is_expired() {
        info!("Session token expired, clearing auth file");
        let _ = std::fs::remove_file(path);
        return None;
    }

    Some(token)
}

pub fn save_token_to(path: &Path, token: &SessionToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create token cache directory {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(token)?;
    std::fs::write(path, json).with_context(|| format!("Failed to save session token to {:?}", path))?;
    info!("Saved session token to {:?}", path);
    Ok(())
}

pub fn clear_token_at(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove token cache: {}", e);
        } else {
            info!("Cleared session token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        let token = SessionToken::new("abc", Some(Duration::hours(1)));

        save_token_to(&path, &token).unwrap();
        assert_eq!(load_token_from(&path), Some(token));
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = SessionToken::new("abc", None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expired_token_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        let token = SessionToken {
            token: "old".to_string(),
            expires_at: Some(Utc::now() - Duration::minutes(5)),
        };

        save_token_to(&path, &token).unwrap();
        assert!(load_token_from(&path).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        save_token_to(&path, &SessionToken::new("abc", None)).unwrap();

        clear_token_at(&path);
        assert!(load_token_from(&path).is_none());
        // clearing twice is harmless
        clear_token_at(&path);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("auth.json");

        assert!(save_token_to(&path, &SessionToken::new("abc", None)).is_err());
        assert!(load_token_from(&path).is_none());
    }

    #[test]
    fn test_garbage_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "not a token").unwrap();
        assert!(load_token_from(&path).is_none());
    }
}
