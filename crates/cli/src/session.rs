use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use photomigrate_core::store::Session;
use tracing::debug;

fn session_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".photomigrate")
        .join("session.json")
}

/// Cached session from a previous run, if still valid.
pub fn load() -> Option<Session> {
    load_from(&session_path())
}

pub fn store(session: &Session) -> Result<()> {
    store_at(&session_path(), session)
}

fn load_from(path: &Path) -> Option<Session> {
    let raw = fs::read_to_string(path).ok()?;
    let session: Session = serde_json::from_str(&raw).ok()?;
    if session.is_expired() {
        debug!("cached session expired");
        return None;
    }
    Some(session)
}

fn store_at(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache/session.json");

        let session = Session::new("tok".to_string());
        store_at(&path, &session).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.token, "tok");
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_from(&tmp.path().join("none.json")).is_none());
    }

    #[test]
    fn test_load_corrupt_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_from(&path).is_none());
    }

    #[test]
    fn test_load_expired_session() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");

        let mut session = Session::new("tok".to_string());
        session.expires_at = chrono::Utc::now() - chrono::Duration::seconds(10);
        store_at(&path, &session).unwrap();

        assert!(load_from(&path).is_none());
    }
}
