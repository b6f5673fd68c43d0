mod ems;

pub use ems::{EmsClient, Session};

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Outcome of pushing one file through the upload gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Identical bytes are already present in the store.
    Skipped,
    /// The store accepted the file and may have assigned an identifier.
    Uploaded(Option<String>),
}

/// Operations the migration needs from the destination content repository.
///
/// `EmsClient` is the production implementation; tests run against
/// in-memory fakes.
pub trait ContentStore {
    /// Content hash of a local file, using the store's hash algorithm.
    fn hash_file(&self, path: &Path) -> Result<String>;

    /// Whether the store already holds the exact bytes of `path`. The check
    /// is content-addressed: identical bytes under any name count as
    /// present.
    fn head_file(&self, path: &Path) -> Result<bool>;

    /// Upload `path` under `display_name`. `None` means the store treated
    /// the upload as a noop; that is not an error.
    fn upload_file(&self, path: &Path, display_name: &str) -> Result<Option<String>>;

    /// Create or overwrite the document `ouuid` of `content_type`.
    fn save_document(&self, content_type: &str, ouuid: &str, document: &Value) -> Result<()>;
}

/// Upload `path` unless the store already holds identical bytes.
pub fn ensure_uploaded<S: ContentStore>(
    store: &S,
    path: &Path,
    display_name: &str,
) -> Result<UploadOutcome> {
    if store.head_file(path)? {
        debug!(path = %path.display(), "content already present, skipping upload");
        return Ok(UploadOutcome::Skipped);
    }
    let id = store.upload_file(path, display_name)?;
    Ok(UploadOutcome::Uploaded(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::PathBuf;

    use crate::error::Error;
    use crate::hash;

    /// In-memory store that becomes "present" for a hash once uploaded.
    #[derive(Default)]
    struct FakeStore {
        present: RefCell<HashSet<String>>,
        uploads: RefCell<Vec<PathBuf>>,
        fail_transport: bool,
    }

    impl ContentStore for FakeStore {
        fn hash_file(&self, path: &Path) -> Result<String> {
            Ok(hash::sha256_file(path)?)
        }

        fn head_file(&self, path: &Path) -> Result<bool> {
            if self.fail_transport {
                return Err(Error::UnexpectedStatus {
                    url: "fake".to_string(),
                    status: 503,
                });
            }
            Ok(self.present.borrow().contains(&self.hash_file(path)?))
        }

        fn upload_file(&self, path: &Path, _display_name: &str) -> Result<Option<String>> {
            let hash = self.hash_file(path)?;
            self.present.borrow_mut().insert(hash.clone());
            self.uploads.borrow_mut().push(path.to_path_buf());
            Ok(Some(hash))
        }

        fn save_document(&self, _: &str, _: &str, _: &Value) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_uploads_absent_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.jpeg");
        std::fs::write(&path, b"derivative bytes").unwrap();

        let store = FakeStore::default();
        let outcome = ensure_uploaded(&store, &path, "a.jpeg").unwrap();
        assert!(matches!(outcome, UploadOutcome::Uploaded(Some(_))));
        assert_eq!(store.uploads.borrow().len(), 1);
    }

    #[test]
    fn test_second_call_skips_after_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.jpeg");
        std::fs::write(&path, b"derivative bytes").unwrap();

        let store = FakeStore::default();
        let first = ensure_uploaded(&store, &path, "a.jpeg").unwrap();
        let second = ensure_uploaded(&store, &path, "a.jpeg").unwrap();
        assert!(matches!(first, UploadOutcome::Uploaded(_)));
        assert_eq!(second, UploadOutcome::Skipped);
        // Exactly one upload in total
        assert_eq!(store.uploads.borrow().len(), 1);
    }

    #[test]
    fn test_same_bytes_other_name_skip() {
        let tmp = tempfile::tempdir().unwrap();
        let path_a = tmp.path().join("a.jpeg");
        let path_b = tmp.path().join("b.jpeg");
        std::fs::write(&path_a, b"same bytes").unwrap();
        std::fs::write(&path_b, b"same bytes").unwrap();

        let store = FakeStore::default();
        ensure_uploaded(&store, &path_a, "a.jpeg").unwrap();
        let outcome = ensure_uploaded(&store, &path_b, "b.jpeg").unwrap();
        assert_eq!(outcome, UploadOutcome::Skipped);
        assert_eq!(store.uploads.borrow().len(), 1);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.jpeg");
        std::fs::write(&path, b"bytes").unwrap();

        let store = FakeStore {
            fail_transport: true,
            ..FakeStore::default()
        };
        let err = ensure_uploaded(&store, &path, "a.jpeg").unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(store.uploads.borrow().len(), 0);
    }
}
