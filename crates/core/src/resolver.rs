use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::store::{ensure_uploaded, ContentStore, UploadOutcome};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Derivative extension generated by Photos.
const DERIVATIVE_SUFFIX: &str = ".jpeg";

/// One on-disk derivative file for an asset.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Metadata of the derivative chosen to represent an asset, persisted as
/// the `file` object of the asset document.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAsset {
    pub sha256: String,
    pub filename: String,
    pub mimetype: String,
    pub filesize: u64,
}

/// Result of resolving one asset: the chosen file plus what the upload
/// gate did with it.
#[derive(Debug)]
pub struct Resolution {
    pub file: ResolvedAsset,
    pub upload: UploadOutcome,
}

/// List derivative files under `dir` whose name starts with `uuid`, in
/// directory-walk order. Unreadable entries are skipped.
pub fn find_candidates(dir: &Path, uuid: &str) -> Vec<CandidateFile> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            if !name.starts_with(uuid) || !name.ends_with(DERIVATIVE_SUFFIX) {
                return None;
            }
            let size = entry.metadata().ok()?.len();
            Some(CandidateFile {
                path: entry.into_path(),
                size,
            })
        })
        .collect()
}

/// Pick the strictly largest candidate. Ties keep the first-seen winner
/// (strict `>`, left to right).
pub fn select_largest(candidates: &[CandidateFile]) -> Option<&CandidateFile> {
    let mut best: Option<&CandidateFile> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.size <= current.size => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Best-effort MIME sniffing from file content.
pub fn detect_mime(path: &Path) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        _ => FALLBACK_MIME.to_string(),
    }
}

/// Resolve the best derivative of the asset `uuid` under `dir`: pick the
/// largest candidate, hash it through the store, and make sure the bytes
/// are present in the destination.
///
/// `Ok(None)` means no derivative exists; no store call is made in that
/// case and callers persist an empty file object.
pub fn resolve_asset<S: ContentStore>(
    store: &S,
    dir: &Path,
    uuid: &str,
) -> Result<Option<Resolution>> {
    let candidates = find_candidates(dir, uuid);
    let Some(winner) = select_largest(&candidates) else {
        debug!(uuid, "no derivative found");
        return Ok(None);
    };

    let real_path = winner
        .path
        .canonicalize()
        .map_err(|_| Error::MissingPath(winner.path.clone()))?;
    let filename = real_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let sha256 = store.hash_file(&real_path)?;
    let mimetype = detect_mime(&real_path);
    let upload = ensure_uploaded(store, &real_path, &filename)?;

    Ok(Some(Resolution {
        file: ResolvedAsset {
            sha256,
            filename,
            mimetype,
            filesize: winner.size,
        },
        upload,
    }))
}
