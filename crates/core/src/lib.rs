pub mod albums;
pub mod error;
pub mod hash;
pub mod library;
pub mod resolver;
pub mod store;

use serde_json::json;
use tracing::{info, warn};

use std::path::Path;

use albums::AlbumStructure;
use error::{Error, Result};
use library::{AssetRow, Library};
use store::{ContentStore, UploadOutcome};

pub const DEFAULT_LIBRARY_CONTENT_TYPE: &str = "photos-library";
pub const DEFAULT_ASSET_CONTENT_TYPE: &str = "photos-asset";

/// Callback for reporting migration progress.
pub enum MigrateProgress {
    /// Starting the album phase.
    AlbumsStart { total: usize },
    /// One album row was added to the structure.
    AlbumAdded { label: String },
    /// The library document (with the serialized tree) was persisted.
    AlbumsSaved { ouuid: String },
    /// Starting the asset phase.
    AssetsStart { total: usize },
    /// One asset document was persisted.
    AssetSaved { uuid: String, uploaded: bool },
    /// One asset failed and was skipped; the run continues.
    AssetFailed { uuid: String, message: String },
}

/// What happened over a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrateSummary {
    pub albums: usize,
    pub assets: usize,
    /// Assets whose derivative was uploaded.
    pub uploaded: usize,
    /// Assets whose derivative was already present in the store.
    pub skipped: usize,
    /// Assets with no derivative on disk.
    pub empty: usize,
    /// Assets abandoned after a per-asset error.
    pub failed: usize,
}

enum AssetOutcome {
    Uploaded,
    Skipped,
    Empty,
}

/// Sequences the migration: album tree build and persist, then one
/// document per asset. Source query and initialization errors are fatal;
/// anything that goes wrong while processing a single asset is logged,
/// counted, and skipped.
pub struct Migrator<S> {
    library: Library,
    store: S,
    library_content_type: String,
    asset_content_type: String,
}

impl<S: ContentStore> Migrator<S> {
    pub fn new(
        library: Library,
        store: S,
        library_content_type: &str,
        asset_content_type: &str,
    ) -> Self {
        Self {
            library,
            store,
            library_content_type: library_content_type.to_string(),
            asset_content_type: asset_content_type.to_string(),
        }
    }

    /// Give the destination store back, e.g. to inspect it after a run.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Run the full migration. Calls `progress_cb` with progress updates
    /// if provided.
    pub fn run(
        &self,
        mut progress_cb: Option<&mut dyn FnMut(MigrateProgress)>,
    ) -> Result<MigrateSummary> {
        let mut summary = MigrateSummary::default();
        self.build_album_structure(&mut progress_cb, &mut summary)?;
        self.import_assets(&mut progress_cb, &mut summary)?;
        info!(
            albums = summary.albums,
            assets = summary.assets,
            uploaded = summary.uploaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "migration finished"
        );
        Ok(summary)
    }

    /// The identifier list stored on an album: one entry per attached
    /// asset, `"{content_type}:{ouuid}"`.
    fn asset_identifiers(&self, album_pk: i64) -> Result<Vec<String>> {
        let ids = self
            .library
            .album_asset_pks(album_pk)?
            .into_iter()
            .map(|asset_pk| {
                format!(
                    "{}:{}",
                    self.asset_content_type,
                    hash::derive_ouuid(&self.asset_content_type, asset_pk)
                )
            })
            .collect();
        Ok(ids)
    }

    fn build_album_structure(
        &self,
        progress_cb: &mut Option<&mut dyn FnMut(MigrateProgress)>,
        summary: &mut MigrateSummary,
    ) -> Result<()> {
        let rows = self.library.album_rows()?;
        if let Some(cb) = progress_cb {
            cb(MigrateProgress::AlbumsStart { total: rows.len() });
        }

        let mut structure = AlbumStructure::new();
        for row in &rows {
            let asset_ids = self.asset_identifiers(row.pk)?;
            structure.add_row(row, asset_ids);
            if let Some(cb) = progress_cb {
                cb(MigrateProgress::AlbumAdded {
                    label: row.title.clone().unwrap_or_default(),
                });
            }
        }
        summary.albums = structure.len();

        let path = self.library.root().to_string_lossy().to_string();
        let document = json!({
            "albums": structure.serialize()?,
            "path": path,
        });
        let ouuid = hash::derive_ouuid(&self.library_content_type, &path);
        self.store
            .save_document(&self.library_content_type, &ouuid, &document)?;

        if let Some(cb) = progress_cb {
            cb(MigrateProgress::AlbumsSaved { ouuid });
        }
        Ok(())
    }

    fn import_assets(
        &self,
        progress_cb: &mut Option<&mut dyn FnMut(MigrateProgress)>,
        summary: &mut MigrateSummary,
    ) -> Result<()> {
        let rows = self.library.asset_rows()?;
        if let Some(cb) = progress_cb {
            cb(MigrateProgress::AssetsStart { total: rows.len() });
        }
        summary.assets = rows.len();

        // A missing derivatives root would make every asset resolve empty
        // and overwrite previously good documents; abort instead.
        let derivatives = self.library.derivatives_dir();
        if !derivatives.is_dir() {
            return Err(Error::DerivativesDirNotFound(derivatives));
        }

        for row in &rows {
            match self.import_one_asset(row, &derivatives) {
                Ok(outcome) => {
                    let uploaded = matches!(outcome, AssetOutcome::Uploaded);
                    match outcome {
                        AssetOutcome::Uploaded => summary.uploaded += 1,
                        AssetOutcome::Skipped => summary.skipped += 1,
                        AssetOutcome::Empty => summary.empty += 1,
                    }
                    if let Some(cb) = progress_cb {
                        cb(MigrateProgress::AssetSaved {
                            uuid: row.uuid.clone(),
                            uploaded,
                        });
                    }
                }
                // Per-asset failures must not end the run
                Err(err) => {
                    warn!(uuid = %row.uuid, error = %err, "asset skipped");
                    summary.failed += 1;
                    if let Some(cb) = progress_cb {
                        cb(MigrateProgress::AssetFailed {
                            uuid: row.uuid.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn import_one_asset(&self, row: &AssetRow, derivatives: &Path) -> Result<AssetOutcome> {
        let resolution = resolver::resolve_asset(&self.store, derivatives, &row.uuid)?;

        let (file, outcome) = match &resolution {
            Some(resolution) => (
                serde_json::to_value(&resolution.file)?,
                match resolution.upload {
                    UploadOutcome::Skipped => AssetOutcome::Skipped,
                    UploadOutcome::Uploaded(_) => AssetOutcome::Uploaded,
                },
            ),
            None => (json!({}), AssetOutcome::Empty),
        };
        let filename = row
            .original_filename
            .clone()
            .or_else(|| resolution.as_ref().map(|r| r.file.filename.clone()));

        let document = json!({
            "filename": filename,
            "file": file,
        });
        let ouuid = hash::derive_ouuid(&self.asset_content_type, row.pk);
        self.store
            .save_document(&self.asset_content_type, &ouuid, &document)?;
        Ok(outcome)
    }
}
