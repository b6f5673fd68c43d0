use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use crate::error::{Error, Result};

/// One album or folder row from `ZGENERICALBUM`.
#[derive(Debug, Clone)]
pub struct AlbumRow {
    pub pk: i64,
    pub parent_pk: Option<i64>,
    pub title: Option<String>,
    pub uuid: String,
}

/// One importable asset row, joined with its extended attributes.
#[derive(Debug, Clone)]
pub struct AssetRow {
    pub pk: i64,
    pub uuid: String,
    pub original_filename: Option<String>,
}

/// Read-only view over the `Photos.sqlite` database inside an Apple Photos
/// library bundle.
#[derive(Debug)]
pub struct Library {
    conn: Connection,
    root: PathBuf,
}

impl Library {
    /// Open the library at `photos_path` (the `.photoslibrary` bundle).
    pub fn open(photos_path: &Path) -> Result<Self> {
        let db_path = photos_path.join("database").join("Photos.sqlite");
        if !db_path.is_file() {
            return Err(Error::LibraryNotFound(photos_path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn,
            root: photos_path.to_path_buf(),
        })
    }

    /// Path of the library bundle this instance reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the generated derivative files.
    pub fn derivatives_dir(&self) -> PathBuf {
        self.root.join("resources").join("derivatives")
    }

    /// User-created albums and folders, ordered so that a folder always
    /// precedes the albums it contains.
    pub fn album_rows(&self) -> Result<Vec<AlbumRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT Z_PK, ZPARENTFOLDER, ZTITLE, ZUUID
             FROM ZGENERICALBUM
             WHERE ZCREATORBUNDLEID IS NOT NULL
             ORDER BY Z_FOK_PARENTFOLDER ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AlbumRow {
                    pk: row.get(0)?,
                    parent_pk: row.get(1)?,
                    title: row.get(2)?,
                    uuid: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Primary keys of the assets attached to one album, in association
    /// order.
    pub fn album_asset_pks(&self, album_pk: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT Z_3ASSETS FROM Z_26ASSETS WHERE Z_26ALBUMS = ?1")?;
        let pks = stmt
            .query_map(params![album_pk], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pks)
    }

    /// All importable assets with their original filename.
    pub fn asset_rows(&self) -> Result<Vec<AssetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT ZASSET.Z_PK, ZASSET.ZUUID, ZADDITIONALASSETATTRIBUTES.ZORIGINALFILENAME
             FROM ZADDITIONALASSETATTRIBUTES, ZASSET
             WHERE ZASSET.ZEXTENDEDATTRIBUTES = ZADDITIONALASSETATTRIBUTES.Z_PK",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AssetRow {
                    pk: row.get(0)?,
                    uuid: row.get(1)?,
                    original_filename: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
