//! Record book persistence with file locking.
//!
//! The whole book lives in one JSON file. Writes go to a temp file in the
//! same directory and are renamed over the original, so readers never see a
//! half-written book.

use crate::records::RecordBook;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// File name of the record book inside the data directory
pub const RECORDS_FILE: &str = "records.json";

impl RecordBook {
    /// Load the record book from a file with shared locking
    ///
    /// Returns an empty book if the file doesn't exist. A file that exists
    /// but cannot be parsed is an error: silently starting over would lose
    /// the user's history on the next save.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No record file at {:?}, starting with an empty book", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let book: RecordBook = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Record file {:?} is corrupted: {}", path, e);
            Error::Json(e)
        })?;

        tracing::debug!(
            "Loaded {} periods and {} ovulation records from {:?}",
            book.periods.len(),
            book.ovulations.len(),
            path
        );
        Ok(book)
    }

    /// Save the record book to a file with exclusive locking
    ///
    /// Atomically writes the book by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other(format!("record path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved record book to {:?}", path);
        Ok(())
    }

    /// Load the book, modify it, and save it back
    ///
    /// An exclusive lock on a sibling `.lock` file is held for the whole
    /// load-modify-save cycle so concurrent writers cannot drop each other's
    /// records. Nothing is written if the closure fails.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut RecordBook) -> Result<T>,
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let guard = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path.with_extension("lock"))?;
        guard.lock_exclusive()?;

        let result = Self::load(path).and_then(|mut book| {
            let value = f(&mut book)?;
            book.save(path)?;
            Ok(value)
        });

        guard.unlock()?;
        result
    }
}
