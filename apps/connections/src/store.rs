use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::models::puzzle::parse_puzzle_date;

/// Date-keyed staging file between the fetcher and the loader.
///
/// Each value is the document exactly as the remote endpoint returned it.
/// Keys serialize as `YYYY-MM-DD` and are kept in date order on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    entries: BTreeMap<NaiveDate, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the store at `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(read_error(path, e)),
        }
    }

    /// Reads the store at `path`, which must exist.
    pub fn load_existing(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, PipelineError> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(contents).map_err(|e| {
            PipelineError::StoreIo(format!("{} is not a valid store: {e}", path.display()))
        })?;

        let entries = raw
            .into_iter()
            .map(|(key, document)| match parse_puzzle_date(&key) {
                Some(date) => Ok((date, document)),
                None => Err(PipelineError::StoreIo(format!(
                    "{} has key '{key}', expected YYYY-MM-DD",
                    path.display()
                ))),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self { entries })
    }

    /// Writes the store to `path` so readers only ever see a complete file.
    ///
    /// The JSON goes to a temp file in the target directory, is synced, then
    /// renamed over `path`. On any error the temp file is removed on drop and
    /// the previous contents of `path` are untouched.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let dir = parent_dir(path);
        fs::create_dir_all(&dir)
            .map_err(|e| PipelineError::StoreIo(format!("failed to create {}: {e}", dir.display())))?;

        let tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| PipelineError::StoreIo(format!("failed to create temp file: {e}")))?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &self.entries)
                .map_err(|e| PipelineError::StoreIo(format!("failed to serialize store: {e}")))?;
            writer
                .write_all(b"\n")
                .and_then(|_| writer.flush())
                .map_err(|e| PipelineError::StoreIo(format!("failed to write store: {e}")))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| PipelineError::StoreIo(format!("failed to sync store: {e}")))?;

        tmp.persist(path).map_err(|e| {
            PipelineError::StoreIo(format!("failed to replace {}: {}", path.display(), e.error))
        })?;

        info!("Saved {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Sets the document for `date`, returning the one it replaced.
    pub fn insert(&mut self, date: NaiveDate, document: Value) -> Option<Value> {
        self.entries.insert(date, document)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Value> {
        self.entries.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(NaiveDate, Value)> for Store {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn read_error(path: &Path, e: std::io::Error) -> PipelineError {
    PipelineError::StoreIo(format!("failed to read {}: {e}", path.display()))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
