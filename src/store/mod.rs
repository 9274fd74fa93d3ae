//! On-disk stores mutated by admin commands.
//!
//! - [`classification`]: per-channel account lists keyed by class
//! - [`hostmasks`]: hostmask pattern to account mappings
//!
//! Both stores own their backing JSON file and rewrite it in full after
//! every successful mutation.

pub mod classification;
pub mod hostmasks;

pub use classification::{AlterOutcome, Class, ClassificationStore};
pub use hostmasks::{HostmaskStore, MaskOutcome};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Store persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Read a JSON document, returning `None` if the file does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| StoreError::json(path, e))?;
    Ok(Some(value))
}

/// Write a JSON document.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// half-written store behind.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path).map_err(|e| StoreError::io(&temp_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StoreError::json(path, e))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| StoreError::io(&temp_path, e))?;
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))?;

    debug!(path = %path.display(), "Store saved");
    Ok(())
}
