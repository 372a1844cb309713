//! Record file codec: one JSON array per file.
//!
//! Canonical form is a pretty-printed array with two-space indentation,
//! fields in declaration order, and a single trailing newline. Writes go
//! through a temp file and a rename so a crash never leaves a torn file.

use chainreg_kernel::{Record, RecordKind};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Records decoded from one file, with the digest of the bytes as read.
#[derive(Debug, Clone)]
pub struct LoadedRecords<T> {
    pub records: Vec<T>,
    pub digest: String,
}

/// Read and decode a record file.
///
/// The payload must be UTF-8 without NUL bytes, and must be a JSON array of
/// records of kind `T`. Unknown fields are rejected.
pub fn read_records_from_path<T: Record>(
    path: impl AsRef<Path>,
) -> Result<LoadedRecords<T>, CodecError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(io_error(path))?;
    check_record_text(path, T::KIND, &bytes)?;
    let records: Vec<T> = serde_json::from_slice(&bytes).map_err(|e| CodecError::Parse {
        path: path.display().to_string(),
        kind: T::KIND.as_str(),
        message: e.to_string(),
    })?;
    Ok(LoadedRecords {
        records,
        digest: digest_bytes(&bytes),
    })
}

/// Canonical bytes for a record array.
pub fn render_records<T: Serialize>(records: &[T]) -> Result<Vec<u8>, CodecError> {
    let mut rendered =
        serde_json::to_vec_pretty(records).map_err(|e| CodecError::Serialize(e.to_string()))?;
    rendered.push(b'\n');
    Ok(rendered)
}

/// Replace the record file at `path` with `bytes`.
///
/// The bytes land in a sibling staging file first, which is synced and then
/// renamed over `path`. The chain directory is synced after the rename.
pub fn write_bytes_atomically(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), CodecError> {
    let path = path.as_ref();
    let chain_dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = chain_dir {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }

    let staging = staging_path(path);
    let staged = File::create(&staging)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&staging, path));
    if let Err(source) = staged {
        let _ = fs::remove_file(&staging);
        return Err(CodecError::Io {
            path: path.display().to_string(),
            source,
        });
    }

    if let Some(dir) = chain_dir {
        File::open(dir)
            .and_then(|handle| handle.sync_all())
            .map_err(io_error(dir))?;
    }
    Ok(())
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn digest_bytes(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CodecError + '_ {
    move |source| CodecError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// `<file>.tmp.<pid>.<nanos>`, next to the file it replaces.
fn staging_path(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let mut staging: OsString = path.as_os_str().to_os_string();
    staging.push(format!(".tmp.{}.{nanos}", std::process::id()));
    PathBuf::from(staging)
}

/// Name of the chain directory holding a record file.
fn chain_of(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn check_record_text(path: &Path, kind: RecordKind, bytes: &[u8]) -> Result<(), CodecError> {
    let reason = if bytes.contains(&0) {
        "NUL byte in payload"
    } else if std::str::from_utf8(bytes).is_err() {
        "payload is not UTF-8"
    } else {
        return Ok(());
    };
    Err(CodecError::Corrupt {
        chain: chain_of(path),
        kind: kind.as_str(),
        path: path.display().to_string(),
        reason,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: cannot decode {kind} records: {message}")]
    Parse {
        path: String,
        kind: &'static str,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("{chain}/{kind}: corrupt record file {path}: {reason}")]
    Corrupt {
        chain: String,
        kind: &'static str,
        path: String,
        reason: &'static str,
    },
}
