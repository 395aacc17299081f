//! Thin wrappers around file reads and writes. Every error carries the path that failed, since
//! config, keyfile and checkpoint paths are user supplied and the bare `std::io` messages do not
//! say which file was involved.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum IoError {
    #[error("File read error at path {path}")]
    FileReadError {
        #[source]
        source: std::io::Error,
        path: String,
    },

    #[error("File write error at path {path}")]
    FileWriteError {
        #[source]
        source: std::io::Error,
        path: String,
    },

    #[error("JSON parse error at path {path}")]
    SerdeJsonError {
        #[source]
        source: serde_json::Error,
        path: String,
    },

    #[error("TOML deserialize error at path {path}")]
    TomlDeError {
        #[source]
        source: toml::de::Error,
        path: String,
    },

    #[error("TOML serialize error at path {path}")]
    TomlSerError {
        #[source]
        source: toml::ser::Error,
        path: String,
    },

    #[error("Directory creation error at path {path}")]
    DirCreationError {
        #[source]
        source: std::io::Error,
        path: String,
    },
}

fn read_string(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path)
        .map_err(|e| IoError::FileReadError { source: e, path: path.display().to_string() })
}

/// Writes next to `path` and renames over it, so a crash leaves either the old or the new file.
fn write_string(path: &Path, data: String) -> Result<(), IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    let write_error =
        |e: std::io::Error| IoError::FileWriteError { source: e, path: path.display().to_string() };
    fs::write(&staging, data).map_err(write_error)?;
    fs::rename(&staging, path).map_err(write_error)
}

pub fn read_json<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T, IoError> {
    let json_str = read_string(path)?;
    serde_json::from_str::<T>(&json_str)
        .map_err(|e| IoError::SerdeJsonError { source: e, path: path.display().to_string() })
}

/// Like [`read_json`], but a missing file is `Ok(None)` rather than an error.
pub fn read_json_if_exists<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<Option<T>, IoError> {
    match fs::read_to_string(path) {
        Ok(json_str) => serde_json::from_str::<T>(&json_str)
            .map(Some)
            .map_err(|e| IoError::SerdeJsonError { source: e, path: path.display().to_string() }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IoError::FileReadError { source: e, path: path.display().to_string() }),
    }
}

pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), IoError> {
    let data = serde_json::to_string_pretty(data)
        .map_err(|e| IoError::SerdeJsonError { source: e, path: path.display().to_string() })?;
    write_string(path, data)
}

pub fn read_toml<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T, IoError> {
    let toml_str = read_string(path)?;
    toml::from_str(&toml_str)
        .map_err(|e| IoError::TomlDeError { source: e, path: path.display().to_string() })
}

pub fn write_toml<T: Serialize>(path: &Path, data: &T) -> Result<(), IoError> {
    let data = toml::to_string(data)
        .map_err(|e| IoError::TomlSerError { source: e, path: path.display().to_string() })?;
    write_string(path, data)
}

pub fn create_dir_all(path: &Path) -> Result<(), IoError> {
    fs::create_dir_all(path)
        .map_err(|e| IoError::DirCreationError { source: e, path: path.display().to_string() })
}
