//! Run manifest export (JSON), written next to the collection artifact.

use crate::config::CollectConfig;
use crate::data::collect::RunSummary;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub config: CollectConfig,
    pub summary: RunSummary,
    /// BLAKE3 of the artifact, absent when no artifact was written.
    pub artifact_blake3: Option<String>,
}

/// `<artifact>.manifest.json`
pub fn manifest_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".manifest.json");
    PathBuf::from(name)
}

/// Stream a file through BLAKE3. `Ok(None)` when the file does not exist.
pub fn hash_file(path: &Path) -> Result<Option<String>, ManifestError> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(hasher.finalize().to_hex().to_string()))
}

/// Hash the artifact and write the manifest beside it. Returns the manifest path.
pub fn write_manifest(config: &CollectConfig, summary: &RunSummary) -> Result<PathBuf, ManifestError> {
    let manifest = RunManifest {
        timestamp: chrono::Utc::now(),
        config: config.clone(),
        summary: summary.clone(),
        artifact_blake3: hash_file(&config.output_file)?,
    };

    let path = manifest_path(&config.output_file);
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&path, json).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
