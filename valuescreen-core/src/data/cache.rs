//! Identifier cache.
//!
//! Layout: `{cache_dir}/identifiers.json`
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity check on load (JSON parse + BLAKE3 hash of the identifier list)
//! - Quarantine for corrupt files (`identifiers.json.quarantined`); a
//!   quarantined cache reads as missing so the caller refetches

use super::source::SourceError;
use crate::table::Identifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CACHE_FILE: &str = "identifiers.json";

/// Contents of the cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedIdentifiers {
    pub source: String,
    pub fetched_at: chrono::NaiveDateTime,
    pub content_hash: String,
    pub identifiers: Vec<Identifier>,
}

impl CachedIdentifiers {
    pub fn new(source: impl Into<String>, identifiers: Vec<Identifier>) -> Self {
        Self {
            source: source.into(),
            fetched_at: chrono::Local::now().naive_local(),
            content_hash: identifiers_hash(&identifiers),
            identifiers,
        }
    }

    pub fn is_intact(&self) -> bool {
        self.content_hash == identifiers_hash(&self.identifiers)
    }
}

/// BLAKE3 over the newline-joined identifier list.
pub fn identifiers_hash(identifiers: &[Identifier]) -> String {
    let mut hasher = blake3::Hasher::new();
    for id in identifiers {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

pub struct IdentifierCache {
    cache_dir: PathBuf,
}

impl IdentifierCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// Write the identifier list atomically.
    pub fn store(&self, cached: &CachedIdentifiers) -> Result<(), SourceError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| SourceError::Cache(format!("failed to create dir: {e}")))?;

        let json = serde_json::to_string_pretty(cached)
            .map_err(|e| SourceError::Cache(format!("serialization: {e}")))?;

        let path = self.path();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| SourceError::Cache(format!("write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            SourceError::Cache(format!("atomic rename failed: {e}"))
        })?;

        tracing::debug!(path = %path.display(), count = cached.identifiers.len(), "identifier cache written");
        Ok(())
    }

    /// Read the cache. `Ok(None)` when missing or quarantined.
    pub fn load(&self) -> Result<Option<CachedIdentifiers>, SourceError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SourceError::Cache(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };

        let problem = match serde_json::from_str::<CachedIdentifiers>(&content) {
            Ok(cached) if cached.is_intact() && !cached.identifiers.is_empty() => {
                return Ok(Some(cached))
            }
            Ok(cached) if cached.identifiers.is_empty() => "empty identifier list".to_string(),
            Ok(_) => "content hash mismatch".to_string(),
            Err(e) => format!("unreadable: {e}"),
        };

        let quarantine = path.with_extension("json.quarantined");
        tracing::warn!(
            path = %path.display(),
            problem = %problem,
            "quarantining corrupt identifier cache"
        );
        let _ = fs::rename(&path, &quarantine);
        Ok(None)
    }
}
