//! Directory-backed embedding cache
//!
//! One file per `(tenant, dimensions, walk_length, num_walks)` key. Entries
//! are written to a temp file and renamed into place, so readers never see a
//! partial entry. There is no locking: concurrent writers of the same key
//! race and the last rename wins.

use crate::embed::Embeddings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

const ENTRY_EXTENSION: &str = "bin";

/// Per-process temp file counter; the pid separates processes
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Parameters and bookkeeping stored with each entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub tenant_id: String,
    pub dimensions: usize,
    pub walk_length: usize,
    pub num_walks: usize,
    pub num_nodes: usize,
    pub created_at: DateTime<Utc>,
}

impl CacheMetadata {
    fn matches(
        &self,
        tenant_id: &str,
        dimensions: usize,
        walk_length: usize,
        num_walks: usize,
    ) -> bool {
        self.tenant_id == tenant_id
            && self.dimensions == dimensions
            && self.walk_length == walk_length
            && self.num_walks == num_walks
    }
}

/// On-disk entry layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEmbeddings {
    pub node_ids: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
    pub metadata: CacheMetadata,
}

impl CachedEmbeddings {
    fn is_consistent(&self) -> bool {
        self.node_ids.len() == self.vectors.len()
            && self.metadata.num_nodes == self.node_ids.len()
            && self.vectors.iter().all(|v| v.len() == self.metadata.dimensions)
    }
}

/// Embedding cache rooted at a directory
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    directory: PathBuf,
}

impl EmbeddingCache {
    /// Open (creating if needed) a cache directory
    pub fn open(directory: impl AsRef<Path>) -> CacheResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        debug!("Opened embedding cache at {:?}", directory);
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Deterministic entry key; any parameter change yields a different key
    pub fn cache_key(
        tenant_id: &str,
        dimensions: usize,
        walk_length: usize,
        num_walks: usize,
    ) -> String {
        let material = format!("{tenant_id}|{dimensions}|{walk_length}|{num_walks}");
        let digest = Sha256::digest(material.as_bytes());
        let hex = format!("{:x}", digest);
        format!("{}_{}", sanitize(tenant_id), &hex[..16])
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Load embeddings; absent, mismatched or unreadable entries are a miss
    pub fn get(
        &self,
        tenant_id: &str,
        dimensions: usize,
        walk_length: usize,
        num_walks: usize,
    ) -> Option<Embeddings> {
        let path = self.entry_path(&Self::cache_key(tenant_id, dimensions, walk_length, num_walks));
        let entry = match read_entry(&path) {
            Ok(entry) => entry,
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!(tenant_id, "embedding cache miss");
                return None;
            }
            Err(e) => {
                warn!(
                    tenant_id,
                    error = %e,
                    "unreadable embedding cache entry {:?}; treating as miss",
                    path
                );
                return None;
            }
        };

        if !entry.metadata.matches(tenant_id, dimensions, walk_length, num_walks) {
            warn!(tenant_id, "embedding cache metadata mismatch for {:?}; treating as miss", path);
            return None;
        }
        if !entry.is_consistent() {
            warn!(tenant_id, "inconsistent embedding cache entry {:?}; treating as miss", path);
            return None;
        }

        debug!(tenant_id, nodes = entry.node_ids.len(), "embedding cache hit");
        Some(entry.node_ids.into_iter().zip(entry.vectors).collect())
    }

    /// Persist embeddings. Empty input is skipped with a warning.
    pub fn put(
        &self,
        tenant_id: &str,
        embeddings: &Embeddings,
        dimensions: usize,
        walk_length: usize,
        num_walks: usize,
    ) -> CacheResult<()> {
        if embeddings.is_empty() {
            warn!(tenant_id, "refusing to cache empty embeddings");
            return Ok(());
        }

        let mut node_ids: Vec<String> = embeddings.keys().cloned().collect();
        node_ids.sort();
        let vectors = node_ids.iter().map(|id| embeddings[id].clone()).collect();
        let entry = CachedEmbeddings {
            metadata: CacheMetadata {
                tenant_id: tenant_id.to_string(),
                dimensions,
                walk_length,
                num_walks,
                num_nodes: node_ids.len(),
                created_at: Utc::now(),
            },
            node_ids,
            vectors,
        };

        let key = Self::cache_key(tenant_id, dimensions, walk_length, num_walks);
        let path = self.entry_path(&key);
        let temp = self.temp_path(&key);

        let result = write_entry(&temp, &entry)
            .and_then(|_| fs::rename(&temp, &path).map_err(CacheError::from));
        if result.is_err() {
            if let Err(e) = fs::remove_file(&temp) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(tenant_id, error = %e, "failed to remove temp cache file {:?}", temp);
                }
            }
        }
        result?;

        info!(tenant_id, nodes = entry.node_ids.len(), "cached embeddings at {:?}", path);
        Ok(())
    }

    /// Remove one tenant's entries, or every entry when `tenant_id` is `None`.
    ///
    /// Ownership is read from each entry's metadata, since sanitized names
    /// can collide. Unreadable entries are only removed when clearing everything.
    pub fn clear(&self, tenant_id: Option<&str>) -> CacheResult<usize> {
        let mut removed = 0;

        for path in self.entry_paths()? {
            let selected = match tenant_id {
                None => true,
                Some(want) => match read_entry(&path) {
                    Ok(entry) => entry.metadata.tenant_id == want,
                    Err(e) => {
                        warn!(error = %e, "leaving unreadable cache entry {:?}", path);
                        false
                    }
                },
            };
            if selected {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        info!(tenant_id = tenant_id.unwrap_or("*"), removed, "cleared embedding cache");
        Ok(removed)
    }

    /// Metadata of every readable entry
    pub fn entries(&self) -> CacheResult<Vec<CacheMetadata>> {
        let mut entries = Vec::new();
        for path in self.entry_paths()? {
            match read_entry(&path) {
                Ok(entry) => entries.push(entry.metadata),
                Err(e) => warn!(error = %e, "skipping unreadable cache entry {:?}", path),
            }
        }
        entries.sort_by(|a, b| a.tenant_id.cmp(&b.tenant_id).then(a.created_at.cmp(&b.created_at)));
        Ok(entries)
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!(".{key}.{}.{seq}.tmp", std::process::id()))
    }

    fn entry_paths(&self) -> CacheResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            let is_entry = path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION);
            if path.is_file() && is_entry {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn read_entry(path: &Path) -> CacheResult<CachedEmbeddings> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}

fn write_entry(path: &Path, entry: &CachedEmbeddings) -> CacheResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, entry)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Keep ASCII alphanumerics, `-` and `_`; replace everything else
fn sanitize(tenant_id: &str) -> String {
    tenant_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}
