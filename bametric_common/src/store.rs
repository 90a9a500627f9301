//! Session file holding named filters.
//!
//! A session is a small JSON document:
//!
//! ```json
//! { "version": 1, "filters": [ { "name": "short", "opposite": false,
//!   "criterion": { "kind": "length", "min_len": 20, "max_len": 50 } } ] }
//! ```
//!
//! Filters keep their insertion order and names are unique. Every mutation
//! goes through [`FilterStore`], which rewrites the whole file atomically on
//! [`FilterStore::save`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::filter::{Filter, FilterError};

/// Session document version written by this crate.
pub const SESSION_VERSION: u32 = 1;

/// Default session file name, relative to the working directory.
pub const DEFAULT_SESSION_FILE: &str = "bametric.json";

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `init` on an existing session without `force`.
    #[error("Session already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    /// Session file missing.
    #[error("No session at {0}; run `bametric init` first")]
    NotInitialized(PathBuf),

    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed session JSON.
    #[error("Failed to parse session {path}: {source}")]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Session could not be encoded.
    #[error("Failed to serialize session: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Document written by an incompatible version.
    #[error("Unsupported session version {0} (expected {expected})", expected = SESSION_VERSION)]
    UnsupportedVersion(u32),

    /// A filter with this name already exists.
    #[error("Filter {0:?} already exists")]
    DuplicateFilter(String),

    /// No filter with this name.
    #[error("Unknown filter {0:?}")]
    UnknownFilter(String),

    /// Import rejected because names collide.
    #[error("Import would overwrite existing filters: {}", .0.join(", "))]
    ImportConflict(Vec<String>),

    /// A stored filter is invalid.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// What `import` does with names already present in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    /// Reject the whole import.
    #[default]
    Fail,
    /// Replace the existing filter in place.
    Overwrite,
    /// Keep the existing filter.
    Skip,
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            _ => Err(format!(
                "unknown import policy {s:?}: expected fail, overwrite or skip"
            )),
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// New filters appended.
    pub added: usize,
    /// Existing filters replaced.
    pub replaced: usize,
    /// Incoming filters ignored.
    pub skipped: usize,
}

/// On-disk session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Document version.
    pub version: u32,
    /// Filters in insertion order.
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            version: SESSION_VERSION,
            filters: Vec::new(),
        }
    }
}

impl Session {
    /// Read and check a session document.
    ///
    /// # Errors
    /// `NotInitialized` if the file is missing, `Parse` on malformed JSON,
    /// `UnsupportedVersion`, `DuplicateFilter` or `Filter` when the content
    /// is inconsistent.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotInitialized(path.to_path_buf())
            } else {
                StoreError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let session: Session = serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        session.check()?;
        Ok(session)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.version != SESSION_VERSION {
            return Err(StoreError::UnsupportedVersion(self.version));
        }
        for (index, filter) in self.filters.iter().enumerate() {
            filter.validate()?;
            if self.filters[..index].iter().any(|f| f.name == filter.name) {
                return Err(StoreError::DuplicateFilter(filter.name.clone()));
            }
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(StoreError::Serialize)
    }

    /// Write atomically: a uniquely named temporary file in the same
    /// directory is renamed over `path`.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json()?;
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".bametric")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.write_all(b"\n").map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        // A failed persist removes the temporary file on drop.
        file.persist(path).map_err(|e| io_err(e.error))?;

        debug!("Wrote {} filters to {}", self.filters.len(), path.display());
        Ok(())
    }
}

/// Session bound to its file.
#[derive(Debug)]
pub struct FilterStore {
    path: PathBuf,
    session: Session,
}

impl FilterStore {
    /// Create an empty session at `path`.
    ///
    /// # Errors
    /// `AlreadyExists` if the file exists and `force` is false.
    pub fn init(path: &Path, force: bool) -> Result<Self, StoreError> {
        if path.exists() && !force {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        let store = Self {
            path: path.to_path_buf(),
            session: Session::default(),
        };
        store.save()?;
        info!("Initialized BAMetric session at {}", path.display());
        Ok(store)
    }

    /// Open an existing session.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let session = Session::read(path)?;
        debug!(
            "Opened session {} with {} filters",
            path.display(),
            session.filters.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            session,
        })
    }

    /// Persist the session.
    pub fn save(&self) -> Result<(), StoreError> {
        self.session.write(&self.path)
    }

    /// Session file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filters in insertion order.
    pub fn filters(&self) -> &[Filter] {
        &self.session.filters
    }

    /// Number of stored filters.
    pub fn len(&self) -> usize {
        self.session.filters.len()
    }

    /// `true` when no filters are stored.
    pub fn is_empty(&self) -> bool {
        self.session.filters.is_empty()
    }

    /// `true` when a filter called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.session.filters.iter().position(|f| f.name == name)
    }

    /// Look up a filter by name.
    pub fn get(&self, name: &str) -> Result<&Filter, StoreError> {
        self.session
            .filters
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| StoreError::UnknownFilter(name.to_string()))
    }

    /// Append a filter.
    ///
    /// # Errors
    /// `DuplicateFilter` if the name is taken.
    pub fn insert(&mut self, filter: Filter) -> Result<(), StoreError> {
        if self.contains(&filter.name) {
            return Err(StoreError::DuplicateFilter(filter.name));
        }
        debug!("Adding filter {}", filter);
        self.session.filters.push(filter);
        Ok(())
    }

    /// Delete a filter and return it.
    ///
    /// Combined filters that embedded it keep their own copy.
    pub fn remove(&mut self, name: &str) -> Result<Filter, StoreError> {
        let index = self
            .position(name)
            .ok_or_else(|| StoreError::UnknownFilter(name.to_string()))?;
        Ok(self.session.filters.remove(index))
    }

    /// First free name of the form `<kind>_<n>`, `n >= 1`.
    pub fn generate_name(&self, kind: &str) -> String {
        (1..)
            .map(|n: usize| format!("{kind}_{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| kind.to_string())
    }

    /// Merge the filters of another session file.
    pub fn import(&mut self, path: &Path, policy: ImportPolicy) -> Result<ImportSummary, StoreError> {
        let incoming = Session::read(path)?;
        let summary = self.merge(incoming, policy)?;
        info!(
            "Imported {} from {}: {} added, {} replaced, {} skipped",
            summary.added + summary.replaced,
            path.display(),
            summary.added,
            summary.replaced,
            summary.skipped
        );
        Ok(summary)
    }

    /// Merge an already loaded session.
    pub fn merge(&mut self, incoming: Session, policy: ImportPolicy) -> Result<ImportSummary, StoreError> {
        if policy == ImportPolicy::Fail {
            let conflicts: Vec<String> = incoming
                .filters
                .iter()
                .filter(|f| self.contains(&f.name))
                .map(|f| f.name.clone())
                .collect();
            if !conflicts.is_empty() {
                return Err(StoreError::ImportConflict(conflicts));
            }
        }

        let mut summary = ImportSummary::default();
        for filter in incoming.filters {
            match (self.position(&filter.name), policy) {
                (None, _) => {
                    self.session.filters.push(filter);
                    summary.added += 1;
                }
                (Some(index), ImportPolicy::Overwrite) => {
                    self.session.filters[index] = filter;
                    summary.replaced += 1;
                }
                (Some(_), _) => summary.skipped += 1,
            }
        }
        Ok(summary)
    }

    /// Session as pretty JSON.
    pub fn export(&self) -> Result<String, StoreError> {
        self.session.to_json()
    }

    /// Write the session to another file.
    pub fn export_to(&self, path: &Path) -> Result<(), StoreError> {
        self.session.write(path)?;
        info!("Exported {} filters to {}", self.len(), path.display());
        Ok(())
    }
}
