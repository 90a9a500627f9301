//! Prelude module for common re-exports.
//!
//! ```rust
//! use bametric_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, Settings};

// ─── Filters ────────────────────────────────────────────────────────
pub use crate::filter::{
    BoolOperator, Criterion, Filter, FilterError, Nucleotide, Predicate, ReferenceSelector,
    SamFlags, TagName, TagType, TagValue,
};

// ─── Records ────────────────────────────────────────────────────────
pub use crate::read::{AlignedRead, ReferenceLookup};

// ─── Session ────────────────────────────────────────────────────────
pub use crate::store::{FilterStore, ImportPolicy, ImportSummary, StoreError, DEFAULT_SESSION_FILE};
