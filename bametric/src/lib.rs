//! # BAMetric Library
//!
//! SAM/BAM side of BAMetric: record format detection, adapters exposing
//! `bam` crate records to the filter evaluator, the apply engine and the
//! logging setup shared by the binary and the tests.
//!
//! # Module Structure
//!
//! - [`format`] - SAM/BAM detection from file names
//! - [`bam_io`] - Readers, writers and `AlignedRead` adapters
//! - [`apply`] - Streaming a file through a compiled filter
//! - [`logging`] - `tracing-subscriber` initialisation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         bametric                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │ FilterStore  │──►│   Applier    │──►│ bam_io readers / │  │
//! │  │ (common)     │   │ (per file)   │   │ writers          │  │
//! │  └──────────────┘   └──────┬───────┘   └──────────────────┘  │
//! │                            │                                 │
//! │                            ▼                                 │
//! │                   ┌────────────────┐                         │
//! │                   │  Predicate     │ evaluates AlignedRead   │
//! │                   └────────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod apply;
pub mod bam_io;
pub mod format;
pub mod logging;

pub use crate::apply::{ApplyError, ApplyOptions, ApplyStats, Applier};
pub use crate::format::RecordFormat;
