//! BAMetric Common Library
//!
//! Shared building blocks for the BAMetric workspace: the filter model, the
//! predicate evaluator, the JSON session store and the runtime settings.
//!
//! This crate has no SAM/BAM codec dependency. Alignment records are seen
//! through the [`read::AlignedRead`] trait and header lookups through
//! [`read::ReferenceLookup`], which the `bametric` crate implements for the
//! `bam` crate types.
//!
//! # Module Structure
//!
//! - [`filter`] - Filter definitions, operators, tag and flag types
//! - [`read`] - Trait seams for alignment records and headers
//! - [`store`] - Session file holding named filters
//! - [`config`] - Settings loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use bametric_common::filter::{Criterion, Filter};
//!
//! let filter = Filter::new(
//!     "short_reads",
//!     false,
//!     Criterion::Length { min_len: 20, max_len: 50 },
//! )
//! .unwrap();
//! assert_eq!(filter.kind(), "length");
//! ```

pub mod config;
pub mod filter;
pub mod prelude;
pub mod read;
pub mod store;
