//! Trait seams for alignment records and file headers.
//!
//! Filters only need a handful of record fields. [`AlignedRead`] exposes
//! exactly those, so predicates can be evaluated against any record type:
//! the `bam` crate's records in production, [`OwnedRead`] in tests and
//! benchmarks.

use std::collections::HashMap;

use crate::filter::{SamFlags, TagName, TagValue};

/// Read-only view of the record fields used by filters.
pub trait AlignedRead {
    /// Length of the query sequence.
    fn query_len(&self) -> u32;

    /// Mapping quality (255 when unavailable).
    fn mapq(&self) -> u8;

    /// Reference id, `-1` when unmapped.
    fn ref_id(&self) -> i32;

    /// FLAG field.
    fn flags(&self) -> SamFlags;

    /// Number of stored bases, `None` when the sequence is `*`.
    fn sequence_len(&self) -> Option<usize>;

    /// Base at `index` as an ASCII letter.
    fn base_at(&self, index: usize) -> Option<u8>;

    /// Scalar value of an optional field. Array fields are reported as absent.
    fn tag(&self, name: TagName) -> Option<TagValue>;
}

/// Resolve reference names to the ids used in records.
pub trait ReferenceLookup {
    /// Id of the reference called `name`.
    fn reference_id(&self, name: &str) -> Option<i32>;
}

impl ReferenceLookup for [String] {
    fn reference_id(&self, name: &str) -> Option<i32> {
        self.iter()
            .position(|candidate| candidate == name)
            .and_then(|index| i32::try_from(index).ok())
    }
}

impl ReferenceLookup for Vec<String> {
    fn reference_id(&self, name: &str) -> Option<i32> {
        self.as_slice().reference_id(name)
    }
}

/// Owned record with just the fields filters look at.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedRead {
    /// Reference id, `-1` when unmapped.
    pub ref_id: i32,
    /// Mapping quality.
    pub mapq: u8,
    /// FLAG field.
    pub flags: SamFlags,
    /// Bases, `None` for `*`.
    pub sequence: Option<Vec<u8>>,
    /// Optional fields.
    pub tags: HashMap<TagName, TagValue>,
}

impl Default for OwnedRead {
    fn default() -> Self {
        Self {
            ref_id: -1,
            mapq: 255,
            flags: SamFlags::UNMAPPED,
            sequence: None,
            tags: HashMap::new(),
        }
    }
}

impl OwnedRead {
    /// Unmapped read carrying `sequence`.
    pub fn with_sequence(sequence: &str) -> Self {
        Self {
            sequence: Some(sequence.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    /// Mark as mapped to `ref_id` with the given quality.
    pub fn mapped(mut self, ref_id: i32, mapq: u8) -> Self {
        self.ref_id = ref_id;
        self.mapq = mapq;
        self.flags.remove(SamFlags::UNMAPPED);
        self
    }

    /// Replace the FLAG field.
    pub fn with_flags(mut self, flags: SamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Add or replace an optional field.
    pub fn with_tag(mut self, name: TagName, value: TagValue) -> Self {
        self.tags.insert(name, value);
        self
    }
}

impl AlignedRead for OwnedRead {
    fn query_len(&self) -> u32 {
        self.sequence
            .as_ref()
            .map_or(0, |seq| u32::try_from(seq.len()).unwrap_or(u32::MAX))
    }

    fn mapq(&self) -> u8 {
        self.mapq
    }

    fn ref_id(&self) -> i32 {
        self.ref_id
    }

    fn flags(&self) -> SamFlags {
        self.flags
    }

    fn sequence_len(&self) -> Option<usize> {
        self.sequence.as_ref().map(Vec::len)
    }

    fn base_at(&self, index: usize) -> Option<u8> {
        self.sequence.as_ref()?.get(index).copied()
    }

    fn tag(&self, name: TagName) -> Option<TagValue> {
        self.tags.get(&name).cloned()
    }
}
