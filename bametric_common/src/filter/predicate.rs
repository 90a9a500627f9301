//! Compiled filter evaluation.
//!
//! A [`Predicate`] is built once per input file (reference names depend on
//! the file header) and then evaluated against every record.

use super::{BoolOperator, Criterion, Filter, FilterError, ReferenceSelector, SamFlags};
use super::{TagName, TagValue};
use crate::read::{AlignedRead, ReferenceLookup};

/// Evaluation tree of a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    opposite: bool,
    test: Test,
}

#[derive(Debug, Clone, PartialEq)]
enum Test {
    Length { min: u32, max: u32 },
    Mapq { min: u8, max: u8 },
    Reference(i32),
    Tag { name: TagName, value: TagValue },
    Nucleotide { position: i64, base: u8, n_is_wildcard: bool },
    Flag(SamFlags),
    Combined {
        operator: BoolOperator,
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
}

impl Predicate {
    /// Build the evaluation tree for `filter`.
    ///
    /// # Errors
    /// Returns `FilterError::UnknownReference` if a reference name (at any
    /// depth) is missing from `references`.
    pub fn compile(filter: &Filter, references: &dyn ReferenceLookup) -> Result<Self, FilterError> {
        let test = match &filter.criterion {
            Criterion::Length { min_len, max_len } => Test::Length {
                min: *min_len,
                max: *max_len,
            },
            Criterion::Mapq { min_mapq, max_mapq } => Test::Mapq {
                min: *min_mapq,
                max: *max_mapq,
            },
            Criterion::Reference { reference } => match reference {
                ReferenceSelector::Id(id) => Test::Reference(*id),
                ReferenceSelector::Name(name) => Test::Reference(
                    references
                        .reference_id(name)
                        .ok_or_else(|| FilterError::UnknownReference(name.clone()))?,
                ),
            },
            Criterion::Tag { tag, value } => Test::Tag {
                name: *tag,
                value: value.clone(),
            },
            Criterion::Nucleotide {
                position,
                nucleotide,
                n_is_wildcard,
            } => Test::Nucleotide {
                position: *position,
                base: nucleotide.as_byte(),
                n_is_wildcard: *n_is_wildcard,
            },
            Criterion::Flag { remove_flags } => Test::Flag(*remove_flags),
            Criterion::Combined {
                operator,
                left,
                right,
            } => Test::Combined {
                operator: *operator,
                left: Box::new(Self::compile(left, references)?),
                right: Box::new(Self::compile(right, references)?),
            },
        };

        Ok(Self {
            opposite: filter.opposite,
            test,
        })
    }

    /// `true` when the read passes and should be kept.
    pub fn evaluate<R: AlignedRead + ?Sized>(&self, read: &R) -> bool {
        let result = match &self.test {
            Test::Length { min, max } => (*min..=*max).contains(&read.query_len()),
            Test::Mapq { min, max } => (*min..=*max).contains(&read.mapq()),
            Test::Reference(id) => read.ref_id() == *id,
            Test::Tag { name, value } => read.tag(*name).is_some_and(|found| found == *value),
            Test::Nucleotide {
                position,
                base,
                n_is_wildcard,
            } => nucleotide_matches(read, *position, *base, *n_is_wildcard),
            Test::Flag(remove) => !read.flags().intersects(*remove),
            Test::Combined {
                operator,
                left,
                right,
            } => {
                let left = left.evaluate(read);
                let right = right.evaluate(read);
                operator.apply(left, right)
            }
        };
        result != self.opposite
    }
}

fn nucleotide_matches<R: AlignedRead + ?Sized>(
    read: &R,
    position: i64,
    expected: u8,
    n_is_wildcard: bool,
) -> bool {
    let Some(len) = read.sequence_len() else {
        return false;
    };
    let Some(index) = resolve_index(position, len) else {
        return false;
    };
    let Some(found) = read.base_at(index) else {
        return false;
    };

    let found = found.to_ascii_uppercase();
    (n_is_wildcard && found == b'N') || found == expected
}

/// Map a signed position to an index into a sequence of length `len`.
fn resolve_index(position: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if position < 0 { len + position } else { position };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}
