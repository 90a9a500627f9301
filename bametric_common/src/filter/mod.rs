//! Filter definitions.
//!
//! A [`Filter`] is a named, serializable description of a test applied to
//! every alignment record. Primitive criteria look at a single record field.
//! [`Criterion::Combined`] joins two complete filters with a
//! [`BoolOperator`]; the operands are embedded by value so a combined filter
//! stays valid when its operands are later removed from the session.
//!
//! Filters are not evaluated directly. [`Filter::compile`] resolves reference
//! names against a file header and returns a [`Predicate`].

pub mod flags;
pub mod nucleotide;
pub mod operator;
pub mod predicate;
pub mod tag;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use flags::SamFlags;
pub use nucleotide::Nucleotide;
pub use operator::BoolOperator;
pub use predicate::Predicate;
pub use tag::{TagName, TagType, TagValue};

use crate::read::ReferenceLookup;

/// Errors raised while building or compiling a filter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Filter name is empty or contains unusable characters.
    #[error("Invalid filter name {0:?}: names must be non-empty, trimmed and free of control characters")]
    InvalidName(String),

    /// Lower bound above upper bound.
    #[error("Invalid {field} range: minimum {min} is greater than maximum {max}")]
    InvalidRange {
        /// Criterion field family (`length`, `mapq`).
        field: &'static str,
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },

    /// Tag name is not two characters `[A-Za-z][A-Za-z0-9]`.
    #[error("Invalid tag name {0:?}: expected two characters matching [A-Za-z][A-Za-z0-9]")]
    InvalidTagName(String),

    /// Tag type keyword not recognised.
    #[error("Invalid tag type {0:?}: expected char, int, float or string")]
    InvalidTagType(String),

    /// Tag value does not parse as the requested type.
    #[error("Invalid {ty} tag value {value:?}: {reason}")]
    InvalidTagValue {
        /// Requested type.
        ty: TagType,
        /// Offending input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Nucleotide is not one of A, C, G, T, N.
    #[error("Invalid nucleotide {0:?}: expected one of A, C, G, T or N")]
    InvalidNucleotide(String),

    /// Flag expression could not be parsed.
    #[error("Invalid flag expression {0:?}: expected a number, 0x-hex value or flag names joined by '|'")]
    InvalidFlags(String),

    /// Boolean operator keyword not recognised.
    #[error("Unknown operator {0:?}: expected one of AND, OR, XOR, XNOR, NAND, NOR, IMPLIES")]
    UnknownOperator(String),

    /// Reference name missing from the input header.
    #[error("Reference {0:?} is not present in the input header")]
    UnknownReference(String),
}

/// Reference sequence a read must be aligned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceSelector {
    /// Numeric reference id as stored in BAM records (`-1` for unmapped).
    Id(i32),
    /// Reference name, resolved against the header of each input file.
    Name(String),
}

impl FromStr for ReferenceSelector {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FilterError::UnknownReference(s.to_string()));
        }
        Ok(match trimmed.parse::<i32>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(trimmed.to_string()),
        })
    }
}

impl fmt::Display for ReferenceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

/// What a filter tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    /// Query length within `[min_len, max_len]`.
    Length {
        /// Inclusive lower bound.
        min_len: u32,
        /// Inclusive upper bound.
        max_len: u32,
    },
    /// Optional field present with the given value.
    Tag {
        /// Tag to look up.
        tag: TagName,
        /// Value it must hold.
        value: TagValue,
    },
    /// Mapping quality within `[min_mapq, max_mapq]`.
    Mapq {
        /// Inclusive lower bound.
        min_mapq: u8,
        /// Inclusive upper bound.
        max_mapq: u8,
    },
    /// Aligned to a given reference sequence.
    Reference {
        /// Reference id or name.
        reference: ReferenceSelector,
    },
    /// Given base at a given read position.
    Nucleotide {
        /// 0-based from the 5' end when non-negative, from the 3' end when
        /// negative (`-1` is the last base).
        position: i64,
        /// Expected base.
        nucleotide: Nucleotide,
        /// Treat `N` in the read as matching any base.
        #[serde(default)]
        n_is_wildcard: bool,
    },
    /// None of the given FLAG bits set.
    Flag {
        /// Reads with any of these bits are removed.
        #[serde(with = "flags::serde_bits")]
        remove_flags: SamFlags,
    },
    /// Two filters joined with a boolean operator.
    Combined {
        /// Operator applied to both results.
        operator: BoolOperator,
        /// First operand.
        left: Box<Filter>,
        /// Second operand.
        right: Box<Filter>,
    },
}

impl Criterion {
    /// Short kind keyword, used for generated names.
    pub fn kind(&self) -> &'static str {
        match self {
            Criterion::Length { .. } => "length",
            Criterion::Tag { .. } => "tag",
            Criterion::Mapq { .. } => "mapq",
            Criterion::Reference { .. } => "reference",
            Criterion::Nucleotide { .. } => "nucleotide",
            Criterion::Flag { .. } => "flag",
            Criterion::Combined { .. } => "combined",
        }
    }

    fn validate(&self) -> Result<(), FilterError> {
        match *self {
            Criterion::Length { min_len, max_len } if min_len > max_len => {
                Err(FilterError::InvalidRange {
                    field: "length",
                    min: min_len,
                    max: max_len,
                })
            }
            Criterion::Mapq { min_mapq, max_mapq } if min_mapq > max_mapq => {
                Err(FilterError::InvalidRange {
                    field: "mapq",
                    min: min_mapq.into(),
                    max: max_mapq.into(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// A named filter as stored in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Unique name within a session.
    pub name: String,
    /// Invert the result.
    #[serde(default)]
    pub opposite: bool,
    /// The test itself.
    pub criterion: Criterion,
}

impl Filter {
    /// Build a validated filter.
    pub fn new(
        name: impl Into<String>,
        opposite: bool,
        criterion: Criterion,
    ) -> Result<Self, FilterError> {
        let name = name.into();
        validate_name(&name)?;
        criterion.validate()?;
        Ok(Self {
            name,
            opposite,
            criterion,
        })
    }

    /// Join two filters. Both operands are copied into the new filter.
    pub fn combine(
        name: impl Into<String>,
        left: Filter,
        operator: BoolOperator,
        right: Filter,
        opposite: bool,
    ) -> Result<Self, FilterError> {
        Self::new(
            name,
            opposite,
            Criterion::Combined {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    /// Kind keyword of the criterion.
    pub fn kind(&self) -> &'static str {
        self.criterion.kind()
    }

    /// Re-check the name and every criterion, recursing into combined operands.
    ///
    /// Used on documents read from disk, which bypass [`Filter::new`].
    pub fn validate(&self) -> Result<(), FilterError> {
        validate_name(&self.name)?;
        self.criterion.validate()?;
        if let Criterion::Combined { left, right, .. } = &self.criterion {
            left.validate()?;
            right.validate()?;
        }
        Ok(())
    }

    /// Resolve reference names and build an evaluation tree.
    pub fn compile(&self, references: &dyn ReferenceLookup) -> Result<Predicate, FilterError> {
        Predicate::compile(self, references)
    }
}

fn validate_name(name: &str) -> Result<(), FilterError> {
    if name.is_empty() || name.trim() != name || name.chars().any(char::is_control) {
        return Err(FilterError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        let opposite = self.opposite;
        match &self.criterion {
            Criterion::Length { min_len, max_len } => write!(
                f,
                "LengthFilter(name={name}, min_len={min_len}, max_len={max_len}, opposite={opposite})"
            ),
            Criterion::Tag { tag, value } => write!(
                f,
                "TagFilter(name={name}, tag_name={tag}, tag_type={}, tag_value={value}, opposite={opposite})",
                value.tag_type()
            ),
            Criterion::Mapq { min_mapq, max_mapq } => write!(
                f,
                "MapqFilter(name={name}, min_mapq={min_mapq}, max_mapq={max_mapq}, opposite={opposite})"
            ),
            Criterion::Reference { reference } => write!(
                f,
                "RefNameFilter(name={name}, reference={reference}, opposite={opposite})"
            ),
            Criterion::Nucleotide {
                position,
                nucleotide,
                n_is_wildcard,
            } => write!(
                f,
                "NthNucleotideFilter(name={name}, position={position}, nucleotide={nucleotide}, n_is_wildcard={n_is_wildcard}, opposite={opposite})"
            ),
            Criterion::Flag { remove_flags } => write!(
                f,
                "FlagFilter(name={name}, remove_flags={} ({}), opposite={opposite})",
                remove_flags.bits(),
                remove_flags.describe()
            ),
            Criterion::Combined {
                operator,
                left,
                right,
            } => write!(
                f,
                "CombinedFilter(name={name}, filter1={}, filter2={}, operator={operator}, opposite={opposite})",
                left.name, right.name
            ),
        }
    }
}
