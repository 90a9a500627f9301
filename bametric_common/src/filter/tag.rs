//! Optional-field (tag) names and values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::FilterError;

/// Two-character SAM tag name such as `NM` or `RG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName([u8; 2]);

impl TagName {
    /// Raw bytes as stored in a BAM record.
    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl FromStr for TagName {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [first, second] if first.is_ascii_alphabetic() && second.is_ascii_alphanumeric() => {
                Ok(Self([*first, *second]))
            }
            _ => Err(FilterError::InvalidTagName(s.to_string())),
        }
    }
}

impl TryFrom<String> for TagName {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TagName> for String {
    fn from(value: TagName) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
    }
}

/// Value type requested on the command line for a tag filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    /// Single printable character (`A` type).
    Char,
    /// Signed integer of any width (`c`, `C`, `s`, `S`, `i`, `I` types).
    Int,
    /// Single-precision float (`f` type).
    Float,
    /// Text (`Z` and `H` types).
    String,
}

impl FromStr for TagType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "char" => Ok(Self::Char),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "string" => Ok(Self::String),
            _ => Err(FilterError::InvalidTagType(s.to_string())),
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Char => "char",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// Scalar tag value.
///
/// Integers are held as `i64` whatever their on-disk width, so an `NM:i:2`
/// stored as `C` and a filter value `2` compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TagValue {
    /// Single character.
    Char(char),
    /// Integer.
    Int(i64),
    /// Float. Compared exactly.
    Float(f32),
    /// Text.
    String(String),
}

impl TagValue {
    /// Parse `data` as a value of type `ty`.
    pub fn parse(ty: TagType, data: &str) -> Result<Self, FilterError> {
        let invalid = |reason: &str| FilterError::InvalidTagValue {
            ty,
            value: data.to_string(),
            reason: reason.to_string(),
        };

        match ty {
            TagType::Char => {
                let mut chars = data.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_graphic() => Ok(Self::Char(c)),
                    _ => Err(invalid("expected a single printable ASCII character")),
                }
            }
            TagType::Int => data
                .trim()
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|e| invalid(&e.to_string())),
            TagType::Float => data
                .trim()
                .parse::<f32>()
                .map(Self::Float)
                .map_err(|e| invalid(&e.to_string())),
            TagType::String => Ok(Self::String(data.to_string())),
        }
    }

    /// Type of this value.
    pub fn tag_type(&self) -> TagType {
        match self {
            Self::Char(_) => TagType::Char,
            Self::Int(_) => TagType::Int,
            Self::Float(_) => TagType::Float,
            Self::String(_) => TagType::String,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "'{c}'"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}
