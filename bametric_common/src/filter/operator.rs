//! Boolean operators for combining two filters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::FilterError;

/// Operator joining the results of two filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOperator {
    /// Both pass.
    And,
    /// At least one passes.
    Or,
    /// Exactly one passes.
    Xor,
    /// Both pass or both fail.
    Xnor,
    /// Not both pass.
    Nand,
    /// Neither passes.
    Nor,
    /// The first passing implies the second passes.
    Implies,
}

impl BoolOperator {
    /// Every operator, in display order.
    pub const ALL: [BoolOperator; 7] = [
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Xnor,
        Self::Nand,
        Self::Nor,
        Self::Implies,
    ];

    /// Combine two filter results.
    #[inline]
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
            Self::Xor => left ^ right,
            Self::Xnor => !(left ^ right),
            Self::Nand => !(left && right),
            Self::Nor => !(left || right),
            Self::Implies => !left || right,
        }
    }

    /// Upper-case keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Xnor => "XNOR",
            Self::Nand => "NAND",
            Self::Nor => "NOR",
            Self::Implies => "IMPLIES",
        }
    }
}

impl FromStr for BoolOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
