//! SAM FLAG bit field.
//!
//! The twelve bits defined by the SAM specification, as a `bitflags` type so
//! that filters can be printed and parsed by name as well as by number.

use bitflags::bitflags;

use super::FilterError;

bitflags! {
    /// Bitwise FLAG field of an alignment record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SamFlags: u16 {
        /// Template has multiple segments.
        const PAIRED         = 0x0001;
        /// Every segment properly aligned.
        const PROPER_PAIR    = 0x0002;
        /// Segment unmapped.
        const UNMAPPED       = 0x0004;
        /// Next segment in the template unmapped.
        const MATE_UNMAPPED  = 0x0008;
        /// Sequence reverse complemented.
        const REVERSE        = 0x0010;
        /// Next segment reverse complemented.
        const MATE_REVERSE   = 0x0020;
        /// First segment in the template.
        const FIRST_IN_PAIR  = 0x0040;
        /// Last segment in the template.
        const SECOND_IN_PAIR = 0x0080;
        /// Secondary alignment.
        const SECONDARY      = 0x0100;
        /// Not passing quality controls.
        const QC_FAIL        = 0x0200;
        /// PCR or optical duplicate.
        const DUPLICATE      = 0x0400;
        /// Supplementary alignment.
        const SUPPLEMENTARY  = 0x0800;

        // Retain bits outside the twelve named ones.
        const _ = !0;
    }
}

impl Default for SamFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl SamFlags {
    /// Parse a flag expression given on the command line.
    ///
    /// Accepts a decimal number (`1024`), a hexadecimal number (`0x400`) or
    /// flag names joined by `|` (`duplicate|secondary`, case-insensitive).
    pub fn parse_expr(input: &str) -> Result<Self, FilterError> {
        let trimmed = input.trim();
        let invalid = || FilterError::InvalidFlags(input.to_string());

        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return u16::from_str_radix(hex, 16)
                .map(Self::from_bits_retain)
                .map_err(|_| invalid());
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed
                .parse::<u16>()
                .map(Self::from_bits_retain)
                .map_err(|_| invalid());
        }

        let mut flags = Self::empty();
        for part in trimmed.split('|') {
            let name = part.trim().to_ascii_uppercase();
            let flag = Self::from_name(&name).ok_or_else(invalid)?;
            flags |= flag;
        }
        Ok(flags)
    }

    /// Names of the set flags joined with `|`, or the raw value for unnamed bits.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "0".to_string();
        }
        let mut parts: Vec<String> = self.iter_names().map(|(name, _)| name.to_string()).collect();
        let unnamed = self.bits() & !Self::all_named().bits();
        if unnamed != 0 {
            parts.push(format!("0x{unnamed:x}"));
        }
        parts.join("|")
    }

    fn all_named() -> Self {
        Self::PAIRED
            | Self::PROPER_PAIR
            | Self::UNMAPPED
            | Self::MATE_UNMAPPED
            | Self::REVERSE
            | Self::MATE_REVERSE
            | Self::FIRST_IN_PAIR
            | Self::SECOND_IN_PAIR
            | Self::SECONDARY
            | Self::QC_FAIL
            | Self::DUPLICATE
            | Self::SUPPLEMENTARY
    }
}

/// Serde helper storing [`SamFlags`] as its raw `u16` value.
pub mod serde_bits {
    use super::SamFlags;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as a plain integer.
    pub fn serialize<S: Serializer>(flags: &SamFlags, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(flags.bits())
    }

    /// Deserialize from a plain integer, keeping unnamed bits.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SamFlags, D::Error> {
        u16::deserialize(deserializer).map(SamFlags::from_bits_retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal() {
        assert_eq!(SamFlags::parse_expr("1024").unwrap(), SamFlags::DUPLICATE);
        assert_eq!(
            SamFlags::parse_expr("1028").unwrap(),
            SamFlags::DUPLICATE | SamFlags::UNMAPPED
        );
    }

    #[test]
    fn parse_hex() {
        assert_eq!(SamFlags::parse_expr("0x100").unwrap(), SamFlags::SECONDARY);
        assert_eq!(SamFlags::parse_expr("0X4").unwrap(), SamFlags::UNMAPPED);
    }

    #[test]
    fn parse_names() {
        assert_eq!(
            SamFlags::parse_expr("duplicate | Secondary").unwrap(),
            SamFlags::DUPLICATE | SamFlags::SECONDARY
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            SamFlags::parse_expr("DUPLICATES"),
            Err(FilterError::InvalidFlags(_))
        ));
        assert!(SamFlags::parse_expr("").is_err());
        assert!(SamFlags::parse_expr("70000").is_err());
        assert!(SamFlags::parse_expr("0xzz").is_err());
    }

    #[test]
    fn unnamed_bits_are_kept() {
        let flags = SamFlags::parse_expr("0x1004").unwrap();
        assert_eq!(flags.bits(), 0x1004);
        assert_eq!(flags.describe(), "UNMAPPED|0x1000");
    }

    #[test]
    fn describe_named_and_empty() {
        assert_eq!(SamFlags::empty().describe(), "0");
        assert_eq!(
            (SamFlags::PAIRED | SamFlags::QC_FAIL).describe(),
            "PAIRED|QC_FAIL"
        );
    }
}
