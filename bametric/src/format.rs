//! Record file formats.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Alignment file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// BGZF-compressed binary alignment map.
    Bam,
    /// Tab-separated sequence alignment map.
    Sam,
}

impl RecordFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bam => "bam",
            Self::Sam => "sam",
        }
    }
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bam" => Ok(Self::Bam),
            "sam" => Ok(Self::Sam),
            _ => Err(format!("unsupported format {s:?}: expected bam or sam")),
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bam => "BAM",
            Self::Sam => "SAM",
        })
    }
}
