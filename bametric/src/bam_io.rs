//! Adapters between the `bam` crate and the filter evaluator.
//!
//! The `bam` crate owns `Record` and `Header`, so the filter traits are
//! implemented on thin borrowing wrappers instead.

use std::io;
use std::path::Path;

use bam::record::tags::TagValue as BamTagValue;
use bam::{BamReader, BamWriter, Header, Record, RecordWriter, SamReader, SamWriter};
use bametric_common::filter::{SamFlags, TagName, TagValue};
use bametric_common::read::{AlignedRead, ReferenceLookup};

use crate::format::RecordFormat;

/// Stream of decoded records.
pub type RecordStream = Box<dyn Iterator<Item = io::Result<Record>>>;

/// Borrowed `bam::Record` seen through [`AlignedRead`].
pub struct BamRead<'a>(pub &'a Record);

impl AlignedRead for BamRead<'_> {
    fn query_len(&self) -> u32 {
        self.0.query_len()
    }

    fn mapq(&self) -> u8 {
        self.0.mapq()
    }

    fn ref_id(&self) -> i32 {
        self.0.ref_id()
    }

    fn flags(&self) -> SamFlags {
        SamFlags::from_bits_retain(self.0.flag().0)
    }

    fn sequence_len(&self) -> Option<usize> {
        let sequence = self.0.sequence();
        sequence.available().then(|| sequence.len())
    }

    fn base_at(&self, index: usize) -> Option<u8> {
        let sequence = self.0.sequence();
        (sequence.available() && index < sequence.len()).then(|| sequence.at(index))
    }

    fn tag(&self, name: TagName) -> Option<TagValue> {
        match self.0.tags().get(name.as_bytes())? {
            BamTagValue::Char(c) => Some(TagValue::Char(char::from(c))),
            BamTagValue::Int(value, _) => Some(TagValue::Int(value)),
            BamTagValue::Float(value) => Some(TagValue::Float(value)),
            BamTagValue::String(bytes, _) => {
                Some(TagValue::String(String::from_utf8_lossy(bytes).into_owned()))
            }
            BamTagValue::IntArray(_) | BamTagValue::FloatArray(_) => None,
        }
    }
}

/// Reference dictionary of an input header.
pub struct HeaderReferences<'a>(pub &'a Header);

impl ReferenceLookup for HeaderReferences<'_> {
    fn reference_id(&self, name: &str) -> Option<i32> {
        self.0
            .reference_id(name)
            .and_then(|id| i32::try_from(id).ok())
    }
}

/// Open `path` for reading.
///
/// `threads` counts the calling thread, so `threads - 1` extra workers
/// decompress BAM blocks. SAM input is always read on the calling thread.
pub fn open_reader(
    path: &Path,
    format: RecordFormat,
    threads: u16,
) -> io::Result<(Header, RecordStream)> {
    match format {
        RecordFormat::Bam => {
            let reader = BamReader::from_path(path, threads.saturating_sub(1))?;
            let header = reader.header().clone();
            Ok((header, Box::new(reader)))
        }
        RecordFormat::Sam => {
            let reader = SamReader::from_path(path)?;
            let header = reader.header().clone();
            Ok((header, Box::new(reader)))
        }
    }
}

/// Create `path` and write `header` to it.
pub fn create_writer(
    path: &Path,
    format: RecordFormat,
    header: Header,
) -> io::Result<Box<dyn RecordWriter>> {
    Ok(match format {
        RecordFormat::Bam => Box::new(BamWriter::from_path(path, header)?),
        RecordFormat::Sam => Box::new(SamWriter::from_path(path, header)?),
    })
}
