//! Apply a stored filter to alignment files.
//!
//! Each input is streamed once: records that pass the compiled predicate
//! are written to `<output_dir>/<input stem>.<ext>` with the input header.
//! A failed or interrupted run never leaves a partial output behind.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bam::RecordWriter;
use bametric_common::config::DEFAULT_PROGRESS_INTERVAL;
use bametric_common::filter::{Filter, FilterError, Predicate};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bam_io::{self, BamRead, HeaderReferences, RecordStream};
use crate::format::RecordFormat;

/// Errors raised while applying a filter.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Thread count below one.
    #[error("Number of threads must be greater than 0")]
    InvalidThreads,

    /// Input is neither `.bam` nor `.sam`.
    #[error("Unsupported input {0}: expected a .bam or .sam file")]
    UnsupportedFormat(PathBuf),

    /// Output would overwrite the input.
    #[error("Output {0} is the input file")]
    OutputIsInput(PathBuf),

    /// Input could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Record could not be decoded.
    #[error("Failed to read record from {path}: {source}")]
    Read {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Output could not be created or written.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Filter failed to compile against the input header.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Two inputs map to the same output path.
    #[error("Inputs {first} and {second} would both be written to {output}")]
    DuplicateOutput {
        /// Shared output path.
        output: PathBuf,
        /// Earlier input.
        first: PathBuf,
        /// Later input.
        second: PathBuf,
    },

    /// An output would replace another input of the same run.
    #[error("Output {output} would overwrite input {input}")]
    OutputOverwritesInput {
        /// Output path.
        output: PathBuf,
        /// Input it collides with.
        input: PathBuf,
    },

    /// Run stopped by the running flag.
    #[error("Interrupted while filtering {0}")]
    Interrupted(PathBuf),
}

/// Options for [`Applier`].
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Directory receiving the filtered files.
    pub output_dir: PathBuf,
    /// Threads for BAM decompression, including the calling thread.
    pub threads: u16,
    /// Output format. `None` keeps the input format.
    pub output_format: Option<RecordFormat>,
    /// Records between progress logs, `0` to disable.
    pub progress_interval: u64,
}

impl ApplyOptions {
    /// Single-threaded options writing to `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            threads: 1,
            output_format: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Outcome of filtering one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyStats {
    /// Input path.
    pub input: PathBuf,
    /// Output path.
    pub output: PathBuf,
    /// Records decoded from the input.
    pub records_read: u64,
    /// Records written to the output.
    pub records_kept: u64,
}

impl ApplyStats {
    /// Records rejected by the filter.
    pub fn records_dropped(&self) -> u64 {
        self.records_read - self.records_kept
    }
}

impl fmt::Display for ApplyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: kept {} of {} records ({} dropped)",
            self.input.display(),
            self.output.display(),
            self.records_kept,
            self.records_read,
            self.records_dropped()
        )
    }
}

/// Streams alignment files through one filter.
pub struct Applier {
    filter: Filter,
    options: ApplyOptions,
    running: Arc<AtomicBool>,
}

impl Applier {
    /// Create an applier.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::InvalidThreads`] when `options.threads` is zero.
    pub fn new(filter: Filter, options: ApplyOptions) -> Result<Self, ApplyError> {
        if options.threads == 0 {
            return Err(ApplyError::InvalidThreads);
        }
        Ok(Self {
            filter,
            options,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Filter being applied.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Where the filtered copy of `input` is written.
    pub fn output_path(&self, input: &Path) -> Result<PathBuf, ApplyError> {
        let input_format = detect(input)?;
        self.output_path_for(input, self.options.output_format.unwrap_or(input_format))
    }

    fn output_path_for(&self, input: &Path, format: RecordFormat) -> Result<PathBuf, ApplyError> {
        let stem = input
            .file_stem()
            .ok_or_else(|| ApplyError::UnsupportedFormat(input.to_path_buf()))?;
        let mut name = OsString::from(stem);
        name.push(".");
        name.push(format.extension());
        Ok(self.options.output_dir.join(name))
    }

    /// Output path of every input, checked before anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::DuplicateOutput`] when two inputs share an
    /// output and [`ApplyError::OutputOverwritesInput`] when an output is
    /// one of the inputs.
    pub fn plan(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ApplyError> {
        let outputs = inputs
            .iter()
            .map(|input| self.output_path(input))
            .collect::<Result<Vec<_>, _>>()?;
        let canonical_inputs: Vec<Option<PathBuf>> =
            inputs.iter().map(|input| fs::canonicalize(input).ok()).collect();

        for (index, output) in outputs.iter().enumerate() {
            if let Some(first) = outputs[..index].iter().position(|other| other == output) {
                return Err(ApplyError::DuplicateOutput {
                    output: output.clone(),
                    first: inputs[first].clone(),
                    second: inputs[index].clone(),
                });
            }

            let Some(target) = resolve_output(output) else {
                continue;
            };
            if let Some(hit) = canonical_inputs
                .iter()
                .position(|input| input.as_ref() == Some(&target))
            {
                return Err(ApplyError::OutputOverwritesInput {
                    output: output.clone(),
                    input: inputs[hit].clone(),
                });
            }
        }
        Ok(outputs)
    }

    /// Filter every file in order, stopping at the first error.
    ///
    /// Output collisions are rejected up front by [`Applier::plan`].
    pub fn apply_all(&self, inputs: &[PathBuf]) -> Result<Vec<ApplyStats>, ApplyError> {
        self.plan(inputs)?;
        inputs.iter().map(|input| self.apply_file(input)).collect()
    }

    /// Filter one file.
    ///
    /// # Errors
    ///
    /// Fails on unsupported or unreadable input, on a reference missing from
    /// the input header and on interruption. In every failure case after the
    /// output was created, the output file is removed.
    pub fn apply_file(&self, input: &Path) -> Result<ApplyStats, ApplyError> {
        let input_format = detect(input)?;
        let output_format = self.options.output_format.unwrap_or(input_format);
        let output = self.output_path_for(input, output_format)?;

        if is_same_file(input, &output) {
            return Err(ApplyError::OutputIsInput(output));
        }

        fs::create_dir_all(&self.options.output_dir).map_err(|source| ApplyError::CreateDir {
            path: self.options.output_dir.clone(),
            source,
        })?;

        let (header, records) = bam_io::open_reader(input, input_format, self.options.threads)
            .map_err(|source| ApplyError::Open {
                path: input.to_path_buf(),
                source,
            })?;
        let predicate = self.filter.compile(&HeaderReferences(&header))?;

        info!(
            "Applying filter {} to {} ({} -> {})",
            self.filter.name,
            input.display(),
            input_format,
            output_format
        );

        let mut writer = bam_io::create_writer(&output, output_format, header).map_err(|source| {
            ApplyError::Write {
                path: output.clone(),
                source,
            }
        })?;

        let streamed = self.stream(input, &output, records, &predicate, writer.as_mut());
        let finished = writer.finish();
        drop(writer);

        let result = streamed.and_then(|stats| {
            finished
                .map(|()| stats)
                .map_err(|source| ApplyError::Write {
                    path: output.clone(),
                    source,
                })
        });

        match result {
            Ok(stats) => {
                info!("{stats}");
                Ok(stats)
            }
            Err(e) => {
                discard(&output);
                Err(e)
            }
        }
    }

    fn stream(
        &self,
        input: &Path,
        output: &Path,
        records: RecordStream,
        predicate: &Predicate,
        writer: &mut dyn RecordWriter,
    ) -> Result<ApplyStats, ApplyError> {
        let mut stats = ApplyStats {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            records_read: 0,
            records_kept: 0,
        };
        let interval = self.options.progress_interval;

        for record in records {
            if !self.running.load(Ordering::SeqCst) {
                warn!(
                    "Interrupted after {} records of {}",
                    stats.records_read,
                    input.display()
                );
                return Err(ApplyError::Interrupted(input.to_path_buf()));
            }

            let record = record.map_err(|source| ApplyError::Read {
                path: input.to_path_buf(),
                source,
            })?;
            stats.records_read += 1;

            if predicate.evaluate(&BamRead(&record)) {
                writer.write(&record).map_err(|source| ApplyError::Write {
                    path: output.to_path_buf(),
                    source,
                })?;
                stats.records_kept += 1;
            }

            if interval > 0 && stats.records_read % interval == 0 {
                debug!(
                    "{}: {} records read, {} kept",
                    input.display(),
                    stats.records_read,
                    stats.records_kept
                );
            }
        }

        Ok(stats)
    }
}

fn detect(input: &Path) -> Result<RecordFormat, ApplyError> {
    RecordFormat::from_path(input).ok_or_else(|| ApplyError::UnsupportedFormat(input.to_path_buf()))
}

/// Canonical form of an output path that may not exist yet.
fn resolve_output(output: &Path) -> Option<PathBuf> {
    if let Ok(existing) = fs::canonicalize(output) {
        return Some(existing);
    }
    let name = output.file_name()?;
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(dir).ok().map(|dir| dir.join(name))
}

fn is_same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), resolve_output(output)) {
        (Ok(a), Some(b)) => a == b,
        _ => false,
    }
}

fn discard(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
    }
}
