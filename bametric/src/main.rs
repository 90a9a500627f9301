//! # BAMetric Binary
//!
//! Create, combine and apply read filters to SAM/BAM files. Filters live in a
//! JSON session file so they can be built up step by step and reused.
//!
//! # Usage
//!
//! ```bash
//! # Start a session in the current directory (bametric.json)
//! bametric init
//!
//! # Primitive filters
//! bametric create -n long length 50 300
//! bametric create -n dedup flag SECONDARY|DUPLICATE
//! bametric create -n g_start nucleotide 0 G -w
//!
//! # Combine and apply
//! bametric combine long AND dedup -n clean
//! bametric apply clean sample1.bam sample2.bam -o filtered/ -p 4
//! ```

mod commands;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use bametric::logging::setup_tracing;
use bametric::{ApplyOptions, RecordFormat};
use bametric_common::config::{ConfigLoader, LogLevel, Settings};
use bametric_common::filter::{
    BoolOperator, FilterError, Nucleotide, ReferenceSelector, SamFlags, TagName, TagType,
};
use bametric_common::store::{DEFAULT_SESSION_FILE, ImportPolicy};
use clap::{Parser, Subcommand};
use tracing::error;

/// BAMetric - composable read filters for SAM/BAM files
#[derive(Parser, Debug)]
#[command(name = "bametric")]
#[command(version)]
#[command(about = "Create, combine and apply read filters to SAM/BAM files")]
#[command(long_about = None)]
struct Args {
    /// Session file holding the defined filters
    #[arg(short = 'p', long, env = "BAMETRIC_PATH", default_value = DEFAULT_SESSION_FILE)]
    bametric_path: PathBuf,

    /// Optional TOML settings file
    #[arg(long, env = "BAMETRIC_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the settings file
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum CreateCommands {
    /// Keep reads whose length lies in [MIN_LEN, MAX_LEN]
    Length {
        /// Minimum read length (inclusive)
        min_len: u32,
        /// Maximum read length (inclusive)
        max_len: u32,
    },
    /// Keep reads carrying a tag with the given value
    Tag {
        /// Two-character tag name, e.g. NM
        tag_name: TagName,
        /// Value type: char, int, float or string
        tag_type: TagType,
        /// Value to match
        tag_value: String,
    },
    /// Keep reads whose mapping quality lies in [MIN_MAPQ, MAX_MAPQ]
    Mapq {
        /// Minimum mapping quality (inclusive)
        min_mapq: u8,
        /// Maximum mapping quality (inclusive)
        max_mapq: u8,
    },
    /// Keep reads aligned to a reference, given by name or numeric id
    RefName {
        /// Reference name (e.g. chr1) or id (-1 for unmapped)
        #[arg(allow_negative_numbers = true)]
        reference: ReferenceSelector,
    },
    /// Keep reads with a given base at a given position
    Nucleotide {
        /// 0-based position. Negative values count from the 3' end (-1 is the last base)
        #[arg(allow_negative_numbers = true)]
        position: i64,
        /// Base to match: A, C, G, T or N
        nucleotide: Nucleotide,
        /// Treat N in the read as matching any base
        #[arg(short = 'w', long)]
        n_is_wildcard: bool,
    },
    /// Remove reads with any of the given SAM flag bits
    Flag {
        /// Decimal, 0x-hex or names joined by '|' (e.g. SECONDARY|DUPLICATE)
        #[arg(value_parser = parse_flags)]
        remove_flags: SamFlags,
    },
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new session
    Init {
        /// Replace an existing session file
        #[arg(long)]
        force: bool,
    },

    /// Create a new filter
    Create {
        /// Filter name. Generated from the filter kind when omitted
        #[arg(short = 'n', long)]
        name: Option<String>,
        /// Invert the filter
        #[arg(short = 'o', long)]
        opposite: bool,
        #[command(subcommand)]
        cmd: CreateCommands,
    },

    /// Combine two existing filters with a boolean operator
    Combine {
        /// First filter
        filter1: String,
        /// AND, OR, XOR, XNOR, NAND, NOR or IMPLIES
        operator: BoolOperator,
        /// Second filter
        filter2: String,
        /// Name of the combined filter. Generated when omitted
        #[arg(short = 'n', long)]
        name: Option<String>,
        /// Invert the combined filter
        #[arg(long)]
        opposite: bool,
    },

    /// Apply a filter to SAM/BAM files
    Apply {
        /// Filter to apply
        filter_name: String,
        /// Input SAM/BAM files
        #[arg(required = true)]
        input: Vec<PathBuf>,
        /// Output directory
        #[arg(short = 'o', long)]
        output: PathBuf,
        /// Threads for BAM decompression. Defaults to the settings file
        #[arg(short = 'p', long)]
        threads: Option<u16>,
        /// Verbose output (debug logging)
        #[arg(short = 'v', long)]
        verbose: bool,
        /// Output format. Defaults to the input format
        #[arg(long, value_name = "bam|sam")]
        output_format: Option<RecordFormat>,
    },

    /// Merge filters from another session file
    Import {
        /// Session file to import
        import_path: PathBuf,
        /// What to do with filters whose name already exists: fail, overwrite or skip
        #[arg(long, default_value = "fail")]
        on_conflict: ImportPolicy,
    },

    /// Export the session as JSON
    Export {
        /// Destination file. Printed to stdout when omitted
        export_path: Option<PathBuf>,
    },

    /// List the defined filters
    View {
        /// Print the filters as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a filter
    Remove {
        /// Filter to delete
        name: String,
    },
}

fn parse_flags(s: &str) -> Result<SamFlags, FilterError> {
    SamFlags::parse_expr(s)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            setup_tracing(args.log_level.unwrap_or_default(), args.log_json);
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let verbose = matches!(args.cmd, Commands::Apply { verbose: true, .. });
    let level = match (args.log_level, verbose) {
        (Some(level), _) => level,
        (None, true) => LogLevel::Debug,
        (None, false) => settings.logging.level,
    };
    setup_tracing(level, args.log_json || settings.logging.json);

    match run(args, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Settings file if given, defaults otherwise.
fn load_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)
            .map_err(|e| format!("Failed to load settings {}: {e}", path.display()))?,
        None => Settings::default(),
    };
    settings.validate()?;
    Ok(settings)
}

fn run(args: Args, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let session = args.bametric_path.as_path();
    let mut out = io::stdout().lock();

    match args.cmd {
        Commands::Init { force } => commands::init(session, force),
        Commands::Create {
            name,
            opposite,
            cmd,
        } => commands::create(&mut out, session, name, opposite, cmd),
        Commands::Combine {
            filter1,
            operator,
            filter2,
            name,
            opposite,
        } => commands::combine(&mut out, session, name, &filter1, operator, &filter2, opposite),
        Commands::Apply {
            filter_name,
            input,
            output,
            threads,
            verbose: _,
            output_format,
        } => {
            let options = ApplyOptions {
                output_dir: output,
                threads: threads.unwrap_or(settings.apply.threads),
                output_format,
                progress_interval: settings.apply.progress_interval,
            };
            commands::apply(&mut out, session, &filter_name, &input, options)
        }
        Commands::Import {
            import_path,
            on_conflict,
        } => commands::import(&mut out, session, &import_path, on_conflict),
        Commands::Export { export_path } => {
            commands::export(&mut out, session, export_path.as_deref())
        }
        Commands::View { json } => commands::view(&mut out, session, json),
        Commands::Remove { name } => commands::remove(session, &name),
    }
}
