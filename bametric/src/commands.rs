//! Command handlers. Every handler opens the session, does one thing and
//! saves when something changed. Command output goes to `out`.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use bametric::{Applier, ApplyOptions};
use bametric_common::prelude::{
    BoolOperator, Criterion, Filter, FilterStore, ImportPolicy, TagValue,
};
use tracing::{info, warn};

use crate::CreateCommands;

type CommandResult = Result<(), Box<dyn Error>>;

pub fn init(session: &Path, force: bool) -> CommandResult {
    FilterStore::init(session, force)?;
    info!("Initialized BAMetric session at {}", session.display());
    Ok(())
}

fn criterion_from(cmd: CreateCommands) -> Result<Criterion, Box<dyn Error>> {
    Ok(match cmd {
        CreateCommands::Length { min_len, max_len } => Criterion::Length { min_len, max_len },
        CreateCommands::Tag {
            tag_name,
            tag_type,
            tag_value,
        } => Criterion::Tag {
            tag: tag_name,
            value: TagValue::parse(tag_type, &tag_value)?,
        },
        CreateCommands::Mapq { min_mapq, max_mapq } => Criterion::Mapq { min_mapq, max_mapq },
        CreateCommands::RefName { reference } => Criterion::Reference { reference },
        CreateCommands::Nucleotide {
            position,
            nucleotide,
            n_is_wildcard,
        } => Criterion::Nucleotide {
            position,
            nucleotide,
            n_is_wildcard,
        },
        CreateCommands::Flag { remove_flags } => Criterion::Flag { remove_flags },
    })
}

pub fn create(
    out: &mut impl Write,
    session: &Path,
    name: Option<String>,
    opposite: bool,
    cmd: CreateCommands,
) -> CommandResult {
    let mut store = FilterStore::open(session)?;
    let criterion = criterion_from(cmd)?;
    let name = name.unwrap_or_else(|| store.generate_name(criterion.kind()));

    let filter = Filter::new(name, opposite, criterion)?;
    info!("Created {filter}");
    let name = filter.name.clone();
    store.insert(filter)?;
    store.save()?;

    writeln!(out, "{name}")?;
    Ok(())
}

pub fn combine(
    out: &mut impl Write,
    session: &Path,
    name: Option<String>,
    filter1: &str,
    operator: BoolOperator,
    filter2: &str,
    opposite: bool,
) -> CommandResult {
    let mut store = FilterStore::open(session)?;
    let left = store.get(filter1)?.clone();
    let right = store.get(filter2)?.clone();
    let name = name.unwrap_or_else(|| store.generate_name("combined"));

    let filter = Filter::combine(name, left, operator, right, opposite)?;
    info!("Created {filter}");
    let name = filter.name.clone();
    store.insert(filter)?;
    store.save()?;

    writeln!(out, "{name}")?;
    Ok(())
}

pub fn apply(
    out: &mut impl Write,
    session: &Path,
    filter_name: &str,
    inputs: &[PathBuf],
    options: ApplyOptions,
) -> CommandResult {
    let store = FilterStore::open(session)?;
    let filter = store.get(filter_name)?.clone();
    let applier = Applier::new(filter, options)?;

    // Setup signal handler.
    let running = applier.running_flag();
    ctrlc::set_handler(move || {
        warn!("Received interrupt, stopping after the current record");
        running.store(false, Ordering::SeqCst);
    })?;

    for stats in applier.apply_all(inputs)? {
        writeln!(out, "{stats}")?;
    }
    Ok(())
}

pub fn import(
    out: &mut impl Write,
    session: &Path,
    import_path: &Path,
    policy: ImportPolicy,
) -> CommandResult {
    let mut store = FilterStore::open(session)?;
    let summary = store.import(import_path, policy)?;
    store.save()?;

    writeln!(
        out,
        "{} added, {} replaced, {} skipped",
        summary.added, summary.replaced, summary.skipped
    )?;
    Ok(())
}

pub fn export(out: &mut impl Write, session: &Path, export_path: Option<&Path>) -> CommandResult {
    let store = FilterStore::open(session)?;
    match export_path {
        Some(path) => store.export_to(path)?,
        None => writeln!(out, "{}", store.export()?)?,
    }
    Ok(())
}

pub fn view(out: &mut impl Write, session: &Path, json: bool) -> CommandResult {
    let store = FilterStore::open(session)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(store.filters())?)?;
        return Ok(());
    }

    if store.is_empty() {
        info!("No filters defined in {}", session.display());
    }
    for filter in store.filters() {
        writeln!(out, "{}: {}", filter.name, filter)?;
    }
    Ok(())
}

pub fn remove(session: &Path, name: &str) -> CommandResult {
    let mut store = FilterStore::open(session)?;
    let removed = store.remove(name)?;
    store.save()?;
    info!("Removed {removed}");
    Ok(())
}
