use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pumlddl::sql::Dialect;
use pumlddl::version::{VersionTracker, migration_file_name};
use pumlddl::{Sources, convert};

/// Generate SQL DDL from a PlantUML ER model
#[derive(Parser, Debug)]
#[command(name = "pumlddl")]
#[command(version, about = "Generate SQL DDL from a PlantUML ER model")]
struct Args {
    /// Target dialect: postgresql or oracle
    #[arg(short, long, default_value = "postgresql", value_parser = parse_dialect)]
    dialect: Dialect,

    /// Attribute template definitions
    #[arg(long, default_value = "attributes.pu")]
    attributes: PathBuf,

    /// Table definitions
    #[arg(long, default_value = "tables.pu")]
    tables: PathBuf,

    /// Relationship document
    #[arg(long, default_value = "er.md")]
    relationships: PathBuf,

    /// Directory for the generated DDL script
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Where to save the combined PlantUML document
    #[arg(long, default_value = "combined_model.puml")]
    combined: PathBuf,

    /// Version state file
    #[arg(long, default_value = "schema_version.json")]
    version_file: PathBuf,

    /// Always generate, without reading or updating version state
    #[arg(long)]
    no_versioning: bool,
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    Dialect::from_str(s).ok_or_else(|| format!("unknown dialect '{s}', expected postgresql or oracle"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pumlddl=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let inputs = [&args.attributes, &args.tables, &args.relationships];

    let mut tracker = if args.no_versioning {
        None
    } else {
        Some(VersionTracker::load(&args.version_file)?)
    };

    if let Some(tracker) = &tracker {
        if !tracker.has_changed(&inputs)? {
            info!("No changes detected in input files. Skipping DDL generation.");
            return Ok(());
        }
    }
    let version = tracker
        .as_ref()
        .map(VersionTracker::next_version)
        .transpose()?;

    let attributes = read_source(&args.attributes)?;
    let tables = read_source(&args.tables)?;
    let relationships = read_source(&args.relationships)?;

    let sources = Sources {
        attributes: &attributes,
        tables: &tables,
        relationships: &relationships,
    };
    let output = convert(&sources, args.dialect);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let ddl_path = args
        .out_dir
        .join(migration_file_name(version, args.dialect, Local::now()));
    fs::write(&ddl_path, &output.ddl)
        .with_context(|| format!("Failed to write {}", ddl_path.display()))?;

    if let (Some(tracker), Some(version)) = (tracker.as_mut(), version) {
        tracker.commit(&inputs, version)?;
    }

    info!("DDL generated successfully in {}", ddl_path.display());

    fs::write(&args.combined, &output.combined)
        .with_context(|| format!("Failed to write {}", args.combined.display()))?;
    info!("Combined PlantUML file saved as {}", args.combined.display());

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
