//! formfill CLI - fill scanned forms and curate override data
//!
//! Logs go to stderr (`RUST_LOG` overrides the level); command results go to
//! stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use formfill_core::{
    CoordinateMap, FieldLocator, FieldMatcher, FormSchema, JsonLayoutFile, KeywordLocator,
    LayoutAnalyzer, OverrideStore,
};
use formfill_overlay::{CoordinateSources, FormFiller, OverlayConfig};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "formfill", version, about = "Fill scanned forms with collected answers")]
struct Args {
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log placement decisions
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Draw a schema's answers onto a form image
    #[command(long_about = "Draw a schema's answers onto a form image.\n\
                      \n\
                      Coordinates come from the first available source: override data \
                      for the image (--overrides), a coordinate file (--coordinates), or \
                      fresh layout analysis (--layout). Fields without coordinates are \
                      drawn in red at fallback positions.")]
    Fill {
        /// Form image (PNG, JPEG, ...)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Schema JSON with collected values
        #[arg(short, long)]
        schema: PathBuf,

        /// Coordinate map JSON (label -> [x, y])
        #[arg(short, long)]
        coordinates: Option<PathBuf>,

        /// Layout analysis JSON for the image
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Override data directory
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Output JPEG (default: filled_<stem>.jpg beside the image)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write coordinates from fresh layout analysis to --coordinates
        #[arg(long, requires = "coordinates")]
        save_coordinates: bool,
    },

    /// Locate field labels in a layout analysis and write a coordinate map
    Extract {
        /// Layout analysis JSON
        #[arg(value_name = "LAYOUT")]
        layout: PathBuf,

        /// Output coordinate map (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which coordinate each schema field would use
    Match {
        /// Schema JSON
        #[arg(short, long)]
        schema: PathBuf,

        /// Coordinate map JSON
        #[arg(short, long)]
        coordinates: PathBuf,
    },

    /// Inspect and create override entries
    Overrides {
        #[command(subcommand)]
        action: OverridesAction,
    },
}

#[derive(Subcommand, Debug)]
enum OverridesAction {
    /// List entries in an override directory
    List {
        /// Override data directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Find the entry for an image
    Find {
        /// Override data directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Form image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },

    /// Save a coordinate map as the override entry for an image
    Create {
        /// Override data directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Form image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Coordinate map JSON
        #[arg(short, long)]
        coordinates: PathBuf,

        /// Form title (used in the entry file name)
        #[arg(short, long)]
        title: Option<String>,
    },
}

/// Defaults, then the config file, then `FORMFILL_*` variables
fn load_config(path: Option<&Path>) -> Result<OverlayConfig> {
    let base = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => OverlayConfig::default(),
    };
    Ok(base.with_env_overrides())
}

#[allow(clippy::too_many_arguments)]
fn fill_command(
    image: &Path,
    schema: &Path,
    coordinates: Option<&Path>,
    layout: Option<&Path>,
    overrides: Option<&Path>,
    output: Option<&Path>,
    config: Option<&Path>,
    save_coordinates: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let schema = FormSchema::load(schema)
        .with_context(|| format!("Failed to load schema: {}", schema.display()))?;
    let store = overrides
        .map(OverrideStore::load_dir)
        .transpose()
        .context("Failed to read override directory")?;
    let analyzer = layout.map(JsonLayoutFile::new);

    let sources = CoordinateSources {
        overrides: store.as_ref(),
        coordinate_file: coordinates,
        analyzer: analyzer.as_ref().map(|a| a as &dyn LayoutAnalyzer),
        locator: None,
        persist_fresh: save_coordinates,
    };

    let filler = FormFiller::new(&config);
    let report = filler
        .fill(image, &schema, &sources, output)
        .with_context(|| format!("Failed to fill {}", image.display()))?;

    println!(
        "Wrote {} ({} matched, {} fallback, {} empty) using {}",
        report.output.display(),
        report.matched_count(),
        report.fallback_count(),
        report.skipped,
        report.source
    );
    Ok(())
}

fn extract_command(layout: &Path, output: Option<&Path>) -> Result<()> {
    let analysis = JsonLayoutFile::new(layout)
        .analyze(layout)
        .with_context(|| format!("Failed to read layout analysis: {}", layout.display()))?;
    let coordinates = KeywordLocator.locate(&analysis);

    match output {
        Some(path) => {
            coordinates
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} field coordinates to {}",
                coordinates.len(),
                path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&coordinates)?),
    }
    Ok(())
}

fn match_command(schema: &Path, coordinates: &Path) -> Result<()> {
    let schema = FormSchema::load(schema)
        .with_context(|| format!("Failed to load schema: {}", schema.display()))?;
    let coordinates = CoordinateMap::load(coordinates)
        .with_context(|| format!("Failed to load coordinates: {}", coordinates.display()))?;
    let matcher = FieldMatcher::new();

    for field in schema.flatten_fields() {
        let label = field.display_label();
        match matcher.find_match(field, &coordinates) {
            Some(hit) => println!(
                "{label}\t{}\t{}\t{}",
                hit.tier, hit.candidate, hit.point
            ),
            None => println!("{label}\tfallback\t-\t-"),
        }
    }
    Ok(())
}

fn overrides_command(action: OverridesAction) -> Result<()> {
    match action {
        OverridesAction::List { dir } => {
            let store = OverrideStore::load_dir(&dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?;
            for entry in store.entries() {
                let meta = &entry.metadata;
                println!(
                    "{}\t{}\t{}\t{} coordinates",
                    meta.filename.as_deref().unwrap_or("-"),
                    meta.file_hash.as_deref().unwrap_or("-"),
                    meta.form_title.as_deref().unwrap_or("-"),
                    entry.coordinates.as_ref().map_or(0, CoordinateMap::len)
                );
            }
            println!("{} entries", store.len());
        }
        OverridesAction::Find { dir, image } => {
            let store = OverrideStore::load_dir(&dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?;
            let Some((entry, key)) = store.find(&image) else {
                bail!("No override entry for {}", image.display());
            };
            println!("Found by {key}");
            println!("{}", serde_json::to_string_pretty(entry)?);
        }
        OverridesAction::Create {
            dir,
            image,
            coordinates,
            title,
        } => {
            let coordinates = CoordinateMap::load(&coordinates)
                .with_context(|| format!("Failed to load coordinates: {}", coordinates.display()))?;
            let mut store = OverrideStore::load_dir(&dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?;
            let path = store
                .create_entry(&image, coordinates, title.as_deref())
                .with_context(|| format!("Failed to create entry for {}", image.display()))?;
            println!("Created {}", path.display());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    match args.command {
        Commands::Fill {
            image,
            schema,
            coordinates,
            layout,
            overrides,
            output,
            config,
            save_coordinates,
        } => fill_command(
            &image,
            &schema,
            coordinates.as_deref(),
            layout.as_deref(),
            overrides.as_deref(),
            output.as_deref(),
            config.as_deref(),
            save_coordinates,
        ),
        Commands::Extract { layout, output } => extract_command(&layout, output.as_deref()),
        Commands::Match {
            schema,
            coordinates,
        } => match_command(&schema, &coordinates),
        Commands::Overrides { action } => overrides_command(action),
    }
}
