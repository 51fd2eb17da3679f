//! NgView CLI
//!
//! Launches the viewer window, or runs store imports and inspections
//! without one.

use clap::{Parser, Subcommand};
use console::{style, Term};
use indicatif::HumanDuration;
use ngview::logging::{self, LogTarget};
use ngview::store::{ContainerInfo, CreateOptions};
use ngview::{format_size, gui, AppConfig, ConsoleProgress, LoadOptions, MapDocument, NgViewError, Session};
use std::path::{Path, PathBuf};

/// NgView - map viewer over a local vector store
#[derive(Parser)]
#[command(name = "ngview")]
#[command(version)]
#[command(about = "Map viewer over a local vector store", long_about = None)]
struct Cli {
    /// Data directory holding the main store (default: ./tmp)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Store worker threads
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the viewer window (default)
    Gui,

    /// Load a vector data source into a store
    Import {
        /// GeoJSON file to load
        source: PathBuf,

        /// Target store container (default: the main store)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Load option as KEY=VALUE (FEATURES_SKIP, BATCH_SIZE, NAME)
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Keep features without geometry
        #[arg(long)]
        keep_empty: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a map document summary
    Info {
        /// Map document (.ngmd)
        map: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the datasets of a store container
    Store {
        /// Store container (default: the main store)
        path: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut config = AppConfig::default();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(threads) = cli.threads {
        config.num_threads = threads.max(1);
    }
    config.debug_mode = cli.debug;

    let command = cli.command.unwrap_or(Commands::Gui);
    if !matches!(command, Commands::Gui) {
        logging::init(LogTarget::Stderr, config.debug_mode);
    }

    let result = match command {
        Commands::Gui => {
            let result = gui::run(config);
            if let Err(e) = result.as_ref() {
                if !e.is_recoverable() {
                    gui::show_fatal_error(e);
                }
            }
            result
        }

        Commands::Import {
            source,
            store,
            options,
            keep_empty,
            json,
        } => cmd_import(config, &source, store.as_deref(), &options, keep_empty, json),

        Commands::Info { map, json } => cmd_info(&map, json),

        Commands::Store { path, json } => cmd_store(config, path.as_deref(), json),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

/// Import command implementation
fn cmd_import(
    config: AppConfig,
    source: &Path,
    store: Option<&Path>,
    pairs: &[String],
    keep_empty: bool,
    json: bool,
) -> ngview::Result<()> {
    let mut options = if pairs.is_empty() {
        config.load_options()
    } else {
        LoadOptions::from_pairs(pairs)?
    };
    if keep_empty {
        options.skip_empty_geometry = false;
    }

    let session = Session::init(config)?;
    let catalog = session.catalog();
    let store = match store {
        Some(path) => path.to_path_buf(),
        None => session.store_path().to_path_buf(),
    };
    if !catalog.object_exists(&store) {
        let parent = store.parent().unwrap_or_else(|| Path::new("."));
        let name = store
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NgViewError::NotFound(store.clone()))?;
        catalog.create_container(parent, name, CreateOptions::default())?;
    }

    if !json {
        println!(
            "{} Loading {} into {}",
            style("→").cyan().bold(),
            style(source.display()).yellow(),
            style(store.display()).yellow()
        );
    }

    let progress = if !json && Term::stderr().is_term() {
        ConsoleProgress::new()
    } else {
        ConsoleProgress::hidden()
    };
    let summary = match catalog.import_into(source, &store, &options, &progress) {
        Ok(summary) => {
            progress.finish("Done");
            summary
        }
        Err(e) => {
            progress.abandon("Failed");
            return Err(e);
        }
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dataset": summary.dataset,
                "path": summary.dataset_path(),
                "features": summary.features_written,
                "skipped": summary.features_skipped,
                "bytes": summary.bytes_written,
                "elapsed_seconds": summary.elapsed.as_secs_f64(),
            })
        );
        return Ok(());
    }

    println!();
    println!(
        "{} Load finished in {}",
        style("✓").green().bold(),
        style(HumanDuration(summary.elapsed)).cyan()
    );
    println!();
    println!("  {} {}", style("Dataset:").bold(), summary.dataset_path().display());
    println!("  {} {}", style("Features:").bold(), summary.features_written);
    if summary.features_skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").bold(),
            style(summary.features_skipped).red()
        );
    }
    println!(
        "  {} {}",
        style("Size:").bold(),
        style(format_size(summary.bytes_written)).yellow()
    );

    Ok(())
}

/// Info command implementation
fn cmd_info(path: &Path, json: bool) -> ngview::Result<()> {
    let document = MapDocument::load(path)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "name": document.name,
                "description": document.description,
                "created": document.created,
                "layers": document.layers,
            })
        );
        return Ok(());
    }

    println!("{} {}", style("Map:").bold(), style(&document.name).yellow());
    if !document.description.is_empty() {
        println!("  {}", document.description);
    }
    println!(
        "  {} {}",
        style("Created:").bold(),
        document.created.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  {} {}", style("Layers:").bold(), document.layers.len());
    println!();

    for (position, layer) in document.layers.iter().enumerate() {
        let visibility = if layer.visible {
            style("visible").green()
        } else {
            style("hidden").dim()
        };
        println!(
            "  {:>3}. {:<24} {:<8} {:<8} {}",
            position,
            layer.name,
            layer.kind.as_str(),
            visibility,
            layer.source.display()
        );
    }

    Ok(())
}

/// Store command implementation
fn cmd_store(config: AppConfig, path: Option<&Path>, json: bool) -> ngview::Result<()> {
    let info = match path {
        Some(path) => ContainerInfo::read(path)?,
        None => {
            let session = Session::init(config)?;
            session.catalog().container_info(session.store_path())?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "{} {} (format {}, created {})",
        style("Store:").bold(),
        style(&info.name).yellow(),
        info.format_version,
        info.created.format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    if info.datasets.is_empty() {
        println!("  {}", style("No datasets").dim());
        return Ok(());
    }

    println!(
        "  {:<24} {:>10} {:>8} {:<18} {:>10}",
        style("Name").bold(),
        style("Features").bold(),
        style("Skipped").bold(),
        style("Geometry").bold(),
        style("Size").bold()
    );
    for dataset in &info.datasets {
        println!(
            "  {:<24} {:>10} {:>8} {:<18} {:>10}",
            dataset.name,
            dataset.feature_count,
            dataset.skipped_count,
            dataset.geometry_type,
            format_size(dataset.bytes)
        );
    }
    println!();
    println!("  {} {} features", style("Total:").bold(), info.total_features());

    Ok(())
}
