//! Leak analyzer CLI
//!
//! # Usage
//!
//! ```bash
//! # Explain why the object tagged with a key is still alive
//! cargo run --bin leakgraph --release -- analyze --snapshot dump.json --key 3f2a...
//!
//! # List every watched object still present in the snapshot
//! cargo run --bin leakgraph --release -- tracked --snapshot dump.json
//!
//! # Print the configuration a preset expands to
//! cargo run --bin leakgraph -- config --preset jvm
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use leakgraph_analyzer::pipeline::{render_json, render_text};
use leakgraph_analyzer::{AnalyzerConfig, HeapAnalyzer, LoggingProgressListener, Preset};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leakgraph")]
#[command(about = "Heap snapshot leak analyzer - shortest strong path from a GC root", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one watched object
    Analyze {
        /// Snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Key stored in the tag record
        #[arg(short, long)]
        key: String,

        /// Analyzer configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Skip the dominator tree and bitmap correction
        #[arg(long)]
        no_retained_size: bool,

        /// Dump the fields of every trace element
        #[arg(long)]
        details: bool,

        /// Debug logging (overridden by RUST_LOG)
        #[arg(short, long)]
        verbose: bool,
    },

    /// List tag records whose referent is still present
    Tracked {
        /// Snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Analyzer configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print a preset as a configuration file
    Config {
        #[arg(short, long, default_value = "android")]
        preset: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AnalyzerConfig::from_yaml(path)?,
        None => AnalyzerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            snapshot,
            key,
            config,
            format,
            no_retained_size,
            details,
            verbose,
        } => {
            init_logging(verbose);
            analyze(&snapshot, &key, config.as_deref(), format, no_retained_size, details)?;
        }
        Commands::Tracked {
            snapshot,
            config,
            format,
        } => {
            init_logging(false);
            list_tracked(&snapshot, config.as_deref(), format)?;
        }
        Commands::Config { preset } => {
            let preset = Preset::from_str(&preset)?;
            print!("{}", AnalyzerConfig::preset(preset).to_yaml()?);
        }
    }

    Ok(())
}

fn analyze(
    snapshot: &Path,
    key: &str,
    config: Option<&Path>,
    format: OutputFormat,
    no_retained_size: bool,
    details: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let compute_retained_size = config.compute_retained_size && !no_retained_size;

    let analyzer =
        HeapAnalyzer::from_config(&config).with_listener(Box::new(LoggingProgressListener));
    let result = analyzer.check_for_leak(snapshot, key, compute_retained_size);

    match format {
        OutputFormat::Text => print!("{}", render_text(&result, details)),
        OutputFormat::Json => println!("{}", render_json(&result)?),
    }

    if result.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}

fn list_tracked(
    snapshot: &Path,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let tracked = HeapAnalyzer::from_config(&config).find_tracked_references(snapshot)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tracked)?),
        OutputFormat::Text => {
            if tracked.is_empty() {
                println!("No watched objects in snapshot.");
            }
            for reference in &tracked {
                println!("* {} ({})", reference.class_name, reference.name);
                println!("  key: {}", reference.key);
                for field in &reference.fields {
                    println!("  | {}", field);
                }
            }
        }
    }
    Ok(())
}
