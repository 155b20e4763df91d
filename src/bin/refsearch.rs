//! Refsearch CLI: run a reference search over a described heap.
//!
//! Usage:
//!   refsearch search --heap heap.yaml [--config search.yaml] [--strong-only]
//!                    [--max-nodes N] [--max-depth N] [--pretty]
//!
//! Prints the search report as JSON on stdout. Logs go to stderr and are
//! filtered by `RUST_LOG`.

use clap::{Parser, Subcommand};
use refsearch::{search_with_config, HeapSpec, SearchConfig, SearchOutcome};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "refsearch",
    version,
    about = "Strong-reachability search over runtime reference graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether the heap's target is reachable from its held roots
    Search {
        /// Heap description (.yaml, .yml or .json)
        #[arg(long)]
        heap: PathBuf,
        /// Search configuration (.yaml, .yml or .json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Count only strong references
        #[arg(long)]
        strong_only: bool,
        /// Stop after expanding this many values
        #[arg(long)]
        max_nodes: Option<usize>,
        /// Do not expand values deeper than this
        #[arg(long)]
        max_depth: Option<usize>,
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

struct SearchArgs<'a> {
    heap: &'a Path,
    config: Option<&'a Path>,
    strong_only: bool,
    max_nodes: Option<usize>,
    max_depth: Option<usize>,
    pretty: bool,
}

fn cmd_search(args: SearchArgs<'_>) -> i32 {
    let mut config = match args.config {
        Some(path) => match SearchConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => SearchConfig::default(),
    };
    if args.strong_only {
        config.strong_only = true;
    }
    if let Some(max) = args.max_nodes {
        config.max_nodes = Some(max);
    }
    if let Some(max) = args.max_depth {
        config.max_depth = Some(max);
    }

    let loaded = match HeapSpec::from_path(args.heap).and_then(|spec| spec.build()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let outcome = match search_with_config(&loaded.heap, &loaded.target, &loaded.held, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let code = match outcome {
        SearchOutcome::Failed(_) => 2,
        _ => 0,
    };

    let report = outcome.into_report();
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match rendered {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            heap,
            config,
            strong_only,
            max_nodes,
            max_depth,
            pretty,
        } => {
            let code = cmd_search(SearchArgs {
                heap: &heap,
                config: config.as_deref(),
                strong_only,
                max_nodes,
                max_depth,
                pretty,
            });
            std::process::exit(code);
        }
    }
}
