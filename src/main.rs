//! n3graph - command-line interface
//!
//! Compares, diffs and merges graphs stored in the `n3graph-text` format.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use n3graph::store::codec;
use n3graph::{Config, Graph, LogLevel};

#[derive(Parser)]
#[command(name = "n3graph")]
#[command(version)]
#[command(about = "Compare, diff and merge N3/RDF graphs", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the first one found on the search path)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether two graphs are equal up to blank-node renaming
    Equal {
        #[command(flatten)]
        pair: GraphPair,

        /// Print the blank-node mapping as JSON
        #[arg(long)]
        mapping: bool,
    },
    /// Check whether the first graph is a sub-graph of the second
    Subgraph {
        #[command(flatten)]
        pair: GraphPair,
    },
    /// Show triples removed from the first graph and added in the second
    Diff {
        #[command(flatten)]
        pair: GraphPair,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge the second graph into the first and write the result
    Merge {
        #[command(flatten)]
        pair: GraphPair,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print triple and index counts
    Stats {
        /// Graph file ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Emit the counts as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct GraphPair {
    /// First graph file ("-" for stdin)
    #[arg(value_name = "A")]
    first: PathBuf,

    /// Second graph file
    #[arg(value_name = "B")]
    second: PathBuf,
}

#[derive(Serialize)]
struct Stats {
    triples: usize,
    prefixes: usize,
    subject_index: usize,
    predicate_index: usize,
    object_index: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides();
            config
        }
        None => Config::load().context("Failed to load config")?,
    };
    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    } else if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }
    init_logging(config.general.log_level);

    match &cli.command {
        Command::Equal { pair, mapping } => {
            let (a, b) = load_pair(pair, &config)?;
            match a.equals_with_mapping(&b) {
                Some(found) => {
                    if *mapping {
                        println!("{}", serde_json::to_string_pretty(&found)?);
                    } else {
                        println!("equal");
                    }
                }
                None => {
                    println!("not equal");
                    std::process::exit(1);
                }
            }
        }
        Command::Subgraph { pair } => {
            let (a, b) = load_pair(pair, &config)?;
            if a.is_sub_graph_of(&b) {
                println!("sub-graph");
            } else {
                println!("not a sub-graph");
                std::process::exit(1);
            }
        }
        Command::Diff { pair, json } => {
            let (a, b) = load_pair(pair, &config)?;
            let report = a.difference(&b);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
            if !report.are_equal() {
                std::process::exit(1);
            }
        }
        Command::Merge { pair, output } => {
            let (mut a, b) = load_pair(pair, &config)?;
            if !a.merge(&b) {
                bail!("Merge was cancelled");
            }
            let text = codec::encode(&a);
            match output {
                Some(path) => fs::write(path, text)
                    .with_context(|| format!("Failed to write to: {}", path.display()))?,
                None => io::stdout()
                    .write_all(text.as_bytes())
                    .context("Failed to write to stdout")?,
            }
        }
        Command::Stats { input, json } => {
            let graph = load_graph(input, &config)?;
            let (subjects, predicates, objects) = graph.store().index_sizes();
            let stats = Stats {
                triples: graph.len(),
                prefixes: graph.namespaces().len(),
                subject_index: subjects,
                predicate_index: predicates,
                object_index: objects,
            };
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("triples:    {}", stats.triples);
                println!("prefixes:   {}", stats.prefixes);
                println!("subjects:   {}", stats.subject_index);
                println!("predicates: {}", stats.predicate_index);
                println!("objects:    {}", stats.object_index);
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_pair(pair: &GraphPair, config: &Config) -> Result<(Graph, Graph)> {
    if pair.first == Path::new("-") && pair.second == Path::new("-") {
        bail!("Only one graph can be read from stdin");
    }
    Ok((load_graph(&pair.first, config)?, load_graph(&pair.second, config)?))
}

fn load_graph(path: &Path, config: &Config) -> Result<Graph> {
    let text = if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        content
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?
    };

    let mut graph = codec::decode_with_config(&text, &config.graph)
        .with_context(|| format!("Failed to decode graph: {}", path.display()))?;
    graph.namespaces_mut().import(&config.namespaces());
    debug!(path = %path.display(), triples = graph.len(), "graph loaded");
    Ok(graph)
}
