//! CLI entrypoint for the CredRank demonstration pipeline.
//!
//! Loads a JSON fixture describing a weighted graph, participants,
//! intervals, and parameters; builds the Markov process graph; runs a
//! bundled power-iteration solver; and writes the resulting cred graph
//! document. This binary exists only to exercise the core crates
//! end-to-end — CLI plumbing and the eigensolver itself stay out of scope
//! for the core library.

mod fixture;
mod solver;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use credrank_core::CredRankError;
use credrank_cred::CredGraph;
use credrank_graph::{build, BuildArgs, ChainView};

use fixture::Fixture;

/// CLI for the CredRank demonstration pipeline.
#[derive(Debug, Parser)]
#[command(name = "credrank")]
#[command(about = "Builds, scores, and exports a CredRank cred graph from a fixture")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Power-iteration convergence tolerance (L1 change between iterates).
    #[arg(long, default_value_t = 1e-7, global = true)]
    tolerance: f64,

    /// Maximum power-iteration steps before giving up on convergence.
    #[arg(long, default_value_t = 1000, global = true)]
    max_iterations: usize,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Build the Markov process graph from a fixture and write it as a
    /// `sourcecred/markovProcessGraph` document, without scoring it.
    Build {
        /// Input fixture path.
        #[arg(long)]
        fixture: PathBuf,
        /// Output document path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Build, score, and write a full `sourcecred/credGraph` document.
    Score {
        /// Input fixture path.
        #[arg(long)]
        fixture: PathBuf,
        /// Output document path.
        #[arg(long)]
        output: PathBuf,
    },
}

fn load_fixture(path: &PathBuf) -> Result<Fixture, CredRankError> {
    let body = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

fn build_chain(fixture: &Fixture) -> Result<ChainView, CredRankError> {
    let source = fixture.graph_source();
    let graph = build(BuildArgs {
        weighted_graph: &source,
        participants: fixture.participants(),
        intervals: fixture.intervals(),
        parameters: fixture.parameters(),
    })?;
    info!(
        node_count = graph.nodes().len(),
        edge_count = graph.edges().len(),
        "built markov process graph"
    );
    Ok(ChainView::new(graph))
}

fn run() -> Result<(), CredRankError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { fixture, output } => {
            let fixture = load_fixture(&fixture)?;
            let chain = build_chain(&fixture)?;
            let json = credrank_graph::json::to_json(&chain)?;
            fs::write(output, json)?;
        }
        Command::Score { fixture, output } => {
            let fixture = load_fixture(&fixture)?;
            let chain = build_chain(&fixture)?;
            let sparse = chain.to_sparse_chain()?;
            let scores = solver::power_iteration(&sparse, cli.tolerance, cli.max_iterations);
            info!(node_count = scores.len(), "power iteration complete");
            let cred_graph = CredGraph::new(chain, scores)?;
            let json = credrank_cred::json::to_json(&cred_graph)?;
            fs::write(output, json)?;
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
