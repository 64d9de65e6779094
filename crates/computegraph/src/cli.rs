use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "computegraph", version)]
#[command(about = "Inspect, refine and simplify typed compute graphs")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered ops
    Ops {
        /// Only ops whose first input accepts this type (JSON, e.g. '"number"')
        #[arg(long, value_name = "TYPE")]
        input_type: Option<String>,

        /// Include hidden ops
        #[arg(long)]
        all: bool,
    },

    /// Check whether one type is assignable to another
    Check {
        /// File holding the source type as JSON
        from: PathBuf,

        /// File holding the target type as JSON
        to: PathBuf,
    },

    /// Refine a serialized graph and print the type of each root
    Refine {
        /// Serialized graph
        graph: PathBuf,

        /// Canned query responses keyed by op name
        #[arg(long, value_name = "FILE")]
        responses: Option<PathBuf>,

        /// Print the refined graph as JSON instead of root types
        #[arg(long)]
        emit: bool,
    },

    /// Simplify a serialized graph and print the result as JSON
    Simplify {
        /// Serialized graph
        graph: PathBuf,

        /// Canned query responses keyed by op name
        #[arg(long, value_name = "FILE")]
        responses: Option<PathBuf>,
    },
}
