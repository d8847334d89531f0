//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "netmeta",
    version,
    author = "neur0map",
    about = "Enrich and filter network telemetry records, and inspect MIB trap registries",
    long_about = "netmeta copies SNMP interface metadata into telemetry records, applies a \
                  configurable keep/drop rule set, and loads trap descriptor files into a \
                  queryable OID registry."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/netmeta/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one attribute map against the configured rules
    Check {
        /// JSON file with the record's attributes (object of name -> value)
        attrs: PathBuf,

        /// JSON file with interface metadata (object of ifIndex -> attributes)
        #[arg(long, value_name = "FILE")]
        interfaces: Option<PathBuf>,

        /// Interface the record belongs to
        #[arg(short, long)]
        interface: Option<u32>,

        /// Print the enriched attributes as well
        #[arg(long)]
        show_attrs: bool,
    },

    /// Stream JSON-lines records through the filter and into the HTTP sink
    Run {
        /// Input file with one record event per line (defaults to stdin)
        input: Option<PathBuf>,

        /// JSON file with interface metadata (object of ifIndex -> attributes)
        #[arg(long, value_name = "FILE")]
        interfaces: Option<PathBuf>,
    },

    /// Load trap descriptors and summarize or query them
    Mibs {
        /// Descriptor files or directories (defaults to registry.descriptor_dir)
        paths: Vec<PathBuf>,

        /// Show the trap or variable registered at this OID
        #[arg(long)]
        oid: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["netmeta", "check", "attrs.json", "-i", "10"]).unwrap();
        match cli.command {
            Commands::Check { interface, .. } => assert_eq!(interface, Some(10)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
