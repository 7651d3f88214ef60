use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Debug bit: dump resolved column lists for every table and exit.
pub const DEBUG_COLUMN_NAMES: u32 = 0x1;
/// Debug bit: dump the generated comparison SQL for every table and exit.
pub const DEBUG_DIFF_SQL: u32 = 0x2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FsEvent {
    /// A writable file descriptor on the database was closed
    #[value(name = "close_write")]
    CloseWrite,
    /// The database file content changed
    Modify,
}

#[derive(Debug, Clone, Parser)]
#[command(about = "Easily keep replicas of SQLite databases")]
pub struct Args {
    /// Path to the database directory; replicas live in backup/,
    /// patch journals in patches/
    pub path: PathBuf,

    /// Filesystem event that triggers a sync pass
    #[arg(long, value_enum, default_value = "close_write")]
    pub event: FsEvent,

    /// Load an SQLite extension library before each pass
    #[arg(short = 'L', long = "lib", value_name = "LIBRARY")]
    pub lib: Vec<PathBuf>,

    /// Use schema-defined PRIMARY KEYs instead of the true PKs
    #[arg(long)]
    pub primarykey: bool,

    /// Output SQL to create/populate RBU data_* table(s)
    #[arg(long)]
    pub rbu: bool,

    /// Wrap each pass in BEGIN TRANSACTION / COMMIT
    #[arg(long)]
    pub transaction: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Debug bitmask: 1 dumps column lists, 2 dumps diff SQL
    #[arg(long, default_value_t = 0, value_name = "MASK")]
    pub debug: u32,
}

/// Tunables consumed by a diff pass. Built once from the command line
/// and passed by reference into the engine.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Compare on the schema-declared PRIMARY KEY rather than the
    /// true (physical) one. Always on in RBU mode.
    pub schema_pk: bool,
    /// Emit RBU data_<table> inserts instead of plain DDL/DML.
    pub rbu: bool,
    /// Bracket the pass output in BEGIN TRANSACTION / COMMIT.
    pub use_transaction: bool,
    /// SQLite extension libraries to load before each pass.
    pub extensions: Vec<PathBuf>,
    /// Debug bitmask; nonzero short-circuits normal emission.
    pub debug: u32,
}

impl DiffOptions {
    pub fn from_args(args: &Args) -> Self {
        DiffOptions {
            // RBU updates identify rows by the declared PK columns.
            schema_pk: args.primarykey || args.rbu,
            rbu: args.rbu,
            use_transaction: args.transaction,
            extensions: args.lib.clone(),
            debug: args.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn rbu_forces_schema_pk() {
        let args = Args::parse_from(["replicator", "--rbu", "/tmp"]);
        let opts = DiffOptions::from_args(&args);
        assert!(opts.schema_pk && opts.rbu);

        let args = Args::parse_from(["replicator", "/tmp"]);
        assert!(!DiffOptions::from_args(&args).schema_pk);
    }

    #[test]
    fn event_values_parse() {
        let args = Args::parse_from(["replicator", "--event", "close_write", "/tmp"]);
        assert_eq!(args.event, FsEvent::CloseWrite);
        let args = Args::parse_from(["replicator", "--event", "modify", "/tmp"]);
        assert_eq!(args.event, FsEvent::Modify);
        let args = Args::parse_from(["replicator", "-L", "a.so", "--lib", "b.so", "/tmp"]);
        assert_eq!(args.lib.len(), 2);
    }
}

