// Watches a directory of SQLite databases, appends a SQL diff to a
// per-database patch journal on every change, and replays the patch
// onto the replica in backup/.

mod delta;
mod diff;
mod patch;
mod rbu;
mod schema;
mod sql;
mod types;
mod watch;

use std::fs;
use std::process;

use clap::Parser;
use eyre::Result;

use crate::types::{Args, DiffOptions};

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "info" } else { "warn" }),
    )
    .init();

    if let Err(e) = run(&args) {
        eprintln!("replicator: {e:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if !args.path.is_dir() {
        eyre::bail!("{} is not a directory", args.path.display());
    }
    fs::create_dir_all(args.path.join("backup"))?;
    fs::create_dir_all(args.path.join("patches"))?;

    let opts = DiffOptions::from_args(args);
    if opts.debug != 0 {
        return debug_dump(args, &opts);
    }
    watch::watch_loop(&args.path, args.event, &opts)
}

/// One immediate pass per primary database, dumped to stdout.
fn debug_dump(args: &Args, opts: &DiffOptions) -> Result<()> {
    for entry in fs::read_dir(&args.path)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.contains("-journal") {
            continue;
        }
        let backup = args.path.join("backup").join(name);
        diff::diff_pass(&backup, &path, None, opts)?;
    }
    Ok(())
}
