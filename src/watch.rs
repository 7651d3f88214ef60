//! Filesystem event loop: one diff-and-replay pass per primary
//! database event.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use eyre::{Result, WrapErr, bail};
use log::info;
use notify::event::{AccessKind, AccessMode, EventKind};
use notify::{RecursiveMode, Watcher};

use crate::diff::diff_pass;
use crate::patch::apply_patch;
use crate::types::{DiffOptions, FsEvent};

/// Settle time before diffing after a modify event; the writer may
/// still hold the database lock.
const MODIFY_SETTLE: Duration = Duration::from_millis(250);

fn wanted(kind: &EventKind, which: FsEvent) -> bool {
    match which {
        FsEvent::CloseWrite => {
            matches!(kind, EventKind::Access(AccessKind::Close(AccessMode::Write)))
        }
        FsEvent::Modify => matches!(kind, EventKind::Modify(_)),
    }
}

/// Diff the primary database `name` against its replica and replay the
/// appended patch.
pub fn sync_one(root: &Path, name: &str, which: FsEvent, opts: &DiffOptions) -> Result<()> {
    let primary = root.join(name);
    let backup = root.join("backup").join(name);
    let journal = root.join("patches").join(name);

    if which == FsEvent::Modify {
        thread::sleep(MODIFY_SETTLE);
    }

    match diff_pass(&backup, &primary, Some(&journal), opts)? {
        Some(offset) => {
            info!("patching {} from offset {offset}", backup.display());
            apply_patch(&backup, &journal, offset)?;
            info!("patch {} ok", backup.display());
        }
        None => info!("no difference for {name}"),
    }
    Ok(())
}

/// Watch `root` until interrupted, running a sync pass for every
/// matching event on a primary database file.
pub fn watch_loop(root: &Path, which: FsEvent, opts: &DiffOptions) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .wrap_err("cannot install SIGINT handler")?;
    }

    let (tx, rx) = mpsc::channel();
    let mut watcher =
        notify::recommended_watcher(tx).wrap_err("cannot create filesystem watcher")?;
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .wrap_err_with(|| format!("cannot watch {}", root.display()))?;

    info!("listening for events in {}", root.display());
    while !stop.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => bail!("filesystem watch error: {e}"),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        if !wanted(&event.kind, which) {
            continue;
        }
        for path in &event.paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // SQLite's own rollback journals churn alongside the
            // database; syncing them would be meaningless.
            if name.contains("-journal") || !path.is_file() {
                continue;
            }
            info!("caught {} event", path.display());
            sync_one(root, name, which, opts)?;
        }
    }
    info!("listening for events stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn event_kind_mapping() {
        let close = EventKind::Access(AccessKind::Close(AccessMode::Write));
        let modify = EventKind::Modify(notify::event::ModifyKind::Any);
        assert!(wanted(&close, FsEvent::CloseWrite));
        assert!(!wanted(&modify, FsEvent::CloseWrite));
        assert!(wanted(&modify, FsEvent::Modify));
        assert!(!wanted(&close, FsEvent::Modify));
    }

    #[test]
    fn sync_one_brings_replica_up_to_date() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("backup")).unwrap();
        fs::create_dir(root.join("patches")).unwrap();

        Connection::open(root.join("app.db"))
            .unwrap()
            .execute_batch(
                "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
                 INSERT INTO t VALUES(1,'one'),(2,'two');",
            )
            .unwrap();

        let opts = DiffOptions {
            schema_pk: false,
            rbu: false,
            use_transaction: false,
            extensions: Vec::new(),
            debug: 0,
        };
        // First pass creates the replica from nothing.
        sync_one(root, "app.db", FsEvent::CloseWrite, &opts).unwrap();

        let replica = Connection::open(root.join("backup/app.db")).unwrap();
        let n: i64 = replica
            .query_row("SELECT count(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 2);
        drop(replica);

        // Mutate the primary and sync again; the journal now holds
        // two concatenated passes.
        Connection::open(root.join("app.db"))
            .unwrap()
            .execute_batch("UPDATE t SET b='uno' WHERE a=1; DELETE FROM t WHERE a=2;")
            .unwrap();
        sync_one(root, "app.db", FsEvent::CloseWrite, &opts).unwrap();

        let replica = Connection::open(root.join("backup/app.db")).unwrap();
        let b: String = replica
            .query_row("SELECT b FROM t WHERE a=1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(b, "uno");
        let n: i64 = replica
            .query_row("SELECT count(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);

        let journal = fs::read_to_string(root.join("patches/app.db")).unwrap();
        assert_eq!(journal.matches("-- ").count(), 2, "{journal}");
    }
}
