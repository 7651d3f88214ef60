//! Replays a patch journal against a backup database.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use eyre::{Result, WrapErr};
use log::error;
use rusqlite::Connection;

/// Read one logical statement line. A line ends at a newline outside
/// double quotes, so quoted identifiers containing newlines survive.
/// Returns `None` at end of input.
fn read_statement(r: &mut impl BufRead) -> Result<Option<String>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut in_quote = false;
    loop {
        let start = buf.len();
        let n = r.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return if buf.is_empty() {
                Ok(None)
            } else {
                Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
            };
        }
        for &b in &buf[start..] {
            if b == b'"' {
                in_quote = !in_quote;
            }
        }
        if buf.ends_with(b"\n") && !in_quote {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
            return Ok(Some(String::from_utf8_lossy(&buf).into_owned()));
        }
    }
}

/// Execute the statements of `journal` starting at byte `offset`
/// against the database at `db_path`. A failing statement is reported
/// and the remaining statements still run.
pub fn apply_patch(db_path: &Path, journal: &Path, offset: u64) -> Result<()> {
    let mut file = File::open(journal)
        .wrap_err_with(|| format!("cannot open patch file {}", journal.display()))?;
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(file);

    let db = Connection::open(db_path)
        .wrap_err_with(|| format!("cannot open database file {}", db_path.display()))?;

    while let Some(stmt) = read_statement(&mut reader)? {
        if stmt.is_empty() {
            continue;
        }
        if let Err(e) = db.execute_batch(&stmt) {
            error!("patch statement failed: {e}\n\"{stmt}\"");
        }
    }
    Ok(())
}
