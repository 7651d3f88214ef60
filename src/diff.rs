//! The classic SQL diff engine: given the backup attached as `main`
//! and the primary as `aux`, emit SQL that turns `main` into `aux`.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;
use eyre::{Result, WrapErr};
use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::rbu;
use crate::schema::{TableColumns, column_names};
use crate::sql::{push_value, quote_id};
use crate::types::{DEBUG_COLUMN_NAMES, DEBUG_DIFF_SQL, DiffOptions};

/// Byte-counting sink for generated SQL. Patch journals are opened in
/// append mode, so the reported position is an absolute file offset
/// the replayer can seek to.
pub struct PatchSink {
    w: Box<dyn Write>,
    pos: u64,
}

impl PatchSink {
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let f = OpenOptions::new().create(true).append(true).open(p)
                    .wrap_err_with(|| format!("cannot open patch file {}", p.display()))?;
                let pos = f.metadata()?.len();
                Ok(PatchSink { w: Box::new(BufWriter::new(f)), pos })
            }
            None => Ok(PatchSink { w: Box::new(io::stdout()), pos: 0 }),
        }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Write for PatchSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.w.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }
}

fn table_exists(db: &Connection, schema: &str, tab: &str) -> Result<bool> {
    let n: i64 = db.query_row(
        &format!(
            "SELECT count(*) FROM {schema}.sqlite_master WHERE type='table' AND name=?1"
        ),
        [tab],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Output SQL that recreates the aux.`tab` table from scratch: the
/// CREATE TABLE statement, the full row set ordered by PK, and any
/// explicit indexes.
pub fn dump_table(
    db: &Connection,
    opts: &DiffOptions,
    tab: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let id = quote_id(tab);

    let mut stmt = db.prepare("SELECT sql FROM aux.sqlite_master WHERE name=?1")?;
    let mut rows = stmt.query([tab])?;
    if let Some(row) = rows.next()? {
        let sql: String = row.get(0)?;
        writeln!(out, "{sql};")?;
    }
    drop(rows);
    drop(stmt);

    let cols = column_names(db, "aux", tab, opts.schema_pk)?;
    let (select_sql, insert_prefix) = match &cols {
        // Rowid not accessible: dump in storage order without a
        // column list.
        None => (
            format!("SELECT * FROM aux.{id}"),
            format!("INSERT INTO {id} VALUES"),
        ),
        Some(t) => {
            let mut sel = String::new();
            let mut sep = "SELECT";
            for c in &t.columns {
                let _ = write!(sel, "{sep} {c}");
                sep = ",";
            }
            let _ = write!(sel, " FROM aux.{id}");
            let mut sep = " ORDER BY";
            for i in 1..=t.pk_arity {
                let _ = write!(sel, "{sep} {i}");
                sep = ",";
            }
            let mut ins = format!("INSERT INTO {id}");
            let mut sep = '(';
            for c in &t.columns {
                ins.push(sep);
                sep = ',';
                ins.push_str(c);
            }
            ins.push_str(") VALUES");
            (sel, ins)
        }
    };

    let mut stmt = db.prepare(&select_sql)?;
    let n_col = stmt.column_count();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut line = insert_prefix.clone();
        let mut sep = '(';
        for i in 0..n_col {
            line.push(sep);
            sep = ',';
            push_value(&mut line, row.get_ref(i)?);
        }
        line.push(')');
        writeln!(out, "{line};")?;
    }
    drop(rows);
    drop(stmt);

    let mut stmt = db.prepare(
        "SELECT sql FROM aux.sqlite_master \
         WHERE type='index' AND tbl_name=?1 AND sql IS NOT NULL",
    )?;
    let mut rows = stmt.query([tab])?;
    while let Some(row) = rows.next()? {
        let sql: String = row.get(0)?;
        writeln!(out, "{sql};")?;
    }
    Ok(())
}

/// Build the three-branch comparison query for one table. The result
/// set carries the PK columns, a tag column (1 update, 2 delete,
/// 3 insert), then one (changed, value) pair per non-key column.
fn build_diff_query(id: &str, main_cols: &[String], aux_cols: &[String], pk: usize) -> String {
    let n_main = main_cols.len();
    let n2 = aux_cols.len();
    let mut sql = String::new();

    if n2 > pk {
        let mut sep = "SELECT ";
        for c in &main_cols[..pk] {
            let _ = write!(sql, "{sep}B.{c}");
            sep = ", ";
        }
        sql.push_str(", 1, -- changed row\n");
        for i in pk..n_main {
            let _ = writeln!(
                sql,
                "       A.{m} IS NOT B.{a}, B.{a}{c}",
                m = main_cols[i],
                a = aux_cols[i],
                c = if i + 1 == n2 { "" } else { "," }
            );
        }
        for i in n_main..n2 {
            let _ = writeln!(
                sql,
                "       B.{a} IS NOT NULL, B.{a}{c}",
                a = aux_cols[i],
                c = if i + 1 == n2 { "" } else { "," }
            );
        }
        let _ = writeln!(sql, "  FROM main.{id} A, aux.{id} B");
        let mut sep = " WHERE";
        for c in &main_cols[..pk] {
            let _ = write!(sql, "{sep} A.{c}=B.{c}");
            sep = " AND";
        }
        let mut sep = "\n   AND (";
        for i in pk..n_main {
            let _ = writeln!(
                sql,
                "{sep}A.{m} IS NOT B.{a}{c}",
                m = main_cols[i],
                a = aux_cols[i],
                c = if i + 1 == n2 { ")" } else { "" }
            );
            sep = "        OR ";
        }
        for i in n_main..n2 {
            let _ = writeln!(
                sql,
                "{sep}B.{a} IS NOT NULL{c}",
                a = aux_cols[i],
                c = if i + 1 == n2 { ")" } else { "" }
            );
            sep = "        OR ";
        }
        sql.push_str(" UNION ALL\n");
    }

    let mut sep = "SELECT ";
    for c in &main_cols[..pk] {
        let _ = write!(sql, "{sep}A.{c}");
        sep = ", ";
    }
    sql.push_str(if n2 > pk { ", 2, -- deleted row\n" } else { ", 2 -- deleted row\n" });
    for i in pk..n2 {
        let _ = writeln!(sql, "       NULL, NULL{}", if i + 1 == n2 { "" } else { "," });
    }
    let _ = writeln!(sql, "  FROM main.{id} A");
    let _ = writeln!(sql, " WHERE NOT EXISTS(SELECT 1 FROM aux.{id} B");
    let mut sep = "                   WHERE";
    for c in &main_cols[..pk] {
        let _ = write!(sql, "{sep} A.{c}=B.{c}");
        sep = " AND";
    }
    sql.push_str(")\n");

    let mut sep = " UNION ALL\nSELECT ";
    for c in &main_cols[..pk] {
        let _ = write!(sql, "{sep}B.{c}");
        sep = ", ";
    }
    sql.push_str(if n2 > pk { ", 3, -- inserted row\n" } else { ", 3 -- inserted row\n" });
    for i in pk..n2 {
        let _ = writeln!(
            sql,
            "       1, B.{a}{c}",
            a = aux_cols[i],
            c = if i + 1 == n2 { "" } else { "," }
        );
    }
    let _ = writeln!(sql, "  FROM aux.{id} B");
    let _ = writeln!(sql, " WHERE NOT EXISTS(SELECT 1 FROM main.{id} A");
    let mut sep = "                   WHERE";
    for c in &main_cols[..pk] {
        let _ = write!(sql, "{sep} A.{c}=B.{c}");
        sep = " AND";
    }
    sql.push_str(")\n ORDER BY");
    let mut sep = " ";
    for i in 1..=pk {
        let _ = write!(sql, "{sep}{i}");
        sep = ", ";
    }
    sql.push_str(";\n");
    sql
}

/// Descriptors are compatible when the PK arity matches and every
/// main column lines up with the aux column at the same position,
/// by name and by declared type. Aux may have extra trailing columns.
fn compatible(main_cols: &TableColumns, aux_cols: &TableColumns) -> bool {
    main_cols.pk_arity == aux_cols.pk_arity
        && main_cols.columns.len() <= aux_cols.columns.len()
        && main_cols
            .columns
            .iter()
            .zip(&aux_cols.columns)
            .all(|(m, a)| m.eq_ignore_ascii_case(a))
        && main_cols
            .types
            .iter()
            .zip(&aux_cols.types)
            .all(|(m, a)| m.eq_ignore_ascii_case(a))
}

/// Compute and emit all differences for a single table.
pub fn diff_one_table(
    db: &Connection,
    opts: &DiffOptions,
    tab: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let id = quote_id(tab);

    if opts.debug & DEBUG_COLUMN_NAMES != 0 {
        match column_names(db, "aux", tab, opts.schema_pk)? {
            None => writeln!(out, "Rowid not accessible for {id}")?,
            Some(cols) => {
                write!(out, "{id}:")?;
                for (i, c) in cols.columns.iter().enumerate() {
                    write!(out, " {c}")?;
                    if i + 1 == cols.pk_arity {
                        write!(out, " *")?;
                    }
                }
                writeln!(out)?;
            }
        }
        return Ok(());
    }

    let in_aux = table_exists(db, "aux", tab)?;
    let in_main = table_exists(db, "main", tab)?;
    if !in_aux {
        // Table missing from the primary.
        if in_main {
            writeln!(out, "DROP TABLE {id};")?;
        }
        return Ok(());
    }
    if !in_main {
        // Table missing from the backup.
        return dump_table(db, opts, tab, out);
    }

    let main_cols = column_names(db, "main", tab, opts.schema_pk)?;
    let aux_cols = column_names(db, "aux", tab, opts.schema_pk)?;
    let (main_cols, aux_cols) = match (main_cols, aux_cols) {
        (Some(m), Some(a)) if compatible(&m, &a) => (m, a),
        _ => {
            writeln!(out, "DROP TABLE {id}; -- due to schema mismatch")?;
            return dump_table(db, opts, tab, out);
        }
    };
    let pk = main_cols.pk_arity;
    let n_main = main_cols.columns.len();
    let n2 = aux_cols.columns.len();

    for c in &aux_cols.columns[n_main..] {
        writeln!(out, "ALTER TABLE {id} ADD COLUMN {c};")?;
    }

    let sql = build_diff_query(&id, &main_cols.columns, &aux_cols.columns, pk);
    if opts.debug & DEBUG_DIFF_SQL != 0 {
        writeln!(out, "SQL for {id}:\n{sql}")?;
        return Ok(());
    }

    // Drop indexes present on the backup only.
    let mut stmt = db.prepare(
        "SELECT name FROM main.sqlite_master \
         WHERE type='index' AND tbl_name=?1 \
           AND sql IS NOT NULL \
           AND sql NOT IN (SELECT sql FROM aux.sqlite_master \
                            WHERE type='index' AND tbl_name=?1 \
                              AND sql IS NOT NULL)",
    )?;
    let mut rows = stmt.query([tab])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        writeln!(out, "DROP INDEX {};", quote_id(&name))?;
    }
    drop(rows);
    drop(stmt);

    // Run the comparison query and render the differences.
    let n_q = pk + 1 + 2 * (n2 - pk);
    let mut stmt = db.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let tag: i64 = row.get(pk)?;
        let mut text = String::new();
        if tag == 1 || tag == 2 {
            if tag == 1 {
                let _ = write!(text, "UPDATE {id}");
                let mut sep = " SET";
                let mut i = pk + 1;
                while i < n_q {
                    let changed =
                        matches!(row.get_ref(i)?, ValueRef::Integer(v) if v != 0);
                    if changed {
                        let _ = write!(text, "{sep} {}=", aux_cols.columns[(i + pk - 1) / 2]);
                        sep = ",";
                        push_value(&mut text, row.get_ref(i + 1)?);
                    }
                    i += 2;
                }
            } else {
                let _ = write!(text, "DELETE FROM {id}");
            }
            let mut sep = " WHERE";
            for i in 0..pk {
                let _ = write!(text, "{sep} {}=", aux_cols.columns[i]);
                push_value(&mut text, row.get_ref(i)?);
                sep = " AND";
            }
        } else {
            let _ = write!(text, "INSERT INTO {id}({}", aux_cols.columns[0]);
            for c in &aux_cols.columns[1..] {
                let _ = write!(text, ",{c}");
            }
            text.push_str(") VALUES");
            let mut sep = '(';
            for i in 0..pk {
                text.push(sep);
                sep = ',';
                push_value(&mut text, row.get_ref(i)?);
            }
            let mut i = pk + 2;
            while i < n_q {
                text.push(',');
                push_value(&mut text, row.get_ref(i)?);
                i += 2;
            }
            text.push(')');
        }
        writeln!(out, "{text};")?;
    }
    drop(rows);
    drop(stmt);

    // Create indexes present on the primary only.
    let mut stmt = db.prepare(
        "SELECT sql FROM aux.sqlite_master \
         WHERE type='index' AND tbl_name=?1 \
           AND sql IS NOT NULL \
           AND sql NOT IN (SELECT sql FROM main.sqlite_master \
                            WHERE type='index' AND tbl_name=?1 \
                              AND sql IS NOT NULL)",
    )?;
    let mut rows = stmt.query([tab])?;
    while let Some(row) = rows.next()? {
        let sql: String = row.get(0)?;
        writeln!(out, "{sql};")?;
    }
    Ok(())
}

/// Run one diff pass: open `db1` (the backup) as `main`, attach `db2`
/// (the primary) as `aux`, and append the difference SQL to `journal`
/// (stdout when `None`). Returns the journal offset replay should
/// start from, or `None` when the databases already agree.
pub fn diff_pass(
    db1: &Path,
    db2: &Path,
    journal: Option<&Path>,
    opts: &DiffOptions,
) -> Result<Option<u64>> {
    let db = Connection::open(db1)
        .wrap_err_with(|| format!("cannot open database file {}", db1.display()))?;
    db.query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
        .wrap_err_with(|| {
            format!("{} does not appear to be a valid SQLite database", db1.display())
        })?;

    if !opts.extensions.is_empty() {
        unsafe {
            db.load_extension_enable()?;
            for ext in &opts.extensions {
                db.load_extension(ext, None::<&str>)
                    .wrap_err_with(|| format!("error loading {}", ext.display()))?;
            }
            db.load_extension_disable()?;
        }
    }

    db.execute(
        "ATTACH DATABASE ?1 AS aux",
        [db2.to_string_lossy().as_ref()],
    )
    .wrap_err_with(|| format!("cannot attach database {}", db2.display()))?;
    db.query_row("SELECT count(*) FROM aux.sqlite_master", [], |_| Ok(()))
        .wrap_err_with(|| {
            format!("{} does not appear to be a valid SQLite database", db2.display())
        })?;

    let mut tables = Vec::new();
    {
        let mut stmt = db.prepare(
            "SELECT name FROM main.sqlite_master \
              WHERE type='table' AND sql NOT LIKE 'CREATE VIRTUAL%' \
              UNION \
             SELECT name FROM aux.sqlite_master \
              WHERE type='table' AND sql NOT LIKE 'CREATE VIRTUAL%' \
              ORDER BY name",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            tables.push(row.get::<_, String>(0)?);
        }
    }

    let mut out = PatchSink::open(journal)?;
    writeln!(out, "-- {}", Local::now().format("%d %B %Y %I:%M:%S %p"))?;
    let start = out.position();
    if opts.use_transaction {
        writeln!(out, "BEGIN TRANSACTION;")?;
    }
    let body_start = out.position();

    for tab in &tables {
        if opts.rbu {
            rbu::rbudiff_one_table(&db, tab, &mut out)?;
        } else {
            diff_one_table(&db, opts, tab, &mut out)?;
        }
    }

    let body_end = out.position();
    if opts.use_transaction {
        writeln!(out, "COMMIT;")?;
    }
    out.flush()?;

    Ok(if body_end == body_start { None } else { Some(start) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::apply_patch;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn opts() -> DiffOptions {
        DiffOptions {
            schema_pk: false,
            rbu: false,
            use_transaction: false,
            extensions: Vec::new(),
            debug: 0,
        }
    }

    struct Fixture {
        _dir: TempDir,
        backup: PathBuf,
        primary: PathBuf,
        journal: PathBuf,
    }

    impl Fixture {
        fn new(backup_sql: &str, primary_sql: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let backup = dir.path().join("backup.db");
            let primary = dir.path().join("primary.db");
            let journal = dir.path().join("journal.sql");
            Connection::open(&backup)
                .unwrap()
                .execute_batch(backup_sql)
                .unwrap();
            Connection::open(&primary)
                .unwrap()
                .execute_batch(primary_sql)
                .unwrap();
            Fixture { _dir: dir, backup, primary, journal }
        }

        fn diff(&self, opts: &DiffOptions) -> (Option<u64>, String) {
            let offset =
                diff_pass(&self.backup, &self.primary, Some(&self.journal), opts).unwrap();
            let text = fs::read_to_string(&self.journal).unwrap();
            (offset, text)
        }
    }

    #[test]
    fn simple_insert() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'x');",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'x'),(2,'y');",
        );
        let (offset, text) = f.diff(&opts());
        assert!(offset.is_some());
        assert!(text.contains("INSERT INTO t(a,b) VALUES(2,'y');\n"), "{text}");
        assert!(!text.contains("UPDATE"), "{text}");
        assert!(!text.contains("DELETE"), "{text}");
    }

    #[test]
    fn simple_update() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'x');",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'y');",
        );
        let (_, text) = f.diff(&opts());
        assert!(text.contains("UPDATE t SET b='y' WHERE a=1;\n"), "{text}");
    }

    #[test]
    fn delete_and_added_column() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'x'),(2,'y');",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT, c INT);
             INSERT INTO t VALUES(1,'x',9);",
        );
        let (_, text) = f.diff(&opts());
        assert!(text.contains("ALTER TABLE t ADD COLUMN c;\n"), "{text}");
        assert!(text.contains("UPDATE t SET c=9 WHERE a=1;\n"), "{text}");
        assert!(text.contains("DELETE FROM t WHERE a=2;\n"), "{text}");
    }

    #[test]
    fn schema_mismatch_recreates() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b INT);
             INSERT INTO t VALUES(1,2);",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'two');",
        );
        let (_, text) = f.diff(&opts());
        assert!(text.contains("DROP TABLE t; -- due to schema mismatch\n"), "{text}");
        assert!(text.contains("CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);\n"), "{text}");
        assert!(text.contains("INSERT INTO t(a,b) VALUES(1,'two');\n"), "{text}");
    }

    #[test]
    fn table_only_in_backup_is_dropped() {
        let f = Fixture::new(
            "CREATE TABLE gone(a INTEGER PRIMARY KEY);",
            "CREATE TABLE kept(a INTEGER PRIMARY KEY);",
        );
        let (_, text) = f.diff(&opts());
        assert!(text.contains("DROP TABLE gone;\n"), "{text}");
        assert!(text.contains("CREATE TABLE kept(a INTEGER PRIMARY KEY);\n"), "{text}");
    }

    #[test]
    fn keyword_identifiers_stay_quoted() {
        let f = Fixture::new(
            "CREATE TABLE \"order\"(\"select\" INTEGER PRIMARY KEY, v TEXT);
             INSERT INTO \"order\" VALUES(1,'a');",
            "CREATE TABLE \"order\"(\"select\" INTEGER PRIMARY KEY, v TEXT);
             INSERT INTO \"order\" VALUES(1,'a'),(2,'b');",
        );
        let (_, text) = f.diff(&opts());
        assert!(
            text.contains("INSERT INTO \"order\"(\"select\",v) VALUES(2,'b');\n"),
            "{text}"
        );
    }

    #[test]
    fn index_reconciliation() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             CREATE INDEX old_idx ON t(b);",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             CREATE INDEX new_idx ON t(b);",
        );
        let (_, text) = f.diff(&opts());
        assert!(text.contains("DROP INDEX old_idx;\n"), "{text}");
        assert!(text.contains("CREATE INDEX new_idx ON t(b);\n"), "{text}");
    }

    #[test]
    fn null_diff_reports_none() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'x');",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(1,'x');",
        );
        let (offset, _) = f.diff(&opts());
        assert!(offset.is_none());

        // Same result inside a transaction bracket.
        let mut with_tx = opts();
        with_tx.use_transaction = true;
        let (offset, text) = f.diff(&with_tx);
        assert!(offset.is_none());
        assert!(text.contains("BEGIN TRANSACTION;\nCOMMIT;\n"), "{text}");
    }

    #[test]
    fn patch_replay_converges() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT, c BLOB);
             INSERT INTO t VALUES(1,'x',x'0102'),(2,'y',NULL),(4,'stale',x'ff');
             CREATE TABLE dead(k INTEGER PRIMARY KEY);",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT, c BLOB);
             INSERT INTO t VALUES(1,'x2',x'0102'),(2,'y',x'03'),(3,'new',NULL);
             CREATE TABLE born(k INTEGER PRIMARY KEY, v TEXT);
             INSERT INTO born VALUES(7,'it''s');",
        );
        let (offset, _) = f.diff(&opts());
        apply_patch(&f.backup, &f.journal, offset.unwrap()).unwrap();

        // A second pass over the patched backup finds nothing left.
        let (offset, _) = f.diff(&opts());
        assert!(offset.is_none(), "replay did not converge");
    }

    #[test]
    fn rows_emitted_in_pk_order() {
        let f = Fixture::new(
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);",
            "CREATE TABLE t(a INTEGER PRIMARY KEY, b TEXT);
             INSERT INTO t VALUES(3,'c'),(1,'a'),(2,'b');",
        );
        let (_, text) = f.diff(&opts());
        let p1 = text.find("VALUES(1,").unwrap();
        let p2 = text.find("VALUES(2,").unwrap();
        let p3 = text.find("VALUES(3,").unwrap();
        assert!(p1 < p2 && p2 < p3, "{text}");
    }
}
