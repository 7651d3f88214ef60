//! RBU-format diff: emits an insert stream for `data_<table>` staging
//! tables, with fossil deltas standing in for large changed BLOBs.

use std::fmt::Write as _;
use std::io::Write;

use eyre::{Result, bail};
use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::delta;
use crate::schema::{TableColumns, column_names};
use crate::sql::{push_value, quote_id, str_literal};

/// Verify that `tab` exists with identical SQL on both sides. RBU
/// patches cannot express schema changes.
fn check_schemas_match(db: &Connection, tab: &str) -> Result<()> {
    let mut stmt = db.prepare(
        "SELECT A.sql=B.sql FROM main.sqlite_master A, aux.sqlite_master B \
         WHERE A.name=?1 AND B.name=?2",
    )?;
    let mut rows = stmt.query([tab, tab])?;
    match rows.next()? {
        Some(row) => {
            let same: bool = row.get(0)?;
            if !same {
                bail!("schema changes for table {}", quote_id(tab));
            }
        }
        None => bail!(
            "table {} missing from one or both databases",
            quote_id(tab)
        ),
    }
    Ok(())
}

/// Build the UNION ALL query producing one result row per changed
/// row. Layout: the table columns (PK first), ota_control (INTEGER 0
/// for insert, 1 for delete, TEXT mask for update), then the old
/// value of every column for delta encoding.
fn rbu_diff_query(tab: &str, cols: &TableColumns) -> String {
    let az = &cols.columns;
    let pk = cols.pk_arity;
    let n = az.len();
    let t = str_literal(tab);
    let mut q = String::new();

    // Newly inserted rows; ota_control is 0.
    q.push_str("SELECT ");
    for (i, c) in az.iter().enumerate() {
        let _ = write!(q, "{}{c}", if i == 0 { "" } else { ", " });
    }
    q.push_str(", 0, ");
    for i in 0..n {
        q.push_str(if i == 0 { "NULL" } else { ", NULL" });
    }
    let _ = write!(q, " FROM aux.{t} AS n WHERE NOT EXISTS (\n");
    let _ = write!(q, "    SELECT 1 FROM main.{t} AS o WHERE ");
    for (i, c) in az[..pk].iter().enumerate() {
        let _ = write!(q, "{}(n.{c} IS o.{c})", if i == 0 { "" } else { " AND " });
    }
    q.push_str("\n)");

    // Deleted rows; ota_control is 1.
    q.push_str("\nUNION ALL\nSELECT ");
    for (i, c) in az[..pk].iter().enumerate() {
        let _ = write!(q, "{}{c}", if i == 0 { "" } else { ", " });
    }
    if n > pk {
        q.push_str(", ");
        for i in pk..n {
            q.push_str(if i == pk { "NULL" } else { ", NULL" });
        }
    }
    q.push_str(", 1, ");
    for i in 0..n {
        q.push_str(if i == 0 { "NULL" } else { ", NULL" });
    }
    let _ = write!(q, " FROM main.{t} AS n WHERE NOT EXISTS (\n");
    let _ = write!(q, "    SELECT 1 FROM aux.{t} AS o WHERE ");
    for (i, c) in az[..pk].iter().enumerate() {
        let _ = write!(q, "{}(n.{c} IS o.{c})", if i == 0 { "" } else { " AND " });
    }
    q.push_str("\n) ");

    // Updated rows. If every column is part of the primary key there
    // is nothing to update.
    if n > pk {
        q.push_str("\nUNION ALL\nSELECT ");
        for (i, c) in az[..pk].iter().enumerate() {
            let _ = write!(q, "{}n.{c}", if i == 0 { "" } else { ", " });
        }
        q.push_str(",\n");
        for (i, c) in az[pk..].iter().enumerate() {
            let _ = write!(
                q,
                "{}    CASE WHEN n.{c} IS o.{c} THEN NULL ELSE n.{c} END",
                if i == 0 { "" } else { " ,\n" }
            );
        }
        if !cols.implicit_rowid {
            q.push_str(", '");
            for _ in 0..pk {
                q.push('.');
            }
            q.push_str("' ||\n");
        } else {
            q.push_str(",\n");
        }
        for (i, c) in az[pk..].iter().enumerate() {
            let _ = write!(
                q,
                "{}    CASE WHEN n.{c} IS o.{c} THEN '.' ELSE 'x' END",
                if i == 0 { "" } else { " ||\n" }
            );
        }
        q.push_str("\nAS ota_control, ");
        for i in 0..pk {
            q.push_str(if i == 0 { "NULL" } else { ", NULL" });
        }
        q.push_str(",\n");
        for (i, c) in az[pk..].iter().enumerate() {
            let _ = write!(
                q,
                "{}    CASE WHEN n.{c} IS o.{c} THEN NULL ELSE o.{c} END",
                if i == 0 { "" } else { " ,\n" }
            );
        }
        let _ = write!(q, "\nFROM main.{t} AS o, aux.{t} AS n\nWHERE ");
        for (i, c) in az[..pk].iter().enumerate() {
            let _ = write!(q, "{}(n.{c} IS o.{c})", if i == 0 { "" } else { " AND " });
        }
        q.push_str(" AND ota_control LIKE '%x%'");
    }

    q.push_str("\nORDER BY ");
    for i in 1..=pk {
        let _ = write!(q, "{}{i}", if i == 1 { "" } else { ", " });
    }
    q
}

/// Emit the RBU `data_<tab>` insert stream for one table.
pub fn rbudiff_one_table(db: &Connection, tab: &str, out: &mut dyn Write) -> Result<()> {
    // RBU rows are keyed by the schema-declared PK.
    check_schemas_match(db, tab)?;

    let Some(cols) = column_names(db, "main", tab, true)? else {
        bail!("table {} has no usable PK columns", quote_id(tab));
    };
    let n_col = cols.columns.len();
    let pk = cols.pk_arity;
    // Implicit-rowid tables carry the rowid in an rbu_rowid column
    // instead of a named one.
    let ota_rowid = cols.implicit_rowid;
    let skip = usize::from(ota_rowid);

    let data_name = format!("'data_{}'", tab.replace('\'', "''"));

    let mut create = format!("CREATE TABLE IF NOT EXISTS {data_name}(");
    if ota_rowid {
        create.push_str("rbu_rowid, ");
    }
    for (i, c) in cols.columns[skip..].iter().enumerate() {
        let _ = write!(create, "{}{c}", if i == 0 { "" } else { ", " });
    }
    create.push_str(", rbu_control);");

    let mut insert = format!("INSERT INTO {data_name} (");
    if ota_rowid {
        insert.push_str("rbu_rowid, ");
    }
    for (i, c) in cols.columns[skip..].iter().enumerate() {
        let _ = write!(insert, "{}{c}", if i == 0 { "" } else { ", " });
    }
    insert.push_str(", rbu_control) VALUES(");

    let sql = rbu_diff_query(tab, &cols);
    let mut create = Some(create);
    let mut stmt = db.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        // Emit the CREATE TABLE ahead of the first row only.
        if let Some(ct) = create.take() {
            writeln!(out, "{ct}")?;
        }
        let mut text = insert.clone();

        match row.get_ref(n_col)? {
            ValueRef::Integer(control) => {
                // Pure insert or delete: values verbatim.
                for i in 0..n_col {
                    if i > 0 {
                        text.push_str(", ");
                    }
                    push_value(&mut text, row.get_ref(i)?);
                }
                let _ = write!(text, ", {control}");
            }
            ValueRef::Text(control) => {
                let mut control = control.to_vec();
                for i in 0..n_col {
                    let mut done = false;
                    if i >= pk {
                        if let (ValueRef::Blob(new), ValueRef::Blob(old)) =
                            (row.get_ref(i)?, row.get_ref(n_col + 1 + i)?)
                        {
                            let patch = delta::create(old, new);
                            debug_assert!(
                                delta::apply(old, &patch).is_ok_and(|t| t == new)
                            );
                            if patch.len() < new.len() {
                                text.push_str("x'");
                                for byte in &patch {
                                    let _ = write!(text, "{byte:02x}");
                                }
                                text.push('\'');
                                control[i - skip] = b'f';
                                done = true;
                            }
                        }
                    }
                    if !done {
                        push_value(&mut text, row.get_ref(i)?);
                    }
                    text.push_str(", ");
                }
                let _ = write!(text, "'{}'", String::from_utf8_lossy(&control));
            }
            other => bail!("unexpected ota_control value {other:?}"),
        }
        writeln!(out, "{text});")?;
    }
    Ok(())
}
