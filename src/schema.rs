//! Column and primary-key resolution for the tables being compared.

use eyre::Result;
use rusqlite::Connection;

use crate::sql::{quote_id, str_literal};

/// Ordered column list for one table: the first `pk_arity` entries are
/// the primary-key columns in key order, the rest are data columns in
/// declaration order. Names are already quoted for splicing; `types`
/// holds the declared type of each column (empty for a synthetic
/// rowid entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub columns: Vec<String>,
    pub types: Vec<String>,
    pub pk_arity: usize,
    pub implicit_rowid: bool,
}

/// Return the column list for `db_name.tab`, primary key first.
///
/// Normally the "primary key" is the true primary key: the rowid or
/// INTEGER PRIMARY KEY for ordinary tables, the declared PRIMARY KEY
/// for WITHOUT ROWID tables. With `schema_pk` set, the schema-declared
/// PRIMARY KEY is used in all cases; rows with NULL values in any PK
/// field are then excluded from the comparison by the diff query.
///
/// Returns `None` when the PK is the rowid but all three rowid
/// synonyms are shadowed by declared columns.
pub fn column_names(
    db: &Connection,
    db_name: &str,
    tab: &str,
    schema_pk: bool,
) -> Result<Option<TableColumns>> {
    let pk_arity;
    let mut true_pk;

    if !schema_pk {
        // Figure out what the true primary key is:
        //  * WITHOUT ROWID tables use the declared PRIMARY KEY.
        //  * Rowid tables with an INTEGER PRIMARY KEY use that column.
        //  * All other rowid tables use the rowid itself.
        let mut pk_index: Option<String> = None;
        let mut stmt = db.prepare(&format!(
            "PRAGMA {db_name}.index_list={}",
            str_literal(tab)
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let origin: String = row.get(3)?;
            if origin.eq_ignore_ascii_case("pk") {
                pk_index = Some(row.get(1)?);
                break;
            }
        }
        drop(rows);
        drop(stmt);

        if let Some(idx) = pk_index {
            let mut n_key = 0usize;
            let mut n_col = 0usize;
            true_pk = false;
            let mut stmt = db.prepare(&format!(
                "PRAGMA {db_name}.index_xinfo={}",
                str_literal(&idx)
            ))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                n_col += 1;
                let is_key: bool = row.get(5)?;
                if is_key {
                    n_key += 1;
                    continue;
                }
                let cid: i64 = row.get(1)?;
                if cid >= 0 {
                    true_pk = true;
                }
            }
            if n_col == n_key {
                true_pk = true;
            }
            pk_arity = if true_pk { n_key } else { 1 };
        } else {
            true_pk = true;
            pk_arity = 1;
        }
    } else {
        // Use whatever primary key the schema declares; fall back to
        // the rowid when the table declares none.
        let mut declared = 0usize;
        let mut stmt = db.prepare(&format!(
            "PRAGMA {db_name}.table_info={}",
            str_literal(tab)
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let ipk: i64 = row.get(5)?;
            if ipk > 0 {
                declared += 1;
            }
        }
        pk_arity = declared.max(1);
        true_pk = true;
    }

    // In the rowid-fallback case every declared column is data.
    let mut pk_slots: Vec<Option<(String, String)>> = vec![None; pk_arity];
    let mut data: Vec<(String, String)> = Vec::new();
    let mut stmt = db.prepare(&format!(
        "PRAGMA {db_name}.table_info={}",
        str_literal(tab)
    ))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let decl_type: String = row.get(2)?;
        let ipk: i64 = row.get(5)?;
        let entry = (quote_id(&name), decl_type);
        if true_pk && ipk > 0 && (ipk as usize) <= pk_arity {
            pk_slots[ipk as usize - 1] = Some(entry);
        } else {
            data.push(entry);
        }
    }

    let implicit_rowid = pk_slots[0].is_none();
    if implicit_rowid {
        // Pick whichever rowid synonym is not shadowed by a declared
        // column.
        for synonym in ["rowid", "_rowid_", "oid"] {
            if !data.iter().any(|(c, _)| c.eq_ignore_ascii_case(synonym)) {
                pk_slots[0] = Some((synonym.to_string(), String::new()));
                break;
            }
        }
        if pk_slots[0].is_none() {
            return Ok(None);
        }
    }

    let mut columns = Vec::with_capacity(pk_arity + data.len());
    let mut types = Vec::with_capacity(pk_arity + data.len());
    for slot in pk_slots {
        match slot {
            Some((name, ty)) => {
                columns.push(name);
                types.push(ty);
            }
            None => return Ok(None),
        }
    }
    for (name, ty) in data {
        columns.push(name);
        types.push(ty);
    }

    Ok(Some(TableColumns {
        columns,
        types,
        pk_arity,
        implicit_rowid,
    }))
}
