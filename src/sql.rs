//! SQL text helpers: identifier quoting and literal rendering for the
//! generated patch scripts.

use std::fmt::Write;

use rusqlite::types::ValueRef;

/// All SQLite keywords, in alphabetical order.
static KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ANALYZE", "AND", "AS",
    "ASC", "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY",
    "CASCADE", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "COMMIT",
    "CONFLICT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE",
    "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT", "DEFERRABLE",
    "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUSIVE", "EXISTS", "EXPLAIN",
    "FAIL", "FOR", "FOREIGN", "FROM", "FULL", "GLOB", "GROUP", "HAVING", "IF",
    "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED", "INITIALLY", "INNER",
    "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY",
    "LEFT", "LIKE", "LIMIT", "MATCH", "NATURAL", "NO", "NOT", "NOTNULL",
    "NULL", "OF", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PLAN", "PRAGMA",
    "PRIMARY", "QUERY", "RAISE", "RECURSIVE", "REFERENCES", "REGEXP",
    "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT", "RIGHT",
    "ROLLBACK", "ROW", "SAVEPOINT", "SELECT", "SET", "TABLE", "TEMP",
    "TEMPORARY", "THEN", "TO", "TRANSACTION", "TRIGGER", "UNION", "UNIQUE",
    "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WITH", "WITHOUT",
];

/// Safely quote an SQL identifier. Uses the minimum amount of
/// transformation necessary to allow the name to be spliced into a
/// statement verbatim.
pub fn quote_id(id: &str) -> String {
    if id.is_empty() {
        return "\"\"".to_string();
    }
    let mut has_digit = false;
    for (i, c) in id.chars().enumerate() {
        if !c.is_ascii_alphabetic() && c != '_' {
            if i > 0 && c.is_ascii_digit() {
                has_digit = true;
            } else {
                return format!("\"{}\"", id.replace('"', "\"\""));
            }
        }
    }
    // Names carrying digits cannot collide with a keyword.
    if has_digit {
        return id.to_string();
    }
    let upper = id.to_ascii_uppercase();
    if KEYWORDS.binary_search(&upper.as_str()).is_ok() {
        return format!("\"{}\"", id.replace('"', "\"\""));
    }
    id.to_string()
}

/// Render a string as a single-quoted SQL literal.
pub fn str_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Append one cell value to `out` as an SQL literal.
pub fn push_value(out: &mut String, v: ValueRef<'_>) {
    match v {
        ValueRef::Null => out.push_str("NULL"),
        ValueRef::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        ValueRef::Real(r) => push_real(out, r),
        ValueRef::Text(t) => {
            out.push('\'');
            out.push_str(&String::from_utf8_lossy(t).replace('\'', "''"));
            out.push('\'');
        }
        ValueRef::Blob(b) => {
            // sqlite3_value_blob() returns a null pointer for an empty
            // blob; the original renders that as NULL.
            if b.is_empty() {
                out.push_str("NULL");
            } else {
                out.push_str("x'");
                for byte in b {
                    let _ = write!(out, "{byte:02x}");
                }
                out.push('\'');
            }
        }
    }
}

/// Append a REAL as a literal that round-trips and keeps REAL affinity.
fn push_real(out: &mut String, r: f64) {
    if r.is_infinite() {
        out.push_str(if r > 0.0 { "9.0e+999" } else { "-9.0e+999" });
        return;
    }
    let s = format!("{r}");
    out.push_str(&s);
    if !s.bytes().any(|b| b == b'.' || b == b'e' || b == b'E') {
        out.push_str(".0");
    }
}
