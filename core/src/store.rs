//! SQLite report export.
//!
//! RULE: Only store.rs talks to the database.
//!
//! A workbook becomes one table per sheet, named after the sheet, plus
//! three bookkeeping tables:
//!   report_meta    (key, value)              generated_at
//!   report_sheet   (position, name)          sheet order
//!   report_column  (sheet, position, name)   header of each sheet
//! Sheet tables use positional columns `row_no, c0, c1, ...` so any
//! header survives, including names SQLite would treat as duplicates
//! and sheets with no columns at all.
//! Writing a workbook replaces whatever report the file held before.

use crate::{
    dataset::CellValue,
    error::{DashError, DashResult},
    report::{Sheet, Workbook},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection, OptionalExtension};

pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Open (or create) a report database at `path`.
    pub fn open(path: &str) -> DashResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DashResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> DashResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS report_meta (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS report_sheet (
                 position INTEGER PRIMARY KEY,
                 name     TEXT NOT NULL UNIQUE
             );
             CREATE TABLE IF NOT EXISTS report_column (
                 sheet    TEXT    NOT NULL,
                 position INTEGER NOT NULL,
                 name     TEXT    NOT NULL,
                 PRIMARY KEY (sheet, position)
             );",
        )?;
        Ok(())
    }

    // ── Write ──────────────────────────────────────────────────

    pub fn write_workbook(&self, workbook: &Workbook) -> DashResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        for name in self.sheet_names()? {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(&name)))?;
        }
        tx.execute("DELETE FROM report_sheet", [])?;
        tx.execute("DELETE FROM report_column", [])?;
        tx.execute("DELETE FROM report_meta", [])?;

        tx.execute(
            "INSERT INTO report_meta (key, value) VALUES ('generated_at', ?1)",
            params![workbook.generated_at.to_rfc3339()],
        )?;

        for (position, sheet) in workbook.sheets.iter().enumerate() {
            tx.execute(
                "INSERT INTO report_sheet (position, name) VALUES (?1, ?2)",
                params![position as i64, sheet.name],
            )?;
            write_sheet(&tx, sheet)?;
        }

        tx.commit()?;
        log::info!("report written: {} sheet(s)", workbook.sheets.len());
        Ok(())
    }

    // ── Read ───────────────────────────────────────────────────

    pub fn sheet_names(&self) -> DashResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM report_sheet ORDER BY position ASC")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn generated_at(&self) -> DashResult<Option<DateTime<Utc>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM report_meta WHERE key = 'generated_at'")?;
        let raw: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        match raw {
            None => Ok(None),
            Some(s) => {
                let ts = DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| anyhow::anyhow!("Bad generated_at '{s}': {e}"))?;
                Ok(Some(ts.with_timezone(&Utc)))
            }
        }
    }

    pub fn read_sheet(&self, name: &str) -> DashResult<Sheet> {
        if !self.sheet_names()?.iter().any(|n| n == name) {
            return Err(DashError::UnknownSheet { name: name.to_string() });
        }

        let columns = self.sheet_columns(name)?;
        let width = columns.len();
        let selected: Vec<String> = std::iter::once("row_no".to_string())
            .chain((0..width).map(positional))
            .collect();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY row_no ASC",
            selected.join(", "),
            quote_ident(name)
        ))?;
        let rows = stmt
            .query_map([], |row| {
                (1..=width)
                    .map(|i| row.get::<_, Value>(i).map(from_sql_value))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sheet {
            name: name.to_string(),
            columns,
            rows,
        })
    }

    fn sheet_columns(&self, sheet: &str) -> DashResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM report_column WHERE sheet = ?1 ORDER BY position ASC",
        )?;
        let names = stmt
            .query_map(params![sheet], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn read_workbook(&self) -> DashResult<Workbook> {
        let generated_at = self
            .generated_at()?
            .ok_or_else(|| anyhow::anyhow!("Report store holds no report"))?;
        let sheets = self
            .sheet_names()?
            .iter()
            .map(|n| self.read_sheet(n))
            .collect::<DashResult<Vec<_>>>()?;
        Ok(Workbook { generated_at, sheets })
    }
}

fn write_sheet(conn: &Connection, sheet: &Sheet) -> DashResult<()> {
    let mut column_defs = vec!["row_no INTEGER PRIMARY KEY".to_string()];
    for (i, name) in sheet.columns.iter().enumerate() {
        conn.execute(
            "INSERT INTO report_column (sheet, position, name) VALUES (?1, ?2, ?3)",
            params![sheet.name, i as i64, name],
        )?;
        let affinity = column_affinity(sheet.rows.iter().map(|r| &r[i]));
        column_defs.push(format!("{} {affinity}", positional(i)).trim_end().to_string());
    }
    let table = quote_ident(&sheet.name);
    conn.execute_batch(&format!("CREATE TABLE {table} ({});", column_defs.join(", ")))?;

    let placeholders: Vec<String> = (1..=sheet.columns.len() + 1).map(|i| format!("?{i}")).collect();
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} VALUES ({})",
        placeholders.join(", ")
    ))?;
    for (row_no, row) in sheet.rows.iter().enumerate() {
        let values = std::iter::once(Value::Integer(row_no as i64))
            .chain(row.iter().map(to_sql_value));
        stmt.execute(params_from_iter(values))?;
    }
    Ok(())
}

/// Storage name of the sheet column at `index`.
fn positional(index: usize) -> String {
    format!("c{index}")
}

/// Declared type for a sheet column. Mixed columns get no affinity so
/// every value is stored exactly as given.
fn column_affinity<'a>(cells: impl Iterator<Item = &'a CellValue>) -> &'static str {
    let (mut ints, mut reals, mut texts) = (false, false, false);
    for cell in cells {
        match cell {
            CellValue::Integer(_) => ints = true,
            CellValue::Number(_)  => reals = true,
            CellValue::Text(_)    => texts = true,
            CellValue::Empty      => {}
        }
    }
    match (ints, reals, texts) {
        (_, false, false) => "INTEGER",
        (false, true, false) => "REAL",
        (false, false, true) => "TEXT",
        _ => "",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Integer(i) => Value::Integer(*i),
        CellValue::Number(n)  => Value::Real(*n),
        CellValue::Text(s)    => Value::Text(s.clone()),
        CellValue::Empty      => Value::Null,
    }
}

fn from_sql_value(value: Value) -> CellValue {
    match value {
        Value::Integer(i) => CellValue::Integer(i),
        Value::Real(n)    => CellValue::Number(n),
        Value::Text(s)    => CellValue::Text(s),
        Value::Null       => CellValue::Empty,
        Value::Blob(b)    => CellValue::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}
