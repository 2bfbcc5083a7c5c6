use crate::constants::{COUNTRY_COLUMN, GDP_BILLIONS_COLUMN, YEAR_COLUMN};
use crate::error::{EtlError, Result};
use crate::types::{write_table, TransformedDataset};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument};

/// SQLite file holding the GDP table. Owns the single connection used for
/// loading and querying; dropping the store releases it.
pub struct GdpStore {
    conn: Connection,
}

impl GdpStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path).map_err(EtlError::TableSink)?;
        debug!("Opened {}", db_path.display());
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(EtlError::TableSink)?;
        Ok(Self { conn })
    }

    /// Drops `table` if present, recreates it and inserts every record in order.
    #[instrument(skip(self, dataset), fields(records = dataset.len()))]
    pub fn replace_table(&self, table: &str, dataset: &TransformedDataset) -> Result<()> {
        let table = checked_identifier(table)?;
        self.conn
            .execute_batch(&format!(
                "DROP TABLE IF EXISTS {table};
                 CREATE TABLE {table} (
                     {COUNTRY_COLUMN}    TEXT,
                     {GDP_BILLIONS_COLUMN} REAL,
                     {YEAR_COLUMN}       TEXT
                 );"
            ))
            .map_err(EtlError::TableSink)?;

        let mut stmt = self
            .conn
            .prepare(&format!(
                "INSERT INTO {table} ({COUNTRY_COLUMN}, {GDP_BILLIONS_COLUMN}, {YEAR_COLUMN}) VALUES (?1, ?2, ?3)"
            ))
            .map_err(EtlError::TableSink)?;
        for record in &dataset.records {
            stmt.execute(params![record.country, record.gdp_billions, record.year])
                .map_err(EtlError::TableSink)?;
        }

        info!("Loaded {} rows into {}", dataset.len(), table);
        Ok(())
    }

    /// Column names of `table`, in declaration order. Empty when the table
    /// does not exist.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let table = checked_identifier(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .map_err(EtlError::QuerySql)?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(EtlError::QuerySql)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(EtlError::QuerySql)?;
        Ok(columns)
    }

    /// Runs a read-only statement and renders every value as text.
    pub fn run_query(&self, sql: &str) -> Result<QueryOutput> {
        let mut stmt = self.conn.prepare(sql).map_err(EtlError::QuerySql)?;
        if !stmt.readonly() {
            return Err(EtlError::Query(format!("statement is not read-only: {}", sql)));
        }

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(render_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(EtlError::QuerySql)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(EtlError::QuerySql)?;

        Ok(QueryOutput { columns, rows })
    }

    /// Checks the filter column against the persisted table, then runs `query`.
    #[instrument(skip(self), fields(sql = %query))]
    pub fn run_gdp_query(&self, query: &GdpQuery) -> Result<QueryOutput> {
        let columns = self.table_columns(&query.table)?;
        if columns.is_empty() {
            return Err(EtlError::Query(format!("table {} does not exist", query.table)));
        }
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(&query.column)) {
            return Err(EtlError::Query(format!(
                "column {} not found in {} (columns: {})",
                query.column,
                query.table,
                columns.join(", ")
            )));
        }

        let output = self.run_query(&query.to_string())?;
        info!("Query returned {} rows", output.rows.len());
        Ok(output)
    }

    /// Releases the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| EtlError::TableSink(e))
    }
}

/// `SELECT Country FROM <table> WHERE <column> > <threshold>`
#[derive(Debug, Clone, PartialEq)]
pub struct GdpQuery {
    pub table: String,
    pub column: String,
    pub threshold: f64,
}

impl GdpQuery {
    /// Countries whose persisted GDP in billions exceeds `threshold`.
    pub fn countries_above(table: &str, threshold: f64) -> Self {
        Self {
            table: table.to_string(),
            column: GDP_BILLIONS_COLUMN.to_string(),
            threshold,
        }
    }
}

impl fmt::Display for GdpQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {} FROM {} WHERE {} > {}",
            COUNTRY_COLUMN, self.table, self.column, self.threshold
        )
    }
}

/// Result rows of a query, every value rendered as text.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(f, &self.columns, &self.rows)
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Names interpolated into SQL must be plain identifiers.
fn checked_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(EtlError::InvalidIdentifier(name.to_string()))
    }
}
