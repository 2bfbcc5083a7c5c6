use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Source schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Unparseable numeric value: {value:?}")]
    NumericParse { value: String },

    #[error("CSV sink failed: {0}")]
    CsvSink(#[from] csv::Error),

    #[error("Table sink failed: {0}")]
    TableSink(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Query execution failed: {0}")]
    QuerySql(#[source] rusqlite::Error),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
