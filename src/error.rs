use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Anything the table backend reports: transport failure, unknown
    /// table, permission denial, malformed filter.
    #[error("Remote query error: {0}")]
    RemoteQuery(String),

    /// The backend rejected a query naming a column the table lacks.
    #[error("Remote query error: column {table}.{column} does not exist")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures raised by the table backend.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::RemoteQuery(_) | Error::UnknownColumn { .. })
    }
}
