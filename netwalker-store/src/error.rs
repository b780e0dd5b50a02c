use thiserror::Error;

/// Failures surfaced by the Inventory Store. A `store-error` never aborts
/// a crawl in progress; workers log it and move on. Only a `Connection`
/// failure at startup is fatal to the whole process.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not open a connection to the inventory database: {0}")]
    Connection(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("no row found for {0}")]
    NotFound(String),
}

impl From<tiberius::error::Error> for StoreError {
    fn from(err: tiberius::error::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<bb8::RunError<bb8_tiberius::Error>> for StoreError {
    fn from(err: bb8::RunError<bb8_tiberius::Error>) -> Self {
        StoreError::Connection(err.to_string())
    }
}
