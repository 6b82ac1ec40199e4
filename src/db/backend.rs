//! Database backend trait for abstracting the reporting connection.
//!
//! Reports run against `&mut dyn DatabaseBackend`, so tests can substitute an
//! in-memory backend for PostgreSQL.

use super::value::CellValue;
use super::{ConnectionParams, DbError};

/// Result of a query execution: column names plus rows in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Trait for database backends that can execute report queries.
pub trait DatabaseBackend {
    /// Execute a fixed SQL statement and fetch every row.
    fn execute_query(&mut self, sql: &str) -> Result<QueryResult, DbError>;

    /// Get the backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;

    /// Release the connection.
    ///
    /// Consumes the backend; a closed connection cannot be reused.
    fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// Opens backends from resolved connection parameters.
pub trait Connector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DatabaseBackend>, DbError>;
}
