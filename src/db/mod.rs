//! Database connection and query layer for the registration database.
//!
//! This module provides the database abstraction used by the report exporter:
//! - Connection parameters and endpoint selection (TCP host vs socket path)
//! - The `DatabaseBackend` trait that reports run against
//! - A PostgreSQL implementation over the synchronous `postgres` client
//!
//! # Type Decisions
//!
//! **Why a `CellValue` enum instead of typed row structs?**
//! Reports are fixed SQL whose only consumer is the CSV writer. Rows are kept
//! as positional cells and rendered as text, so adding a column to a query
//! never needs a matching Rust type.
//!
//! **Why `close(self: Box<Self>)` on the trait?**
//! Closing consumes the backend, so a connection can only be released once.
//! Dropping a backend without closing it still releases the socket.

mod backend;
mod params;
mod postgres;
mod value;

pub use backend::{Connector, DatabaseBackend, QueryResult};
pub use params::{ConnectionParams, Endpoint};
pub use self::postgres::{PostgresBackend, PostgresConnector};
pub use value::CellValue;

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to {endpoint}: {message}")]
    ConnectFailed { endpoint: String, message: String },

    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    #[error("Unsupported value in column '{column}': {message}")]
    UnsupportedValue { column: String, message: String },

    #[error("Failed to close connection: {message}")]
    CloseFailed { message: String },
}
