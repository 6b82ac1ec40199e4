//! PostgreSQL backend implementation.
//!
//! Uses the synchronous `postgres` client. Each report is prepared first so
//! column names are available even when the query returns no rows.

use ::postgres::types::Type;
use ::postgres::{Client, Config, NoTls, Row};
use tracing::debug;

use super::backend::{Connector, DatabaseBackend, QueryResult};
use super::value::CellValue;
use super::{ConnectionParams, DbError, Endpoint};

/// PostgreSQL backend holding the single reporting connection.
pub struct PostgresBackend {
    client: Client,
}

impl PostgresBackend {
    /// Connect using resolved parameters.
    ///
    /// # Errors
    /// Returns `DbError::ConnectFailed` if the server is unreachable, rejects
    /// the credentials, or the endpoint is a socket on a platform without
    /// Unix domain sockets.
    pub fn connect(params: &ConnectionParams) -> Result<Self, DbError> {
        let config = build_config(params)?;
        let client = config.connect(NoTls).map_err(|e| DbError::ConnectFailed {
            endpoint: params.endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }
}

/// Translate connection parameters into a driver config.
fn build_config(params: &ConnectionParams) -> Result<Config, DbError> {
    let mut config = Config::new();

    match &params.endpoint {
        Endpoint::Tcp(host) => {
            config.host(host);
        }
        #[cfg(unix)]
        Endpoint::Socket(path) => {
            config.host_path(path);
        }
        #[cfg(not(unix))]
        Endpoint::Socket(path) => {
            return Err(DbError::ConnectFailed {
                endpoint: path.display().to_string(),
                message: "socket connections require a Unix platform".to_string(),
            });
        }
    }

    config.user(&params.user);
    config.dbname(&params.database);
    if let Some(password) = &params.password {
        config.password(password);
    }
    if let Some(port) = params.port {
        config.port(port);
    }
    config.application_name("reg_stats");

    Ok(config)
}

impl DatabaseBackend for PostgresBackend {
    fn execute_query(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        let statement = self.client.prepare(sql).map_err(query_failed)?;
        let headers = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>();

        let rows = self.client.query(&statement, &[]).map_err(query_failed)?;
        debug!(rows = rows.len(), "Fetched result set");

        let rows = rows
            .iter()
            .map(convert_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult { headers, rows })
    }

    fn backend_name(&self) -> &'static str {
        "Postgres"
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        self.client.close().map_err(|e| DbError::CloseFailed {
            message: e.to_string(),
        })
    }
}

fn query_failed(e: ::postgres::Error) -> DbError {
    DbError::QueryFailed {
        message: e.to_string(),
    }
}

fn convert_row(row: &Row) -> Result<Vec<CellValue>, DbError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            convert_cell(row, idx, column.type_()).map_err(|e| DbError::UnsupportedValue {
                column: column.name().to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Convert one cell based on its declared column type.
///
/// Anything that is not a boolean or a number is read as text; types with no
/// text representation surface as a conversion error.
fn convert_cell(row: &Row, idx: usize, ty: &Type) -> Result<CellValue, ::postgres::Error> {
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(CellValue::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(|n| CellValue::Int(i64::from(n)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(|n| CellValue::Int(i64::from(n)))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(CellValue::Int)
    } else if *ty == Type::OID {
        row.try_get::<_, Option<u32>>(idx)?.map(|n| CellValue::Int(i64::from(n)))
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.map(|x| CellValue::Float(f64::from(x)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.map(CellValue::Float)
    } else {
        row.try_get::<_, Option<String>>(idx)?.map(CellValue::Text)
    };

    Ok(value.unwrap_or(CellValue::Null))
}

/// Connector that opens `PostgresBackend` connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

impl Connector for PostgresConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DatabaseBackend>, DbError> {
        let backend = PostgresBackend::connect(params)?;
        Ok(Box::new(backend))
    }
}
