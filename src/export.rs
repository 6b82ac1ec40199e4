//! Report export: run each report query and write its result set as CSV.
//!
//! A report file is only created after its query has executed and every row
//! was fetched, so a failed query never leaves a partial or empty file behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::db::{ConnectionParams, Connector, DatabaseBackend, DbError, QueryResult};
use crate::reports::Report;

/// Export error types
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode CSV for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// A report export stopped early by `source`.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct ExportFailure {
    /// Reports written before the failure
    pub written: Vec<PathBuf>,
    #[source]
    pub source: ExportError,
}

/// How a run ended when it did not fail fatally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every report was written
    Completed(Vec<PathBuf>),
    /// A database error stopped the run; these reports were written before it
    DatabaseError(Vec<PathBuf>),
}

impl RunOutcome {
    pub fn written(&self) -> &[PathBuf] {
        match self {
            Self::Completed(paths) | Self::DatabaseError(paths) => paths,
        }
    }
}

/// Write a result set as CSV: a header row, then one record per row in
/// fetch order.
pub fn write_csv<W: Write>(writer: W, result: &QueryResult) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(&result.headers)?;
    for row in &result.rows {
        wtr.write_record(row.iter().map(|cell| cell.to_field()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes report result sets into an output directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_path(&self, report: &Report) -> PathBuf {
        self.output_dir.join(report.file_name())
    }

    /// Execute one report and write its CSV file, replacing any previous one.
    ///
    /// Returns the path written.
    pub fn export_report(
        &self,
        db: &mut dyn DatabaseBackend,
        report: &Report,
    ) -> Result<PathBuf, ExportError> {
        debug!(report = report.name, backend = db.backend_name(), "Running report query");
        let result = db.execute_query(report.sql)?;

        let path = self.output_path(report);
        let shown = path.display().to_string();
        let file = File::create(&path).map_err(|source| ExportError::Io {
            path: shown.clone(),
            source,
        })?;

        write_csv(BufWriter::new(file), &result).map_err(|source| ExportError::Csv {
            path: shown.clone(),
            source,
        })?;

        info!("Results saved to {}", shown);
        Ok(path)
    }

    /// Export reports in order, stopping at the first error.
    ///
    /// On failure the paths already written are carried in the error.
    pub fn export_all(
        &self,
        db: &mut dyn DatabaseBackend,
        reports: &[Report],
    ) -> Result<Vec<PathBuf>, ExportFailure> {
        let mut written = Vec::with_capacity(reports.len());
        for report in reports {
            match self.export_report(db, report) {
                Ok(path) => written.push(path),
                Err(source) => return Err(ExportFailure { written, source }),
            }
        }
        Ok(written)
    }
}

/// Connect, export every report, and release the connection.
///
/// Database errors (including a failed connect) are logged and reported as
/// `RunOutcome::DatabaseError`. Output errors are returned after the
/// connection has been closed.
pub fn run(
    connector: &dyn Connector,
    params: &ConnectionParams,
    exporter: &ReportExporter,
    reports: &[Report],
) -> Result<RunOutcome, ExportError> {
    debug!(endpoint = %params.endpoint, "Connecting to database...");
    let mut backend = match connector.connect(params) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Database error: {}", e);
            return Ok(RunOutcome::DatabaseError(Vec::new()));
        }
    };

    let result = exporter.export_all(backend.as_mut(), reports);

    if let Err(e) = backend.close() {
        warn!("{}", e);
    }
    debug!("Database connection closed.");

    match result {
        Ok(written) => Ok(RunOutcome::Completed(written)),
        Err(ExportFailure {
            written,
            source: ExportError::Database(e),
        }) => {
            error!("Database error: {}", e);
            Ok(RunOutcome::DatabaseError(written))
        }
        Err(failure) => Err(failure.source),
    }
}
