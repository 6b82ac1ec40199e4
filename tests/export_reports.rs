//! End-to-end export tests using an in-memory backend.
//!
//! Exercises settings resolution, connection, export and cleanup through the
//! public API without a database server.

use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use reg_stats::config::{self, ConfigError, DbOverrides, FileSettings, SettingsProvider};
use reg_stats::db::{
    CellValue, ConnectionParams, Connector, DatabaseBackend, DbError, Endpoint, QueryResult,
};
use reg_stats::diversity::RegTally;
use reg_stats::export::{self, ReportExporter, RunOutcome};
use reg_stats::reports::{ALL_REPORTS, DEMO_DATA, TOTALS};

/// Backend that answers every query with the same result set.
struct StaticBackend {
    result: Option<QueryResult>,
    closed: Rc<Cell<u32>>,
}

impl DatabaseBackend for StaticBackend {
    fn execute_query(&mut self, _sql: &str) -> Result<QueryResult, DbError> {
        self.result.clone().ok_or_else(|| DbError::QueryFailed {
            message: "server closed the connection unexpectedly".to_string(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "Static"
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        self.closed.set(self.closed.get() + 1);
        Ok(())
    }
}

/// Connector that records the parameters it was asked to connect with.
struct RecordingConnector {
    result: Option<QueryResult>,
    closed: Rc<Cell<u32>>,
    socket: Cell<Option<bool>>,
}

impl RecordingConnector {
    fn new(result: Option<QueryResult>) -> Self {
        Self {
            result,
            closed: Rc::new(Cell::new(0)),
            socket: Cell::new(None),
        }
    }
}

impl Connector for RecordingConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DatabaseBackend>, DbError> {
        self.socket.set(Some(params.endpoint.is_socket()));
        Ok(Box::new(StaticBackend {
            result: self.result.clone(),
            closed: Rc::clone(&self.closed),
        }))
    }
}

fn badge_counts() -> QueryResult {
    QueryResult::new(
        vec!["badge_type_id".to_string(), "count".to_string()],
        vec![
            vec![CellValue::from("full"), CellValue::Int(10)],
            vec![CellValue::from("student"), CellValue::Int(4)],
        ],
    )
}

#[test]
fn test_settings_file_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");
    fs::write(
        &settings_path,
        r#"{"DATABASES": {"default": {"HOST": "/var/run/postgresql", "USER": "reg", "PASSWORD": "", "NAME": "scalereg"}}}"#,
    )
    .unwrap();

    let params = config::resolve(&DbOverrides::default(), &FileSettings::new(&settings_path)).unwrap();
    let connector = RecordingConnector::new(Some(badge_counts()));
    let exporter = ReportExporter::new(dir.path());

    let outcome = export::run(&connector, &params, &exporter, &ALL_REPORTS).unwrap();

    assert_eq!(outcome.written().len(), 2);
    assert_eq!(connector.socket.get(), Some(true));
    assert_eq!(connector.closed.get(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("totals.csv")).unwrap(),
        "badge_type_id,count\nfull,10\nstudent,4\n"
    );
}

#[test]
fn test_explicit_credentials_skip_missing_settings() {
    struct PanickingProvider;
    impl SettingsProvider for PanickingProvider {
        fn connection_params(&self) -> Result<ConnectionParams, ConfigError> {
            panic!("settings provider must not be consulted");
        }
    }

    let overrides = DbOverrides {
        host: Some("db.internal".to_string()),
        user: Some("reg".to_string()),
        database: Some("scalereg".to_string()),
        ..Default::default()
    };
    let params = config::resolve(&overrides, &PanickingProvider).unwrap();
    assert_eq!(params.endpoint, Endpoint::Tcp("db.internal".to_string()));
}

#[test]
fn test_missing_settings_without_overrides_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FileSettings::new(dir.path().join("absent.json"));
    let result = config::resolve(&DbOverrides::default(), &provider);
    assert!(matches!(result, Err(ConfigError::SettingsNotFound { .. })));
}

#[test]
fn test_query_failure_leaves_no_file_and_releases_connection() {
    let dir = tempfile::tempdir().unwrap();
    let connector = RecordingConnector::new(None);
    let exporter = ReportExporter::new(dir.path());
    let params = ConnectionParams::new("localhost", "reg", "scalereg");

    let outcome = export::run(&connector, &params, &exporter, &[TOTALS]).unwrap();

    assert_eq!(outcome, RunOutcome::DatabaseError(vec![]));
    assert!(!dir.path().join("totals.csv").exists());
    assert_eq!(connector.closed.get(), 1);
}

#[test]
fn test_exported_reports_feed_registration_summary() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = ReportExporter::new(dir.path());
    let params = ConnectionParams::new("localhost", "reg", "scalereg");

    let demo = QueryResult::new(
        vec![
            "question_id".to_string(),
            "question_text".to_string(),
            "answer_id".to_string(),
            "answer_text".to_string(),
            "num_attendees".to_string(),
        ],
        vec![
            vec![CellValue::Int(4), "Gender".into(), CellValue::Int(40), "Female".into(), CellValue::Int(6)],
            vec![CellValue::Int(5), "Age".into(), CellValue::Int(51), "25 to 34".into(), CellValue::Int(9)],
        ],
    );
    export::run(&RecordingConnector::new(Some(demo)), &params, &exporter, &[DEMO_DATA]).unwrap();
    export::run(&RecordingConnector::new(Some(badge_counts())), &params, &exporter, &[TOTALS])
        .unwrap();

    let tally = RegTally::from_readers(
        fs::File::open(dir.path().join("demo_data.csv")).unwrap(),
        fs::File::open(dir.path().join("totals.csv")).unwrap(),
        &["gender".to_string(), "age".to_string()],
    )
    .unwrap();

    assert_eq!(tally.total(), 14);
    let gender = tally.summarize("gender");
    assert_eq!(gender.answered, 6);
    let csv = gender.render_csv();
    assert!(csv.starts_with("GENDER\n# male, female, other, no response,"));
    assert!(csv.lines().nth(2).unwrap().starts_with(", 6, , 8, ,"));
    assert_eq!(tally.summarize("age").counts[2], Some(9));
}
