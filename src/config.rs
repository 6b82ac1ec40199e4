//! Settings file handling for database connections.
//!
//! The registration web application keeps its database settings in a
//! `DATABASES` map. This module reads the same shape from a JSON file and
//! decides whether those settings or explicit command-line credentials are
//! used for the reporting connection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::ConnectionParams;

/// Settings file used when `--settings` is not given.
pub const DEFAULT_SETTINGS_PATH: &str = "/var/www/django/scalereg/settings.json";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Settings file not found: {path}\n\n\
         Either pass --db-host/--db-user/--db-pass/--db-database or create a settings file:\n\
         {{\n  \
           \"DATABASES\": {{\n    \
             \"default\": {{\n      \
               \"HOST\": \"/var/run/postgresql\",\n      \
               \"USER\": \"scalereg\",\n      \
               \"PASSWORD\": \"\",\n      \
               \"NAME\": \"scalereg\"\n    \
             }}\n  \
           }}\n\
         }}"
    )]
    SettingsNotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No '{alias}' entry under DATABASES in {path}")]
    MissingDatabase { alias: String, path: String },

    #[error("Missing {field} in database settings")]
    MissingField { field: &'static str },

    #[error("Invalid port '{value}'")]
    InvalidPort { value: String },
}

/// Top-level settings file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(rename = "DATABASES")]
    pub databases: BTreeMap<String, DatabaseSettings>,
}

/// One entry of the `DATABASES` map.
///
/// Field names follow the web application's settings module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(rename = "HOST", default)]
    pub host: String,
    #[serde(rename = "USER", default)]
    pub user: String,
    #[serde(rename = "PASSWORD", default)]
    pub password: String,
    #[serde(rename = "NAME", default)]
    pub name: String,
    /// Either a string (empty means default) or a number
    #[serde(rename = "PORT", default)]
    pub port: Option<PortSetting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(u16),
    Text(String),
}

impl PortSetting {
    fn resolve(&self) -> Result<Option<u16>, ConfigError> {
        match self {
            Self::Number(port) => Ok(Some(*port)),
            Self::Text(text) if text.trim().is_empty() => Ok(None),
            Self::Text(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidPort { value: text.clone() }),
        }
    }
}

impl SettingsFile {
    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - The file cannot be read
    /// - The JSON is invalid
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(ConfigError::SettingsNotFound { path: display });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: display.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::InvalidJson {
            path: display,
            source,
        })
    }
}

impl DatabaseSettings {
    /// Convert a settings entry into connection parameters.
    pub fn to_connection_params(&self) -> Result<ConnectionParams, ConfigError> {
        if self.user.is_empty() {
            return Err(ConfigError::MissingField { field: "USER" });
        }
        if self.name.is_empty() {
            return Err(ConfigError::MissingField { field: "NAME" });
        }

        let mut params = ConnectionParams::new(&self.host, self.user.clone(), self.name.clone());
        if !self.password.is_empty() {
            params = params.with_password(self.password.clone());
        }
        if let Some(port) = self.port.as_ref().map(PortSetting::resolve).transpose()?.flatten() {
            params = params.with_port(port);
        }
        Ok(params)
    }
}

/// Source of default connection parameters.
///
/// Consulted only when no explicit credentials were supplied.
pub trait SettingsProvider {
    fn connection_params(&self) -> Result<ConnectionParams, ConfigError>;
}

/// Settings provider backed by a JSON settings file.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    alias: String,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            alias: "default".to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsProvider for FileSettings {
    fn connection_params(&self) -> Result<ConnectionParams, ConfigError> {
        let settings = SettingsFile::load(&self.path)?;
        let entry = settings
            .databases
            .get(&self.alias)
            .ok_or_else(|| ConfigError::MissingDatabase {
                alias: self.alias.clone(),
                path: self.path.display().to_string(),
            })?;
        entry.to_connection_params()
    }
}

/// Credentials given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
}

impl DbOverrides {
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.database.is_none()
            && self.port.is_none()
    }

    fn to_connection_params(&self) -> Result<ConnectionParams, ConfigError> {
        let user = self
            .user
            .clone()
            .ok_or(ConfigError::MissingField { field: "--db-user" })?;
        let database = self
            .database
            .clone()
            .ok_or(ConfigError::MissingField { field: "--db-database" })?;

        let mut params = ConnectionParams::new(self.host.as_deref().unwrap_or(""), user, database);
        if let Some(password) = &self.password {
            params = params.with_password(password.clone());
        }
        if let Some(port) = self.port {
            params = params.with_port(port);
        }
        Ok(params)
    }
}

/// Resolve the connection parameters for this run.
///
/// Any explicit override replaces the settings entirely; the provider is
/// only consulted when no override was given.
pub fn resolve(
    overrides: &DbOverrides,
    provider: &dyn SettingsProvider,
) -> Result<ConnectionParams, ConfigError> {
    if overrides.is_empty() {
        provider.connection_params()
    } else {
        overrides.to_connection_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Endpoint;
    use rstest::rstest;
    use std::cell::Cell;
    use tempfile::TempDir;

    const SETTINGS_JSON: &str = r#"
    {
        "DATABASES": {
            "default": {
                "ENGINE": "django.db.backends.postgresql",
                "HOST": "/var/run/postgresql",
                "USER": "scalereg",
                "PASSWORD": "s3cret",
                "NAME": "scalereg",
                "PORT": ""
            }
        }
    }
    "#;

    /// Provider that counts how often it is consulted.
    struct CountingProvider {
        calls: Cell<usize>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl SettingsProvider for CountingProvider {
        fn connection_params(&self) -> Result<ConnectionParams, ConfigError> {
            self.calls.set(self.calls.get() + 1);
            Ok(ConnectionParams::new("settings-host", "settings_user", "settings_db"))
        }
    }

    /// Provider standing in for a missing settings module.
    struct UnavailableProvider;

    impl SettingsProvider for UnavailableProvider {
        fn connection_params(&self) -> Result<ConnectionParams, ConfigError> {
            Err(ConfigError::SettingsNotFound {
                path: "/nonexistent/settings.json".to_string(),
            })
        }
    }

    fn write_settings(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("settings.json");
        fs::write(&path, json).unwrap();
        path
    }

    // =========================================================================
    // Settings file parsing
    // =========================================================================

    #[rstest]
    fn test_settings_deserialization() {
        let settings: SettingsFile = serde_json::from_str(SETTINGS_JSON).unwrap();
        let default = &settings.databases["default"];
        assert_eq!(default.host, "/var/run/postgresql");
        assert_eq!(default.user, "scalereg");
        assert_eq!(default.name, "scalereg");
    }

    #[rstest]
    fn test_settings_socket_host_becomes_socket_endpoint() {
        let settings: SettingsFile = serde_json::from_str(SETTINGS_JSON).unwrap();
        let params = settings.databases["default"].to_connection_params().unwrap();
        assert!(params.endpoint.is_socket());
        assert_eq!(params.password.as_deref(), Some("s3cret"));
        assert_eq!(params.port, None);
    }

    #[rstest]
    #[case(r#""5433""#, Some(5433))]
    #[case("5433", Some(5433))]
    #[case(r#""""#, None)]
    fn test_port_setting_forms(#[case] port_json: &str, #[case] expected: Option<u16>) {
        let json = format!(r#"{{"USER": "u", "NAME": "n", "PORT": {}}}"#, port_json);
        let settings: DatabaseSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings.to_connection_params().unwrap().port, expected);
    }

    #[rstest]
    fn test_invalid_port_rejected() {
        let json = r#"{"USER": "u", "NAME": "n", "PORT": "not-a-port"}"#;
        let settings: DatabaseSettings = serde_json::from_str(json).unwrap();
        let err = settings.to_connection_params().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[rstest]
    fn test_empty_password_means_none() {
        let json = r#"{"HOST": "", "USER": "u", "PASSWORD": "", "NAME": "n"}"#;
        let settings: DatabaseSettings = serde_json::from_str(json).unwrap();
        let params = settings.to_connection_params().unwrap();
        assert!(params.password.is_none());
        assert_eq!(params.endpoint, Endpoint::Tcp("localhost".to_string()));
    }

    #[rstest]
    fn test_missing_user_rejected() {
        let json = r#"{"HOST": "localhost", "NAME": "n"}"#;
        let settings: DatabaseSettings = serde_json::from_str(json).unwrap();
        let err = settings.to_connection_params().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "USER" }));
    }

    // =========================================================================
    // File provider
    // =========================================================================

    #[rstest]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSettings::new(dir.path().join("settings.json"));
        let err = provider.connection_params().unwrap_err();
        assert!(matches!(err, ConfigError::SettingsNotFound { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[rstest]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(&dir, "{ invalid json }");
        let err = FileSettings::new(path).connection_params().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }

    #[rstest]
    fn test_load_without_default_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(&dir, r#"{"DATABASES": {"replica": {"USER": "u", "NAME": "n"}}}"#);
        let err = FileSettings::new(path).connection_params().unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabase { .. }));
    }

    #[rstest]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(&dir, SETTINGS_JSON);
        let params = FileSettings::new(path).connection_params().unwrap();
        assert_eq!(params.user, "scalereg");
        assert_eq!(params.database, "scalereg");
    }

    // =========================================================================
    // Resolution precedence
    // =========================================================================

    #[rstest]
    fn test_explicit_params_never_consult_provider() {
        let provider = CountingProvider::new();
        let overrides = DbOverrides {
            host: Some("db.example.org".to_string()),
            user: Some("reporter".to_string()),
            password: Some("pw".to_string()),
            database: Some("reg".to_string()),
            port: None,
        };

        let params = resolve(&overrides, &provider).unwrap();

        assert_eq!(provider.calls.get(), 0);
        assert_eq!(params.endpoint, Endpoint::Tcp("db.example.org".to_string()));
        assert_eq!(params.user, "reporter");
        assert_eq!(params.database, "reg");
    }

    #[rstest]
    fn test_single_override_takes_precedence_entirely() {
        // Only a host is given, so the settings user/database are not merged in
        let provider = CountingProvider::new();
        let overrides = DbOverrides {
            host: Some("db.example.org".to_string()),
            ..Default::default()
        };

        let err = resolve(&overrides, &provider).unwrap_err();

        assert_eq!(provider.calls.get(), 0);
        assert!(matches!(err, ConfigError::MissingField { field: "--db-user" }));
    }

    #[rstest]
    fn test_no_overrides_falls_back_to_provider() {
        let provider = CountingProvider::new();
        let params = resolve(&DbOverrides::default(), &provider).unwrap();

        assert_eq!(provider.calls.get(), 1);
        assert_eq!(params.user, "settings_user");
    }

    #[rstest]
    fn test_unavailable_provider_is_fatal() {
        let result = resolve(&DbOverrides::default(), &UnavailableProvider);
        assert!(matches!(result, Err(ConfigError::SettingsNotFound { .. })));
    }

    #[rstest]
    fn test_explicit_socket_host() {
        let overrides = DbOverrides {
            host: Some("/var/run/postgresql".to_string()),
            user: Some("reg".to_string()),
            database: Some("scalereg".to_string()),
            ..Default::default()
        };
        let params = resolve(&overrides, &UnavailableProvider).unwrap();
        assert!(params.endpoint.is_socket());
    }
}
