//! Connection parameters resolved once at startup.

use std::fmt;
use std::path::PathBuf;

/// Host used when the settings leave `HOST` empty.
pub const DEFAULT_HOST: &str = "localhost";

/// Where the database server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Hostname or IP address reached over TCP
    Tcp(String),
    /// Directory (or file) of a Unix domain socket
    Socket(PathBuf),
}

impl Endpoint {
    /// Classify a host string.
    ///
    /// A host beginning with `/` names a socket path; an empty host means
    /// `localhost`; anything else is a TCP hostname.
    pub fn from_host(host: &str) -> Self {
        let host = host.trim();
        if host.starts_with('/') {
            Self::Socket(PathBuf::from(host))
        } else if host.is_empty() {
            Self::Tcp(DEFAULT_HOST.to_string())
        } else {
            Self::Tcp(host.to_string())
        }
    }

    pub fn is_socket(&self) -> bool {
        matches!(self, Self::Socket(_))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(host) => write!(f, "{}", host),
            Self::Socket(path) => write!(f, "socket {}", path.display()),
        }
    }
}

/// Everything needed to open the single reporting connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub endpoint: Endpoint,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    /// Server port; `None` uses the driver default
    pub port: Option<u16>,
}

impl ConnectionParams {
    pub fn new(host: &str, user: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::from_host(host),
            user: user.into(),
            password: None,
            database: database.into(),
            port: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

// Hand-written so passwords never reach the logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}
