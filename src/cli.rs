//! CLI argument definitions.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{DEFAULT_SETTINGS_PATH, DbOverrides};

/// Export registration statistics as CSV reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
Examples:
  reg_stats                                        # Use the settings file, write to .
  reg_stats --directory /srv/reports               # Write reports elsewhere
  reg_stats --db-host /var/run/postgresql \\
            --db-user reg --db-database scalereg  # Explicit credentials over a socket")]
pub struct Args {
    /// Directory to store output files
    #[arg(long, default_value = ".")]
    pub directory: PathBuf,

    /// Set log level (DEBUG, INFO, WARNING, ERROR)
    #[arg(long, default_value = "INFO")]
    pub log_level: String,

    /// Settings file holding the default database configuration
    #[arg(long, env = "REG_STATS_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    /// Database host, or socket directory when it starts with '/'
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database user
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long)]
    pub db_pass: Option<String>,

    /// Database name
    #[arg(long)]
    pub db_database: Option<String>,

    /// Database port
    #[arg(long)]
    pub db_port: Option<u16>,
}

impl Args {
    /// Explicit credentials given on the command line.
    pub fn db_overrides(&self) -> DbOverrides {
        DbOverrides {
            host: self.db_host.clone(),
            user: self.db_user.clone(),
            password: self.db_pass.clone(),
            database: self.db_database.clone(),
            port: self.db_port,
        }
    }
}
