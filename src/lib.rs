//! reg_stats library - registration statistics reporting
//!
//! Provides settings resolution, the database backend, and CSV report export
//! for the registration database, plus the demographic summary used by the
//! `diversity_report` tool.

pub mod cli;
pub mod config;
pub mod db;
pub mod diversity;
pub mod export;
pub mod logging;
pub mod reports;
