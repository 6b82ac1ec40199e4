use clap::Parser;

use reg_stats::cli::Args;
use reg_stats::config::{self, FileSettings};
use reg_stats::db::PostgresConnector;
use reg_stats::export::{self, ReportExporter};
use reg_stats::logging::init_tracing;
use reg_stats::reports::ALL_REPORTS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let settings = FileSettings::new(&args.settings);
    let params = config::resolve(&args.db_overrides(), &settings)?;

    let exporter = ReportExporter::new(&args.directory);
    export::run(&PostgresConnector, &params, &exporter, &ALL_REPORTS)?;
    Ok(())
}
