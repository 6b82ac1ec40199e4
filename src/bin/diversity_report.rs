//! Summarize demographic answers for the diversity spreadsheet.
//!
//! Reads either a CFP submissions export or the registration reports written
//! by `reg_stats` and prints one block per demographic type.

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info, warn};

use reg_stats::diversity::{ALL_DEMO_TYPES, CfpTally, FieldOrder, InputType, OutputType, RegTally};
use reg_stats::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
Examples:
  diversity_report submissions.csv
  diversity_report -o simple -t gender,age submissions.csv
  diversity_report -i reg -T totals.csv demo_data.csv")]
struct Args {
    /// Limit to these demographic types (comma-separated)
    #[arg(short = 't', long = "demo-type", value_delimiter = ',', value_name = "TYPE")]
    demo_types: Vec<String>,

    /// Output format: `csv` includes calculated fields, `simple` is a
    /// human-readable printout of the parsed counts
    #[arg(short, long, value_enum, default_value_t = OutputType::Csv)]
    output_type: OutputType,

    /// Input format: `cfp` is the CFP system export, `reg` is demo_data.csv
    #[arg(short, long, value_enum, default_value_t = InputType::Cfp)]
    input_type: InputType,

    /// Totals report, required in reg mode
    #[arg(short = 'T', long, required_if_eq("input_type", "reg"))]
    totals_csv: Option<PathBuf>,

    /// Set log level (DEBUG, INFO, WARNING, ERROR)
    #[arg(short, long, default_value = "INFO")]
    log_level: String,

    /// Submissions export (cfp) or demo_data.csv (reg)
    file: PathBuf,
}

impl Args {
    fn demo_types(&self) -> Vec<String> {
        if self.demo_types.is_empty() {
            ALL_DEMO_TYPES.iter().map(|t| t.to_string()).collect()
        } else {
            self.demo_types.iter().map(|t| t.trim().to_lowercase()).collect()
        }
    }
}

fn open(path: &Path) -> Result<File, String> {
    File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))
}

fn log_warnings(order: &FieldOrder) {
    for warning in order.warnings() {
        warn!("{}", warning);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);
    let demo_types = args.demo_types();

    match args.input_type {
        InputType::Cfp => {
            let tally = CfpTally::from_reader(open(&args.file)?, &demo_types)?;
            info!(
                submissions = tally.submissions(),
                accepts = tally.accepts(),
                "Tallied {}",
                args.file.display()
            );
            for demo_type in tally.demo_types() {
                let summary = tally.summarize(demo_type);
                log_warnings(&summary.order);
                match args.output_type {
                    OutputType::Csv => println!("{}", summary.render_csv()),
                    OutputType::Simple => println!("{}", summary.render_simple()),
                }
            }
        }
        InputType::Reg => {
            let totals_path = args.totals_csv.as_deref().ok_or("Need to specify -T")?;
            let tally =
                RegTally::from_readers(open(&args.file)?, open(totals_path)?, &demo_types)?;
            info!(attendees = tally.total(), "Tallied {}", args.file.display());
            for demo_type in tally.demo_types() {
                let summary = tally.summarize(demo_type);
                log_warnings(&summary.order);
                match args.output_type {
                    OutputType::Csv => println!("{}", summary.render_csv()),
                    OutputType::Simple => error!("not implemented yet"),
                }
            }
        }
    }
    Ok(())
}
