use clap::Parser;
use finsim::{ReportFormat, RunOptions, init_logging, run};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "finsim")]
#[command(about = "Simulate personal finance scenarios period by period")]
struct Args {
    /// Scenario files (YAML)
    #[arg(required = true)]
    scenarios: Vec<PathBuf>,

    /// Report file, or a directory when several scenarios are given (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    run(&RunOptions {
        scenarios: args.scenarios,
        output: args.output,
        format: args.format,
    })
}
