use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use std::{fs::File, io, path::PathBuf, process::ExitCode};

use revenue_report::{
    create_report, prompt::prompt_paths, Config, ReportError, TransformError, WorkbookError,
};

#[derive(Parser)]
/// Reports revenue by category and date from an Excel sales ledger and price
/// list.
struct Args {
    /// Input workbook containing the raw and dict sheets
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output workbook for the report (asked for instead with --interactive)
    #[arg(long, default_value = "report.xlsx")]
    out: PathBuf,
    /// Path to the YAML configuration
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,
    /// Ask for the input and output files on the terminal
    #[arg(short, long, conflicts_with_all = ["input", "out"])]
    interactive: bool,
    /// Print the report to standard output
    #[arg(short, long)]
    print: bool,
    /// Also export the report as CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", describe(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let (input, out) = if args.interactive {
        let stdin = io::stdin();
        prompt_paths(stdin.lock(), io::stdout())?
    } else {
        let Some(input) = args.input else {
            bail!("--input is required (or use --interactive)");
        };
        (input, args.out)
    };

    let report = create_report(&input, &out, &config)?;
    if args.print {
        print!("{report}");
    }
    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        report
            .write_csv(file)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "exported CSV");
    }
    Ok(())
}

/// Turns a failure into a message for the user, saying which kind of
/// problem it is.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ReportError>() {
        Some(ReportError::Transform(TransformError::Schema { .. })) => {
            format!("the workbook doesn't match the configured columns: {err}")
        }
        Some(ReportError::Transform(TransformError::Cardinality { .. })) => {
            format!("the price list must have one row per code: {err}")
        }
        Some(ReportError::Workbook(WorkbookError::Extension { .. })) => {
            format!("only .xlsx workbooks are supported: {err}")
        }
        Some(ReportError::Workbook(_)) => format!("file error: {err}"),
        None => format!("{err:#}"),
    }
}
