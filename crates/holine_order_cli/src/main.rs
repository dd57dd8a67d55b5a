use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use holine_order::{
    C_MSG_DONE, C_MSG_ERROR_PREFIX, EnumOrderVariant, SpecSplitOptions, parse_date_run,
    split_orders,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Split a Holine order workbook into per-vendor order sheets", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_log: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a consignment (위탁) order form
    Consignment(SplitArgs),
    /// Split a wholesale (사입) order form with price and amount columns
    Wholesale(SplitArgs),
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Source order workbook containing the `발주양식` sheet
    #[arg(long, short = 's')]
    source: PathBuf,
    /// Existing folder receiving one workbook per vendor
    #[arg(long, short = 'o')]
    output: PathBuf,
    /// Run date stamped into file names (YYYY-MM-DD or yyMMdd); defaults to today
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_log);

    let (rule_variant, args) = match cli.command {
        Command::Consignment(args) => (EnumOrderVariant::Consignment, args),
        Command::Wholesale(args) => (EnumOrderVariant::Wholesale, args),
    };

    let mut options = SpecSplitOptions::for_variant(rule_variant);
    if let Some(val) = &args.date {
        options.date_run =
            parse_date_run(val).map_err(|message| anyhow!("invalid --date: {message}"))?;
    }

    let mut observer = |n_percent: u8, message: &str| println!("[{n_percent:>3}%] {message}");
    match split_orders(&args.source, &args.output, &options, &mut observer) {
        Ok(report) => {
            info!(variant = rule_variant.as_str(), "split finished");
            println!("{C_MSG_DONE}");
            println!("{report}");
            for summary in &report.vendors {
                println!(
                    "  {} rows={} -> {}",
                    summary.vendor,
                    summary.n_rows,
                    summary.path_file.display()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{C_MSG_ERROR_PREFIX}: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_tracing(if_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if if_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
