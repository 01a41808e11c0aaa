use clap::{ArgAction, Parser};
use gcsv::{MalformedRowPolicy, Pipeline, PipelineConfig, Progress, SystemRunner};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const USAGE: &str = "gcsv <peptide csv path>";

#[derive(Parser, Debug)]
#[command(
    name = "gcsv",
    about = "Turn a peptide CSV export into BLAST/MView alignments and open them in Genome Workbench",
    override_usage = USAGE
)]
struct Cli {
    /// Drop rows without a peptide column instead of stopping
    #[arg(long = "skip-malformed", action = ArgAction::SetTrue)]
    skip_malformed: bool,

    /// 0-based column holding the peptide sequence
    #[arg(long = "column")]
    column: Option<usize>,

    /// Upper bound for each external tool run
    #[arg(long = "timeout-secs", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[arg(long = "no-viewer", action = ArgAction::SetTrue)]
    no_viewer: bool,

    /// Peptide CSV; options go before it, and a leading '-' is part of the name
    #[arg(allow_hyphen_values = true)]
    inputs: Vec<PathBuf>,
}

struct Console;

impl Progress for Console {
    fn stage(&self, message: &str) {
        println!("{message}");
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let [input] = cli.inputs.as_slice() else {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    };

    let mut config = PipelineConfig::from_env();
    if cli.skip_malformed {
        config = config.with_malformed_rows(MalformedRowPolicy::Skip);
    }
    if let Some(column) = cli.column {
        config = config.with_peptide_column(column);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_tool_timeout(Duration::from_secs(secs));
    }
    if cli.no_viewer {
        config = config.without_viewer();
    }

    let runner = SystemRunner::new(config.tool_timeout);
    match Pipeline::new(config, runner).run_with_progress(input, &Console) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
