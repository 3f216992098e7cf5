use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kira_downsample::app::{App, ProgressSink, SampleOptions, SampleResult};
use kira_downsample::config::{ConfigLoader, SampleRequest};
use kira_downsample::domain::DatasetKind;
use kira_downsample::error::SampleError;
use kira_downsample::output::{JsonOutput, OutputMode, StderrSink, TracingSink};
use kira_downsample::store::Store;

#[derive(Parser)]
#[command(name = "kira-ds")]
#[command(about = "Downsample single-cell visualisation JSON datasets to every tenth cell")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Directory the dataset paths are resolved against (default: current directory)
    #[arg(long, global = true)]
    data_root: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Sample datasets and write the reduced files")]
    Sample(SampleArgs),
    #[command(about = "List built-in datasets and their paths")]
    List,
}

#[derive(Args, Clone, Default)]
struct SampleArgs {
    #[arg(value_enum)]
    datasets: Vec<DatasetKind>,

    /// Sample every *Combined.json dataset
    #[arg(long, conflicts_with = "datasets")]
    all: bool,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SampleError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SampleError) -> u8 {
    match error {
        SampleError::MissingInput(_) | SampleError::MissingConfig | SampleError::ConfigRead(_) => {
            2
        }
        SampleError::MalformedJson { .. }
        | SampleError::RootNotObject { .. }
        | SampleError::RootNotArray { .. }
        | SampleError::NonIntegerKey(_)
        | SampleError::NonIntegerRecordHead { .. }
        | SampleError::RecordShape { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Some(Commands::Sample(args)) => run_sample(args, cli.data_root, output_mode),
        Some(Commands::List) => run_list(store_for(cli.data_root, None)?, output_mode),
        None => run_sample(SampleArgs::default(), cli.data_root, output_mode),
    }
}

/// `--data-root` wins over the config file, which wins over the working directory.
fn store_for(flag: Option<String>, config_root: Option<Utf8PathBuf>) -> miette::Result<Store> {
    match flag.map(Utf8PathBuf::from).or(config_root) {
        Some(root) => Ok(Store::new_with_root(root)),
        None => Ok(Store::new()?),
    }
}

fn resolve_requests(
    args: &SampleArgs,
) -> miette::Result<(Vec<SampleRequest>, Option<Utf8PathBuf>)> {
    if !args.datasets.is_empty() {
        let requests = args
            .datasets
            .iter()
            .copied()
            .map(SampleRequest::builtin)
            .collect();
        return Ok((requests, None));
    }
    if args.all {
        let requests = DatasetKind::COMBINED
            .into_iter()
            .map(SampleRequest::builtin)
            .collect();
        return Ok((requests, None));
    }

    let resolved = match ConfigLoader::resolve(args.config.as_deref()) {
        Ok(resolved) => Some(resolved),
        Err(SampleError::MissingConfig) => None,
        Err(err) => return Err(err.into()),
    };
    match resolved {
        Some(resolved) if !resolved.requests.is_empty() => {
            tracing::debug!(
                schema_version = resolved.schema_version,
                datasets = resolved.requests.len(),
                "using config file"
            );
            Ok((resolved.requests, resolved.data_root))
        }
        Some(resolved) => Ok((
            vec![SampleRequest::builtin(DatasetKind::Umap)],
            resolved.data_root,
        )),
        None => Ok((vec![SampleRequest::builtin(DatasetKind::Umap)], None)),
    }
}

fn run_sample(
    args: SampleArgs,
    data_root: Option<String>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let (requests, config_root) = resolve_requests(&args)?;
    let app = App::new(store_for(data_root, config_root)?);
    let options = SampleOptions {
        dry_run: args.dry_run,
    };

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.sample(&requests, &options, &TracingSink)?;
            JsonOutput::print_sample(&result).map_err(miette::Report::msg)?;
        }
        OutputMode::Interactive => {
            let sink: &dyn ProgressSink = &StderrSink;
            let result = app.sample(&requests, &options, sink)?;
            print_sample_summary(&result);
        }
    }
    Ok(())
}

fn run_list(store: Store, output_mode: OutputMode) -> miette::Result<()> {
    let app = App::new(store);
    let result = app.list();
    match output_mode {
        OutputMode::NonInteractive => {
            JsonOutput::print_list(&result).map_err(miette::Report::msg)?;
        }
        OutputMode::Interactive => {
            println!("data root: {}", result.data_root);
            for entry in &result.datasets {
                let marker = if entry.input_exists { "+" } else { "-" };
                println!(
                    "{marker} {:<22} {:<18} {:<8} {}",
                    entry.dataset.as_str(),
                    entry.rule.to_string(),
                    entry.style.to_string(),
                    entry.input
                );
            }
        }
    }
    Ok(())
}

fn print_sample_summary(result: &SampleResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}KIRA-DS summary{reset}");
    println!("{green}Sampled datasets: {}{reset}", result.items.len());

    for item in &result.items {
        let color = if item.action == "written" { green } else { yellow };
        println!(
            "{color}* {} kept {}/{} entries ({}, {} ms){reset}",
            item.dataset, item.entries_out, item.entries_in, item.action, item.elapsed_ms
        );
        if let (Some(records_in), Some(records_out)) = (item.records_in, item.records_out) {
            println!("{color}   records: {records_out}/{records_in}{reset}");
        }
        println!("{color}   output: {}{reset}", item.output);
    }
}
