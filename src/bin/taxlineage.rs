use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use taxlineage::app::App;
use taxlineage::config::{ConfigLoader, ConfigOverrides};
use taxlineage::edirect::{EdirectClient, check_toolchain};
use taxlineage::error::LineageError;
use taxlineage::output::StdoutProgress;
use taxlineage::table::{LineageTables, output_paths};

#[derive(Parser)]
#[command(name = "taxlineage")]
#[command(about = "Retrieves taxonomic information from the NCBI taxonomy DB.")]
#[command(version, author)]
struct Cli {
    /// Text file with a list of accession numbers for which the taxonomic info will be retrieved.
    #[arg(short = 'i', long = "input_file", visible_alias = "input-file")]
    input_file: PathBuf,

    /// Path to the output prefix file [default: lineage].
    #[arg(short = 'p', long = "output_prefix", visible_alias = "output-prefix")]
    output_prefix: Option<String>,

    /// Seconds to wait for each external query before killing it.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Optional JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    if std::env::args_os().len() == 1 {
        let _ = Cli::command().write_long_help(&mut std::io::stderr());
        return ExitCode::from(1);
    }

    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    check_toolchain()?;

    let resolved = ConfigLoader::resolve(
        &cli.input_file,
        cli.config.as_deref(),
        ConfigOverrides {
            output_prefix: cli.output_prefix,
            timeout_secs: cli.timeout_secs,
        },
    )?;

    let input = File::open(&resolved.input_file).map_err(|err| LineageError::InputRead {
        path: resolved.input_file.clone(),
        message: err.to_string(),
    })?;

    let client = EdirectClient::new(resolved.edirect.clone())?;
    let app = App::new(client);
    let mut tables = LineageTables::create(&resolved.output_prefix)?;

    let summary = app.run(BufReader::new(input), &mut tables, &StdoutProgress)?;
    tables.into_inner()?;

    let (taxids_path, names_path) = output_paths(&resolved.output_prefix);
    tracing::info!(
        resolved = summary.resolved(),
        processed = summary.processed,
        taxids = %taxids_path,
        names = %names_path,
        "wrote lineage tables"
    );
    Ok(())
}
