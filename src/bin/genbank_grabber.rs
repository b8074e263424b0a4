use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use genbank_grabber::config::ConfigLoader;
use genbank_grabber::domain::{Accession, ReturnType};
use genbank_grabber::error::GrabberError;
use genbank_grabber::eutils::EutilsHttpClient;
use genbank_grabber::fetcher::{RecordFetcher, SaveOutcome};
use genbank_grabber::output::TracingSink;

#[derive(Parser)]
#[command(name = "genbank-grabber")]
#[command(about = "Downloads the FASTA sequence of a GenBank nucleotide accession")]
#[command(version, author)]
struct Cli {
    #[arg(value_name = "ACCESSION", help = "GenBank accession to download")]
    accession: String,

    #[arg(short, long, value_name = "NAME", help = "Output filename, default: stdout")]
    out: Option<String>,

    #[arg(short = 'd', long, value_name = "DIR", help = "Directory for the output file")]
    outdir: Option<String>,

    #[arg(long, value_name = "TYPE", default_value_t = ReturnType::Fasta)]
    rettype: ReturnType,

    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    #[arg(short, long, help = "Increase output verbosity")]
    verbose: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<GrabberError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GrabberError) -> u8 {
    match error {
        GrabberError::RecordNotFound(_) | GrabberError::InvalidAccession(_) => 2,
        GrabberError::EutilsHttp(_) | GrabberError::EutilsStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let accession: Accession = cli.accession.parse()?;
    let resolved = ConfigLoader::resolve(cli.config.as_deref())?;
    let output_dir = cli
        .outdir
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| resolved.output_dir.clone());

    let transport = EutilsHttpClient::new(resolved.timeout)?;
    let mut fetcher = RecordFetcher::new(transport, TracingSink, resolved.endpoint, accession)
        .with_output(cli.out, output_dir)
        .with_return_type(cli.rettype);

    let outcome = fetcher.save()?;
    match outcome {
        SaveOutcome::File(path) => tracing::info!(
            header = fetcher.record_header(),
            "saved {} to {path}",
            fetcher.accession()
        ),
        SaveOutcome::Stdout => {
            tracing::debug!(header = fetcher.record_header(), "written to stdout")
        }
    }
    Ok(())
}
