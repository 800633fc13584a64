use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bankcsv::{
    DocumentProcessor, ExtractionResponse, ExtractionResult, Pdftoppm, PlumberTableReader,
    ProcessorConfig, TesseractCli, write_csv_to_writer,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "bank2csv",
    version,
    about = "Rebuild bank-statement tables from PDFs and screenshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the statement table from one PDF or image.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableStrategy {
    /// Only tables drawn with ruling lines.
    Lattice,
    /// Also borderless tables aligned by whitespace.
    Stream,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF or image path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Tesseract language codes, e.g. eng+spa.
    #[arg(long)]
    lang: Option<String>,

    /// Extra arguments passed to tesseract.
    #[arg(long = "ocr-config", allow_hyphen_values = true)]
    ocr_config: Option<String>,

    /// How PDF tables are located before falling back to OCR.
    #[arg(long, value_enum, default_value_t = TableStrategy::Lattice)]
    table_strategy: TableStrategy,

    #[arg(long, default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    #[arg(long, default_value = "pdftoppm")]
    pdftoppm_cmd: PathBuf,

    /// Print every note and enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &ExtractArgs) -> Result<ProcessorConfig> {
    let mut config = ProcessorConfig::from_env();
    if let Some(lang) = &args.lang {
        config.ocr_language.clone_from(lang);
    }
    if let Some(ocr_config) = &args.ocr_config {
        config.ocr_config.clone_from(ocr_config);
    }
    config.validate().context("invalid OCR settings")?;
    Ok(config)
}

fn write_output(args: &ExtractArgs, result: &ExtractionResult) -> Result<()> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create '{}'", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    match args.format {
        OutputFormat::Csv => {
            write_csv_to_writer(&mut sink, &result.table, args.delimiter as u8)
                .context("failed to write CSV")?;
        }
        OutputFormat::Json => {
            let response = ExtractionResponse::from_result(display_name(&args.input), result)?;
            serde_json::to_writer_pretty(&mut sink, &response).context("failed to write JSON")?;
            writeln!(sink)?;
        }
    }
    sink.flush()?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn log_notes(result: &ExtractionResult, verbose: bool) {
    if result.notes.is_empty() {
        return;
    }

    eprintln!("note: {} step(s) recorded", result.notes.len());
    if verbose {
        for note in &result.notes {
            eprintln!("  - {:?} page={:?}: {}", note.code, note.page, note.message);
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionResult> {
    let config = build_config(args)?;
    let content = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    let table_reader = match args.table_strategy {
        TableStrategy::Lattice => PlumberTableReader::lattice(),
        TableStrategy::Stream => PlumberTableReader::stream(),
    };
    let processor = DocumentProcessor::new(config)
        .with_ocr_engine(TesseractCli::with_command(&args.tesseract_cmd))
        .with_rasterizer(Pdftoppm::with_command(&args.pdftoppm_cmd))
        .with_table_reader(table_reader);
    let result = processor.process(&display_name(&args.input), &content);

    write_output(args, &result)?;
    Ok(result)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Extract(args) = cli.command;

    let default_filter = if args.verbose { "bankcsv=debug" } else { "bankcsv=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_extract(&args) {
        Ok(result) => {
            log_notes(&result, args.verbose);
            if result.row_count() > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
