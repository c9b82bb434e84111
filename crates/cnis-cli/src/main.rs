use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cnis_core::config_file::{self, ConfigFile};
use cnis_parsing::{CnisExtractor, ParsingConfigBuilder, PdfBackend};
use cnis_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// CNIS statement extractor - Pull employment records and contribution gaps out of CNIS Cidadão statements
#[derive(Parser, Debug)]
#[command(name = "cnis", version, about, long_about = None)]
struct Cli {
    /// Log extraction details to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read this config file instead of the .cnis.toml cascade
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reject statements larger than this many MiB
    #[arg(long, global = true)]
    max_input_mb: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a statement (PDF or extracted text) and print the result as JSON
    Parse {
        /// Path to the PDF or text file
        file_path: PathBuf,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print a human-readable summary of a statement
    Summary {
        /// Path to the PDF or text file
        file_path: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Also print how every line of the statement was classified
        #[arg(long)]
        lines: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => config_file::load_from_path(path)
            .ok_or_else(|| anyhow::anyhow!("Could not read config file {}", path.display()))?,
        None => config_file::load_config(),
    };
    let extractor = build_extractor(&config, cli.max_input_mb)?;
    let backend = build_backend(&config);

    match cli.command {
        Command::Parse {
            file_path,
            output,
            compact,
        } => parse(&extractor, &backend, &file_path, output, compact),
        Command::Summary {
            file_path,
            no_color,
            lines,
        } => summary(&extractor, &backend, &file_path, ColorMode(!no_color), lines),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve parsing settings: CLI flags > env vars > config file > defaults.
fn build_extractor(config: &ConfigFile, max_input_mb: Option<u64>) -> anyhow::Result<CnisExtractor> {
    let section = config.parsing.clone().unwrap_or_default();
    let mut builder = ParsingConfigBuilder::from_section(&section);

    let max_input_mb = max_input_mb.or_else(|| {
        std::env::var("CNIS_MAX_INPUT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
    });
    if let Some(mb) = max_input_mb {
        builder = builder.max_input_bytes((mb as usize).saturating_mul(1024 * 1024));
    }

    Ok(CnisExtractor::with_config(builder.build()?))
}

fn build_backend(config: &ConfigFile) -> MupdfBackend {
    let mut backend = MupdfBackend::new();
    if let Some(pdf) = &config.pdf {
        if let Some(ratio) = pdf.footer_exclusion {
            backend = backend.with_footer_exclusion(ratio);
        }
        if let Some(ratio) = pdf.header_exclusion {
            backend = backend.with_header_exclusion(ratio);
        }
    }
    backend
}

/// PDF by extension, or by the `%PDF-` signature for files without one.
fn is_pdf(path: &Path) -> std::io::Result<bool> {
    if path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    {
        return Ok(true);
    }
    let mut magic = [0u8; 5];
    let mut file = std::fs::File::open(path)?;
    let read = file.read(&mut magic)?;
    Ok(read == magic.len() && &magic == b"%PDF-")
}

/// Statement text, through the PDF backend when needed, checked against the
/// configured input bounds.
fn read_statement(
    extractor: &CnisExtractor,
    backend: &dyn PdfBackend,
    file_path: &Path,
) -> anyhow::Result<String> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let text = if is_pdf(file_path)? {
        backend.extract_text(file_path)?
    } else {
        std::fs::read_to_string(file_path)?
    };
    extractor.validate_input(&text)?;
    Ok(text)
}

fn parse(
    extractor: &CnisExtractor,
    backend: &dyn PdfBackend,
    file_path: &Path,
    output: Option<PathBuf>,
    compact: bool,
) -> anyhow::Result<()> {
    let text = read_statement(extractor, backend, file_path)?;
    let result = extractor.parse(&text);

    let json = if compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };
    writeln!(writer, "{}", json)?;
    Ok(())
}

fn summary(
    extractor: &CnisExtractor,
    backend: &dyn PdfBackend,
    file_path: &Path,
    color: ColorMode,
    lines: bool,
) -> anyhow::Result<()> {
    let text = read_statement(extractor, backend, file_path)?;
    let (result, stats) = extractor.parse_with_stats(&text);

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    if lines {
        output::print_line_kinds(&mut writer, &text, extractor, color)?;
        writeln!(writer)?;
    }
    output::print_summary(&mut writer, &file_name, &result, &stats, color)?;
    Ok(())
}
