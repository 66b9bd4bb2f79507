//! Command-line front end for the PGN engine: read a game file, report
//! anything that failed to resolve, and re-serialize it as plain PGN or as
//! the annotated HTML markup used by board views.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pgn::{export_game, parse_game, HtmlExporter, ParseOptions, TextExporter};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "pgn-cli", about = "Reformat and inspect PGN game files")]
struct Cli {
    /// PGN file to read.
    input: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Column budget for line wrapping; 0 disables wrapping.
    #[arg(long, default_value_t = 80)]
    columns: usize,

    /// Strip comments and NAGs from the output.
    #[arg(long)]
    no_comments: bool,

    /// Strip sidelines from the output.
    #[arg(long)]
    no_variations: bool,

    /// Print unresolved-move diagnostics as JSON instead of the game text.
    #[arg(long)]
    diagnostics: bool,

    /// Write the output to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Canonical PGN text.
    Text,
    /// Annotated markup with position anchors.
    Html,
}

/// Error type for CLI operations.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to write {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Parse(#[from] pgn::ParseError),

    #[error("failed to encode diagnostics: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Parse the input file and render whatever the flags ask for.
fn run(cli: &Cli) -> Result<String, CliError> {
    let text =
        fs::read_to_string(&cli.input).map_err(|e| CliError::Read(cli.input.clone(), e))?;

    let parsed = parse_game(&text, &ParseOptions::default())?;
    for diagnostic in &parsed.diagnostics {
        tracing::warn!(
            "unresolved move {:?} at {} (offset {})",
            diagnostic.raw,
            diagnostic.fen,
            diagnostic.offset
        );
    }

    if cli.diagnostics {
        return Ok(serde_json::to_string_pretty(&parsed.diagnostics)?);
    }

    let columns = if cli.columns == 0 {
        None
    } else {
        Some(cli.columns)
    };
    let include_comments = !cli.no_comments;
    let include_variations = !cli.no_variations;

    let rendered = match cli.format {
        Format::Text => {
            let mut exporter = TextExporter::new(columns);
            export_game(&parsed.tree, &mut exporter, include_comments, include_variations)
        }
        Format::Html => {
            let mut exporter = HtmlExporter::new(columns);
            export_game(&parsed.tree, &mut exporter, include_comments, include_variations)
        }
    };
    Ok(rendered)
}

/// Deliver the rendered text to stdout or the requested file.
fn emit(output: Option<&PathBuf>, rendered: &str) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, format!("{rendered}\n"))
            .map_err(|e| CliError::Write(path.clone(), e)),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let rendered = run(&cli)?;
    emit(cli.output.as_ref(), &rendered)
}
