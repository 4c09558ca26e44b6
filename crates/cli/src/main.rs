//! CLI tool for querying and extracting structured content from PowerPoint files.

mod config;
mod session;
mod tools;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Settings;
use deck_core::{ColumnSelection, SlideSelection, TableRequest};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tools::{is_error, ToolError, ToolRequest, Workspace};

/// Query and extract slides, tables and formatting from .pptx files.
#[derive(Parser, Debug)]
#[command(name = "deck-query")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Slide count, size, sections and per-slide summary
    Overview { file: PathBuf },

    /// Everything extracted from one slide
    Slide { file: PathBuf, number: i64 },

    /// Segments of one formatting kind (bold, italic, hyperlinks, ...)
    Formatting {
        file: PathBuf,
        kind: String,
        /// Slide selection, e.g. "3", "1,4", "2:5", ":3" or "[2:]"
        #[arg(short, long)]
        slides: Option<String>,
    },

    /// Count formatting kinds, font sizes and colours in use
    AnalyzeFormatting {
        file: PathBuf,
        #[arg(short, long)]
        slides: Option<String>,
    },

    /// Extract tables as row/column/value triples or HTML
    Tables {
        file: PathBuf,
        #[arg(short, long)]
        slides: Option<String>,
        /// Output format: row_col_value or html
        #[arg(short, long, default_value = "row_col_value")]
        format: String,
        /// Keep only these columns (by header)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Keep columns whose header matches one of these patterns
        #[arg(long = "pattern")]
        patterns: Vec<String>,
        /// Drop these columns (by header)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
        /// Formatting kinds to report per cell
        #[arg(long, value_delimiter = ',')]
        formatting: Vec<String>,
        /// Full table request as JSON; overrides the other table flags
        #[arg(long)]
        request: Option<String>,
    },

    /// Find slides matching JSON search criteria
    Query {
        file: PathBuf,
        /// Search criteria as a JSON object
        #[arg(short, long)]
        criteria: String,
        /// Fields to return for each match
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(short, long)]
        slides: Option<String>,
        /// Maximum matches (0 for no limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Serve JSON-lines requests from stdin, sharing one cache
    Session,
}

impl Command {
    /// The tool request for a one-shot subcommand; `None` for a session.
    fn into_request(self) -> Result<Option<ToolRequest>, ToolError> {
        let request = match self {
            Command::Overview { file } => ToolRequest::GetPresentationOverview { file_path: file },
            Command::Slide { file, number } => ToolRequest::GetSlideInfo {
                file_path: file,
                slide_number: number,
            },
            Command::Formatting { file, kind, slides } => ToolRequest::ExtractTextFormatting {
                file_path: file,
                formatting_type: kind,
                slides: selection(slides),
            },
            Command::AnalyzeFormatting { file, slides } => ToolRequest::AnalyzeTextFormatting {
                file_path: file,
                slides: selection(slides),
            },
            Command::Tables {
                file,
                slides,
                format,
                columns,
                patterns,
                exclude,
                formatting,
                request,
            } => {
                let options = match request {
                    Some(json) => serde_json::from_str(&json)
                        .context("Invalid table request JSON")
                        .map_err(ToolError::Failed)?,
                    None => TableRequest {
                        columns: ColumnSelection {
                            specific_columns: columns,
                            column_patterns: patterns,
                            exclude_columns: exclude,
                        },
                        formatting,
                        output_format: Some(format),
                        ..TableRequest::default()
                    },
                };
                ToolRequest::ExtractTableData {
                    file_path: file,
                    slides: selection(slides),
                    options,
                }
            }
            Command::Query {
                file,
                criteria,
                fields,
                slides,
                limit,
            } => ToolRequest::QuerySlides {
                file_path: file,
                search_criteria: serde_json::from_str(&criteria)
                    .context("Search criteria is not valid JSON")
                    .map_err(ToolError::Failed)?,
                return_fields: (!fields.is_empty()).then_some(fields),
                slides: selection(slides),
                limit,
            },
            Command::Session => return Ok(None),
        };
        Ok(Some(request))
    }
}

fn selection(slides: Option<String>) -> SlideSelection {
    slides.map(SlideSelection::Expression).unwrap_or_default()
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env = if std::env::var_os("DECK_LOG").is_some() {
        env_logger::Env::new().filter("DECK_LOG")
    } else {
        env_logger::Env::default()
    };
    env_logger::Builder::from_env(env.default_filter_or(level)).init();
}

fn write_json(value: &Value, pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::debug!("Settings: {:?}", cli.settings);
    let workspace = Workspace::new(cli.settings);

    let response = match cli.command.into_request() {
        Ok(Some(request)) => workspace.respond(request),
        Ok(None) => {
            session::run(&workspace, io::stdin().lock(), io::stdout().lock())?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => err.to_json(),
    };
    write_json(&response, cli.pretty)?;

    Ok(if is_error(&response) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
