use clap::{Parser, Subcommand};
use erdsketch::ast::TablePosition;
use erdsketch::config::Settings;
use erdsketch::error::{Error, Result};
use erdsketch::meta::{upsert_directive, Directive};
use erdsketch::normalize::normalize;
use erdsketch::parser::parse;
use erdsketch::query::{generate_query, Column};
use erdsketch::serializer::serialize;
use erdsketch::snapshot::Snapshot;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "erdsketch",
    about = "Format plain-text ER schemas and generate join queries from them"
)]
struct Cli {
    /// Settings file (default: ./erdsketch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical form of a schema
    Format {
        input: PathBuf,
        /// Rewrite the input file
        #[arg(long)]
        in_place: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the parsed schema as JSON
    Inspect { input: PathBuf },
    /// Generate a select statement joining the given columns
    Query {
        input: PathBuf,
        /// Selected column as table.field; the first one picks the base table
        #[arg(short, long = "column", required = true)]
        columns: Vec<Column>,
    },
    /// Move a field into its own table and reference it by foreign key
    Normalize {
        input: PathBuf,
        #[arg(long)]
        field: String,
        /// Target table name (default: the field name)
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        in_place: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Record a table's diagram position
    Place {
        input: PathBuf,
        table: String,
        #[arg(allow_negative_numbers = true)]
        x: i64,
        #[arg(allow_negative_numbers = true)]
        y: i64,
        /// Table color such as #c0ffee
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        in_place: bool,
    },
    /// Wrap a schema into a JSON snapshot
    Export {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract the schema text from a JSON snapshot
    Import {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::discover(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", Error::from(e));
            process::exit(1);
        }
    };

    init_tracing(&settings, cli.verbose);
    tracing::debug!(?settings, "loaded settings");

    if let Err(e) = run(cli.command, &settings) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn init_tracing(settings: &Settings, verbose: bool) {
    let fallback = if verbose { "debug" } else { settings.log.filter.as_str() };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Format {
            input,
            in_place,
            output,
        } => {
            let text = read(&input)?;
            let formatted = serialize(&parse(&text));
            emit(&input, in_place || settings.format.in_place, output, &formatted)
        }
        Command::Inspect { input } => {
            let result = parse(&read(&input)?);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Query { input, columns } => {
            let result = parse(&read(&input)?);
            let sql = generate_query(&columns, &result.table_list);
            if sql.is_empty() {
                tracing::warn!("no query generated");
            } else {
                println!("{}", sql);
            }
            Ok(())
        }
        Command::Normalize {
            input,
            field,
            table,
            in_place,
            output,
        } => {
            let text = read(&input)?;
            let normalized = normalize(&text, &field, table.as_deref().unwrap_or(""));
            emit(&input, in_place, output, &normalized)
        }
        Command::Place {
            input,
            table,
            x,
            y,
            color,
            in_place,
        } => {
            let text = read(&input)?;
            let directive = Directive::TablePosition {
                name: table,
                position: TablePosition { x, y, color },
            };
            emit(&input, in_place, None, &upsert_directive(&text, &directive)?)
        }
        Command::Export { input, output } => {
            let json = Snapshot::new(read(&input)?).to_json(settings.export.pretty)?;
            emit(&input, false, output, &(json + "\n"))
        }
        Command::Import { input, output } => {
            let snapshot = Snapshot::from_json(&read(&input)?)?;
            emit(&input, false, output, &snapshot.input)
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Write to `output`, back to `input` when `in_place`, else stdout.
fn emit(input: &Path, in_place: bool, output: Option<PathBuf>, content: &str) -> Result<()> {
    let target = match output {
        Some(path) => Some(path),
        None if in_place => Some(input.to_path_buf()),
        None => None,
    };
    match target {
        Some(path) => fs::write(&path, content).map_err(|e| Error::write(path, e)),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}
