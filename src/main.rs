use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use mapquill::config::Config;
use mapquill::document::node::Value;
use mapquill::file::loader::{load_value_file, load_value_from_stdin};
use mapquill::file::saver::{render_value, save_value_file};
use mapquill::file::Format;
use mapquill::logging::{self, LogLevel};
use mapquill::mapping::MappingEngine;
use mapquill::path::{DataAccessor, PathExpression, Resolved};
use mapquill::pipeline::stages::Normalizer;
use mapquill::pipeline::Pipeline;

/// MAPQuill - Map nested JSON/YAML data through reversible templates
#[derive(Parser)]
#[command(name = "mapquill")]
#[command(version)]
#[command(about = "Map nested JSON/YAML data through reversible templates", long_about = None)]
struct Cli {
    /// Output format (default from config: json)
    #[arg(short, long, value_enum, global = true)]
    format: Option<Format>,

    /// Config file (default: ~/.config/mapquill/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print compact output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Map source data through a template
    Map {
        /// Data to read (stdin if omitted)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Existing document to map into
        #[arg(long)]
        target: Option<PathBuf>,

        #[command(flatten)]
        mapping: MappingArgs,
    },
    /// Rebuild source data from mapped output and its template
    Reverse {
        /// Mapped data to read (stdin if omitted)
        #[arg(short, long)]
        mapped: Option<PathBuf>,

        /// Existing document to rebuild into
        #[arg(long)]
        original: Option<PathBuf>,

        #[command(flatten)]
        mapping: MappingArgs,
    },
    /// Print the value at a path
    Get {
        /// Dotted path, may contain `*`
        path: String,

        /// Document to read (stdin if omitted)
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MappingArgs {
    /// Template file (JSON or YAML)
    #[arg(short, long)]
    template: PathBuf,

    /// Omit null results
    #[arg(long)]
    skip_null: bool,

    /// Renumber wildcard indices from zero
    #[arg(long)]
    reindex: bool,

    /// Trim strings and coerce numeric strings before writing
    #[arg(long)]
    normalize: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    // CLI log level overrides config log level
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let level = level.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    logging::init(level);

    let format = cli.format.unwrap_or(config.output_format);
    let pretty = config.pretty && !cli.compact;

    match cli.command {
        Command::Map {
            source,
            target,
            mapping,
        } => {
            let source = load_input(source.as_ref())?;
            let target = load_optional(target.as_ref())?;
            let engine = build_engine(&config, &mapping);
            let template = load_value_file(&mapping.template)?;
            let out = engine
                .map_value(&source, target, &template)
                .context("Mapping failed")?;
            emit(&out, mapping.output.as_ref(), format, pretty)
        }
        Command::Reverse {
            mapped,
            original,
            mapping,
        } => {
            let mapped = load_input(mapped.as_ref())?;
            let original = load_optional(original.as_ref())?;
            let engine = build_engine(&config, &mapping).reverse();
            let template = load_value_file(&mapping.template)?;
            let out = engine
                .map_value(&mapped, original, &template)
                .context("Reverse mapping failed")?;
            emit(&out, mapping.output.as_ref(), format, pretty)
        }
        Command::Get { path, file } => {
            let document = load_input(file.as_ref())?;
            let expr = PathExpression::parse(&path)?;
            let value = match DataAccessor::new(&document).get(&expr) {
                Resolved::Single(Some(value)) => value.into_owned(),
                Resolved::Single(None) => anyhow::bail!("Path '{}' not found", path),
                Resolved::Expanded(matches) => Value::Map(matches),
            };
            emit(&value, None, format, pretty)
        }
    }
}

fn build_engine(config: &Config, args: &MappingArgs) -> MappingEngine {
    let mut engine = MappingEngine::new()
        .with_options(config.mapping_options())
        .skip_null(config.skip_null || args.skip_null)
        .reindex_wildcard(config.reindex_wildcard || args.reindex);
    if args.normalize {
        engine = engine.pipe(
            Pipeline::new()
                .stage(Normalizer::new())
                .stop_on_error(config.stop_on_error),
        );
    }
    engine
}

fn load_input(path: Option<&PathBuf>) -> Result<Value> {
    match path {
        Some(path) => load_value_file(path),
        None => load_value_from_stdin(),
    }
}

fn load_optional(path: Option<&PathBuf>) -> Result<Value> {
    path.map_or(Ok(Value::Null), load_value_file)
}

fn emit(value: &Value, output: Option<&PathBuf>, format: Format, pretty: bool) -> Result<()> {
    match output {
        Some(path) => {
            let format = Format::from_path(path).unwrap_or(format);
            save_value_file(path, value, format)
        }
        None => {
            print!("{}", render_value(value, format, pretty)?);
            Ok(())
        }
    }
}
