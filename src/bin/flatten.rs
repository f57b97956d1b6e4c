//! Schema Flatten CLI
//!
//! Flattens JSON Schema documents into entity maps, and exports the
//! composite JSON Schema or relation graph of the result.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use schema_flatten::config::FlattenConfig;
use schema_flatten::loader::{batch_targets, discover, flatten_file, root_entity_name};
use schema_flatten::{compile_json_schema, to_json_schema, Checksum, EntityGraph, EntityMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-flatten")]
#[command(about = "Flatten JSON Schema documents into relational entities")]
struct Cli {
    /// Configuration file (in addition to flatten.toml lookups)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override a configuration option, e.g. --set rootEntity=collection
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_option, global = true)]
    set: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the flattened entity map as JSON
    Flatten(SchemaArgs),
    /// Write the composite JSON Schema of the flattened entities
    JsonSchema(SchemaArgs),
    /// Write the entity relation graph as DOT
    Graph(SchemaArgs),
    /// Flatten every schema file under a directory
    Batch {
        /// Directory to search for schema files
        dir: PathBuf,

        /// Directory receiving one <name>.entities.json per schema, mirroring subdirectories
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[derive(Args)]
struct SchemaArgs {
    /// Schema file
    schema: PathBuf,

    /// Root entity name (defaults to the file stem)
    #[arg(short, long)]
    entity: Option<String>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_option(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref().map(|p| p.to_string_lossy().into_owned());
    let config = FlattenConfig::load_from(config_path.as_deref())
        .context("failed to load configuration")?
        .with_options(&cli.set)
        .context("invalid --set option")?;

    match cli.command {
        Command::Flatten(args) => {
            let entities = flatten_checked(&args.schema, args.entity.as_deref(), &config)?;
            write_output(args.output.as_deref(), &config.output.format.render(&entities)?)
        }
        Command::JsonSchema(args) => {
            let entities = flatten_checked(&args.schema, args.entity.as_deref(), &config)?;
            let document = to_json_schema(&entities);
            if config.validation.compile_json_schema {
                compile_json_schema(&document).context("generated JSON Schema does not compile")?;
            }
            write_output(args.output.as_deref(), &config.output.format.render(&document)?)
        }
        Command::Graph(args) => {
            let entities = flatten_checked(&args.schema, args.entity.as_deref(), &config)?;
            write_output(args.output.as_deref(), &EntityGraph::from_entities(&entities).to_dot())
        }
        Command::Batch { dir, output_dir } => batch(&dir, &output_dir, &config),
    }
}

fn flatten_checked(
    schema: &Path,
    entity: Option<&str>,
    config: &FlattenConfig,
) -> Result<EntityMap> {
    let root_entity = entity.or(config.flatten.root_entity.as_deref());
    let entities = flatten_file(schema, root_entity)
        .with_context(|| format!("failed to flatten {}", schema.display()))?;

    if config.validation.check_references {
        let violations = EntityGraph::from_entities(&entities).validate();
        if !violations.is_empty() {
            for violation in &violations {
                tracing::error!(%violation, "reference violation");
            }
            bail!("{} reference violation(s) in {}", violations.len(), schema.display());
        }
    }

    if config.output.fingerprint {
        let checksum = Checksum::of_entities(&entities)?;
        tracing::info!(schema = %schema.display(), %checksum, "entity map fingerprint");
    }

    tracing::info!(schema = %schema.display(), entities = entities.len(), "flattened");
    Ok(entities)
}

fn batch(dir: &Path, output_dir: &Path, config: &FlattenConfig) -> Result<()> {
    let schemas = discover(dir, &config.loader)
        .with_context(|| format!("failed to search {}", dir.display()))?;
    let targets = batch_targets(dir, &schemas, output_dir)?;

    for (schema, target) in &targets {
        let name = root_entity_name(schema);
        let entities = flatten_checked(schema, Some(&name), config)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(target, config.output.format.render(&entities)?)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }

    println!("Flattened {} schema(s) into {}", schemas.len(), output_dir.display());
    Ok(())
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "written");
        }
        None => println!("{}", content),
    }
    Ok(())
}
