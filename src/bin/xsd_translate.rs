//! xsd-translate: Restructure documents into a target XML shape
//!
//! Usage:
//!   # Ask a model for a mapping (needs OPENAI_API_KEY)
//!   xsd-translate propose --json-schema customer.schema.json --xsd request.xsd > mapping.json
//!
//!   # Apply a mapping to an XML document
//!   xsd-translate transform --input customer.xml --mapping mapping.json --xsd request.xsd
//!
//!   # Apply a mapping to a JSON document read from stdin
//!   cat customer.json | xsd-translate transform --json-input --mapping mapping.json --xsd request.xsd
//!
//!   # Show the flattened paths of a document
//!   xsd-translate flatten --input customer.xml

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::io::{stdin, Read};
use tracing_subscriber::EnvFilter;
use xsd_translate::pipeline::{propose_mapping, transform, transform_to_tree};
use xsd_translate::{OpenAiProposer, ProposerConfig, SourceDocument, TransformConfig, TransformRequest};

#[derive(Parser, Debug)]
#[command(name = "xsd-translate")]
#[command(about = "Restructure documents into a target XML shape using a path mapping", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propose a mapping from a JSON Schema to an XSD
    Propose {
        /// Source JSON Schema file
        #[arg(long, value_name = "FILE")]
        json_schema: String,

        /// Target XSD file
        #[arg(long, value_name = "FILE")]
        xsd: String,

        /// Print the raw model reply instead of the parsed table
        #[arg(long)]
        raw: bool,
    },

    /// Apply a mapping to a source document
    Transform {
        #[command(flatten)]
        source: SourceArgs,

        /// Mapping table file (JSON object of source path to target path)
        #[arg(long, value_name = "FILE")]
        mapping: String,

        /// Target XSD file, read for the root element name
        #[arg(long, value_name = "FILE")]
        xsd: String,

        /// Root element used when the XSD declares none
        #[arg(long)]
        root: Option<String>,

        /// Spaces per indentation level (0 for compact output)
        #[arg(long)]
        indent: Option<usize>,

        /// Print the rebuilt tree as JSON instead of XML
        #[arg(long)]
        tree: bool,
    },

    /// Print the flattened paths of a source document
    Flatten {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Source document (use - for stdin)
    #[arg(long, short = 'i', value_name = "FILE", default_value = "-")]
    input: String,

    /// Treat the source as JSON instead of XML
    #[arg(long)]
    json_input: bool,
}

impl SourceArgs {
    fn load(&self) -> Result<SourceDocument> {
        let text = read_input(&self.input)?;
        if self.json_input {
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse JSON input: {}", self.input))?;
            Ok(SourceDocument::Json(value))
        } else {
            Ok(SourceDocument::Xml(text))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Propose { json_schema, xsd, raw } => run_propose(&json_schema, &xsd, raw),
        Command::Transform {
            source,
            mapping,
            xsd,
            root,
            indent,
            tree,
        } => {
            let mut config = TransformConfig::default();
            if let Some(root) = root {
                config.fallback_root = root;
            }
            if let Some(indent) = indent {
                config.indent = indent;
            }

            let request = TransformRequest {
                source: Some(source.load()?),
                mapping: Some(read_input(&mapping)?),
                target_schema: Some(read_input(&xsd)?),
            };

            if tree {
                let tree = transform_to_tree(&request, &config)?;
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                println!("{}", transform(&request, &config)?);
            }
            Ok(())
        }
        Command::Flatten { source } => {
            let flat = source.load()?.to_flat(&TransformConfig::default())?;
            println!("{}", serde_json::to_string_pretty(&flat)?);
            Ok(())
        }
    }
}

fn run_propose(json_schema: &str, xsd: &str, raw: bool) -> Result<()> {
    let source_schema = read_input(json_schema)?;
    let target_schema = read_input(xsd)?;

    let config = ProposerConfig::from_env()?;
    let proposer = OpenAiProposer::new(config)?;

    if raw {
        use xsd_translate::MappingProposer;
        println!("{}", proposer.propose(&source_schema, &target_schema)?);
        return Ok(());
    }

    let table = propose_mapping(&proposer, &source_schema, &target_schema)?;
    if table.invalid_count() > 0 {
        eprintln!(
            "Warning: {} of {} proposed entries have no usable target",
            table.invalid_count(),
            table.len()
        );
    }
    println!("{}", serde_json::to_string_pretty(&table.to_value())?);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a whole file, or stdin when `path` is `-`
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
    }
}
