//! JSON Schema Tools CLI
//!
//! Relocates schema trees, validates data files and generates Markdown
//! documentation.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use json_schema_tools::{generate_markdown_file, Relocator, SchemaValidator, ToolConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jst")]
#[command(about = "JSON schema tool")]
#[command(version)]
struct Cli {
    /// Configuration file (layered over jst.toml and JST__* variables)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a schema and every file:// schema it references into a new tree
    Relocate {
        /// Root schema file (relative to the exec directory)
        #[arg(short, long)]
        schema: PathBuf,
        /// Directory input paths are resolved against
        #[arg(short, long)]
        exec_dir: Option<PathBuf>,
        /// Directory relocated files are written under
        #[arg(short, long)]
        dest_dir: Option<PathBuf>,
        /// Prefix of rewritten references
        #[arg(short, long)]
        new_location: Option<String>,
    },

    /// Validate data files against a schema
    Validate {
        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,
        /// Data file (repeat to merge several, later files win)
        #[arg(short, long, required = true, num_args = 1.., value_delimiter = ',')]
        data: Vec<PathBuf>,
        /// Base path of files
        #[arg(short, long)]
        base: Option<PathBuf>,
    },

    /// Generate the Markdown documentation of a schema
    Generate {
        /// Schema file
        #[arg(short, long)]
        schema: PathBuf,
        /// Markdown output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = run(cli);
    if let Err(e) = &outcome {
        eprintln!("Error: {:#}", e);
    }
    std::process::exit(exit_code(&outcome));
}

/// Process status of a command: 0 only when it ran and its check passed.
fn exit_code(outcome: &anyhow::Result<bool>) -> i32 {
    match outcome {
        Ok(true) => 0,
        Ok(false) | Err(_) => 1,
    }
}

impl Commands {
    /// Overlay the flags given on the command line onto `config`.
    fn apply_to(&self, config: &mut ToolConfig) {
        match self {
            Commands::Relocate {
                exec_dir,
                dest_dir,
                new_location,
                ..
            } => {
                if let Some(exec_dir) = exec_dir {
                    config.relocate.exec_dir = exec_dir.clone();
                }
                if let Some(dest_dir) = dest_dir {
                    config.relocate.dest_dir = dest_dir.clone();
                }
                if let Some(new_location) = new_location {
                    config.relocate.new_location = new_location.clone();
                }
            }
            Commands::Validate { base, .. } => {
                if base.is_some() {
                    config.validate.base = base.clone();
                }
            }
            Commands::Generate { output, .. } => {
                if let Some(output) = output {
                    config.generate.output = output.clone();
                }
            }
        }
    }
}

/// Returns `false` when the command ran but its check failed.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config =
        ToolConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    cli.command.apply_to(&mut config);

    match cli.command {
        Commands::Relocate { schema, .. } => {
            let relocation = config.relocation_config()?;
            let report = Relocator::new(relocation)
                .relocate(&schema)
                .with_context(|| format!("failed to relocate {}", schema.display()))?;

            println!("Relocated {} file(s)", report.written.len());
            for path in &report.written {
                println!("- {}", path.display());
            }
            if !report.unresolved.is_empty() {
                println!("{} reference(s) left unchanged:", report.unresolved.len());
                for unresolved in &report.unresolved {
                    println!(
                        "- {} in {}: {}",
                        unresolved.reference,
                        unresolved.file.display(),
                        unresolved.reason
                    );
                }
            }
            Ok(true)
        }

        Commands::Validate { schema, data, .. } => {
            let report = SchemaValidator::new()
                .validate_files(config.validate.base.as_deref(), &schema, &data)
                .with_context(|| format!("failed to validate against {}", schema.display()))?;

            if report.valid {
                println!("The document is valid");
            } else {
                println!("The document is not valid. see errors :");
                for error in &report.errors {
                    println!("- {}", error);
                }
            }
            Ok(report.valid)
        }

        Commands::Generate { schema, .. } => {
            let output = config.generate.output;
            generate_markdown_file(&schema, &output)
                .with_context(|| format!("failed to generate markdown for {}", schema.display()))?;

            println!("Markdown written to {}", output.display());
            Ok(true)
        }
    }
}
