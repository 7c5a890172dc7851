use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// varforge - variant creation and dependency resolution for native modules
#[derive(Parser)]
#[command(name = "varforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Log pipeline progress to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve module declarations into a variant manifest
  Resolve {
    /// JSON file holding an array of module declarations
    decls: PathBuf,

    /// JSON build configuration (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also list hidden variants
    #[arg(long)]
    all: bool,
  },

  /// Resolve and report every diagnostic without printing the manifest
  Check {
    /// JSON file holding an array of module declarations
    decls: PathBuf,

    /// JSON build configuration (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Resolve {
      decls,
      config,
      format,
      all,
    } => cmd::cmd_resolve(&decls, config.as_deref(), format, all),
    Commands::Check { decls, config } => cmd::cmd_check(&decls, config.as_deref()),
  }
}
