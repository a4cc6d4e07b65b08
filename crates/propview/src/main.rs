use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use propview::cli::commands;
use propview::config::{self, Config};
use propview::filter::FilterSelection;

#[derive(Parser)]
#[command(name = "propview")]
#[command(about = "Propview - Property & Agent Data Dashboard\nFetch, join and filter listings straight from PostgreSQL")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), ", courtesy of Propview"))]
struct Cli {
  /// Log pipeline activity to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

/// Filter choices; `All` (the default) means no constraint
#[derive(Args)]
struct FilterArgs {
  /// Only properties of this type
  #[arg(long)]
  property_type: Option<String>,
  /// Only properties in this city
  #[arg(long)]
  city: Option<String>,
  /// Only properties listed by this agent company
  #[arg(long)]
  agent_company: Option<String>,
}

impl FilterArgs {
  fn selection(&self) -> FilterSelection {
    FilterSelection::from_choices(self.property_type.as_deref(), self.city.as_deref(), self.agent_company.as_deref())
  }
}

#[derive(Subcommand)]
enum Command {
  /// Load the dashboard once and print notices, data and chart summaries
  Snapshot {
    #[command(flatten)]
    filters: FilterArgs,
    /// Maximum rows of each table to print
    #[arg(short, long, default_value = "20")]
    rows: usize,
    /// Print the full dashboard view as JSON
    #[arg(long)]
    json: bool,
  },
  /// List the values each filter offers
  Options {
    /// Print the option lists as JSON
    #[arg(long)]
    json: bool,
  },
  /// Validate configuration and show where the dashboard reads from
  Check {
    /// Also read one row of each table
    #[arg(long)]
    connect: bool,
  },
}

async fn handle(command: Command, config: &Config) -> Result<()> {
  match command {
    Command::Snapshot { filters, rows, json } => commands::snapshot(config, filters.selection(), rows, json).await,
    Command::Options { json } => commands::options(config, json).await,
    Command::Check { connect } => commands::check(config, connect).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose { EnvFilter::new("propview=debug,warn") } else { EnvFilter::new("error") };
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  config::load_env_files();
  let config = Config::from_env()?;

  handle(cli.command, &config).await
}
