//! modelgen CLI
//!
//! Usage:
//!   modelgen                      # generate models from migrations
//!   modelgen -d                   # generate models from the live database
//!   modelgen inspect -m db/sql    # print the settled schema as JSON

use std::error::Error as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use modelgen::{
    config, generate, CatalogSource, GenerationReport, MigrationSource, ModelgenError, Overrides,
    SchemaSource, Settings,
};

#[derive(Parser)]
#[command(name = "modelgen")]
#[command(author, version, about = "Generate typed Rust models from SQL migrations or a live database")]
struct Cli {
    /// Env file to load before reading the environment (may set RUST_LOG)
    #[arg(short, long, global = true, value_name = "FILE")]
    env: Option<PathBuf>,

    /// TOML settings file (defaults to ./modelgen.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the model files are written to
    #[arg(short, long, global = true, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Directory holding <version>_<name>.up.sql files
    #[arg(short, long, global = true, value_name = "DIR")]
    migrations: Option<PathBuf>,

    /// Read the schema from the database catalog instead of migrations
    #[arg(short = 'd', long, global = true)]
    from_db: bool,

    /// Postgres connection string
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,

    /// Database schema to introspect
    #[arg(long, global = true, value_name = "NAME")]
    db_schema: Option<String>,

    /// Catalog query timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Write one model file per table (default)
    Generate,
    /// Print the settled schema as JSON
    Inspect,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            env_file: self.env.clone(),
            config_file: self.config.clone(),
            output_dir: self.output.clone(),
            migrations_dir: self.migrations.clone(),
            from_db: self.from_db,
            database_url: self.database_url.clone(),
            db_schema: self.db_schema.clone(),
            query_timeout_secs: self.timeout,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("modelgen=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modelgen=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_file = config::load_env_file(cli.env.as_deref());
    init_tracing(cli.verbose);
    env_file.log();

    let command = cli.command.unwrap_or(Commands::Generate);
    let overrides = cli.overrides();

    tokio::select! {
        result = run(command, overrides) => result,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    }
}

async fn run(command: Commands, overrides: Overrides) -> Result<()> {
    let settings = Settings::from_environment(&overrides).context("failed to load settings")?;

    if settings.from_db {
        let url = settings
            .database_url
            .clone()
            .ok_or(ModelgenError::MissingDatabaseUrl)?;
        let source = CatalogSource::new(url, settings.db_schema.clone(), settings.query_timeout);
        execute(command, &source, &settings).await
    } else {
        let source = MigrationSource::new(settings.migrations_dir.clone());
        execute(command, &source, &settings).await
    }
}

async fn execute<S: SchemaSource>(command: Commands, source: &S, settings: &Settings) -> Result<()> {
    match command {
        Commands::Generate => {
            println!("{} Generating models from {}", "→".cyan(), source.label().cyan());
            let report = generate(source, &settings.output_dir).await?;
            print_report(&report, &settings.output_dir);
        }
        Commands::Inspect => {
            let tables = source.load_tables().await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
    }
    Ok(())
}

fn print_report(report: &GenerationReport, output_dir: &Path) {
    for path in &report.written {
        println!("  {} {}", "✓".green(), path.display());
    }
    for path in &report.unchanged {
        println!("  {} {} {}", "·".dimmed(), path.display(), "(unchanged)".dimmed());
    }
    for (table, err) in &report.failed {
        match err.source() {
            Some(cause) => println!("  {} {}: {}: {}", "✗".red(), table.yellow(), err, cause),
            None => println!("  {} {}: {}", "✗".red(), table.yellow(), err),
        }
    }

    let summary = format!(
        "{} written, {} unchanged, {} failed",
        report.written.len(),
        report.unchanged.len(),
        report.failed.len()
    );
    if report.is_clean() {
        println!("\n{} {} in {}", "✓".green().bold(), summary, output_dir.display());
    } else {
        println!("\n{} {} in {}", "!".yellow().bold(), summary, output_dir.display());
    }
}
