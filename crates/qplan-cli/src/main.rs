//! QPlan Binary

use clap::Parser;
use qplan_catalog::{CatalogProvider, InMemoryCatalog};
use qplan_common::OptimizerConfig;
use qplan_planner::{annotate, explain, Optimizer};
use qplan_sql::SqlPlanner;
use std::path::PathBuf;
use std::sync::Arc;

/// QPlan CLI
#[derive(Parser, Debug)]
#[command(name = "qplan")]
#[command(version = "0.1.0")]
#[command(about = "Estimate and optimise relational query plans")]
struct Args {
    /// Catalogue file (TOML)
    #[arg(long)]
    catalog: PathBuf,

    /// SQL query text
    #[arg(long, conflicts_with = "query_file", required_unless_present = "query_file")]
    query: Option<String>,

    /// File containing the SQL query
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Optimizer config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only print the canonical plan
    #[arg(long)]
    no_optimise: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => OptimizerConfig::load_from_file(path)?,
        None => OptimizerConfig::default(),
    };

    let catalog = InMemoryCatalog::load_from_file(&args.catalog)?;
    tracing::info!("Registered tables: {}", catalog.tables().join(", "));
    let catalog: Arc<dyn CatalogProvider> = Arc::new(catalog);

    let sql = match (args.query, &args.query_file) {
        (Some(sql), _) => sql,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => anyhow::bail!("one of --query or --query-file is required"),
    };

    let canonical = SqlPlanner::new(catalog).plan(&sql)?;
    println!("-- canonical --");
    print!("{}", explain(&annotate(&canonical)?));

    if args.no_optimise {
        return Ok(());
    }

    let optimized = Optimizer::with_config(config).optimize(&canonical)?;
    println!("-- optimised --");
    print!("{}", explain(&annotate(&optimized)?));

    Ok(())
}
