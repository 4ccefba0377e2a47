//! Build automation tasks for the DWH pipeline
//!
//! - Rendering the statement catalog to reviewable SQL scripts

use anyhow::Context;
use clap::Parser;
use dwh_common::Phase;
use dwh_etl::catalog::{Catalog, Dialect, Statement};
use dwh_etl::Config;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for the DWH pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Render every catalog phase to a SQL script plus a JSON manifest
    Sql {
        /// Output directory for the generated scripts
        #[arg(short, long, default_value = "target/sql")]
        output_dir: PathBuf,

        /// Dialect the create phase is rendered for (redshift or postgres)
        #[arg(short, long, default_value = "redshift")]
        dialect: String,

        /// Config file supplying the COPY parameters
        #[arg(short, long, default_value = "dwh.cfg.example")]
        config: PathBuf,
    },
}

#[derive(Serialize)]
struct Manifest<'a> {
    dialect: Dialect,
    scripts: Vec<String>,
    statements: &'a [Statement],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Sql { output_dir, dialect, config } => render_sql(&output_dir, &dialect, &config)?,
    }

    Ok(())
}

fn render_sql(output_dir: &Path, dialect: &str, config_path: &Path) -> anyhow::Result<()> {
    println!("Rendering statement catalog...");

    let dialect: Dialect = dialect.parse()?;
    let config = Config::from_file(config_path)?;
    let catalog = Catalog::with_dialect(&config, dialect);
    catalog.validate()?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut scripts = Vec::with_capacity(Phase::ALL.len());
    for (i, phase) in Phase::ALL.iter().enumerate() {
        let name = format!("{:02}_{}.sql", i + 1, phase);
        let path = output_dir.join(&name);
        fs::write(&path, catalog.render(*phase))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  {}", path.display());
        scripts.push(name);
    }

    let manifest = Manifest { dialect, scripts, statements: catalog.statements() };
    let path = output_dir.join("catalog.json");
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  {}", path.display());

    println!("✓ {} statements rendered for {:?}", catalog.statements().len(), dialect);

    Ok(())
}
