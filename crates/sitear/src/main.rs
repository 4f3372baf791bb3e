//! sitear CLI
//!
//! Administrative front end for site archive databases.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sitear::bootstrap::{self, resolve};
use sitear::{BootstrapError, SiteType};
use sitear_db::prelude::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Site archival tool.
#[derive(Parser)]
#[command(name = "sitear")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database.
    #[arg(short, long, env = "SITEAR_DB", default_value = "data.db")]
    db: PathBuf,

    /// Site customization type (default: auction for new databases).
    #[arg(short, long, value_enum)]
    site_type: Option<SiteType>,

    /// Enforce foreign keys.
    #[arg(long)]
    foreign_keys: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or migrate the database.
    Migrate {
        /// Target version (latest if not specified).
        #[arg(short, long)]
        to: Option<u16>,
    },

    /// Show the stored schema and pending migrations.
    Status,

    /// List tables.
    Tables,

    /// Print CREATE statements.
    Schema,

    /// Print every row of a table.
    Dump {
        /// Table name.
        table: String,

        /// One JSON object per line.
        #[arg(long)]
        json: bool,
    },

    /// Search one column of a table.
    Search {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// Column name.
        #[arg(short, long)]
        column: String,

        /// Terms that must all match.
        #[arg(long, default_value = "")]
        all: String,

        /// Terms of which one must match.
        #[arg(long, default_value = "")]
        any: String,

        /// Terms that must not match.
        #[arg(long, default_value = "")]
        not: String,

        /// Match case.
        #[arg(long)]
        case_sensitive: bool,

        /// One JSON object per line.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = DriverConfig {
        foreign_keys: cli.foreign_keys,
        ..DriverConfig::default()
    };

    match cli.command {
        Commands::Migrate { to } => {
            let session = bootstrap::open(&cli.db, cli.site_type, &config, to)?;
            let report = &session.report;
            match report.direction {
                None => info!(version = report.to, "Database is up to date"),
                Some(direction) => info!(
                    from = report.from,
                    to = report.to,
                    %direction,
                    steps = report.steps.len(),
                    "Migrated database"
                ),
            }
        }

        Commands::Status => status(&cli.db, cli.site_type, &config)?,

        Commands::Tables => {
            let driver = open_driver(&cli.db, &config)?;
            for table in driver.tables()? {
                println!("{table}");
            }
        }

        Commands::Schema => {
            let driver = open_driver(&cli.db, &config)?;
            for sql in driver.schema_sql()? {
                println!("{sql};");
            }
        }

        Commands::Dump { table, json } => {
            let session = bootstrap::open_existing(&cli.db, cli.site_type, &config)?;
            let cursor = session.driver.select_where(&table, None, &[])?;
            print_rows(cursor, json)?;
        }

        Commands::Search {
            table,
            column,
            all,
            any,
            not,
            case_sensitive,
            json,
        } => {
            let session = bootstrap::open_existing(&cli.db, cli.site_type, &config)?;
            let terms = SearchTerms::parse(&all, &any, &not)?;
            let search = build_search(
                session.driver.catalog(),
                &table,
                &column,
                &terms,
                case_sensitive,
            )?;
            print_rows(search.cursor(&session.driver)?, json)?;
        }
    }

    Ok(())
}

fn open_driver(path: &Path, config: &DriverConfig) -> anyhow::Result<Driver> {
    if !path.is_file() {
        return Err(BootstrapError::NotFound(path.to_path_buf()).into());
    }
    Ok(Driver::open_with(
        path,
        &DriverConfig {
            create_if_missing: false,
            ..*config
        },
    )?)
}

fn status(path: &Path, requested: Option<SiteType>, config: &DriverConfig) -> anyhow::Result<()> {
    let driver = open_driver(path, config)?;
    let slot = driver.version_slot()?;
    let resolution = resolve(requested, Some(slot))?;
    let Some(migrations) = resolution.site_type.migrations() else {
        anyhow::bail!("site type {} has no schema", resolution.site_type);
    };
    let manager = MigrationManager::new(u32::from(slot.schema_id), migrations)?;
    let status = manager.status(&driver)?;

    println!("site type: {}", resolution.site_type);
    println!("schema id: {}", status.slot.schema_id);
    println!("version:   {} (latest {})", status.slot.version, status.latest);
    if status.is_current() {
        println!("pending:   none");
    } else {
        let pending: Vec<String> = status.pending.iter().map(u16::to_string).collect();
        println!("pending:   {}", pending.join(", "));
    }
    Ok(())
}

fn print_rows(mut cursor: Cursor<'_>, json: bool) -> anyhow::Result<()> {
    let mut count = 0usize;
    for row in cursor.records()? {
        let row = row?;
        if json {
            println!("{}", serde_json::to_string(&row)?);
        } else {
            println!("{row}");
        }
        count += 1;
    }
    info!(rows = count, "Done");
    Ok(())
}
