//! tablesync CLI - keep database tables in line with their XML definitions.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tablesync::{Config, Database, DatabaseUpdater, SyncError};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "tablesync")]
#[command(about = "Synchronize MySQL/PostgreSQL tables with XML definitions")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or alter tables until they match their definitions
    Ensure {
        /// Tables to synchronize
        tables: Vec<String>,

        /// Synchronize every table that has a definition
        #[arg(long, conflicts_with = "tables")]
        all: bool,
    },

    /// Print the DDL `ensure` would run, without running it
    Plan {
        /// Tables to plan
        tables: Vec<String>,

        /// Plan every table that has a definition
        #[arg(long, conflicts_with = "tables")]
        all: bool,
    },

    /// Drop a table if it exists
    Drop {
        /// Table to drop
        table: String,
    },

    /// List tables
    Tables {
        /// List tables with a definition file instead of live tables
        #[arg(long)]
        defined: bool,
    },

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Returns `Ok(false)` when every step ran but at least one statement batch failed.
async fn run() -> Result<bool, SyncError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?.with_env_overrides()?;
    info!("Loaded configuration from {:?}", cli.config);

    let updater = DatabaseUpdater::from_config(&config.schema);
    let mut db = Database::new(&config.database)?;

    let outcome = match cli.command {
        Commands::Ensure { tables, all } => {
            let tables = select_tables(&updater, tables, all)?;
            let mut results = Vec::with_capacity(tables.len());
            for table in &tables {
                let ok = updater.ensure(&mut db, table).await?;
                if !cli.output_json {
                    println!("  {} {}", if ok { "OK    " } else { "FAILED" }, table);
                }
                results.push(json!({ "table": table, "success": ok }));
            }
            let failed = results.iter().filter(|r| r["success"] == false).count();
            if cli.output_json {
                println!("{:#}", json!({ "tables": results, "failed": failed }));
            } else {
                println!("\n{} table(s) checked, {} failed", tables.len(), failed);
            }
            failed == 0
        }

        Commands::Plan { tables, all } => {
            let tables = select_tables(&updater, tables, all)?;
            let mut plans = serde_json::Map::new();
            for table in &tables {
                let statements = updater.plan(&mut db, table).await?;
                if !cli.output_json {
                    if statements.is_empty() {
                        println!("-- {}: up to date", table);
                    } else {
                        println!("-- {}", table);
                        for statement in &statements {
                            println!("{}", statement);
                        }
                    }
                }
                plans.insert(table.clone(), json!(statements));
            }
            if cli.output_json {
                println!("{:#}", serde_json::Value::Object(plans));
            }
            true
        }

        Commands::Drop { table } => {
            let ok = updater.drop_table(&mut db, &table).await?;
            if cli.output_json {
                println!("{:#}", json!({ "table": table, "dropped": ok }));
            } else if ok {
                println!("Dropped {}", table);
            } else {
                println!("Could not drop {}", table);
            }
            ok
        }

        Commands::Tables { defined } => {
            let tables = if defined {
                updater.reader().available_tables()?
            } else {
                db.get_tables().await?
            };
            if cli.output_json {
                println!("{:#}", json!(tables));
            } else {
                for table in &tables {
                    println!("{}", table);
                }
            }
            true
        }

        Commands::HealthCheck => {
            let start = Instant::now();
            db.connect().await?;
            let version = db.version().await?;
            let latency_ms = start.elapsed().as_millis() as u64;

            if cli.output_json {
                println!(
                    "{:#}",
                    json!({
                        "healthy": true,
                        "dialect": tablesync::Dialect::name(db.dialect()),
                        "version": version,
                        "latency_ms": latency_ms,
                    })
                );
            } else {
                println!("Health Check Results:");
                println!("  Server: {} ({}ms)", version, latency_ms);
                println!("  Overall: HEALTHY");
            }
            true
        }
    };

    db.close().await;
    Ok(outcome)
}

fn select_tables(
    updater: &DatabaseUpdater,
    tables: Vec<String>,
    all: bool,
) -> Result<Vec<String>, SyncError> {
    if all {
        return updater.reader().available_tables();
    }
    if tables.is_empty() {
        return Err(SyncError::Config(
            "no tables given (pass table names or --all)".to_string(),
        ));
    }
    Ok(tables)
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json stays machine readable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
