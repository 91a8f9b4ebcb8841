//! CSV database CLI
//!
//! Serves the HTTP playground or runs single commands against a CSV directory.

use anyhow::Context;
use clap::{Parser, Subcommand};
use percolate_csvdb::otel::{init_logging, LogFormat};
use percolate_csvdb::query::SplitMode;
use percolate_csvdb::storage::LoadMode;
use percolate_csvdb::{server, Config, Database};
use std::io::Read;
use std::path::PathBuf;

/// CSV files as an embedded SQL database
#[derive(Parser)]
#[command(name = "csvdb")]
#[command(about = "Query and mutate a directory of CSV files with SQL", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, env = "P8_CSVDB_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the CSV files
    #[arg(long, env = "P8_CSVDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// SQLite cache file (default: <data-dir>/database.sqlite)
    #[arg(long, env = "P8_CSVDB_DATABASE")]
    database: Option<PathBuf>,

    /// Fresh in-memory engine per command instead of a SQLite file
    #[arg(long, env = "P8_CSVDB_IN_MEMORY")]
    in_memory: bool,

    /// How CSVs are loaded into existing tables
    #[arg(long, value_enum, env = "P8_CSVDB_LOAD_MODE")]
    load_mode: Option<LoadMode>,

    /// Statement splitting strategy
    #[arg(long, value_enum, env = "P8_CSVDB_SPLIT_MODE")]
    split_mode: Option<SplitMode>,

    /// Do not append caret excerpts to SQL errors
    #[arg(long)]
    no_annotate: bool,

    /// Log as JSON lines
    #[arg(long, env = "P8_CSVDB_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind
        #[arg(long, env = "P8_CSVDB_HOST")]
        host: Option<String>,

        /// Port to bind
        #[arg(long, env = "P8_CSVDB_PORT")]
        port: Option<u16>,
    },

    /// Run one command (plain SQL or {"command": ...})
    Run {
        /// Command text (or use --stdin)
        sql: Option<String>,

        /// Read the command from stdin
        #[arg(long)]
        stdin: bool,

        /// Print {sql, output} as JSON
        #[arg(long)]
        json: bool,
    },

    /// List CSV files and their tables
    Tables,

    /// Delete every CSV and the SQLite file
    Reset,
}

impl Cli {
    /// Defaults, then the config file, then flags and environment.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
                Config::load(&path)?
            }
            None => Config::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if self.in_memory {
            config.in_memory = true;
        }
        if let Some(mode) = self.load_mode {
            config.load_mode = mode;
        }
        if let Some(mode) = self.split_mode {
            config.split_mode = mode;
        }
        if self.no_annotate {
            config.annotate_errors = false;
        }
        if let Commands::Serve { host, port } = &self.command {
            if let Some(host) = host {
                config.host = host.clone();
            }
            if let Some(port) = port {
                config.port = *port;
            }
        }

        Ok(config.expand_paths())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LogFormat::from_flag(cli.log_json))?;

    let config = cli.config()?;
    let db = Database::open(config).context("Failed to open CSV database")?;

    match cli.command {
        Commands::Serve { .. } => {
            server::serve(db).await?;
        }
        Commands::Run { sql, stdin, json } => {
            let raw = read_command(sql, stdin)?;
            cmd_run(&db, &raw, json)?;
        }
        Commands::Tables => {
            cmd_tables(&db)?;
        }
        Commands::Reset => {
            db.reset()?;
            println!("✓ Reset {}", db.data_dir().display());
        }
    }

    Ok(())
}

fn read_command(sql: Option<String>, stdin: bool) -> anyhow::Result<String> {
    match (sql, stdin) {
        (Some(sql), false) => Ok(sql),
        (None, true) => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read command from stdin")?;
            Ok(raw)
        }
        (Some(_), true) => anyhow::bail!("Pass the command as an argument or with --stdin, not both"),
        (None, false) => anyhow::bail!("Either provide a command or use --stdin"),
    }
}

fn cmd_run(db: &Database, raw: &str, json: bool) -> anyhow::Result<()> {
    let outcome = db.run(raw)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.sql.trim_end());
        println!();
        println!("{}", outcome.output);
    }

    if outcome.output.starts_with("ERROR:") {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_tables(db: &Database) -> anyhow::Result<()> {
    let tables = db.tables()?;
    if tables.is_empty() {
        println!("No CSV files in {}", db.data_dir().display());
        return Ok(());
    }
    for table in tables {
        println!("{:<32} → {}", table.file, table.table);
    }
    Ok(())
}
