use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use payroll_extract::api::{AppState, create_router};
use payroll_extract::config::{ConfigLoader, EngineConfig};
use payroll_extract::error::EngineResult;
use payroll_extract::extraction::PayrollExtractor;
use payroll_extract::models::{EmployeeDirectory, InMemoryEmployeeDirectory};
use payroll_extract::template::{InMemoryTemplateStore, SqliteTemplateStore, TemplateStore};

#[derive(Parser)]
#[command(name = "payroll-extract")]
#[command(about = "Extracts payroll records from factory statement workbooks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a workbook and print the report as JSON
    Parse {
        /// Path to the workbook (xlsx, xlsm, xls, xlsb, ods)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// Directory containing engine.yaml
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Employee master YAML file
    #[arg(long, value_name = "FILE")]
    employees: Option<PathBuf>,

    /// SQLite template database (templates live in memory when omitted)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,
}

struct Engine {
    config: EngineConfig,
    templates: Arc<dyn TemplateStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

impl EngineArgs {
    fn build(&self) -> EngineResult<Engine> {
        let config = match &self.config {
            Some(dir) => ConfigLoader::load(dir)?.into_config(),
            None => EngineConfig::default(),
        };
        let templates: Arc<dyn TemplateStore> = match &self.db {
            Some(path) => Arc::new(SqliteTemplateStore::open(path)?),
            None => Arc::new(InMemoryTemplateStore::new()),
        };
        let directory: Arc<dyn EmployeeDirectory> = match &self.employees {
            Some(path) => Arc::new(InMemoryEmployeeDirectory::load_yaml(path)?),
            None => Arc::new(InMemoryEmployeeDirectory::new()),
        };
        Ok(Engine {
            config,
            templates,
            directory,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so `parse` output stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Parse { file, engine } => {
            let engine = engine.build()?;
            let extractor = PayrollExtractor::new(engine.config, engine.templates, engine.directory);
            let report = extractor.parse_path(&file)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve { bind, engine } => {
            let engine = engine.build()?;
            let state = AppState::new(engine.config, engine.templates, engine.directory);
            let app = create_router(state);

            tracing::info!("Listening on {}", bind);
            let listener = tokio::net::TcpListener::bind(&bind).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
