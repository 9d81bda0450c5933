use anyhow::Result;
use clap::{Parser, Subcommand};
use ops_cli::{commands, ApiClient};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "configra")]
#[command(about = "Validate, publish and roll back Configra configurations")]
#[command(version)]
struct Cli {
    /// Base URL of the Configra API
    #[arg(long, global = true, env = "CONFIGRA_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Project API key
    #[arg(long, global = true, env = "CONFIGRA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file against a schema file, locally
    Validate {
        #[arg(long, default_value = "schema.json")]
        schema: PathBuf,
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
    },
    /// Validate locally, then store a new version
    Push {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "schema.json")]
        schema: PathBuf,
        #[arg(long = "env")]
        env_id: i64,
        #[arg(long)]
        key: String,
    },
    /// Print the latest version of a key
    Fetch {
        #[arg(long = "env")]
        env_id: i64,
        #[arg(long)]
        key: String,
    },
    /// List every version of a key
    History {
        #[arg(long = "env")]
        env_id: i64,
        #[arg(long)]
        key: String,
    },
    /// Restore an earlier version as a new version
    Rollback {
        #[arg(long = "env")]
        env_id: i64,
        #[arg(long)]
        key: String,
        #[arg(long = "version")]
        target_version: i32,
    },
    /// Apply database migrations
    Migrate {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },
    /// Project administration
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// Register a project and issue its API key
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        owner_id: i64,
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = || ApiClient::new(&cli.api_url, cli.api_key.clone());

    match cli.command {
        Command::Validate { ref schema, ref config } => commands::validate(schema, config),
        Command::Push { ref file, ref schema, env_id, ref key } => {
            commands::push(&api()?, file, schema, env_id, key).await
        }
        Command::Fetch { env_id, ref key } => commands::fetch(&api()?, env_id, key).await,
        Command::History { env_id, ref key } => commands::history(&api()?, env_id, key).await,
        Command::Rollback { env_id, ref key, target_version } => {
            commands::rollback(&api()?, env_id, key, target_version).await
        }
        Command::Migrate { ref database_url } => commands::migrate(database_url).await,
        Command::Project {
            command: ProjectCommand::Create { ref name, owner_id, ref database_url },
        } => commands::create_project(database_url, name, owner_id).await,
    }
}
