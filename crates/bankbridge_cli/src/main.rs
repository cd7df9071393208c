use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bankbridge_adapters::BankAdapter;
use bankbridge_contract::{ApplicationEnvelope, ApplicationRecord, ApplicationType};
use bankbridge_manager::{AdapterManager, ManagerConfig};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "config/bankbridge.toml";

#[derive(Debug, Parser)]
#[command(author, version, about = "Dispatch credit and guarantee applications to partner banks")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Descriptors of every active bank.
    Summary,
    /// Active banks accepting the given application type.
    Supported {
        #[arg(long = "type")]
        application_type: String,
    },
    Available {
        bank_id: String,
    },
    /// Submit an application; without --bank it goes to every active bank.
    Send {
        #[arg(long)]
        application: PathBuf,
        #[arg(long = "bank")]
        banks: Vec<String>,
    },
    Status {
        application_id: String,
        #[arg(long)]
        bank: String,
    },
    /// Show the payload a bank would receive, without sending it.
    Preview {
        #[arg(long)]
        application: PathBuf,
        #[arg(long)]
        bank: String,
    },
}

/// Application files hold either a ready envelope or a stored record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApplicationFile {
    Envelope(ApplicationEnvelope),
    Record(ApplicationRecord),
}

impl From<ApplicationFile> for ApplicationEnvelope {
    fn from(file: ApplicationFile) -> Self {
        match file {
            ApplicationFile::Envelope(envelope) => envelope,
            ApplicationFile::Record(record) => record.into(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let manager = AdapterManager::from_config(&config);

    match cli.command {
        Command::Summary => {
            let banks = manager.summarize();
            print_json(&json!({ "total": banks.len(), "banks": banks }))
        }
        Command::Supported { application_type } => {
            let application_type = ApplicationType::from(application_type);
            print_json(&manager.supported_for(&application_type))
        }
        Command::Available { bank_id } => {
            let available = manager.is_available(&bank_id);
            print_json(&json!({ "bank_id": bank_id, "available": available }))
        }
        Command::Send { application, banks } => {
            let envelope = read_application(&application)?;
            info!(application_id = %envelope.id, banks = ?banks, "dispatching application");
            let responses = manager.dispatch(&envelope, &banks).await;
            let accepted = responses.iter().filter(|r| r.success).count();
            if accepted == 0 {
                warn!(application_id = %envelope.id, "no bank accepted the application");
            }
            print_json(&responses)
        }
        Command::Status {
            application_id,
            bank,
        } => {
            let status = manager
                .application_status(&application_id, &bank)
                .await
                .with_context(|| format!("status query for {application_id} at {bank} failed"))?;
            print_json(&status)
        }
        Command::Preview { application, bank } => {
            let envelope = read_application(&application)?;
            let adapter = manager.get(&bank)?;
            print_json(&preview(adapter.as_ref(), &envelope)?)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ManagerConfig> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG), false),
    };
    if !explicit && !path.exists() {
        info!(path = %path.display(), "config file not found, using built-in defaults");
        return Ok(ManagerConfig::default());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    ManagerConfig::from_toml_str(&source)
        .with_context(|| format!("invalid config at {}", path.display()))
}

fn read_application(path: &Path) -> Result<ApplicationEnvelope> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read application file {}", path.display()))?;
    let file: ApplicationFile = serde_json::from_str(&source)
        .with_context(|| format!("invalid application JSON at {}", path.display()))?;
    Ok(file.into())
}

#[derive(Debug, Serialize)]
struct Preview {
    bank_id: String,
    payload: serde_json::Value,
    encoded_bytes: usize,
}

fn preview(adapter: &dyn BankAdapter, envelope: &ApplicationEnvelope) -> Result<Preview> {
    let encoded = adapter
        .encode_wire(envelope)
        .context("failed to encode provider payload")?;
    Ok(Preview {
        bank_id: adapter.bank_info().id.clone(),
        payload: adapter.transform(envelope),
        encoded_bytes: encoded.len(),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
