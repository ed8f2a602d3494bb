use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;
use std::time::Duration;

const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";
const DEFAULT_INVOCATION_DEADLINE_SECS: u64 = 60;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub project_id: String,
    pub topic_id: String,
    pub pubsub_endpoint: String,
    pub auth_token: Option<String>,
    pub invocation_deadline_secs: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Storage-event to Pub/Sub metadata relay")]
pub struct Args {
    /// Host to bind to (overrides RELAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides RELAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Backend project identifier (overrides PROJECT_ID)
    #[arg(long)]
    pub project_id: Option<String>,

    /// Destination topic identifier (overrides TOPIC_ID)
    #[arg(long)]
    pub topic_id: Option<String>,

    /// Pub/Sub endpoint, e.g. an emulator address (overrides PUBSUB_ENDPOINT)
    #[arg(long)]
    pub pubsub_endpoint: Option<String>,

    /// Per-invocation deadline in seconds (overrides RELAY_INVOCATION_DEADLINE_SECS)
    #[arg(long)]
    pub invocation_deadline_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    ///
    /// `PROJECT_ID` and `TOPIC_ID` are required; missing either one is a
    /// configuration error and the process must not start.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::merge(args)
    }

    fn merge(args: Args) -> Result<Self> {
        let env_host = env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("RELAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing RELAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading RELAY_PORT"),
        };
        let env_deadline = match env::var("RELAY_INVOCATION_DEADLINE_SECS") {
            Ok(value) => Some(value.parse::<u64>().with_context(|| {
                format!("parsing RELAY_INVOCATION_DEADLINE_SECS value `{}`", value)
            })?),
            Err(_) => None,
        };

        let project_id = args.project_id.or_else(|| env::var("PROJECT_ID").ok());
        let topic_id = args.topic_id.or_else(|| env::var("TOPIC_ID").ok());
        let (project_id, topic_id) = match (project_id, topic_id) {
            (Some(p), Some(t)) if !p.is_empty() && !t.is_empty() => (p, t),
            _ => bail!("required configuration not set: PROJECT_ID and/or TOPIC_ID"),
        };

        let pubsub_endpoint = args
            .pubsub_endpoint
            .or_else(|| env::var("PUBSUB_ENDPOINT").ok())
            .unwrap_or_else(|| DEFAULT_PUBSUB_ENDPOINT.into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            project_id,
            topic_id,
            pubsub_endpoint,
            auth_token: env::var("PUBSUB_AUTH_TOKEN").ok(),
            invocation_deadline_secs: args
                .invocation_deadline_secs
                .or(env_deadline)
                .unwrap_or(DEFAULT_INVOCATION_DEADLINE_SECS),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn invocation_deadline(&self) -> Duration {
        Duration::from_secs(self.invocation_deadline_secs)
    }
}
