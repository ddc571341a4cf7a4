/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Sign-in and account query results on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use fused_auth::{AuthSession, FileCredentialStore, FusedClient, Identity};
use fused_auth_cli::{CliConfig, Command, Settings, TimeClaim, run};

#[derive(Parser, Debug)]
#[command(name = "fused-auth-cli", version, about = "Magic-link sign-in and wallet queries")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    log_level: String,
    #[command(flatten)]
    subject: SubjectArgs,
    #[arg(long = "app-id", value_name = "ID")]
    app_id: Option<String>,
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,
    #[arg(long = "store-dir", value_name = "DIR")]
    store_dir: Option<PathBuf>,
    #[arg(long = "key-prefix", value_name = "PREFIX")]
    key_prefix: Option<String>,
    #[arg(long = "time-claim", value_enum)]
    time_claim: Option<TimeClaim>,
    #[arg(long = "login-timeout", value_name = "SECS")]
    login_timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SubjectArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    uuid: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let settings = load_settings(&args)?;
    debug!(
        base_url = %settings.client.base_url,
        store_dir = %settings.store_dir.display(),
        "configuration resolved"
    );

    let identity = match (&args.subject.email, &args.subject.uuid) {
        (Some(email), _) => Identity::email(email.clone(), settings.app_id.clone()),
        (None, Some(uuid)) => Identity::uuid(uuid.clone(), settings.app_id.clone()),
        (None, None) => return Err(anyhow!("either --email or --uuid is required")),
    };

    let client = FusedClient::with_config(settings.client.clone()).context("build http client")?;
    let store = Arc::new(FileCredentialStore::new(&settings.store_dir));
    let mut session = AuthSession::builder(identity, store)
        .client(client)
        .key_prefix(settings.key_prefix.clone())
        .validator(settings.validator.clone())
        .signature_policy(settings.signature_policy.clone())
        .build()
        .context("build session")?;

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    run(args.command, &mut session, shutdown).await
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("initialize tracing subscriber: {err}"))?;
    Ok(())
}

fn load_settings(args: &Cli) -> Result<Settings> {
    let file = match &args.config_path {
        Some(path) => CliConfig::from_file(path).context("load config")?,
        None => CliConfig::default(),
    };
    let flags = CliConfig {
        base_url: args.base_url.clone(),
        app_id: args.app_id.clone(),
        store_dir: args.store_dir.clone(),
        key_prefix: args.key_prefix.clone(),
        time_claim: args.time_claim,
        login_timeout_secs: args.login_timeout_secs,
        hs256_secret: std::env::var("FUSED_AUTH_HS256_SECRET").ok(),
    };
    file.merge(flags).resolve()
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
