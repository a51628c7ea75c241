//! Escalation producer server.
//!
//! Every option can also be set through the environment variable named in
//! its help text.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use iam_escalation::auth::authenticator::DEFAULT_VALIDATION_URL;
use iam_escalation::auth::claims::DEFAULT_ALLOWED_PREFIX;
use iam_escalation::auth::{PathPrefixVerifier, ValidationServiceAuthenticator, ValidationServiceConfig};
use iam_escalation::policy::resource_manager::DEFAULT_BASE_URL;
use iam_escalation::policy::{ResourceManagerClient, ResourceManagerConfig, TokenSource};
use iam_escalation::{Backoff, Producer, ProducerConfig, RetryPolicy};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "iam-escalation-webhook")]
#[command(version, about, long_about = None)]
struct Args {
    /// Gateway access ID allowed to call this producer
    #[arg(long, env = "AKEYLESS_ACCESS_ID")]
    access_id: String,

    /// Producer item name the validation service should also check
    #[arg(long, env = "AKEYLESS_ITEM_NAME")]
    item_name: Option<String>,

    /// Items outside this path prefix may not request escalation
    #[arg(long, env = "ESCALATION_ALLOWED_PATH_PREFIX", default_value = DEFAULT_ALLOWED_PREFIX)]
    allowed_path_prefix: String,

    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Credential validation endpoint
    #[arg(long, env = "AKEYLESS_VALIDATION_URL", default_value = DEFAULT_VALIDATION_URL)]
    validation_url: String,

    /// Cloud Resource Manager API root
    #[arg(long, env = "RESOURCE_MANAGER_URL", default_value = DEFAULT_BASE_URL)]
    resource_manager_url: String,

    /// Static bearer token for the control plane (default: metadata server)
    #[arg(long, env = "GCP_ACCESS_TOKEN", hide_env_values = true)]
    gcp_access_token: Option<String>,

    /// Attempts per principal on revoke
    #[arg(long, env = "REVOKE_MAX_ATTEMPTS", default_value_t = 3)]
    revoke_max_attempts: u32,

    /// Seconds to wait between revoke attempts
    #[arg(long, env = "REVOKE_BACKOFF_SECS", default_value_t = 3)]
    revoke_backoff_secs: u64,

    /// Timeout for each control plane and validation call, in seconds
    #[arg(long, env = "POLICY_TIMEOUT_SECS", default_value_t = 10)]
    policy_timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let timeout = Duration::from_secs(args.policy_timeout_secs);

    let token = match args.gcp_access_token {
        Some(token) => TokenSource::Static(token),
        None => TokenSource::metadata_server(),
    };
    let policies = ResourceManagerClient::new(
        ResourceManagerConfig::default()
            .with_base_url(args.resource_manager_url)
            .with_timeout(timeout)
            .with_token(token),
    )
    .context("failed to build resource manager client")?;

    let authenticator = ValidationServiceAuthenticator::new(ValidationServiceConfig {
        url: args.validation_url,
        timeout,
    })
    .context("failed to build validation client")?;

    let verifier = PathPrefixVerifier::new(args.allowed_path_prefix);

    let mut config = ProducerConfig::new(args.access_id).with_revoke_retry(RetryPolicy::new(
        args.revoke_max_attempts,
        Backoff::Fixed(Duration::from_secs(args.revoke_backoff_secs)),
    ));
    if let Some(item_name) = args.item_name {
        config = config.with_allowed_item_name(item_name);
    }

    info!(
        access_id = %config.allowed_access_id,
        prefix = verifier.prefix(),
        "producer configured"
    );

    let producer = Producer::new(policies, authenticator, verifier, config);
    let app = iam_escalation_webhook::router(Arc::new(producer));

    let listener = TcpListener::bind(args.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", args.listen_addr))?;
    info!(addr = %args.listen_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failure")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
