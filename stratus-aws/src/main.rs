use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stratus_aws::iam::GroupOps;
use stratus_aws::local::LocalCloud;
use stratus_aws::s3::BucketOps;
use stratus_provider::adapter::ProviderRegistry;
use stratus_provider::retry::RetryPolicy;
use stratus_provider::rpc::{AppState, create_router};

#[derive(Parser)]
#[command(name = "stratus-aws")]
#[command(about = "stratus AWS resource provider daemon")]
struct Args {
    /// HTTP listen address
    #[arg(short, long, default_value = "[::1]:7080")]
    listen: String,

    /// Emulated cloud propagation delay in milliseconds
    #[arg(long, default_value_t = 200)]
    propagation_delay_ms: u64,

    /// Delay between convergence poll attempts in milliseconds
    #[arg(long, default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Maximum convergence poll attempts
    #[arg(long, default_value_t = 60)]
    poll_attempts: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stratus=info".parse()?))
        .init();

    let args = Args::parse();

    // Until real SDK wiring lands, the daemon serves the in-process
    // emulator so deployments can be exercised end to end.
    let cloud = Arc::new(LocalCloud::with_propagation_delay(Duration::from_millis(
        args.propagation_delay_ms,
    )));
    let retry = RetryPolicy::new(
        Duration::from_millis(args.poll_interval_ms),
        args.poll_attempts,
    );

    let mut registry = ProviderRegistry::new();
    registry.register(BucketOps::with_retry(cloud.clone(), retry));
    registry.register(GroupOps::with_retry(cloud.clone(), retry));
    info!(
        kinds = ?registry.tokens(),
        propagation_delay_ms = args.propagation_delay_ms,
        "registered resource providers"
    );

    let state = Arc::new(AppState { registry });
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(addr = %args.listen, "starting provider RPC server");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
    info!("shutting down");
}
