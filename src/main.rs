use clap::Parser;
use filestash_oidc_bridge::cli::Cli;
use filestash_oidc_bridge::config::BridgeConfig;
use filestash_oidc_bridge::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // A missing .env is fine, a broken one is not
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        eprintln!("Failed to load .env: {}", err);
        return Err(err.into());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filestash_oidc_bridge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::try_from(cli).inspect_err(|err| {
        tracing::error!(error = %err, "Invalid configuration");
    })?;

    let server = Server::new(config);
    server.run().await.map_err(|err| {
        eprintln!("Server error: {}", err);
        err.into()
    })
}
