use anyhow::Result;
use slug_resolver::{config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slug_resolver=info".parse()?),
        )
        .init();

    info!("Starting slug resolver");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    // Connect the store and wire up the pipeline
    let resolver = config.build_resolver().await?;

    server::serve(resolver, config.port).await?;

    info!("Slug resolver stopped");
    Ok(())
}
