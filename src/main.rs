use croptrace::{api::Server, config::Config, store};
use tracing::info;

/// The main entry point for the tracker service.
///
/// Initializes logging, loads the application configuration, opens the
/// database and runs the schema migration, then starts the API server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging using tracing_subscriber.
    tracing_subscriber::fmt::init();

    // Load the application configuration from the specified TOML file.
    let config = Config::load("config/default.toml")?;
    info!("Tracker starting with config: {:?}", config);

    // Open the connection pool and bring the schema up to date before
    // accepting any request.
    let pool = store::connect(&config.database.url).await?;
    store::migrate(&pool).await?;
    let batch_store = store::BatchStore::new(pool);
    info!("Database ready at {}", config.database.url);

    // Start the API server. This binds to the configured address and
    // serves requests until shutdown.
    let server = Server::new(config, batch_store);
    server.start().await?;

    Ok(())
}
