use commerce_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(None, config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "commerce server starting"
    );

    // 2. Open the database, wire the gateway, serve
    let server = Server::new(config).await?;
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
