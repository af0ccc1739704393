use brain_server::{config::ServerConfig, server::run_server, telemetry::init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    init_logging(config.log_json)?;

    run_server(config).await
}
