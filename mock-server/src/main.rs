use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let defaults = MockConfig::default();
    let config = MockConfig {
        username: std::env::var("SPIRE_USER").unwrap_or(defaults.username),
        password: std::env::var("SPIRE_PASSWORD").unwrap_or(defaults.password),
        inventory_items: std::env::var("SEED_ITEMS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.inventory_items),
        max_limit: defaults.max_limit,
    };

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, inventory_items = config.inventory_items, "mock backend listening");
    mock_server::run(listener, config).await
}
