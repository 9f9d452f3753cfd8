use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let config = rosterd::config::Config::from_env()?;

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "rosterd",
        "rosterd starting: RUST_LOG='{}', http_port={}, token_ttl={}s, max_query_cost={}, hash_cost={}",
        rust_log,
        config.http_port,
        config.token_ttl.as_secs(),
        config.max_query_cost,
        config.hash_cost
    );

    rosterd::server::run(config).await
}
