use causal_kvs::config::NodeConfig;
use causal_kvs::server::{build_node, http_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = NodeConfig::from_env()?;
    tracing::info!(
        "starting node {} with {} seed node(s), replication factor {}",
        config.local,
        config.initial_view.len(),
        config.replication_factor
    );

    let node = build_node(&config);
    node.anti_entropy.start();

    let app = http_app(&node);
    let bind_addr = config.bind_addr()?;
    tracing::info!("listening on {bind_addr}");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
