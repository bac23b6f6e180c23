use replicated_cache::cache::CacheStrategy;
use replicated_cache::cache::handlers::gateway_routes;
use replicated_cache::cluster::types::NodeId;
use replicated_cache::config::{AppConfig, LoggingConfig};
use replicated_cache::node::MemoryNode;
use replicated_cache::node::handlers::node_router;

use axum::extract::Extension;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

const STATS_INTERVAL: Duration = Duration::from_secs(30);

struct Args {
    bind: Option<SocketAddr>,
    config: Option<PathBuf>,
    node_id: Option<String>,
    peers: Vec<String>,
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} --bind <addr:port> [--config <file>] [--node-id <id>] [--peer <endpoint>]...",
        program
    );
    eprintln!("Example: {} --bind 127.0.0.1:7001", program);
    eprintln!(
        "Example: {} --bind 127.0.0.1:7000 --peer a=127.0.0.1:7001 --peer b=127.0.0.1:7002",
        program
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("cache-node");

    let mut parsed = Args {
        bind: None,
        config: None,
        node_id: None,
        peers: Vec::new(),
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--help" | "-h") {
            usage(program);
        }
        let Some(value) = args.get(i + 1) else {
            if matches!(flag, "--bind" | "--config" | "--node-id" | "--peer") {
                usage(program);
            }
            break;
        };

        match flag {
            "--bind" => {
                parsed.bind = Some(value.parse()?);
                i += 2;
            }
            "--config" => {
                parsed.config = Some(PathBuf::from(value));
                i += 2;
            }
            "--node-id" => {
                parsed.node_id = Some(value.clone());
                i += 2;
            }
            "--peer" => {
                parsed.peers.push(value.clone());
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok(parsed)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.node.bind = bind;
    }
    if let Some(node_id) = args.node_id {
        config.node.node_id = Some(node_id);
    }
    if !args.peers.is_empty() {
        config.cache.distribution = args.peers;
        if config.cache.strategy == "memory" {
            config.cache.strategy = "distributed".to_string();
        }
    }

    init_tracing(&config.logging);

    let node_id = config
        .node
        .node_id
        .clone()
        .map(NodeId::from)
        .unwrap_or_else(NodeId::generate);
    let bind_addr = config.node.bind;

    tracing::info!("Starting cache node {} on {}", node_id, bind_addr);

    // 1. Local node store (served to peers):
    let store = Arc::new(MemoryNode::with_endpoint(&format!("http://{}", bind_addr)));

    // 2. Gateway facade:
    let cache = Arc::new(CacheStrategy::from_config(&config).await?);
    tracing::info!(
        "Gateway strategy: {} ({} endpoint(s))",
        cache.provider_name(),
        config.cache.distribution.len()
    );

    // 3. Health monitor:
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let monitor_handle = cache
        .distributed()
        .map(|distributed| distributed.spawn_health_monitor(shutdown_tx.subscribe()));

    // 4. Stats reporter:
    let stats_cache = cache.clone();
    let mut stats_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATS_INTERVAL);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = stats_shutdown.recv() => break,
                _ = interval.tick() => {
                    let stats = stats_cache.metrics();
                    tracing::info!(
                        "Cache stats: hits={} misses={} evictions={} size={}B hit_rate={:.2}",
                        stats.hits,
                        stats.misses,
                        stats.evictions,
                        stats.size,
                        stats.hit_rate()
                    );
                    if let Some(distributed) = stats_cache.distributed() {
                        let router = distributed.router();
                        tracing::info!(
                            "Nodes: {}/{} healthy",
                            router.healthy_count(),
                            router.node_count()
                        );
                        for node in distributed.nodes() {
                            tracing::info!(
                                "  - {} {} healthy={}",
                                node.id,
                                node.endpoint,
                                node.healthy
                            );
                        }
                    }
                }
            }
        }
    });

    // 5. HTTP router:
    let app = node_router(store, node_id)
        .merge(gateway_routes())
        .layer(Extension(cache));

    // 6. Serve until Ctrl+C:
    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let signal_tx = shutdown_tx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
            tracing::info!("Shutdown requested");
            let _ = signal_tx.send(());
        })
        .await?;

    if let Some(handle) = monitor_handle
        && let Err(e) = handle.await
    {
        tracing::error!("Health monitor task failed: {}", e);
    }

    Ok(())
}
