use super::health::{HealthMonitor, HealthReport};
use super::router::ConsistentHashRouter;
use super::types::{CacheNode, CacheOptions, ConsistencyLevel, NodeId};
use crate::error::{CacheError, NodeFailure, Result};
use crate::node::NodeClient;

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Executes logical cache operations against the nodes the router picks.
///
/// Reads go to the key's primary only. Writes and deletes fan out to the
/// replica set concurrently under one deadline and fail if any node fails.
/// Writes that landed are never rolled back, and concurrent writes to one
/// key are not ordered across nodes.
pub struct DistributedCache {
    router: Arc<ConsistentHashRouter>,
    monitor: HealthMonitor,
    options: CacheOptions,
}

impl DistributedCache {
    pub fn new(nodes: Vec<CacheNode>, options: CacheOptions) -> Arc<Self> {
        let options = options.normalized();

        if options.consistency_level != ConsistencyLevel::All {
            tracing::info!(
                "Consistency level {:?} accepted; writes still target every replica",
                options.consistency_level
            );
        }

        let router = Arc::new(ConsistentHashRouter::new(
            options.virtual_nodes,
            options.replication_factor,
        ));
        router.update_nodes(nodes);

        let monitor = HealthMonitor::new(
            router.clone(),
            options.health_interval,
            options.health_timeout,
        );

        Arc::new(Self {
            router,
            monitor,
            options,
        })
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn router(&self) -> &ConsistentHashRouter {
        &self.router
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let node = self.router.select_node(key).ok_or(CacheError::NoHealthyNode)?;

        if !node.healthy {
            return Err(CacheError::NodeUnavailable(node.id));
        }

        tracing::debug!("GET {} from {}", key, node.id);

        tokio::time::timeout(self.options.timeout, node.client.get(key))
            .await
            .map_err(|_| CacheError::Timeout(self.options.timeout))?
    }

    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let replicas = self.router.get_replication_nodes(key);
        if replicas.is_empty() {
            return Err(CacheError::NoHealthyNode);
        }
        if replicas.len() < self.options.replication_factor {
            tracing::warn!(
                "SET {}: only {} of {} replicas available",
                key,
                replicas.len(),
                self.options.replication_factor
            );
        }

        let key: Arc<str> = Arc::from(key);
        let value = Arc::new(value);

        self.fan_out("set", replicas, move |client| {
            let key = key.clone();
            let value = value.clone();
            async move { client.set(&key, &value).await }
        })
        .await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let replicas = self.router.get_replication_nodes(key);
        if replicas.is_empty() {
            tracing::debug!("DELETE {}: no healthy replicas, nothing to delete", key);
            return Ok(());
        }

        let key: Arc<str> = Arc::from(key);

        self.fan_out("delete", replicas, move |client| {
            let key = key.clone();
            async move { client.delete(&key).await }
        })
        .await
    }

    /// Flushes every healthy node in the registry.
    pub async fn clear(&self) -> Result<()> {
        let nodes = self.router.healthy_nodes();

        self.fan_out("clear", nodes, |client| async move { client.delete("").await })
            .await
    }

    /// Runs `op` against every node in its own task, all bounded by one
    /// deadline, and folds the outcomes into a single result.
    async fn fan_out<F, Fut>(&self, operation: &'static str, nodes: Vec<CacheNode>, op: F) -> Result<()>
    where
        F: Fn(Arc<dyn NodeClient>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let timeout = self.options.timeout;
        let deadline = Instant::now() + timeout;

        let (ids, handles): (Vec<NodeId>, Vec<JoinHandle<Result<()>>>) = nodes
            .into_iter()
            .filter(|node| node.healthy)
            .map(|node| {
                let call = op(node.client.clone());
                let handle = tokio::spawn(async move {
                    match tokio::time::timeout_at(deadline, call).await {
                        Ok(result) => result,
                        Err(_) => Err(CacheError::Timeout(timeout)),
                    }
                });
                (node.id, handle)
            })
            .unzip();
        let attempted = ids.len();

        let failures: Vec<NodeFailure> = ids
            .into_iter()
            .zip(join_all(handles).await)
            .filter_map(|(node, outcome)| match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(NodeFailure {
                    node,
                    reason: e.to_string(),
                }),
                Err(join_err) => Some(NodeFailure {
                    node,
                    reason: format!("task failed: {}", join_err),
                }),
            })
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        tracing::warn!(
            "{} failed on {}/{} nodes",
            operation,
            failures.len(),
            attempted
        );

        Err(CacheError::Replication {
            operation,
            attempted,
            failures,
        })
    }

    pub fn update_nodes(&self, nodes: Vec<CacheNode>) {
        self.router.update_nodes(nodes);
    }

    pub fn nodes(&self) -> Vec<CacheNode> {
        self.router.nodes()
    }

    pub fn mark_health(&self, id: &NodeId, healthy: bool) -> bool {
        self.router.mark_health(id, healthy)
    }

    pub async fn check_nodes_health(&self) -> HealthReport {
        self.monitor.check_nodes_health().await
    }

    /// Blocks until `shutdown` fires.
    pub async fn monitor_health(&self, shutdown: broadcast::Receiver<()>) {
        self.monitor.run(shutdown).await;
    }

    pub fn spawn_health_monitor(self: &Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.monitor_health(shutdown).await;
        })
    }
}
