use super::router::ConsistentHashRouter;
use super::types::NodeId;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Outcome of one probe round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub healthy: Vec<NodeId>,
    pub unhealthy: Vec<NodeId>,
}

/// Periodically probes every registered node and records its liveness in
/// the router. Membership is never changed here.
pub struct HealthMonitor {
    router: Arc<ConsistentHashRouter>,
    interval: Duration,
    probe_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(router: Arc<ConsistentHashRouter>, interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            router,
            interval,
            probe_timeout,
        }
    }

    /// Probes all nodes concurrently, then applies the results by node id.
    ///
    /// The node list is snapshotted first so no lock is held while probing.
    pub async fn check_nodes_health(&self) -> HealthReport {
        let nodes = self.router.nodes();
        let probe_timeout = self.probe_timeout;

        let probes = nodes.into_iter().map(|node| async move {
            let healthy = tokio::time::timeout(probe_timeout, node.client.health())
                .await
                .unwrap_or(false);
            (node, healthy)
        });

        let mut report = HealthReport::default();

        for (node, healthy) in join_all(probes).await {
            if node.healthy && !healthy {
                tracing::warn!("Node {} at {} marked unhealthy", node.id, node.endpoint);
            } else if !node.healthy && healthy {
                tracing::info!("Node {} at {} is healthy again", node.id, node.endpoint);
            }

            if !self.router.mark_health(&node.id, healthy) {
                tracing::debug!("Node {} left the node set during probing", node.id);
                continue;
            }

            if healthy {
                report.healthy.push(node.id);
            } else {
                report.unhealthy.push(node.id);
            }
        }

        report
    }

    /// Runs probe rounds every `interval` until `shutdown` fires or its
    /// sender is dropped.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            "Health monitor started (interval {:?}, probe timeout {:?})",
            self.interval,
            self.probe_timeout
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                result = shutdown.recv() => {
                    match result {
                        Ok(()) | Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::debug!("Health monitor shutdown receiver lagged by {}", n);
                        }
                    }
                }
                _ = interval.tick() => {
                    let report = self.check_nodes_health().await;
                    if !report.unhealthy.is_empty() {
                        tracing::warn!(
                            "{} of {} nodes unhealthy: {:?}",
                            report.unhealthy.len(),
                            report.healthy.len() + report.unhealthy.len(),
                            report.unhealthy
                        );
                    }
                }
            }
        }

        tracing::info!("Health monitor stopped");
    }
}
