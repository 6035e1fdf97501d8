use super::{ClusterControl, ControlError, OperationStatus, PendingOperation};
use crate::shared::entries::PowerState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

type ClusterKey = (String, String);

#[derive(Debug)]
struct Transition {
    target: PowerState,
    ready_at: Instant,
}

#[derive(Debug)]
struct SimCluster {
    state: PowerState,
    transition: Option<Transition>,
}

impl SimCluster {
    fn settle(&mut self, now: Instant) {
        if let Some(transition) = &self.transition {
            if transition.ready_at <= now {
                self.state = transition.target;
                self.transition = None;
            }
        }
    }
}

/// In-memory control plane. A begun transition completes once its transition
/// time has passed on the clock, whether or not anyone is polling it.
#[derive(Debug, Clone)]
pub(crate) struct SimulatedControl {
    transition_time: Duration,
    clusters: Arc<Mutex<HashMap<ClusterKey, SimCluster>>>,
}

impl SimulatedControl {
    pub(crate) fn new(
        transition_time: Duration,
        clusters: impl IntoIterator<Item = (String, String, PowerState)>,
    ) -> Self {
        let clusters = clusters
            .into_iter()
            .map(|(group, cluster, state)| {
                (
                    (group, cluster),
                    SimCluster {
                        state,
                        transition: None,
                    },
                )
            })
            .collect();
        Self {
            transition_time,
            clusters: Arc::new(Mutex::new(clusters)),
        }
    }

    async fn begin(
        &self,
        group: &str,
        cluster: &str,
        target: PowerState,
    ) -> Result<Box<dyn PendingOperation>, ControlError> {
        let key = (group.to_string(), cluster.to_string());
        let mut clusters = self.clusters.lock().await;
        let sim = clusters.get_mut(&key).ok_or_else(|| not_found(group, cluster))?;
        let now = Instant::now();
        sim.settle(now);
        if sim.transition.is_some() {
            return Err(ControlError::Busy(cluster.to_string()));
        }
        sim.transition = Some(Transition {
            target,
            ready_at: now + self.transition_time,
        });
        tracing::debug!(
            event = "control.simulated.begin",
            group = %group,
            cluster = %cluster,
            desired = %target,
        );
        Ok(Box::new(SimOperation {
            clusters: Arc::clone(&self.clusters),
            key,
            target,
        }))
    }
}

#[async_trait]
impl ClusterControl for SimulatedControl {
    async fn get(&self, group: &str, cluster: &str) -> Result<PowerState, ControlError> {
        let mut clusters = self.clusters.lock().await;
        let key = (group.to_string(), cluster.to_string());
        let sim = clusters.get_mut(&key).ok_or_else(|| not_found(group, cluster))?;
        sim.settle(Instant::now());
        Ok(sim.state)
    }

    async fn begin_start(
        &self,
        group: &str,
        cluster: &str,
    ) -> Result<Box<dyn PendingOperation>, ControlError> {
        self.begin(group, cluster, PowerState::Running).await
    }

    async fn begin_stop(
        &self,
        group: &str,
        cluster: &str,
    ) -> Result<Box<dyn PendingOperation>, ControlError> {
        self.begin(group, cluster, PowerState::Stopped).await
    }
}

struct SimOperation {
    clusters: Arc<Mutex<HashMap<ClusterKey, SimCluster>>>,
    key: ClusterKey,
    target: PowerState,
}

#[async_trait]
impl PendingOperation for SimOperation {
    async fn poll(&mut self) -> Result<OperationStatus, ControlError> {
        let mut clusters = self.clusters.lock().await;
        let sim = clusters
            .get_mut(&self.key)
            .ok_or_else(|| not_found(&self.key.0, &self.key.1))?;
        sim.settle(Instant::now());
        if sim.transition.is_none() && sim.state == self.target {
            Ok(OperationStatus::Succeeded)
        } else {
            Ok(OperationStatus::InProgress)
        }
    }
}

fn not_found(group: &str, cluster: &str) -> ControlError {
    ControlError::NotFound {
        group: group.to_string(),
        cluster: cluster.to_string(),
    }
}
