//! Seam to the cloud control plane that actually powers clusters on and off.
//!
//! Operations are long-running: `begin_*` returns a handle that has to be
//! polled until it reports completion.

mod simulated;

pub(crate) use simulated::SimulatedControl;

use crate::shared::entries::PowerState;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ControlError {
    #[error("cluster {cluster} not found in resource group {group}")]
    NotFound { group: String, cluster: String },
    #[error("operation already in progress on cluster {0}")]
    Busy(String),
    #[cfg(test)]
    #[error("control plane request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationStatus {
    InProgress,
    Succeeded,
}

#[async_trait]
pub(crate) trait PendingOperation: Send {
    async fn poll(&mut self) -> Result<OperationStatus, ControlError>;
}

#[async_trait]
pub(crate) trait ClusterControl: Send + Sync {
    async fn get(&self, group: &str, cluster: &str) -> Result<PowerState, ControlError>;

    async fn begin_start(
        &self,
        group: &str,
        cluster: &str,
    ) -> Result<Box<dyn PendingOperation>, ControlError>;

    async fn begin_stop(
        &self,
        group: &str,
        cluster: &str,
    ) -> Result<Box<dyn PendingOperation>, ControlError>;
}

/// Polls `operation` every `interval` until it succeeds or a poll fails.
/// Dropping the returned future stops polling but not the operation itself.
pub(crate) async fn poll_until_done(
    mut operation: Box<dyn PendingOperation>,
    interval: Duration,
) -> Result<(), ControlError> {
    loop {
        match operation.poll().await? {
            OperationStatus::Succeeded => return Ok(()),
            OperationStatus::InProgress => tokio::time::sleep(interval).await,
        }
    }
}
