use super::records::RecMessage;
use super::store::RecordStore;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) const DEFAULT_QUEUE_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub(crate) struct AuditSender {
    tx: mpsc::Sender<RecMessage>,
}

impl AuditSender {
    pub(crate) async fn send(&self, message: impl Into<RecMessage>) {
        if let Err(err) = self.tx.send(message.into()).await {
            tracing::warn!(
                event = "audit.channel.closed",
                kind = ?err.0.kind(),
                "registrar is gone, audit record lost"
            );
        }
    }
}

pub(crate) fn audit_channel(capacity: usize) -> (AuditSender, mpsc::Receiver<RecMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    (AuditSender { tx }, rx)
}

/// Single consumer of the audit channel. Writes one row at a time in arrival
/// order; a failed write is logged and the row discarded.
pub(crate) struct Registrar {
    store: Arc<dyn RecordStore>,
    rx: mpsc::Receiver<RecMessage>,
}

impl Registrar {
    pub(crate) fn new(store: Arc<dyn RecordStore>, rx: mpsc::Receiver<RecMessage>) -> Self {
        Self { store, rx }
    }

    pub(crate) fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.watch(cancel))
    }

    pub(crate) async fn watch(mut self, cancel: CancellationToken) {
        tracing::info!(event = "audit.registrar.started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                message = self.rx.recv() => match message {
                    Some(message) => self.write(message).await,
                    None => break,
                },
            }
        }

        self.rx.close();
        let mut flushed = 0usize;
        while let Ok(message) = self.rx.try_recv() {
            self.write(message).await;
            flushed += 1;
        }
        tracing::info!(event = "audit.registrar.stopped", flushed);
    }

    async fn write(&self, mut message: RecMessage) {
        message.record_mut().set_timestamp(SystemTime::now());
        let result = match &message {
            RecMessage::Audit(record) => self.store.insert_audit(record).await,
            RecMessage::State(record) => self.store.insert_state(record).await,
        };
        if let Err(err) = result {
            tracing::warn!(
                event = "audit.write.failed",
                kind = ?message.kind(),
                error = %err,
                "audit record discarded"
            );
        }
    }
}
