use crate::layers::audit::RecordStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long the registrar gets to write out queued records once every
/// producer has stopped.
const REGISTRAR_GRACE: Duration = Duration::from_secs(30);

pub(crate) struct ServerTasks {
    pub(crate) server: JoinHandle<()>,
    pub(crate) watcher: JoinHandle<()>,
    pub(crate) registrar: JoinHandle<()>,
}

impl ServerTasks {
    /// Stops the producers first and waits for them, so every request already
    /// accepted is answered and its records are queued. Their audit senders are
    /// gone by then, which lets the registrar drain the channel and exit on its
    /// own. The store is closed last.
    pub(crate) async fn shutdown(
        self,
        producers: CancellationToken,
        registrar_stop: CancellationToken,
        store: &dyn RecordStore,
    ) {
        producers.cancel();
        join("server", self.server).await;
        join("watcher", self.watcher).await;

        let mut registrar = self.registrar;
        match tokio::time::timeout(REGISTRAR_GRACE, &mut registrar).await {
            Ok(result) => log_join("registrar", result),
            Err(_) => {
                tracing::warn!(
                    event = "audit.registrar.slow",
                    grace = %humantime::format_duration(REGISTRAR_GRACE),
                    "registrar still busy, stopping it"
                );
                registrar_stop.cancel();
                log_join("registrar", registrar.await);
            }
        }

        if let Err(err) = store.close().await {
            tracing::warn!(event = "store.close_failed", error = %err);
        }
        tracing::info!(event = "server.stopped");
    }
}

async fn join(name: &'static str, task: JoinHandle<()>) {
    log_join(name, task.await);
}

fn log_join(name: &'static str, result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        tracing::warn!(event = "server.task_failed", task = name, error = %err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::audit::{audit_channel, MemoryStore, RecMessage, Registrar};
    use crate::layers::commands::testing as contexts;
    use crate::layers::control::{ClusterControl, ControlError, PendingOperation};
    use crate::layers::service::{serve, spawn_status_watcher, Deadlines, Dispatcher};
    use crate::shared::entries::{seed, PowerState};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::{SinkExt, StreamExt};
    use protocol::rpc::{RpcReply, RpcRequest};
    use protocol::{Command, SYSTEM_ACTOR};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_util::codec::{Framed, LengthDelimitedCodec};

    /// Answers `get` slowly so requests are still running when shutdown starts.
    #[derive(Default)]
    struct SlowControl {
        gets: AtomicUsize,
    }

    #[async_trait]
    impl ClusterControl for SlowControl {
        async fn get(&self, _: &str, _: &str) -> Result<PowerState, ControlError> {
            self.gets.fetch_add(1, Ordering::AcqRel);
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(PowerState::Running)
        }

        async fn begin_start(
            &self,
            _: &str,
            cluster: &str,
        ) -> Result<Box<dyn PendingOperation>, ControlError> {
            Err(ControlError::Busy(cluster.to_string()))
        }

        async fn begin_stop(
            &self,
            _: &str,
            cluster: &str,
        ) -> Result<Box<dyn PendingOperation>, ControlError> {
            Err(ControlError::Busy(cluster.to_string()))
        }
    }

    #[tokio::test]
    async fn in_flight_requests_are_answered_and_persisted_before_close() {
        let control = Arc::new(SlowControl::default());
        let ctx = contexts::with_control(
            vec![seed("Demo", "demo", PowerState::Stopped)],
            control.clone(),
        );
        let store = Arc::new(MemoryStore::default());
        let (audit, rx) = audit_channel(20);
        let registrar_stop = CancellationToken::new();
        let producers = CancellationToken::new();
        let registrar = Registrar::new(store.clone(), rx).spawn(registrar_stop.clone());

        let dispatcher = Arc::new(Dispatcher::new(ctx.clone(), audit).expect("dispatcher"));
        let watcher = spawn_status_watcher(
            Arc::clone(&dispatcher),
            Duration::from_secs(60),
            Duration::from_secs(5),
            producers.clone(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let deadlines = Deadlines {
            unary: Duration::from_secs(5),
            stream: Duration::from_secs(5),
        };
        let server = tokio::spawn(serve(listener, dispatcher, deadlines, producers.clone()));

        let client = tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.expect("connect");
            let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
            let command = Command::new("alice", "status", vec!["-cluster".into(), "demo".into()]);
            let payload = serde_json::to_vec(&RpcRequest::ExecCommand { command }).expect("encode");
            framed.send(Bytes::from(payload)).await.expect("send");
            let frame = framed.next().await.expect("reply").expect("frame");
            serde_json::from_slice::<RpcReply>(&frame).expect("decode")
        });

        // The watcher tick and the client request share the entry lock, so the
        // second `get` starts only once the first has finished.
        while control.gets.load(Ordering::Acquire) < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let tasks = ServerTasks {
            server,
            watcher,
            registrar,
        };
        tasks.shutdown(producers, registrar_stop, store.as_ref()).await;

        match client.await.expect("client") {
            RpcReply::Response { response } => {
                assert!(response.cmd_result.contains(r#""powerState":"Running""#));
            }
            other => panic!("unexpected reply {other:?}"),
        }
        assert!(store.is_closed());
        let mut users: Vec<_> = store
            .rows()
            .into_iter()
            .map(|row| match row {
                RecMessage::Audit(record) => record.username.unwrap_or_default(),
                other => panic!("unexpected row {other:?}"),
            })
            .collect();
        users.sort();
        assert_eq!(users, vec!["alice".to_string(), SYSTEM_ACTOR.to_string()]);
        assert_eq!(ctx.entries.snapshot().await[0].power_state, PowerState::Running);
    }
}
