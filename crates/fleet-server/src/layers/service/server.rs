use crate::layers::service::dispatcher::Dispatcher;
use anyhow::Context;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use protocol::rpc::{RpcReply, RpcRequest, RpcStatus};
use protocol::{Command, CommandResponse};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

type Connection = Framed<TcpStream, LengthDelimitedCodec>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadlines {
    pub(crate) unary: Duration,
    pub(crate) stream: Duration,
}

pub(crate) async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    deadlines: Deadlines,
    cancel: CancellationToken,
) {
    let connections = TaskTracker::new();
    loop {
        let accepted = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                let dispatcher = Arc::clone(&dispatcher);
                let span = tracing::info_span!("rpc", id = %uuid::Uuid::new_v4(), peer = %peer);
                connections.spawn(
                    async move {
                        if let Err(err) = handle_connection(stream, peer, dispatcher, deadlines).await
                        {
                            tracing::warn!(
                                event = "rpc.conn.error",
                                error = %err,
                                "connection handler failed"
                            );
                        }
                    }
                    .instrument(span),
                );
            }
            Err(err) => {
                tracing::warn!(
                    event = "rpc.listener.accept_failed",
                    error = %err,
                    "listener accept failed"
                );
            }
        }
    }
    drop(listener);
    connections.close();
    tracing::info!(
        event = "rpc.listener.stopped",
        in_flight = connections.len(),
    );
    // Requests already accepted run to completion and get audited.
    connections.wait().await;
    tracing::info!(event = "rpc.connections.drained");
}

fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(protocol::framing::MAX_FRAME_LENGTH)
        .new_codec()
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    deadlines: Deadlines,
) -> anyhow::Result<()> {
    let mut framed = Framed::new(stream, codec());
    let Some(frame) = framed.next().await else {
        return Ok(());
    };
    let bytes = frame.context("read request frame")?;
    let request: RpcRequest = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(event = "rpc.request.invalid", peer = %peer, error = %err);
            let status = RpcStatus::invalid_argument(format!("invalid request: {err}"));
            return send_reply(&mut framed, &RpcReply::Status { status }).await;
        }
    };

    match request {
        RpcRequest::ExecCommand { command } => {
            tracing::info!(event = "rpc.exec_command", command = %command.cmd_name);
            let result = dispatcher
                .dispatch_with_deadline(&command, deadlines.unary)
                .await;
            send_reply(&mut framed, &reply(result)).await
        }
        RpcRequest::GetRemoteCommands => {
            tracing::info!(event = "rpc.get_remote_commands");
            let result = dispatcher.remote_usage();
            send_reply(&mut framed, &RpcReply::RemoteUsage { result }).await
        }
        RpcRequest::CommandListener => {
            tracing::info!(event = "rpc.command_listener");
            listen(&mut framed, &dispatcher, deadlines.stream).await
        }
    }
}

/// Answers each command frame with one reply until the client half-closes or
/// the stream deadline passes.
async fn listen(
    framed: &mut Connection,
    dispatcher: &Dispatcher,
    deadline: Duration,
) -> anyhow::Result<()> {
    let expires_at = Instant::now() + deadline;
    loop {
        let frame = match tokio::time::timeout_at(expires_at, framed.next()).await {
            Ok(Some(frame)) => frame.context("read command frame")?,
            Ok(None) => return Ok(()),
            Err(_) => {
                let status = RpcStatus::deadline_exceeded("command stream deadline exceeded");
                return send_reply(framed, &RpcReply::Status { status }).await;
            }
        };
        let command: Command = match serde_json::from_slice(&frame) {
            Ok(command) => command,
            Err(err) => {
                let status = RpcStatus::invalid_argument(format!("invalid command: {err}"));
                return send_reply(framed, &RpcReply::Status { status }).await;
            }
        };
        let remaining = expires_at.saturating_duration_since(Instant::now());
        let result = dispatcher.dispatch_with_deadline(&command, remaining).await;
        let failed = result.is_err();
        send_reply(framed, &reply(result)).await?;
        if failed {
            return Ok(());
        }
    }
}

fn reply(result: Result<CommandResponse, RpcStatus>) -> RpcReply {
    match result {
        Ok(response) => RpcReply::Response { response },
        Err(status) => RpcReply::Status { status },
    }
}

async fn send_reply(framed: &mut Connection, reply: &RpcReply) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(reply)?;
    framed
        .send(Bytes::from(payload))
        .await
        .context("write reply frame")?;
    Ok(())
}
