use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use protocol::rpc::{RpcReply, RpcRequest, RpcStatus};
use protocol::{Command, CommandResponse, RemoteUsageResult};
use serde::Serialize;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

type Connection = Framed<TcpStream, LengthDelimitedCodec>;

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn exec_command(&self, command: &Command) -> Result<CommandResponse, RpcStatus>;

    async fn command_listener(&self, command: &Command) -> Result<CommandResponse, RpcStatus>;

    async fn remote_commands(&self) -> Result<RemoteUsageResult, RpcStatus>;
}

pub(crate) struct TcpTransport {
    addr: String,
    unary: Duration,
    stream: Duration,
}

impl TcpTransport {
    pub(crate) fn new(addr: String, unary: Duration, stream: Duration) -> Self {
        Self {
            addr,
            unary,
            stream,
        }
    }

    async fn connect(&self) -> Result<Connection, RpcStatus> {
        tracing::debug!(event = "rpc.connect", addr = %self.addr);
        let stream = TcpStream::connect(&self.addr).await.map_err(|err| {
            RpcStatus::unavailable(format!("failed to connect {}: {err}", self.addr))
        })?;
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(protocol::framing::MAX_FRAME_LENGTH)
            .new_codec();
        Ok(Framed::new(stream, codec))
    }

    async fn unary_call(&self, request: RpcRequest) -> Result<RpcReply, RpcStatus> {
        let call = async {
            let mut framed = self.connect().await?;
            send_frame(&mut framed, &request).await?;
            read_reply(&mut framed).await
        };
        within(self.unary, call).await
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn exec_command(&self, command: &Command) -> Result<CommandResponse, RpcStatus> {
        let request = RpcRequest::ExecCommand {
            command: command.clone(),
        };
        expect_response(self.unary_call(request).await?)
    }

    async fn command_listener(&self, command: &Command) -> Result<CommandResponse, RpcStatus> {
        let call = async {
            let mut framed = self.connect().await?;
            send_frame(&mut framed, &RpcRequest::CommandListener).await?;
            send_frame(&mut framed, command).await?;
            framed
                .get_mut()
                .shutdown()
                .await
                .map_err(|err| RpcStatus::unavailable(format!("failed to close send side: {err}")))?;
            read_reply(&mut framed).await
        };
        expect_response(within(self.stream, call).await?)
    }

    async fn remote_commands(&self) -> Result<RemoteUsageResult, RpcStatus> {
        match self.unary_call(RpcRequest::GetRemoteCommands).await? {
            RpcReply::RemoteUsage { result } => Ok(result),
            RpcReply::Status { status } => Err(status),
            other => Err(unexpected(&other)),
        }
    }
}

async fn within<T>(
    deadline: Duration,
    call: impl std::future::Future<Output = Result<T, RpcStatus>>,
) -> Result<T, RpcStatus> {
    timeout(deadline, call).await.map_err(|_| {
        RpcStatus::deadline_exceeded(format!(
            "no reply within {}",
            humantime::format_duration(deadline)
        ))
    })?
}

async fn send_frame(framed: &mut Connection, message: &impl Serialize) -> Result<(), RpcStatus> {
    let payload = serde_json::to_vec(message)
        .map_err(|err| RpcStatus::internal(format!("failed to encode request: {err}")))?;
    framed
        .send(Bytes::from(payload))
        .await
        .map_err(|err| RpcStatus::unavailable(format!("failed to send request: {err}")))
}

async fn read_reply(framed: &mut Connection) -> Result<RpcReply, RpcStatus> {
    let frame = framed
        .next()
        .await
        .ok_or_else(|| RpcStatus::unavailable("server closed connection"))?
        .map_err(|err| RpcStatus::unavailable(format!("failed to read reply: {err}")))?;
    serde_json::from_slice(&frame)
        .map_err(|err| RpcStatus::internal(format!("invalid reply: {err}")))
}

fn expect_response(reply: RpcReply) -> Result<CommandResponse, RpcStatus> {
    match reply {
        RpcReply::Response { response } => Ok(response),
        RpcReply::Status { status } => Err(status),
        other => Err(unexpected(&other)),
    }
}

fn unexpected(reply: &RpcReply) -> RpcStatus {
    RpcStatus::internal(format!("unexpected reply: {reply:?}"))
}
