use shared::{error::ApiException, protocol::IpcMessage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("no discord ipc socket found")]
    SocketNotFound,
    #[error("ipc socket closed before a reply was received")]
    EmptyReceive,
    #[error("discord does not know client id {0}")]
    InvalidClientId(String),
    #[error("handshake rejected: {0}")]
    HandshakeRejected(#[source] ApiException),
    #[error("unexpected handshake reply: {0:?}")]
    UnexpectedReply(Box<IpcMessage>),
    #[error("{cmd} rejected: {source}")]
    CommandRejected {
        cmd: String,
        #[source]
        source: ApiException,
    },
    #[error("invalid frame length {0}")]
    InvalidFrameLength(i32),
    #[error("empty launch command")]
    EmptyLaunchCommand,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
