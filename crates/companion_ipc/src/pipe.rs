//! A single framed connection to a Discord IPC socket.

use std::path::{Path, PathBuf};

use serde::Serialize;
use shared::protocol::{
    encode_frame, FrameHeader, Handshake, IpcCommand, IpcMessage, Opcode, HEADER_LEN,
    MAX_PAYLOAD_LEN,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::UnixStream,
};
use tracing::{debug, error, info};

use crate::IpcError;

/// Discord listens on the first free slot of `discord-ipc-0` .. `discord-ipc-9`.
pub const IPC_SOCKET_SLOTS: usize = 10;

pub fn socket_name(slot: usize) -> String {
    format!("discord-ipc-{slot}")
}

/// Returns the first existing socket, scanning slots in order and each root
/// within a slot.
pub fn locate_ipc_socket(roots: &[PathBuf]) -> Option<PathBuf> {
    (0..IPC_SOCKET_SLOTS)
        .flat_map(|slot| roots.iter().map(move |root| root.join(socket_name(slot))))
        .find(|path| path.exists())
}

pub struct IpcPipe {
    stream: UnixStream,
    client_id: String,
}

impl IpcPipe {
    pub async fn connect(path: &Path, client_id: impl Into<String>) -> Result<Self, IpcError> {
        let stream = UnixStream::connect(path).await?;
        debug!("ipc: connected to {}", path.display());
        Ok(Self {
            stream,
            client_id: client_id.into(),
        })
    }

    pub async fn handshake(&mut self) -> Result<(), IpcError> {
        info!("ipc: beginning handshake for app {}", self.client_id);
        let handshake = Handshake::new(self.client_id.clone());
        self.send(Opcode::Handshake, &handshake).await?;
        let reply = self.recv().await?;

        if reply.is_ready() {
            info!("ipc: handshake complete for app {}", self.client_id);
            return Ok(());
        }
        if let Some(err) = reply.error() {
            if err.is_invalid_client_id() {
                error!("ipc: invalid client id {}", self.client_id);
                return Err(IpcError::InvalidClientId(self.client_id.clone()));
            }
            error!("ipc: handshake failed code={} message={}", err.code, err.message);
            return Err(IpcError::HandshakeRejected(err.into()));
        }
        error!("ipc: handshake failed reply={reply:?}");
        Err(IpcError::UnexpectedReply(Box::new(reply)))
    }

    /// Sends a command frame and waits for the matching reply.
    pub async fn request<A: Serialize>(
        &mut self,
        command: &IpcCommand<A>,
    ) -> Result<IpcMessage, IpcError> {
        self.send(Opcode::Frame, command).await?;
        let reply = self.recv().await?;
        if let Some(err) = reply.error() {
            return Err(IpcError::CommandRejected {
                cmd: command.cmd.clone(),
                source: err.into(),
            });
        }
        Ok(reply)
    }

    pub async fn send<T: Serialize>(&mut self, opcode: Opcode, payload: &T) -> Result<(), IpcError> {
        let frame = encode_frame(opcode, payload)?;
        debug!(?opcode, len = frame.len() - HEADER_LEN, "ipc: send");
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Reads frames until a JSON message arrives; pings are answered in place.
    pub async fn recv(&mut self) -> Result<IpcMessage, IpcError> {
        loop {
            let mut header = [0u8; HEADER_LEN];
            match self.stream.read_exact(&mut header).await {
                Ok(_) => {}
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(IpcError::EmptyReceive);
                }
                Err(err) => return Err(err.into()),
            }

            let header = FrameHeader::decode(header);
            let len = usize::try_from(header.len)
                .ok()
                .filter(|len| *len <= MAX_PAYLOAD_LEN)
                .ok_or(IpcError::InvalidFrameLength(header.len))?;
            let mut body = vec![0u8; len];
            self.stream.read_exact(&mut body).await?;

            if header.opcode == Opcode::Ping as i32 {
                let echo: serde_json::Value = serde_json::from_slice(&body)?;
                self.send(Opcode::Pong, &echo).await?;
                continue;
            }

            let message: IpcMessage = serde_json::from_slice(&body)?;
            debug!(opcode = header.opcode, ?message, "ipc: recv");
            return Ok(message);
        }
    }

    pub async fn close(mut self) -> Result<(), IpcError> {
        info!("ipc: disconnecting app {}", self.client_id);
        self.send(Opcode::Close, &serde_json::json!({})).await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/pipe_tests.rs"]
mod tests;
