//! In-process stand-in for the Discord client's IPC socket.

use std::{path::PathBuf, sync::Arc};

use serde_json::{json, Value};
use shared::protocol::{encode_frame, FrameHeader, Opcode, HEADER_LEN};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::Mutex,
    task::JoinHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandshakeMode {
    Ready,
    RejectClientId,
    RejectVersion,
}

pub(crate) struct FakeDiscord {
    pub dir: tempfile::TempDir,
    pub received: Arc<Mutex<Vec<(i32, Value)>>>,
    task: JoinHandle<()>,
}

impl FakeDiscord {
    pub fn start(mode: HandshakeMode) -> Self {
        Self::start_accepting(mode, usize::MAX)
    }

    /// Serves the first `limit` connections; later ones are dropped on accept.
    pub fn start_accepting(mode: HandshakeMode, limit: usize) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let listener = UnixListener::bind(dir.path().join("discord-ipc-0")).expect("bind");
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let task = tokio::spawn(async move {
            let mut served = 0;
            while let Ok((stream, _)) = listener.accept().await {
                if served == limit {
                    drop(stream);
                    continue;
                }
                served += 1;
                tokio::spawn(serve(stream, sink.clone(), mode));
            }
        });
        Self {
            dir,
            received,
            task,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub async fn frames(&self) -> Vec<(i32, Value)> {
        self.received.lock().await.clone()
    }
}

impl Drop for FakeDiscord {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: UnixStream, received: Arc<Mutex<Vec<(i32, Value)>>>, mode: HandshakeMode) {
    loop {
        let mut header = [0u8; HEADER_LEN];
        if stream.read_exact(&mut header).await.is_err() {
            return;
        }
        let header = FrameHeader::decode(header);
        let mut body = vec![0u8; header.len as usize];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let payload: Value = serde_json::from_slice(&body).expect("client sent json");
        received.lock().await.push((header.opcode, payload.clone()));

        let reply = match Opcode::try_from(header.opcode) {
            Ok(Opcode::Handshake) if mode == HandshakeMode::Ready => encode_frame(
                Opcode::Frame,
                &json!({"cmd": "DISPATCH", "evt": "READY", "data": {"v": 1}}),
            ),
            Ok(Opcode::Handshake) if mode == HandshakeMode::RejectClientId => encode_frame(
                Opcode::Close,
                &json!({"code": 4000, "message": "Invalid Client ID"}),
            ),
            Ok(Opcode::Handshake) => encode_frame(
                Opcode::Close,
                &json!({"code": 4004, "message": "Invalid Version"}),
            ),
            Ok(Opcode::Frame) => encode_frame(
                Opcode::Frame,
                &json!({"cmd": payload["cmd"], "evt": null, "data": {}, "nonce": payload["nonce"]}),
            ),
            _ => return,
        }
        .expect("encode reply");

        if stream.write_all(&reply).await.is_err() {
            return;
        }
    }
}
