//! Wire format of the Discord local IPC socket.
//!
//! Every frame is an 8 byte header (little-endian `i32` opcode, little-endian
//! `i32` payload length) followed by a UTF-8 JSON payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

pub const HEADER_LEN: usize = 8;
pub const HANDSHAKE_VERSION: u32 = 1;
/// Upper bound accepted for an incoming payload.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

pub const CMD_SET_ACTIVITY: &str = "SET_ACTIVITY";
pub const CMD_DISPATCH: &str = "DISPATCH";
pub const EVT_READY: &str = "READY";
pub const EVT_ERROR: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Opcode {
    Handshake = 0,
    Frame = 1,
    Close = 2,
    Ping = 3,
    Pong = 4,
}

impl TryFrom<i32> for Opcode {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Handshake),
            1 => Ok(Self::Frame),
            2 => Ok(Self::Close),
            3 => Ok(Self::Ping),
            4 => Ok(Self::Pong),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: i32,
    pub len: i32,
}

impl FrameHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.opcode.to_le_bytes());
        out[4..].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    pub fn decode(bytes: [u8; HEADER_LEN]) -> Self {
        let [o0, o1, o2, o3, l0, l1, l2, l3] = bytes;
        Self {
            opcode: i32::from_le_bytes([o0, o1, o2, o3]),
            len: i32::from_le_bytes([l0, l1, l2, l3]),
        }
    }
}

pub fn encode_frame<T: Serialize>(opcode: Opcode, payload: &T) -> serde_json::Result<Vec<u8>> {
    let body = serde_json::to_vec(payload)?;
    let header = FrameHeader {
        opcode: opcode as i32,
        len: body.len() as i32,
    };
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&header.encode());
    frame.extend_from_slice(&body);
    Ok(frame)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub v: u32,
    pub client_id: String,
}

impl Handshake {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            v: HANDSHAKE_VERSION,
            client_id: client_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcCommand<A> {
    pub cmd: String,
    pub args: A,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActivityArgs {
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub assets: ActivityAssets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<ActivityTimestamps>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    pub small_image: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActivityTimestamps {
    pub start: i64,
}

pub fn set_activity_command(
    pid: u32,
    activity: Option<ActivityPayload>,
    nonce: impl Into<String>,
) -> IpcCommand<SetActivityArgs> {
    IpcCommand {
        cmd: CMD_SET_ACTIVITY.to_string(),
        args: SetActivityArgs { pid, activity },
        nonce: nonce.into(),
    }
}

/// Any JSON message read back from the socket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpcMessage {
    #[serde(default)]
    pub cmd: Option<String>,
    #[serde(default)]
    pub evt: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl IpcMessage {
    pub fn is_ready(&self) -> bool {
        self.cmd.as_deref() == Some(CMD_DISPATCH) && self.evt.as_deref() == Some(EVT_READY)
    }

    /// Error carried either at the top level (close frames) or inside an
    /// `ERROR` event's data.
    pub fn error(&self) -> Option<ApiError> {
        if let Some(code) = self.code {
            return Some(ApiError::new(code, self.message.clone().unwrap_or_default()));
        }
        if self.evt.as_deref() != Some(EVT_ERROR) {
            return None;
        }
        let data = self.data.as_ref()?;
        let code = data.get("code")?.as_i64()?;
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(ApiError::new(code, message))
    }
}
