//! Remote operator commands.
//!
//! Commands arrive as JSON event arrays, `["name", {payload}]`, optionally
//! prefixed by a namespace (`/devices,["start"]`). Everything before the
//! first `[` is skipped. Decoded commands become [`ControlMessage`]s for the
//! controller's inbox; nothing here touches the engine directly.

use crate::traffic::{ControlMessage, Signal};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("malformed command JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command is not an event array")]
    NotAnEvent,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("bad payload for {name}: {source}")]
    Payload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct ValuePayload {
    value: u32,
}

#[derive(Deserialize)]
struct MessagePayload {
    message: String,
}

fn payload<T: for<'de> Deserialize<'de>>(name: &str, data: Value) -> Result<T, RemoteError> {
    serde_json::from_value(data).map_err(|source| RemoteError::Payload {
        name: name.to_string(),
        source,
    })
}

/// Decode one command.
///
/// ```rust
/// use junction::remote::decode;
/// use junction::traffic::{ControlMessage, Signal};
///
/// let message = decode(r#"/devices,["start"]"#).unwrap();
/// assert_eq!(message, ControlMessage::Signal(Signal::Start));
///
/// let message = decode(r#"["vehicle_count",{"value":12}]"#).unwrap();
/// assert_eq!(message, ControlMessage::VehicleCount(12));
/// ```
pub fn decode(text: &str) -> Result<ControlMessage, RemoteError> {
    let start = text.find('[').ok_or(RemoteError::NotAnEvent)?;
    let mut parts = match serde_json::from_str::<Value>(&text[start..])? {
        Value::Array(parts) => parts.into_iter(),
        _ => return Err(RemoteError::NotAnEvent),
    };
    let name = match parts.next() {
        Some(Value::String(name)) => name,
        _ => return Err(RemoteError::NotAnEvent),
    };
    let data = parts.next().unwrap_or(Value::Null);

    let message = match name.as_str() {
        "emergency" => ControlMessage::Ambulance(true),
        "reset" | "clear_emergency" => ControlMessage::Ambulance(false),
        "vehicle_count" => {
            ControlMessage::VehicleCount(payload::<ValuePayload>(&name, data)?.value)
        }
        "speed" => ControlMessage::Speed(payload::<ValuePayload>(&name, data)?.value),
        "start" => ControlMessage::Signal(Signal::Start),
        "switch" => ControlMessage::Signal(Signal::Switch),
        "emergency_stop" => ControlMessage::Signal(Signal::Stop),
        "message" => ControlMessage::Note(payload::<MessagePayload>(&name, data)?.message),
        _ => return Err(RemoteError::Unknown(name)),
    };
    Ok(message)
}

/// Forward every decodable line from `reader` into the inbox.
///
/// Undecodable lines are logged and dropped. Returns the number forwarded
/// once the reader is exhausted or the inbox is closed.
pub async fn forward_lines<R>(
    reader: R,
    inbox: mpsc::Sender<ControlMessage>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode(line) {
            Ok(message) => {
                debug!(?message, "remote command");
                if inbox.send(message).await.is_err() {
                    info!("controller inbox closed, no longer reading commands");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => warn!(%line, "dropping remote command: {e}"),
        }
    }

    Ok(forwarded)
}
