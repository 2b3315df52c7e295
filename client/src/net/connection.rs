//! WebSocket plumbing: connect, send, and read frames.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::net::types::Frame;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsWriter = SplitSink<WsStream, Message>;
pub type WsReader = SplitStream<WsStream>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket send failed: {0}")]
    Send(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Derive the gateway URL from the HTTP base URL.
///
/// # Errors
///
/// Returns an error when the base URL has no http/https scheme.
pub fn ws_url(base_url: &str) -> Result<String, ConnectionError> {
    if let Some(rest) = base_url.strip_prefix("https://") {
        Ok(format!("wss://{rest}/api/ws"))
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        Ok(format!("ws://{rest}/api/ws"))
    } else {
        Err(ConnectionError::InvalidBaseUrl(base_url.to_string()))
    }
}

/// Open the WebSocket and split it for independent read/write halves.
///
/// # Errors
///
/// Returns an error when the URL is invalid or the handshake fails.
pub async fn connect(base_url: &str) -> Result<(WsWriter, WsReader), ConnectionError> {
    let url = ws_url(base_url)?;
    let (stream, _resp) = connect_async(&url)
        .await
        .map_err(|e| ConnectionError::Connect(Box::new(e)))?;
    Ok(stream.split())
}

/// Serialize and send one frame.
///
/// # Errors
///
/// Returns an error when the socket write fails.
pub async fn send_frame(writer: &mut WsWriter, frame: &Frame) -> Result<(), ConnectionError> {
    let json = serde_json::to_string(frame)?;
    writer
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| ConnectionError::Send(Box::new(e)))
}

/// Read the next parseable frame. Returns `None` once the stream closes.
/// Non-text messages and unparseable payloads are skipped.
pub async fn next_frame(reader: &mut WsReader) -> Option<Frame> {
    while let Some(msg) = reader.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(frame) = serde_json::from_str::<Frame>(&text) {
                    return Some(frame);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;
