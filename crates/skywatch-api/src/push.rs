//! Push channel reader.
//!
//! Opens one WebSocket connection to the backend's push endpoint and hands
//! every decoded event to a callback until the connection ends or the
//! cancellation token fires. Reconnection is the caller's job: this module
//! owns a single connection lifecycle only.
//!
//! Two frame dialects are understood:
//! - plain JSON envelopes `{"event": "telemetry", "data": {...}}`
//! - Socket.IO v4 over Engine.IO v4 (`0{..}` open, `2` ping, `42["telemetry", {...}]`),
//!   which is what the Flask-SocketIO backend speaks on
//!   `/socket.io/?EIO=4&transport=websocket`.
//!
//! # Example
//!
//! ```rust,ignore
//! use skywatch_api::push::read_events;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! read_events(&url, None, &cancel, |event| {
//!     println!("{}: {}", event.name, event.data);
//! })
//! .await?;
//! ```

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── PushEvent ────────────────────────────────────────────────────────

/// A named event received over the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    /// Event name, e.g. `"telemetry"`, `"fire_alert"`.
    pub name: String,
    /// Event payload; `Value::Null` when the server sent none.
    pub data: Value,
}

// ── Frame decoding ───────────────────────────────────────────────────

/// What a single text frame asks of the reader.
#[derive(Debug, PartialEq)]
pub(crate) enum Frame {
    Event(PushEvent),
    /// Protocol reply to write back (namespace connect, pong).
    Reply(&'static str),
    /// Server-initiated namespace disconnect.
    Disconnect,
    Ignore,
}

#[derive(Debug, Deserialize)]
struct JsonEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Decode one text frame.
pub(crate) fn parse_frame(text: &str) -> Frame {
    if text.starts_with('{') {
        return match serde_json::from_str::<JsonEnvelope>(text) {
            Ok(env) => Frame::Event(PushEvent { name: env.event, data: env.data }),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to parse push envelope");
                Frame::Ignore
            }
        };
    }

    match text.as_bytes().first() {
        // Engine.IO open: join the default namespace.
        Some(b'0') => Frame::Reply("40"),
        // Engine.IO ping.
        Some(b'2') => Frame::Reply("3"),
        Some(b'4') => parse_socketio(&text[1..]),
        _ => Frame::Ignore,
    }
}

/// Decode a Socket.IO packet (the part after the Engine.IO `4` message type).
fn parse_socketio(packet: &str) -> Frame {
    match packet.as_bytes().first() {
        Some(b'1') => Frame::Disconnect,
        Some(b'2') => {
            // Optional ack id between the packet type and the JSON array.
            let body = packet[1..].trim_start_matches(|c: char| c.is_ascii_digit());
            match serde_json::from_str::<Vec<Value>>(body) {
                Ok(items) => {
                    let mut items = items.into_iter();
                    match items.next() {
                        Some(Value::String(name)) => Frame::Event(PushEvent {
                            name,
                            data: items.next().unwrap_or(Value::Null),
                        }),
                        _ => Frame::Ignore,
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to parse Socket.IO event");
                    Frame::Ignore
                }
            }
        }
        _ => Frame::Ignore,
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Connect, read frames until the connection drops, and pass each event to
/// `on_event`.
///
/// The bearer token, when given, is sent as an `Authorization` header on the
/// upgrade request. Returns `Ok(())` on a clean close or cancellation,
/// [`Error::Unauthorized`] when the upgrade is rejected with 401, and
/// [`Error::PushConnect`] / [`Error::PushClosed`] for everything else.
pub async fn read_events<F>(
    url: &Url,
    bearer: Option<&SecretString>,
    cancel: &CancellationToken,
    mut on_event: F,
) -> Result<(), Error>
where
    F: FnMut(PushEvent) + Send,
{
    tracing::info!(url = %url, "Connecting to push channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::PushConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = bearer {
        request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
    }

    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(()),
        result = tokio_tungstenite::connect_async(request) => result.map_err(map_connect_error)?,
    };

    tracing::info!("Push channel connected");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.close().await;
                return Ok(());
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => match parse_frame(&text) {
                        Frame::Event(event) => on_event(event),
                        Frame::Reply(reply) => {
                            write
                                .send(tungstenite::Message::text(reply))
                                .await
                                .map_err(|e| Error::PushConnect(e.to_string()))?;
                        }
                        Frame::Disconnect => {
                            tracing::info!("Push namespace disconnected by server");
                            return Ok(());
                        }
                        Frame::Ignore => {}
                    },
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return match frame {
                            Some(cf) => {
                                tracing::info!(code = %cf.code, reason = %cf.reason, "Push close frame received");
                                match u16::from(cf.code) {
                                    1000 | 1001 => Ok(()),
                                    code => Err(Error::PushClosed { code, reason: cf.reason.to_string() }),
                                }
                            }
                            None => Ok(()),
                        };
                    }
                    Some(Err(e)) => return Err(Error::PushConnect(e.to_string())),
                    None => {
                        tracing::info!("Push stream ended");
                        return Ok(());
                    }
                    // Binary, Ping, Pong, Frame: tungstenite answers pings itself
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

fn map_connect_error(e: tungstenite::Error) -> Error {
    match e {
        tungstenite::Error::Http(ref resp)
            if resp.status() == tungstenite::http::StatusCode::UNAUTHORIZED =>
        {
            Error::Unauthorized
        }
        other => Error::PushConnect(other.to_string()),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
