//! WebSocket bridge: a dedicated Tokio thread that owns the socket.
//!
//! ## Threading model
//!
//! ```text
//! Frame-loop thread            │  Bridge thread (Tokio current-thread)
//! ──────────────────────────── │ ─────────────────────────────────────
//! ArenaClient::pump            │ run_bridge()
//!   → BridgeHandle::poll       │   read.next()  → parse_frame
//!   → events.try_recv()        │   → event_tx.try_send(ArenaEvent)
//!                              │
//! ArenaClient::send            │
//!   → encode (JSON)            │   every 8 ms: outbound.try_recv()
//!   → outbound.try_send(text)  │   → write.send(Message::text)
//! ```
//!
//! The frame loop never touches async code.  It only reads from and writes
//! to bounded `crossbeam_channel` queues, so a slow socket can never stall a
//! frame: inbound events are dropped when the event queue is full and
//! outbound sends fail fast with [`ConnectionError::QueueFull`].

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::events::{parse_frame, ArenaEvent};
use crate::protocol::{encode, ClientMessage};
use crate::types::ClientConfig;

const OUTBOUND_POLL: Duration = Duration::from_millis(8);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Server URL (e.g. "ws://localhost:8080")
    pub endpoint: String,
    /// How deep to buffer inbound events before dropping (back-pressure)
    pub event_buffer: usize,
    /// How deep to buffer outbound messages before refusing sends
    pub intent_buffer: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for BridgeConfig {
    fn from(c: &ClientConfig) -> Self {
        Self {
            endpoint: c.endpoint.clone(),
            event_buffer: c.event_buffer.max(1),
            intent_buffer: c.intent_buffer.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared link state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LinkState {
    open: bool,
    closed_reason: Option<String>,
}

type SharedLink = Arc<Mutex<LinkState>>;

fn mark_closed(link: &SharedLink, reason: &str) {
    let mut s = link.lock();
    s.open = false;
    s.closed_reason.get_or_insert_with(|| reason.to_string());
}

// ---------------------------------------------------------------------------
// Handle (owned by the frame loop)
// ---------------------------------------------------------------------------

pub struct BridgeHandle {
    events: Receiver<ArenaEvent>,
    outbound: Sender<String>,
    link: SharedLink,
    _thread: thread::JoinHandle<()>,
}

impl BridgeHandle {
    /// Why the link closed, once it has.
    pub fn closed_reason(&self) -> Option<String> {
        self.link.lock().closed_reason.clone()
    }
}

impl Connection for BridgeHandle {
    fn send(&mut self, msg: &ClientMessage) -> Result<(), ConnectionError> {
        if !self.is_open() {
            return Err(ConnectionError::Closed);
        }
        let text = encode(msg)?;
        self.outbound.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => ConnectionError::QueueFull,
            TrySendError::Disconnected(_) => ConnectionError::Closed,
        })
    }

    fn poll(&mut self) -> Vec<ArenaEvent> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(ev) => out.push(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    fn is_open(&self) -> bool {
        self.link.lock().open
    }
}

// ---------------------------------------------------------------------------
// Spawning the bridge thread
// ---------------------------------------------------------------------------

/// Spawn the bridge thread and return its [`BridgeHandle`].
///
/// Connection failures are not errors here; they arrive later as
/// [`ArenaEvent::Disconnected`].
pub fn spawn(config: BridgeConfig) -> std::io::Result<BridgeHandle> {
    let (event_tx, event_rx) = crossbeam_channel::bounded::<ArenaEvent>(config.event_buffer);
    let (out_tx, out_rx) = crossbeam_channel::bounded::<String>(config.intent_buffer);
    let link: SharedLink = Arc::new(Mutex::new(LinkState {
        open: true,
        closed_reason: None,
    }));

    let thread_link = link.clone();
    let handle = thread::Builder::new()
        .name("petal-arena-bridge".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let reason = format!("failed to start bridge runtime: {}", e);
                    log::error!("[bridge] {}", reason);
                    mark_closed(&thread_link, &reason);
                    let _ = event_tx.try_send(ArenaEvent::Disconnected { reason });
                    return;
                }
            };
            rt.block_on(run_bridge(config, event_tx, out_rx, thread_link));
        })?;

    Ok(BridgeHandle {
        events: event_rx,
        outbound: out_tx,
        link,
        _thread: handle,
    })
}

// ---------------------------------------------------------------------------
// Async bridge implementation
// ---------------------------------------------------------------------------

enum Step {
    Inbound(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Outbound,
}

async fn run_bridge(
    config: BridgeConfig,
    event_tx: Sender<ArenaEvent>,
    out_rx: Receiver<String>,
    link: SharedLink,
) {
    log::info!("[bridge] connecting to {}", config.endpoint);

    let ws = match tokio_tungstenite::connect_async(config.endpoint.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            let reason = format!("connect failed: {}", e);
            log::error!("[bridge] {}", reason);
            mark_closed(&link, &reason);
            let _ = event_tx.try_send(ArenaEvent::Disconnected { reason });
            return;
        }
    };

    log::info!("[bridge] connected");
    let _ = event_tx.try_send(ArenaEvent::Connected);

    let (mut write, mut read) = ws.split();

    let reason = 'run: loop {
        let step = tokio::select! {
            msg = read.next() => Step::Inbound(msg),
            _ = tokio::time::sleep(OUTBOUND_POLL) => Step::Outbound,
        };

        match step {
            Step::Inbound(Some(Ok(Message::Text(text)))) => {
                if let Some(ev) = parse_frame(text.as_str()) {
                    if event_tx.try_send(ev).is_err() {
                        log::warn!("[bridge] event queue full, dropping event");
                    }
                }
            }
            Step::Inbound(Some(Ok(Message::Close(frame)))) => {
                break frame
                    .map(|f| f.reason.as_str().to_owned())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "server closed connection".into());
            }
            // Pings are answered by tungstenite; binary frames are not part
            // of the protocol.
            Step::Inbound(Some(Ok(_))) => {}
            Step::Inbound(Some(Err(e))) => break format!("socket error: {}", e),
            Step::Inbound(None) => break "server closed connection".into(),
            Step::Outbound => loop {
                match out_rx.try_recv() {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::text(text)).await {
                            break 'run format!("send failed: {}", e);
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        let _ = write.send(Message::Close(None)).await;
                        break 'run "client shut down".into();
                    }
                }
            },
        }
    };

    log::info!("[bridge] disconnected: {}", reason);
    mark_closed(&link, &reason);
    let _ = event_tx.try_send(ArenaEvent::Disconnected { reason });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_client_config() {
        let c = BridgeConfig::from(&ClientConfig {
            endpoint: "ws://arena:9000".into(),
            event_buffer: 0,
            ..Default::default()
        });
        assert_eq!(c.endpoint, "ws://arena:9000");
        assert_eq!(c.event_buffer, 1);
        assert_eq!(c.intent_buffer, 64);
    }

    #[test]
    fn unreachable_server_reports_disconnect() {
        // Port 9 (discard) on localhost is refused on any sane test box.
        let mut handle = spawn(BridgeConfig {
            endpoint: "ws://127.0.0.1:9".into(),
            ..Default::default()
        })
        .unwrap();

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(handle.poll());
            if !events.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(&events[..], [ArenaEvent::Disconnected { .. }]));
        assert!(!handle.is_open());
        assert!(handle.closed_reason().is_some());
        assert!(matches!(
            handle.send(&ClientMessage::AttackTick),
            Err(ConnectionError::Closed)
        ));
    }
}
