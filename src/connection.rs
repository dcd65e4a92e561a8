//! Connection Adapter seam.
//!
//! The frame loop talks to the server only through [`Connection`]: a
//! non-blocking `send` for intents and a non-blocking `poll` that drains
//! inbound events.  [`crate::bridge`] implements it over a WebSocket; the
//! in-process [`MemoryConnection`] implements it for headless runs and tests.

use std::collections::VecDeque;

use crate::error::ConnectionError;
use crate::events::ArenaEvent;
use crate::protocol::ClientMessage;

pub trait Connection {
    /// Queue `msg` for the server.  Fire-and-forget: no reply is awaited.
    fn send(&mut self, msg: &ClientMessage) -> Result<(), ConnectionError>;

    /// Drain every event that arrived since the last call, in arrival order.
    fn poll(&mut self) -> Vec<ArenaEvent>;

    /// False once the channel has closed; sends will fail from then on.
    fn is_open(&self) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory connection
// ---------------------------------------------------------------------------

/// Loopback connection: records what the client sends and replays events
/// pushed with [`MemoryConnection::deliver`].
#[derive(Debug)]
pub struct MemoryConnection {
    open: bool,
    inbound: VecDeque<ArenaEvent>,
    sent: Vec<ClientMessage>,
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            open: true,
            inbound: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Queue an event for the next `poll`.
    pub fn deliver(&mut self, event: ArenaEvent) {
        self.inbound.push_back(event);
    }

    /// Close the channel, queueing the matching `Disconnected` event.
    pub fn close(&mut self, reason: &str) {
        if self.open {
            self.open = false;
            self.inbound.push_back(ArenaEvent::Disconnected {
                reason: reason.into(),
            });
        }
    }

    pub fn sent(&self) -> &[ClientMessage] {
        &self.sent
    }

    /// Sent messages other than the per-tick movement and heartbeat traffic.
    pub fn sent_actions(&self) -> Vec<&ClientMessage> {
        self.sent
            .iter()
            .filter(|m| !m.is_movement() && !matches!(m, ClientMessage::AttackTick))
            .collect()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Connection for MemoryConnection {
    fn send(&mut self, msg: &ClientMessage) -> Result<(), ConnectionError> {
        if !self.open {
            return Err(ConnectionError::Closed);
        }
        self.sent.push(msg.clone());
        Ok(())
    }

    fn poll(&mut self) -> Vec<ArenaEvent> {
        self.inbound.drain(..).collect()
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn send(&mut self, msg: &ClientMessage) -> Result<(), ConnectionError> {
        (**self).send(msg)
    }

    fn poll(&mut self) -> Vec<ArenaEvent> {
        (**self).poll()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_connection_refuses_sends() {
        let mut c = MemoryConnection::new();
        assert!(c.send(&ClientMessage::AttackTick).is_ok());
        c.close("bye");
        assert!(!c.is_open());
        assert!(matches!(
            c.send(&ClientMessage::AttackTick),
            Err(ConnectionError::Closed)
        ));
        assert_eq!(c.sent().len(), 1);

        let events = c.poll();
        assert!(matches!(&events[..], [ArenaEvent::Disconnected { reason }] if reason == "bye"));
    }

    #[test]
    fn poll_drains_in_arrival_order() {
        let mut c = MemoryConnection::new();
        c.deliver(ArenaEvent::Welcome {
            player_id: "a".into(),
        });
        c.deliver(ArenaEvent::Respawn);
        let events = c.poll();
        assert!(matches!(events[0], ArenaEvent::Welcome { .. }));
        assert!(matches!(events[1], ArenaEvent::Respawn));
        assert!(c.poll().is_empty());
    }
}
