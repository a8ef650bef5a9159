//! Abstract duplex message bus scoped to a session channel.
//!
//! Any implementation that delivers messages in order per sender, does not
//! echo back to the sender, and supports channel naming satisfies the
//! contract. Implementations silently drop inbound payloads that fail to
//! decode; malformed input never reaches the engine.

use crate::messages::MeshMessage;

/// Error returned when a broadcast could not be handed to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendError;

/// Error returned when the inbound side of the bus failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvError;

/// A bus that can be attached to a named session channel, yielding the two
/// endpoint halves.
pub trait Bus {
    fn connect(self: Box<Self>, channel: &str) -> (Box<dyn BusSender>, Box<dyn BusReceiver>);
}

/// Outbound half: fire-and-forget fan-out on the session channel.
pub trait BusSender: Send + Sync {
    /// Delivers `message` to every other peer currently attached to the same
    /// channel. Must not echo back to this sender.
    fn broadcast(&self, message: &MeshMessage) -> Result<(), SendError>;
}

/// Inbound half, polled by the engine.
pub trait BusReceiver: Send + Sync {
    /// Returns the next pending message, or `None` when the queue is empty.
    fn try_receive(&mut self) -> Result<Option<MeshMessage>, RecvError>;
}
