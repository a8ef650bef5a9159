use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::PeerId;
use crate::layout::Layout;
use crate::state::PeerSnapshot;
use crate::types::TimestampMs;

/// Every message that travels the session bus.
///
/// Adjacently tagged, so transports carrying JSON dispatch on the `type`
/// discriminator and can drop anything without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeshMessage {
    /// New peer announcement.
    Hello(PeerSnapshot),
    /// Liveness plus the sender's latest rect.
    Heartbeat(PeerSnapshot),
    /// Graceful departure.
    Goodbye { id: PeerId },
    /// Authoritative layout from the leader.
    LayoutUpdate(Layout),
    /// Explicit preemption; receivers step down.
    LeaderClaim { id: PeerId, timestamp: TimestampMs },
    /// Newcomer asking the leader to rebroadcast the layout.
    RequestLayout { id: PeerId },
    /// Last-write-wins shared map entry.
    SharedDataUpdate { key: String, value: Value },
}

impl MeshMessage {
    /// The id of the sending peer, when the variant carries one.
    pub fn sender(&self) -> Option<&PeerId> {
        match self {
            MeshMessage::Hello(snapshot) | MeshMessage::Heartbeat(snapshot) => Some(&snapshot.id),
            MeshMessage::Goodbye { id }
            | MeshMessage::LeaderClaim { id, .. }
            | MeshMessage::RequestLayout { id } => Some(id),
            MeshMessage::LayoutUpdate(_) | MeshMessage::SharedDataUpdate { .. } => None,
        }
    }
}
