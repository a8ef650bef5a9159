use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{Point, Rect};
use crate::identity::PeerId;
use crate::layout::Layout;
use crate::types::TimestampMs;

/// Everything one peer knows (or has derived) about a peer, self included.
/// Travels inside HELLO and HEARTBEAT messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    pub id: PeerId,
    /// Wall time at peer birth; the primary leader-election key.
    pub created_at: TimestampMs,
    /// Updated on each inbound message from this peer.
    pub last_seen: TimestampMs,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_screen_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_rect: Option<Rect>,
    /// Wall time this snapshot was taken.
    pub timestamp: TimestampMs,
}

/// Replicated key→value map with last-write-wins semantics.
pub type SharedData = HashMap<String, Value>;

/// The Store's content: the full observable state of one engine.
///
/// `assigned_screen_id`, `viewport_offset`, and `virtual_rect` are
/// derived-only outputs of the layout engine; external collaborators read
/// them via subscription and never write them.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    /// Own identifier, unique per process lifetime.
    pub window_id: PeerId,
    /// Own current physical rectangle.
    pub win_rect: Rect,
    /// Physical display rect, when the host was able to discover one. Feeds
    /// the dimension-similarity screen assignment.
    pub display_rect: Option<Rect>,
    /// Latest snapshot per known peer, self included; entries are evicted
    /// when stale.
    pub peers: HashMap<PeerId, PeerSnapshot>,
    /// Current globally agreed layout, or `None` until first observation.
    pub layout: Option<Layout>,
    pub assigned_screen_id: Option<String>,
    /// Translation from frame coordinates to local content coordinates.
    pub viewport_offset: Point,
    /// This peer's rectangle in frame coordinates.
    pub virtual_rect: Option<Rect>,
    pub is_leader: bool,
    pub leader_id: Option<PeerId>,
    pub shared_data: SharedData,
    /// Pinned layout that overrides all dynamic computation.
    pub static_layout: Option<Layout>,
}
