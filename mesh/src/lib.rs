//! # Windowmesh
//! Serverless coordination for co-located window peers: discovery and
//! liveness gossip over a local broadcast bus, deterministic leader
//! election with a startup grace period, and a shared virtual-canvas layout
//! that every peer projects itself into.
//!
//! Each peer process instantiates one [`MeshEngine`], attaches a
//! [`Bus`] implementation, and calls [`MeshEngine::receive`] regularly;
//! all observable state flows through the engine's [`Store`].

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod backends;
mod codec;
mod constants;
mod engine;
mod geometry;
mod identity;
mod layout;
mod lifecycle;
mod messages;
mod protocol;
mod session;
mod state;
mod store;
mod transport;
mod types;

pub use backends::{Clock, ClockError, ManualClock, SystemClock, Timer};
pub use codec::{
    decode_layout, decode_screen_position, encode_layout, encode_screen_position, CodecError,
};
pub use constants::{
    CLEANUP_INTERVAL_MS, GRACE_PERIOD_TICKS, HEARTBEAT_INTERVAL_MS, WINDOW_TIMEOUT_MS,
};
pub use engine::{MeshConfig, MeshEngine};
pub use geometry::{union_all, Point, Rect};
pub use identity::PeerId;
pub use layout::{Layout, LayoutEngine, LayoutError, PlacementOverrides, Screen, LAYOUT_VERSION};
pub use messages::MeshMessage;
pub use session::{hash32, pair_hash, session_id};
pub use state::{EngineState, PeerSnapshot, SharedData};
pub use store::{Store, SubscriptionId};
pub use transport::{Bus, BusReceiver, BusSender, RecvError, SendError};
pub use types::TimestampMs;
