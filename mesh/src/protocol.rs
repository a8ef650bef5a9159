//! Inbound message reactions and outbound self-publication.

use std::sync::Arc;

use log::warn;

use crate::backends::Clock;
use crate::geometry::Rect;
use crate::identity::PeerId;
use crate::layout::LayoutEngine;
use crate::messages::MeshMessage;
use crate::state::{EngineState, PeerSnapshot};
use crate::store::Store;
use crate::transport::BusSender;
use crate::types::TimestampMs;

/// Ingests bus messages, mutates the Store, and triggers layout work where a
/// message changes the world.
pub struct ProtocolHandler {
    clock: Arc<dyn Clock>,
    /// Wall time at engine birth; carried in every self snapshot as the
    /// primary election key.
    created_at: TimestampMs,
}

impl ProtocolHandler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let created_at = clock.now_ms();
        Self { clock, created_at }
    }

    pub fn process(
        &self,
        store: &Store<EngineState>,
        layout_engine: &LayoutEngine,
        sender: Option<&dyn BusSender>,
        message: MeshMessage,
    ) {
        // id-only variants refresh the sender's liveness here; HELLO and
        // HEARTBEAT carry a full snapshot and GOODBYE removes the entry, so
        // they manage `peers` in their own arms below
        match &message {
            MeshMessage::LeaderClaim { .. } | MeshMessage::RequestLayout { .. } => {
                if let Some(id) = message.sender() {
                    self.touch_peer(store, id);
                }
            }
            _ => {}
        }

        match message {
            MeshMessage::Hello(snapshot) | MeshMessage::Heartbeat(snapshot) => {
                self.on_peer_snapshot(store, layout_engine, sender, snapshot);
            }
            MeshMessage::Goodbye { id } => {
                self.on_goodbye(store, layout_engine, sender, &id);
            }
            MeshMessage::LayoutUpdate(new_layout) => {
                let state = store.get();
                if state.is_leader {
                    // leaders are the source of truth
                    return;
                }
                if state.layout.as_ref() == Some(&new_layout) {
                    return;
                }
                store.update(|s| s.layout = Some(new_layout));
                layout_engine.recompute_local_view(store);
            }
            MeshMessage::SharedDataUpdate { key, value } => {
                store.update(|s| {
                    s.shared_data.insert(key, value);
                });
            }
            MeshMessage::RequestLayout { .. } => {
                let state = store.get();
                if !state.is_leader {
                    return;
                }
                layout_engine.recompute_world(store, sender);
                // replay the whole shared map so the newcomer converges
                // without waiting for organic writes
                if let Some(sender) = sender {
                    for (key, value) in state.shared_data {
                        let message = MeshMessage::SharedDataUpdate { key, value };
                        if sender.broadcast(&message).is_err() {
                            warn!("Failed to replay shared data entry");
                        }
                    }
                }
            }
            MeshMessage::LeaderClaim { .. } => {
                // unconditional step-down; the next tick re-adjudicates
                if store.with(|s| s.is_leader) {
                    store.update(|s| s.is_leader = false);
                }
            }
        }
    }

    fn on_peer_snapshot(
        &self,
        store: &Store<EngineState>,
        layout_engine: &LayoutEngine,
        sender: Option<&dyn BusSender>,
        snapshot: PeerSnapshot,
    ) {
        let state = store.get();
        if snapshot.id == state.window_id {
            // loopback guard for transports that echo
            return;
        }

        let material_change = match state.peers.get(&snapshot.id) {
            None => true,
            Some(known) => {
                known.rect != snapshot.rect || known.virtual_rect != snapshot.virtual_rect
            }
        };

        let now = self.clock.now_ms();
        store.update(|s| {
            let mut entry = snapshot.clone();
            entry.last_seen = now;
            s.peers.insert(entry.id.clone(), entry);
        });

        if material_change && state.is_leader {
            layout_engine.recompute_world(store, sender);
        }
    }

    fn on_goodbye(
        &self,
        store: &Store<EngineState>,
        layout_engine: &LayoutEngine,
        sender: Option<&dyn BusSender>,
        id: &PeerId,
    ) {
        store.update(|s| {
            s.peers.remove(id);
        });
        // every peer shrinks its local copy immediately; the leader follows
        // up with the authoritative recompute
        layout_engine.prune_screen(store, id.as_str());
        let state = store.get();
        if state.is_leader && state.static_layout.is_none() {
            layout_engine.recompute_world(store, sender);
        }
    }

    /// Emits a HELLO (on announce) or HEARTBEAT with the current self
    /// snapshot and refreshes our own entry in `peers`.
    pub fn publish_self(
        &self,
        store: &Store<EngineState>,
        sender: Option<&dyn BusSender>,
        announce: bool,
    ) {
        let now = self.clock.now_ms();
        let state = store.get();
        let snapshot = PeerSnapshot {
            id: state.window_id.clone(),
            created_at: self.created_at,
            last_seen: now,
            rect: state.win_rect,
            assigned_screen_id: state.assigned_screen_id.clone(),
            virtual_rect: state.virtual_rect,
            timestamp: now,
        };
        store.update(|s| {
            s.peers.insert(snapshot.id.clone(), snapshot.clone());
        });
        if let Some(sender) = sender {
            let message = if announce {
                MeshMessage::Hello(snapshot)
            } else {
                MeshMessage::Heartbeat(snapshot)
            };
            if sender.broadcast(&message).is_err() {
                warn!("Failed to broadcast self snapshot");
            }
        }
    }

    /// Emits a REQUEST_LAYOUT for this peer.
    pub fn request_layout(&self, store: &Store<EngineState>, sender: Option<&dyn BusSender>) {
        let Some(sender) = sender else {
            return;
        };
        let id = store.with(|s| s.window_id.clone());
        if sender.broadcast(&MeshMessage::RequestLayout { id }).is_err() {
            warn!("Failed to broadcast layout request");
        }
    }

    pub fn created_at(&self) -> TimestampMs {
        self.created_at
    }

    /// Entries are created on any inbound message: a known sender gets
    /// `last_seen` bumped, an unknown one a placeholder snapshot. The zero
    /// rect keeps the placeholder out of layouts and `created_at = now`
    /// keeps it from winning elections before its first real heartbeat.
    fn touch_peer(&self, store: &Store<EngineState>, id: &PeerId) {
        let now = self.clock.now_ms();
        if store.with(|s| s.window_id == *id) {
            return;
        }
        store.update(|s| match s.peers.get_mut(id) {
            Some(entry) => entry.last_seen = now,
            None => {
                s.peers.insert(
                    id.clone(),
                    PeerSnapshot {
                        id: id.clone(),
                        created_at: now,
                        last_seen: now,
                        rect: Rect::default(),
                        assigned_screen_id: None,
                        virtual_rect: None,
                        timestamp: now,
                    },
                );
            }
        });
    }
}
