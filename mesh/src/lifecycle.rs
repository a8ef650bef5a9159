//! The periodic heartbeat and cleanup ticks, and the deterministic leader
//! election they drive.

use log::{info, warn};

use crate::backends::Timer;
use crate::constants::{
    CLEANUP_INTERVAL_MS, GRACE_PERIOD_TICKS, HEARTBEAT_INTERVAL_MS, WINDOW_TIMEOUT_MS,
};
use crate::identity::PeerId;
use crate::layout::LayoutEngine;
use crate::messages::MeshMessage;
use crate::protocol::ProtocolHandler;
use crate::state::EngineState;
use crate::store::Store;
use crate::transport::BusSender;
use crate::types::TimestampMs;

/// Runs the two periodic tasks on the engine's serialized executor and
/// adjudicates leadership every heartbeat.
pub struct LifecycleLoop {
    heartbeat: Timer,
    cleanup: Timer,
    tick_count: u32,
}

impl LifecycleLoop {
    pub fn new(now_ms: TimestampMs) -> Self {
        Self {
            heartbeat: Timer::new(HEARTBEAT_INTERVAL_MS, now_ms),
            cleanup: Timer::new(CLEANUP_INTERVAL_MS, now_ms),
            tick_count: 0,
        }
    }

    /// Runs whichever periodic work has come due: heartbeat first, then
    /// cleanup.
    pub fn run_due(
        &mut self,
        now: TimestampMs,
        store: &Store<EngineState>,
        protocol: &ProtocolHandler,
        layout_engine: &LayoutEngine,
        sender: Option<&dyn BusSender>,
    ) {
        if self.heartbeat.ringing(now) {
            self.heartbeat.reset(now);
            self.heartbeat_tick(now, store, protocol, layout_engine, sender);
        }
        if self.cleanup.ringing(now) {
            self.cleanup.reset(now);
            self.cleanup_tick(now, store, layout_engine, sender);
        }
    }

    fn heartbeat_tick(
        &mut self,
        now: TimestampMs,
        store: &Store<EngineState>,
        protocol: &ProtocolHandler,
        layout_engine: &LayoutEngine,
        sender: Option<&dyn BusSender>,
    ) {
        protocol.publish_self(store, sender, false);

        if self.tick_count < GRACE_PERIOD_TICKS {
            // no election yet: concurrently-starting peers get a chance to
            // discover each other first
            self.tick_count += 1;
            return;
        }

        let state = store.get();
        let Some(leader_id) = elect(&state, now) else {
            return;
        };

        if state.leader_id.as_ref() != Some(&leader_id) {
            let elected = leader_id.clone();
            store.update(|s| s.leader_id = Some(elected));
        }

        if !state.is_leader && state.layout.is_none() {
            // recovers late joiners when the leader's spontaneous heartbeats
            // are throttled
            protocol.request_layout(store, sender);
        }

        let elected_self = leader_id == state.window_id;
        if elected_self && !state.is_leader {
            info!("Assuming leadership of the session");
            store.update(|s| s.is_leader = true);
            if let Some(sender) = sender {
                let claim = MeshMessage::LeaderClaim {
                    id: state.window_id.clone(),
                    timestamp: now,
                };
                if sender.broadcast(&claim).is_err() {
                    warn!("Failed to broadcast leader claim");
                }
            }
            layout_engine.recompute_world(store, sender);
        } else if !elected_self && state.is_leader {
            info!("Stepping down: older peer {} leads the session", leader_id);
            store.update(|s| s.is_leader = false);
        }
    }

    fn cleanup_tick(
        &mut self,
        now: TimestampMs,
        store: &Store<EngineState>,
        layout_engine: &LayoutEngine,
        sender: Option<&dyn BusSender>,
    ) {
        let state = store.get();
        let stale: Vec<PeerId> = state
            .peers
            .values()
            .filter(|p| p.id != state.window_id) // self is never removed
            .filter(|p| now.saturating_sub(p.last_seen) > WINDOW_TIMEOUT_MS)
            .map(|p| p.id.clone())
            .collect();
        if stale.is_empty() {
            return;
        }
        store.update(|s| {
            for id in &stale {
                s.peers.remove(id);
            }
        });
        let state = store.get();
        if state.is_leader && state.static_layout.is_none() {
            layout_engine.recompute_world(store, sender);
        }
    }
}

/// Deterministic election over the current peer set: smallest `created_at`
/// wins, ties broken by the lexicographically smallest id. Only peers heard
/// within the window timeout are candidates; self always is.
pub(crate) fn elect(state: &EngineState, now: TimestampMs) -> Option<PeerId> {
    let mut best: Option<(TimestampMs, &PeerId)> = None;
    for peer in state.peers.values() {
        let is_self = peer.id == state.window_id;
        if !is_self && now.saturating_sub(peer.last_seen) > WINDOW_TIMEOUT_MS {
            continue;
        }
        let candidate = (peer.created_at, &peer.id);
        if best.map_or(true, |b| candidate < b) {
            best = Some(candidate);
        }
    }
    best.map(|(_, id)| id.clone())
}
