//! The per-peer engine façade.

use std::sync::Arc;

use log::warn;
use serde_json::Value;

use crate::backends::{Clock, SystemClock};
use crate::geometry::{Point, Rect};
use crate::identity::PeerId;
use crate::layout::{Layout, LayoutEngine, PlacementOverrides};
use crate::lifecycle::LifecycleLoop;
use crate::messages::MeshMessage;
use crate::protocol::ProtocolHandler;
use crate::session;
use crate::state::EngineState;
use crate::store::Store;
use crate::transport::{Bus, BusReceiver, BusSender};

/// Boot configuration for one peer.
pub struct MeshConfig {
    /// Own identifier; generated when absent. Never persist one across boots.
    pub window_id: Option<PeerId>,
    /// Initial physical rectangle of this window.
    pub rect: Rect,
    /// Physical display rect, when the host has discovered one.
    pub display_rect: Option<Rect>,
    /// Pinned layout that overrides all dynamic computation.
    pub static_layout: Option<Layout>,
    /// Layout descriptor string whose hash selects the session channel.
    pub session_seed: String,
    /// Forces this peer onto the named screen.
    pub screen_id_override: Option<String>,
    /// Forces the relative position on the assigned screen.
    pub screen_position_override: Option<Point>,
    /// Time source; defaults to the system wall clock.
    pub clock: Option<Arc<dyn Clock>>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            window_id: None,
            rect: Rect::default(),
            display_rect: None,
            static_layout: None,
            session_seed: String::new(),
            screen_id_override: None,
            screen_position_override: None,
            clock: None,
        }
    }
}

/// One peer's coordination engine.
///
/// Composes the store, the protocol handler, the lifecycle loop, and the
/// layout engine. The host constructs it, attaches a bus with [`connect`],
/// and calls [`receive`] regularly; everything else is read through the
/// store's subscriptions.
///
/// [`connect`]: MeshEngine::connect
/// [`receive`]: MeshEngine::receive
pub struct MeshEngine {
    store: Store<EngineState>,
    clock: Arc<dyn Clock>,
    protocol: ProtocolHandler,
    lifecycle: LifecycleLoop,
    layout_engine: LayoutEngine,
    session_id: String,
    sender: Option<Box<dyn BusSender>>,
    receiver: Option<Box<dyn BusReceiver>>,
    disposed: bool,
}

impl MeshEngine {
    pub fn new(config: MeshConfig) -> Self {
        let clock: Arc<dyn Clock> = config.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let now = clock.now_ms();
        let window_id = config.window_id.unwrap_or_else(PeerId::generate);
        let session_id = session::session_id(&config.session_seed);

        let state = EngineState {
            window_id,
            win_rect: config.rect,
            display_rect: config.display_rect,
            static_layout: config.static_layout,
            ..EngineState::default()
        };

        Self {
            store: Store::new(state),
            protocol: ProtocolHandler::new(clock.clone()),
            lifecycle: LifecycleLoop::new(now),
            layout_engine: LayoutEngine::new(PlacementOverrides {
                screen_id: config.screen_id_override,
                screen_position: config.screen_position_override,
            }),
            session_id,
            clock,
            sender: None,
            receiver: None,
            disposed: false,
        }
    }

    /// The session channel derived from this engine's boot descriptor.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Read access to the reactive state container.
    pub fn store(&self) -> &Store<EngineState> {
        &self.store
    }

    pub fn window_id(&self) -> PeerId {
        self.store.with(|s| s.window_id.clone())
    }

    // Session

    /// Attaches the bus to the session channel and announces this peer: one
    /// immediate HELLO plus one layout request.
    pub fn connect<B: Into<Box<dyn Bus>>>(&mut self, bus: B) {
        if self.disposed {
            return;
        }
        let (sender, receiver) = bus.into().connect(&self.session_id);
        self.sender = Some(sender);
        self.receiver = Some(receiver);
        self.protocol
            .publish_self(&self.store, self.sender.as_deref(), true);
        self.protocol
            .request_layout(&self.store, self.sender.as_deref());
    }

    /// Must be called regularly: drains inbound messages, then runs whatever
    /// periodic work has come due.
    pub fn receive(&mut self) {
        if self.disposed {
            return;
        }
        // inbound first, so the ticks observe the freshest peer set
        if let Some(receiver) = self.receiver.as_mut() {
            loop {
                match receiver.try_receive() {
                    Ok(Some(message)) => self.protocol.process(
                        &self.store,
                        &self.layout_engine,
                        self.sender.as_deref(),
                        message,
                    ),
                    Ok(None) => break,
                    Err(_) => {
                        warn!("Session bus receive failed");
                        break;
                    }
                }
            }
        }
        let now = self.clock.now_ms();
        self.lifecycle.run_due(
            now,
            &self.store,
            &self.protocol,
            &self.layout_engine,
            self.sender.as_deref(),
        );
    }

    // State entry points

    /// Signals that this window's physical rect changed.
    pub fn update_rect(&mut self, rect: Rect) {
        if self.disposed {
            return;
        }
        self.store.update(|s| s.win_rect = rect);
        self.layout_engine.recompute_local_view(&self.store);
        self.protocol
            .publish_self(&self.store, self.sender.as_deref(), false);
        if self.store.with(|s| s.is_leader) {
            self.layout_engine
                .recompute_world(&self.store, self.sender.as_deref());
        }
    }

    /// Installs or clears the static layout override.
    pub fn set_static_layout(&mut self, layout: Option<Layout>) {
        if self.disposed {
            return;
        }
        self.store.update(|s| s.static_layout = layout);
        if self.store.with(|s| s.is_leader) {
            self.layout_engine
                .recompute_world(&self.store, self.sender.as_deref());
        }
    }

    /// Writes a shared-data entry locally and broadcasts it.
    pub fn set_shared_data(&mut self, key: impl Into<String>, value: Value) {
        if self.disposed {
            return;
        }
        let key = key.into();
        let broadcast_value = value.clone();
        let broadcast_key = key.clone();
        self.store.update(|s| {
            s.shared_data.insert(key, value);
        });
        if let Some(sender) = self.sender.as_deref() {
            let message = MeshMessage::SharedDataUpdate {
                key: broadcast_key,
                value: broadcast_value,
            };
            if sender.broadcast(&message).is_err() {
                warn!("Failed to broadcast shared data update");
            }
        }
    }

    /// Leaves the session: broadcasts a GOODBYE (best effort), severs the
    /// bus, and turns every further call into a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(sender) = self.sender.as_deref() {
            let id = self.store.with(|s| s.window_id.clone());
            if sender.broadcast(&MeshMessage::Goodbye { id }).is_err() {
                warn!("Failed to broadcast goodbye during dispose");
            }
        }
        self.sender = None;
        self.receiver = None;
    }
}
