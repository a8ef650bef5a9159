use log::warn;

use crate::geometry::{Point, Rect};
use crate::messages::MeshMessage;
use crate::session;
use crate::state::{EngineState, PeerSnapshot};
use crate::store::Store;
use crate::transport::BusSender;

use super::{Layout, Screen};

/// Boot-time overrides pinning this peer's place in the layout.
#[derive(Debug, Clone, Default)]
pub struct PlacementOverrides {
    /// Forces this peer onto the named screen, when present in the layout.
    pub screen_id: Option<String>,
    /// Forces the relative position on the assigned screen.
    pub screen_position: Option<Point>,
}

/// Computes the global frame (leader side) and projects this peer into its
/// viewport (every peer). Both operations are idempotent over equal inputs.
pub struct LayoutEngine {
    overrides: PlacementOverrides,
}

impl LayoutEngine {
    pub fn new(overrides: PlacementOverrides) -> Self {
        Self { overrides }
    }

    /// Leader-side recomputation: one screen per live peer with a positive
    /// rect (or the static override), frame from their union, then a
    /// broadcast of the result.
    ///
    /// A validation failure aborts the recompute and leaves the previous
    /// layout intact. Receivers treat an identical re-broadcast as a no-op.
    pub fn recompute_world(&self, store: &Store<EngineState>, sender: Option<&dyn BusSender>) {
        let state = store.get();
        if !state.is_leader {
            return;
        }

        let layout = if let Some(static_layout) = &state.static_layout {
            match static_layout.validate() {
                Ok(()) => static_layout.clone(),
                Err(e) => {
                    warn!("Static layout rejected: {}", e);
                    return;
                }
            }
        } else {
            let mut contributors: Vec<&PeerSnapshot> = state.peers.values().collect();
            contributors.sort_by(|a, b| a.id.cmp(&b.id));

            let screens: Vec<Screen> = contributors
                .into_iter()
                .filter_map(|peer| {
                    let rect = peer.virtual_rect.unwrap_or(peer.rect);
                    rect.is_positive().then(|| Screen {
                        id: peer.id.to_string(),
                        rect,
                        scale: None,
                    })
                })
                .collect();
            if screens.is_empty() {
                return;
            }
            match Layout::from_screens(screens) {
                Ok(layout) => layout,
                Err(e) => {
                    warn!("Layout recompute failed validation: {}", e);
                    return;
                }
            }
        };

        if state.layout.as_ref() != Some(&layout) {
            let installed = layout.clone();
            store.update(|s| s.layout = Some(installed));
            self.recompute_local_view(store);
        }
        if let Some(sender) = sender {
            if sender.broadcast(&MeshMessage::LayoutUpdate(layout)).is_err() {
                warn!("Failed to broadcast layout update");
            }
        }
    }

    /// Projects this peer into the active layout: assigned screen, virtual
    /// rect, and viewport offset, committed to the Store in one write.
    pub fn recompute_local_view(&self, store: &Store<EngineState>) {
        let state = store.get();
        let Some(layout) = state.layout.as_ref() else {
            return;
        };
        let Some(assigned) = self.assign_screen(&state, layout) else {
            return;
        };

        let relative = self.overrides.screen_position.unwrap_or(Point::new(
            state.win_rect.x - assigned.rect.x,
            state.win_rect.y - assigned.rect.y,
        ));
        let virtual_rect = Rect::new(
            assigned.rect.x + relative.x,
            assigned.rect.y + relative.y,
            state.win_rect.w,
            state.win_rect.h,
        );
        let viewport_offset = Point::new(
            virtual_rect.x - layout.frame.x,
            virtual_rect.y - layout.frame.y,
        );

        let assigned_id = assigned.id.clone();
        store.update(|s| {
            s.assigned_screen_id = Some(assigned_id.clone());
            s.virtual_rect = Some(virtual_rect);
            s.viewport_offset = viewport_offset;
            // keep the self entry in `peers` in sync so the next world
            // recompute sees the projected rect
            let me = s.window_id.clone();
            if let Some(entry) = s.peers.get_mut(&me) {
                entry.assigned_screen_id = Some(assigned_id.clone());
                entry.virtual_rect = Some(virtual_rect);
            }
        });
    }

    /// Drops the departed peer's screen from the local layout copy and
    /// refreshes the frame, so every peer shrinks immediately on a GOODBYE
    /// without waiting for the next authoritative update.
    pub fn prune_screen(&self, store: &Store<EngineState>, screen_id: &str) {
        let state = store.get();
        if state.static_layout.is_some() {
            return;
        }
        let Some(layout) = state.layout else {
            return;
        };
        if !layout.screens.iter().any(|s| s.id == screen_id) {
            return;
        }
        let screens: Vec<Screen> = layout
            .screens
            .into_iter()
            .filter(|s| s.id != screen_id)
            .collect();
        match Layout::from_screens(screens) {
            Ok(pruned) => {
                store.update(|s| s.layout = Some(pruned));
                self.recompute_local_view(store);
            }
            Err(_) => {
                // the last screen left with the departing peer
                store.update(|s| {
                    s.layout = None;
                    s.assigned_screen_id = None;
                    s.virtual_rect = None;
                    s.viewport_offset = Point::default();
                });
            }
        }
    }

    /// Screen assignment: external override first, then dimension-similarity
    /// against the physical display (or the window itself), then the first
    /// screen.
    fn assign_screen<'l>(&self, state: &EngineState, layout: &'l Layout) -> Option<&'l Screen> {
        if let Some(id) = &self.overrides.screen_id {
            if let Some(screen) = layout.screen(id) {
                return Some(screen);
            }
        }

        let target = state.display_rect.unwrap_or(state.win_rect);
        if target.is_positive() {
            let mut best: Option<(&Screen, f64, u32)> = None;
            for screen in &layout.screens {
                let score = size_similarity(&target, &screen.rect);
                let tie = session::pair_hash(state.window_id.as_str(), &screen.id);
                let better = match best {
                    None => true,
                    Some((_, best_score, best_tie)) => {
                        score > best_score || (score == best_score && tie > best_tie)
                    }
                };
                if better {
                    best = Some((screen, score, tie));
                }
            }
            if let Some((screen, _, _)) = best {
                return Some(screen);
            }
        }

        layout.screens.first()
    }
}

/// `1 − (Δw/max(w) + Δh/max(h)) / 2`; 1.0 is an exact size match.
fn size_similarity(target: &Rect, candidate: &Rect) -> f64 {
    let dw = (target.w - candidate.w).abs() / target.w.max(candidate.w);
    let dh = (target.h - candidate.h).abs() / target.h.max(candidate.h);
    1.0 - (dw + dh) / 2.0
}
