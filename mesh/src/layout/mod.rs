//! The shared virtual canvas: screens, the union frame, and the engine that
//! computes them.

mod engine;
mod error;

pub use engine::{LayoutEngine, PlacementOverrides};
pub use error::LayoutError;

use serde::{Deserialize, Serialize};

use crate::geometry::{union_all, Rect};

/// Current layout format version.
pub const LAYOUT_VERSION: u32 = 1;

/// One rectangular tile of the virtual canvas, owned by one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: String,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// The global virtual canvas: the union frame plus the screens it bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub version: u32,
    pub frame: Rect,
    pub screens: Vec<Screen>,
}

impl Layout {
    /// Builds a layout from screens, deriving the frame as their union.
    pub fn from_screens(screens: Vec<Screen>) -> Result<Layout, LayoutError> {
        let frame =
            union_all(screens.iter().map(|s| &s.rect)).ok_or(LayoutError::NoScreens)?;
        let layout = Layout {
            version: LAYOUT_VERSION,
            frame,
            screens,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks the layout invariants: supported version, non-empty screens
    /// with positive sizes and unique ids, and a frame equal to the union of
    /// the screens.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.version != LAYOUT_VERSION {
            return Err(LayoutError::UnsupportedVersion {
                version: self.version,
            });
        }
        for screen in &self.screens {
            if !screen.rect.is_positive() {
                return Err(LayoutError::InvalidScreenSize {
                    id: screen.id.clone(),
                    w: screen.rect.w,
                    h: screen.rect.h,
                });
            }
        }
        for (index, screen) in self.screens.iter().enumerate() {
            if self.screens[..index].iter().any(|s| s.id == screen.id) {
                return Err(LayoutError::DuplicateScreenId {
                    id: screen.id.clone(),
                });
            }
        }
        let expected = union_all(self.screens.iter().map(|s| &s.rect))
            .ok_or(LayoutError::NoScreens)?;
        if expected != self.frame {
            return Err(LayoutError::FrameMismatch);
        }
        Ok(())
    }

    pub fn screen(&self, id: &str) -> Option<&Screen> {
        self.screens.iter().find(|s| s.id == id)
    }
}
