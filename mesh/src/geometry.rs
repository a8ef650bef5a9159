use serde::{Deserialize, Serialize};

/// A point in virtual-canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in virtual-canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether this rect can contribute a screen to a layout.
    pub fn is_positive(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Union bounding box of two rects.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Union bounding box of a sequence of rects, or `None` when empty.
pub fn union_all<'a, I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    let mut iter = rects.into_iter();
    let first = *iter.next()?;
    Some(iter.fold(first, |acc, r| acc.union(r)))
}
