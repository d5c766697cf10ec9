//! Geometry primitives for canvas-space layout
//!
//! All coordinates are integer canvas-space units (pixels in the destination
//! workspace's coordinate system).

use serde::{Deserialize, Serialize};

/// A 2D point in canvas space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Offset this point by a delta
    pub fn translated(&self, dx: i64, dy: i64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Pixel dimensions of a single image in the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Fixed size used when images are scaled to a standard size before upload
    pub fn standard() -> Self {
        Self::new(1000, 1000)
    }

    pub(crate) fn width_i64(&self) -> i64 {
        i64::from(self.width)
    }

    pub(crate) fn height_i64(&self) -> i64 {
        i64::from(self.height)
    }
}

/// An axis-aligned rectangle in canvas space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box of the given size anchored at the origin
    pub fn at_origin(width: i64, height: i64) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Same size, shifted by a delta
    pub fn translated(&self, dx: i64, dy: i64) -> BoundingBox {
        BoundingBox::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Same size, with its origin placed at `(x, y)`
    pub fn moved_to(&self, x: i64, y: i64) -> BoundingBox {
        BoundingBox::new(x, y, self.width, self.height)
    }

    /// Grow the box outward by the given padding on each side
    pub fn padded(&self, top: i64, bottom: i64, left: i64, right: i64) -> BoundingBox {
        BoundingBox::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }

    /// Check if `other` lies entirely inside this box (edges inclusive)
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Anchor for a text block: origin plus wrap width
///
/// Text elements in the destination workspace grow downward from their
/// origin, so only the width is fixed up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextLocation {
    pub x: i64,
    pub y: i64,
    pub width: i64,
}

impl TextLocation {
    pub fn new(x: i64, y: i64, width: i64) -> Self {
        Self { x, y, width }
    }
}

impl From<BoundingBox> for TextLocation {
    fn from(bounds: BoundingBox) -> Self {
        Self::new(bounds.x, bounds.y, bounds.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let b = BoundingBox::new(10, 20, 100, 50);
        assert_eq!(b.right(), 110);
        assert_eq!(b.bottom(), 70);
        assert_eq!(b.origin(), Point::new(10, 20));
    }

    #[test]
    fn test_moved_to_keeps_size() {
        let b = BoundingBox::new(10, 20, 100, 50).moved_to(-5, 900);
        assert_eq!(b, BoundingBox::new(-5, 900, 100, 50));
    }

    #[test]
    fn test_padded_contains_original() {
        let inner = BoundingBox::new(50, 400, 200, 100);
        let outer = inner.padded(400, 500, 50, 50);
        assert_eq!(outer, BoundingBox::new(0, 0, 300, 1000));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_translated() {
        let b = BoundingBox::new(0, 0, 10, 10).translated(3, -4);
        assert_eq!(b, BoundingBox::new(3, -4, 10, 10));
        assert_eq!(Point::new(1, 1).translated(2, 2), Point::new(3, 3));
    }
}
