//! Bounding boxes in pixel and normalized page space.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box `[x0, y0, x1, y1]` with a top-left origin.
///
/// The same type is used for pixel coordinates and for normalized (0..1)
/// page coordinates; the owning field says which.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build a bbox from a flat polygon `[x, y, x, y, ...]`.
    ///
    /// Returns `None` when fewer than two points are given.
    pub fn from_polygon(points: &[f32]) -> Option<Self> {
        if points.len() < 4 {
            return None;
        }
        let xs = points.iter().step_by(2);
        let ys = points.iter().skip(1).step_by(2);
        let (x0, x1) = xs.fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let (y0, y1) = ys.fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self::new(x0, y0, x1, y1))
    }

    /// Width (may be zero for degenerate boxes).
    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    /// Height (may be zero for degenerate boxes).
    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// True when the box is inverted or contains a non-finite coordinate.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.x1 < self.x0 || self.y1 < self.y0
    }

    /// Return a well-formed copy: coordinates are swapped into order and
    /// non-finite values are replaced with zero.
    pub fn repaired(&self) -> Self {
        let fix = |v: f32| if v.is_finite() { v } else { 0.0 };
        let (x0, x1) = (fix(self.x0), fix(self.x1));
        let (y0, y1) = (fix(self.y0), fix(self.y1));
        Self::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Check whether `inner` lies within this box grown by `tolerance` on every side.
    pub fn contains_with_slack(&self, inner: &BBox, tolerance: f32) -> bool {
        inner.x0 >= self.x0 - tolerance
            && inner.y0 >= self.y0 - tolerance
            && inner.x1 <= self.x1 + tolerance
            && inner.y1 <= self.y1 + tolerance
    }

    /// Scale a normalized box into page units.
    pub fn scale(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x0 * width,
            self.y0 * height,
            self.x1 * width,
            self.y1 * height,
        )
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BBox) -> Self {
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// Round to two decimals, the precision used for exported positions.
pub(crate) fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_polygon() {
        let b = BBox::from_polygon(&[0.1, 0.2, 0.5, 0.2, 0.5, 0.4, 0.1, 0.4]).unwrap();
        assert_eq!(b, BBox::new(0.1, 0.2, 0.5, 0.4));
        assert!(BBox::from_polygon(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_bbox_repair() {
        let inverted = BBox::new(0.5, 0.6, 0.1, 0.2);
        assert!(inverted.is_degenerate());
        let fixed = inverted.repaired();
        assert_eq!(fixed, BBox::new(0.1, 0.2, 0.5, 0.6));
        assert!(!fixed.is_degenerate());

        let nan = BBox::new(f32::NAN, 0.0, 1.0, 1.0);
        assert!(nan.is_degenerate());
        assert_eq!(nan.repaired().x0, 0.0);
    }

    #[test]
    fn test_contains_with_slack() {
        let block = BBox::new(0.1, 0.1, 0.5, 0.2);
        assert!(block.contains_with_slack(&BBox::new(0.1, 0.1, 0.5, 0.2), 0.0));
        assert!(block.contains_with_slack(&BBox::new(0.09, 0.1, 0.51, 0.21), 0.02));
        assert!(!block.contains_with_slack(&BBox::new(0.05, 0.1, 0.5, 0.2), 0.02));
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let b = BBox::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
        let back: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(3.0), 3.0);
    }
}
