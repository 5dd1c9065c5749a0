//! Detection geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned face region in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in square pixels; degenerate boxes count as zero.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// A face found by a detector, with its confidence score in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, score: f64) -> Self {
        Self { bbox, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_of_negative_box_is_zero() {
        assert_eq!(BoundingBox::new(0.0, 0.0, -4.0, 10.0).area(), 0.0);
        assert_eq!(BoundingBox::new(5.0, 5.0, 4.0, 10.0).area(), 40.0);
    }
}
