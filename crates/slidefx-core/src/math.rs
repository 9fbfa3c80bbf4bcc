use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::zero()
    }
}

/// A 2D size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Scale to device pixels, rounding and never going below one pixel per axis.
    pub fn to_device_pixels(&self, pixel_ratio: f64) -> (u32, u32) {
        let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let w = (self.width * ratio).round().max(1.0) as u32;
        let h = (self.height * ratio).round().max(1.0) as u32;
        (w, h)
    }
}

/// An axis-aligned box, as reported by live layout measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point2D,
    pub size: Size2D,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point2D::new(x, y),
            size: Size2D::new(width, height),
        }
    }

    pub fn x(&self) -> f64 {
        self.origin.x
    }

    pub fn y(&self) -> f64 {
        self.origin.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Express `self` relative to a containing box whose padding edge starts
    /// `border` pixels inside `container`.
    ///
    /// Both rects must come from the same coordinate space (e.g. viewport
    /// coordinates from `getBoundingClientRect`).
    pub fn relative_to(&self, container: &Rect, border: Point2D) -> Rect {
        Rect::new(
            self.origin.x - container.origin.x - border.x,
            self.origin.y - container.origin.y - border.y,
            self.size.width,
            self.size.height,
        )
    }
}
