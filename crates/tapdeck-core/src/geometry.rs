/*
[INPUT]:  Pointer positions in surface pixels and the rendered surface size.
[OUTPUT]: Device-space points and regions for the 320x720 virtual device.
[POS]:    Geometry layer - pure mapping between screen and device space.
[UPDATE]: When the device dimensions or scaling rules change.
*/

use serde::{Deserialize, Serialize};

pub const DEVICE_WIDTH: f64 = 320.0;
pub const DEVICE_HEIGHT: f64 = 720.0;

/// A point on the rendered surface, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
}

impl DevicePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current size of the rendered surface. Dimensions are validated once at
/// construction so the mapping functions stay total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBounds {
    width: f64,
    height: f64,
}

impl SurfaceBounds {
    /// Returns `None` for non-positive or non-finite dimensions.
    pub fn new(width: f64, height: f64) -> Option<Self> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Some(Self { width, height })
        } else {
            None
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// A rectangle in device space. Corners are stored exactly as produced:
/// `x1 > x2` or `y1 > y2` are legal, and consumers read the rectangle as a
/// bounding box through the min/max accessors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Region {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn min_x(&self) -> f64 {
        self.x1.min(self.x2)
    }

    pub fn max_x(&self) -> f64 {
        self.x1.max(self.x2)
    }

    pub fn min_y(&self) -> f64 {
        self.y1.min(self.y2)
    }

    pub fn max_y(&self) -> f64 {
        self.y1.max(self.y2)
    }

    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// Zero extent on either axis. Degenerate regions are still valid tap
    /// targets; they pin the tap to an exact line or point.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    pub fn contains(&self, point: DevicePoint) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }
}

pub fn to_device_space(point: ScreenPoint, surface: SurfaceBounds) -> DevicePoint {
    DevicePoint {
        x: (point.x / surface.width) * DEVICE_WIDTH,
        y: (point.y / surface.height) * DEVICE_HEIGHT,
    }
}

pub fn to_screen_space(point: DevicePoint, surface: SurfaceBounds) -> ScreenPoint {
    ScreenPoint {
        x: (point.x / DEVICE_WIDTH) * surface.width,
        y: (point.y / DEVICE_HEIGHT) * surface.height,
    }
}
