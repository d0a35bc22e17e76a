use crate::input::Point;
use std::sync::{PoisonError, RwLock};

/// Rectangle covered by the on-screen keyboard, in item coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyboardRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl KeyboardRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Read-only access to the current keyboard region.
pub trait KeyboardRegionSource: Send + Sync {
    fn region(&self) -> KeyboardRegion;
}

/// Keyboard region shared between the keyboard subsystem (writer) and the
/// items hosting input-method surfaces (readers).
#[derive(Debug, Default)]
pub struct KeyboardInfo {
    region: RwLock<KeyboardRegion>,
}

impl KeyboardInfo {
    pub fn new(region: KeyboardRegion) -> Self {
        Self {
            region: RwLock::new(region),
        }
    }

    pub fn set_region(&self, region: KeyboardRegion) {
        *self.region.write().unwrap_or_else(PoisonError::into_inner) = region;
    }
}

impl KeyboardRegionSource for KeyboardInfo {
    fn region(&self) -> KeyboardRegion {
        *self.region.read().unwrap_or_else(PoisonError::into_inner)
    }
}
