//! Change notifications published by a [`SurfaceItem`](crate::item::SurfaceItem).
//!
//! Every property the toolkit can bind to has a matching [`ItemEvent`]
//! variant. Events go out on a broadcast channel; subscribe with
//! [`SurfaceItem::subscribe`](crate::item::SurfaceItem::subscribe).

use crate::surface::{OrientationAngle, SurfaceId, SurfaceSize, SurfaceState, SurfaceType};

#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    // ****************************************
    // ** Attached surface
    /// Another surface (or none) is now attached
    SurfaceChanged { surface: Option<SurfaceId> },
    /// Type of the attached surface
    TypeChanged { surface_type: SurfaceType },
    /// Liveness of the attached surface
    LiveChanged { live: bool },
    /// Window-management state of the attached surface
    SurfaceStateChanged { state: SurfaceState },
    /// Orientation, staged or of the attached surface
    OrientationAngleChanged { angle: OrientationAngle },
    /// Natural size of the item, following the surface's size
    ImplicitSizeChanged { size: SurfaceSize },

    // ****************************************
    // ** Item properties
    /// Desired surface width (0 = follow the surface)
    SurfaceWidthChanged { width: i32 },
    /// Desired surface height (0 = follow the surface)
    SurfaceHeightChanged { height: i32 },
    /// Input forwarding was switched on or off
    ConsumesInputChanged { consumes_input: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itemevent_equality_and_debug() {
        let a = ItemEvent::SurfaceWidthChanged { width: 640 };
        let b = a.clone();
        assert_eq!(a, b);
        assert!(format!("{a:?}").contains("SurfaceWidthChanged"));
    }
}
