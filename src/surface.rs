//! The compositor-owned surface as seen from an item.
//!
//! A surface is created and destroyed by the compositor session, never by the
//! item displaying it. Items talk to it only through the [`SurfaceHandle`]
//! capability: they read its identity and current buffer, forward input, and
//! contribute to its view count while they display it.
//!
//! # Main Types
//!
//! - [`SurfaceHandle`]: the capability interface a compositor implements.
//! - [`SurfaceId`]: opaque identity used to tell two handles apart.
//! - [`SurfaceEvent`]: change notifications published by a handle.

use crate::input::{HoverEvent, KeyEvent, Modifiers, MouseEvent, TouchPoint, TouchPointStates};
use crate::render::Texture;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A unique identifier for a compositor surface.
///
/// Treat it as an opaque handle; the [`Uuid`] inside is an implementation detail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SurfaceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a surface in the shell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurfaceType {
    #[default]
    Unknown,
    Normal,
    Utility,
    Dialog,
    Gloss,
    Freestyle,
    Menu,
    /// On-screen keyboard. Input to it is gated by the keyboard region.
    InputMethod,
    Satellite,
    Tip,
}

/// Window-management state of a surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurfaceState {
    #[default]
    Unknown,
    Restored,
    Minimized,
    Maximized,
    VertMaximized,
    Fullscreen,
    HorizMaximized,
    Hidden,
}

/// Rotation applied to a surface's content, in steps of 90 degrees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrientationAngle {
    #[default]
    Angle0,
    Angle90,
    Angle180,
    Angle270,
}

impl OrientationAngle {
    pub fn degrees(self) -> u32 {
        match self {
            OrientationAngle::Angle0 => 0,
            OrientationAngle::Angle90 => 90,
            OrientationAngle::Angle180 => 180,
            OrientationAngle::Angle270 => 270,
        }
    }

    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(OrientationAngle::Angle0),
            90 => Some(OrientationAngle::Angle90),
            180 => Some(OrientationAngle::Angle180),
            270 => Some(OrientationAngle::Angle270),
            _ => None,
        }
    }
}

/// Size of a surface in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: i32,
    pub height: i32,
}

impl SurfaceSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Notifications a surface publishes to the items displaying it.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// One or more new frames are ready to be shown
    FramesPosted,
    /// Window-management state changed
    StateChanged(SurfaceState),
    /// The client went away (false) or came back (true)
    LiveChanged(bool),
    /// The actual buffer size changed
    SizeChanged(SurfaceSize),
    /// The orientation applied to the content changed
    OrientationAngleChanged(OrientationAngle),
}

/// Capability interface of a compositor surface.
///
/// Calls may arrive from the UI thread (identity, input, focus, view count) and
/// from the render thread (texture, frame number, buffer advance, swap
/// notification). Implementations synchronise internally.
///
/// Once [`live`](SurfaceHandle::live) has returned `false` it never returns
/// `true` again. Identity accessors keep answering from the last known values
/// after that point.
pub trait SurfaceHandle: Send + Sync {
    fn id(&self) -> SurfaceId;
    fn surface_type(&self) -> SurfaceType;
    fn name(&self) -> String;
    fn app_id(&self) -> String;
    fn live(&self) -> bool;

    fn state(&self) -> SurfaceState;
    fn set_state(&self, state: SurfaceState);

    fn orientation_angle(&self) -> OrientationAngle;
    fn set_orientation_angle(&self, angle: OrientationAngle);

    fn size(&self) -> SurfaceSize;
    fn resize(&self, width: i32, height: i32);

    /// Texture holding the current buffer, if one has been produced yet.
    fn texture(&self) -> Option<Arc<Texture>>;
    /// Monotonic number of the buffer currently bound to the texture.
    fn current_frame_number(&self) -> u64;
    /// Buffers queued by the client that the compositor has not consumed yet.
    fn num_buffers_ready_for_compositor(&self) -> usize;
    /// Bind the latest client buffer to the texture. Render thread only.
    fn update_texture(&self);
    /// Called inline on the render thread after the window swapped buffers.
    fn on_compositor_swapped_buffers(&self);

    fn increment_view_count(&self);
    fn decrement_view_count(&self);
    /// Whether any item still displays this surface.
    fn is_being_displayed(&self) -> bool;

    fn set_focus(&self, focused: bool);

    fn mouse_press_event(&self, event: &MouseEvent);
    fn mouse_move_event(&self, event: &MouseEvent);
    fn mouse_release_event(&self, event: &MouseEvent);
    fn hover_enter_event(&self, event: &HoverEvent);
    fn hover_move_event(&self, event: &HoverEvent);
    fn hover_leave_event(&self, event: &HoverEvent);
    fn key_press_event(&self, event: &KeyEvent);
    fn key_release_event(&self, event: &KeyEvent);
    fn touch_event(
        &self,
        modifiers: Modifiers,
        points: &[TouchPoint],
        states: TouchPointStates,
        timestamp: u64,
    );

    /// Subscribe to this surface's change notifications.
    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_degrees_round_trip_known_values() {
        for angle in [
            OrientationAngle::Angle0,
            OrientationAngle::Angle90,
            OrientationAngle::Angle180,
            OrientationAngle::Angle270,
        ] {
            assert_eq!(OrientationAngle::from_degrees(angle.degrees()), Some(angle));
        }
        assert_eq!(OrientationAngle::from_degrees(45), None);
    }

    #[test]
    fn defaults_are_the_detached_sentinels() {
        assert_eq!(SurfaceType::default(), SurfaceType::Unknown);
        assert_eq!(SurfaceState::default(), SurfaceState::Unknown);
        assert_eq!(OrientationAngle::default(), OrientationAngle::Angle0);
    }

    #[test]
    fn surface_ids_are_unique() {
        assert_ne!(SurfaceId::new(), SurfaceId::new());
    }
}
