//! Item system: [`SurfaceItem`] and the [`SurfaceBinding`] it shares with the render thread.

mod binding;
mod item;

pub use binding::{AttachContext, AttachReport, AttachedSurfaceInfo, DesiredSize, SurfaceBinding};
pub use item::SurfaceItem;
