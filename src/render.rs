//! Render-thread side of the item.
//!
//! Types in here are touched by the render thread: the [`Texture`] a surface
//! renders into, the [`TextureProvider`] that hands it to the scene graph, the
//! [`ImageNode`] built from it, and the [`RenderWindow`] that drives frames and
//! runs deferred render jobs.

mod node;
mod provider;
mod texture;
mod window;

pub use node::{DirtyState, ImageNode, PaintParams, Rect, WrapMode};
pub use provider::TextureProvider;
pub use texture::{Filtering, Texture, TextureId};
pub use window::{RenderJob, RenderStage, RenderWindow, WindowId};
