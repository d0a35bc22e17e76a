pub mod config;
pub mod errors;
pub mod event;
pub mod input;
pub mod item;
pub mod render;
pub mod surface;
pub mod tick;

#[cfg(test)]
pub(crate) mod mock;

pub use config::ItemConfig;
pub use errors::ItemError;
pub use event::ItemEvent;
pub use item::{SurfaceBinding, SurfaceItem};
pub use surface::{SurfaceHandle, SurfaceId};
pub use tick::TickResult;
