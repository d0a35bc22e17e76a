//! Input events forwarded from the toolkit to a surface.
//!
//! Pointer, hover and key events pass through unchanged. Touch events go
//! through the [`TouchSequenceNormalizer`] so a surface only ever observes
//! well-formed touch sequences.

mod events;
mod keyboard;
mod touch;

pub use events::*;
pub use keyboard::{KeyboardInfo, KeyboardRegion, KeyboardRegionSource};
pub use touch::TouchSequenceNormalizer;
