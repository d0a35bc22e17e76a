use crate::render::{Filtering, Texture};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the texture of the attached surface on behalf of the render thread.
///
/// The binding only mutates a provider while holding its lock, but scene-graph
/// consumers keep an `Arc` to it and read it outside that lock, hence the
/// interior synchronisation.
#[derive(Debug, Default)]
pub struct TextureProvider {
    texture: RwLock<Option<Arc<Texture>>>,
    smooth: AtomicBool,
}

impl TextureProvider {
    pub fn new(texture: Option<Arc<Texture>>) -> Self {
        Self {
            texture: RwLock::new(texture),
            smooth: AtomicBool::new(false),
        }
    }

    /// Returns the current texture after applying the filtering mode to it.
    /// `None` when no texture was ever set or it has been released.
    pub fn texture(&self) -> Option<Arc<Texture>> {
        let guard = self.texture.read().unwrap_or_else(PoisonError::into_inner);
        let texture = guard.as_ref()?;
        texture.set_filtering(if self.smooth() {
            Filtering::Linear
        } else {
            Filtering::Nearest
        });
        Some(texture.clone())
    }

    pub fn has_texture(&self) -> bool {
        self.texture
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn set_texture(&self, texture: Option<Arc<Texture>>) {
        *self.texture.write().unwrap_or_else(PoisonError::into_inner) = texture;
    }

    /// Drops the texture reference; the provider itself stays usable.
    pub fn release_texture(&self) {
        self.set_texture(None);
    }

    pub fn smooth(&self) -> bool {
        self.smooth.load(Ordering::Acquire)
    }

    pub fn set_smooth(&self, smooth: bool) {
        self.smooth.store(smooth, Ordering::Release);
    }
}
