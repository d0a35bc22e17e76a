use crate::surface::SurfaceSize;
use std::sync::atomic::{AtomicU8, Ordering};
use uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(Uuid);

impl TextureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TextureId {
    fn default() -> Self {
        Self::new()
    }
}

/// Sampling filter applied when a texture is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filtering {
    /// No filtering (only meaningful for mipmaps)
    None,
    #[default]
    Nearest,
    Linear,
}

impl Filtering {
    fn to_u8(self) -> u8 {
        match self {
            Filtering::None => 0,
            Filtering::Nearest => 1,
            Filtering::Linear => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Filtering::None,
            2 => Filtering::Linear,
            _ => Filtering::Nearest,
        }
    }
}

/// GPU texture a surface's buffers are bound to.
///
/// Shared between the compositor and any provider or node drawing it, so the
/// filtering mode is stored atomically.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    size: SurfaceSize,
    filtering: AtomicU8,
}

impl Texture {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            id: TextureId::new(),
            size,
            filtering: AtomicU8::new(Filtering::Nearest.to_u8()),
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn filtering(&self) -> Filtering {
        Filtering::from_u8(self.filtering.load(Ordering::Acquire))
    }

    pub fn set_filtering(&self, filtering: Filtering) {
        self.filtering.store(filtering.to_u8(), Ordering::Release);
    }
}
