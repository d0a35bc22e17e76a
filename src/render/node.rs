//! Scene-graph node drawing a surface texture.
//!
//! An [`ImageNode`] is created on the render thread the first time a surface
//! has something to show and is then updated in place on every paint. Setters
//! only mark the node dirty when a value actually changes; [`ImageNode::update`]
//! flushes the accumulated dirty state, which is when the renderer re-uploads
//! material or geometry.

use crate::render::{Filtering, Texture};
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    #[derive(Default)]
    pub struct DirtyState: u8 {
        const GEOMETRY = 0b01;
        const MATERIAL = 0b10;
    }
}

/// Axis-aligned rectangle in item coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    Repeat,
    #[default]
    ClampToEdge,
}

/// Item state the toolkit hands to the render thread for one paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintParams {
    pub width: f64,
    pub height: f64,
    pub smooth: bool,
    pub antialiasing: bool,
}

#[derive(Debug, Clone)]
pub struct ImageNode {
    texture: Arc<Texture>,
    filtering: Filtering,
    mipmap_filtering: Filtering,
    horizontal_wrap: WrapMode,
    vertical_wrap: WrapMode,
    sub_source_rect: Rect,
    target_rect: Rect,
    inner_target_rect: Rect,
    antialiasing: bool,
    dirty: DirtyState,
    /// Number of `update()` calls that flushed a material change
    material_uploads: u64,
}

impl ImageNode {
    /// A node sampling the whole texture without mipmaps, clamped at the edges.
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            filtering: Filtering::Nearest,
            mipmap_filtering: Filtering::None,
            horizontal_wrap: WrapMode::ClampToEdge,
            vertical_wrap: WrapMode::ClampToEdge,
            sub_source_rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            target_rect: Rect::default(),
            inner_target_rect: Rect::default(),
            antialiasing: false,
            dirty: DirtyState::MATERIAL | DirtyState::GEOMETRY,
            material_uploads: 0,
        }
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    pub fn set_texture(&mut self, texture: Arc<Texture>) {
        if texture.id() != self.texture.id() {
            self.texture = texture;
            self.dirty |= DirtyState::MATERIAL;
        }
    }

    pub fn filtering(&self) -> Filtering {
        self.filtering
    }

    pub fn set_filtering(&mut self, filtering: Filtering) {
        if self.filtering != filtering {
            self.filtering = filtering;
            self.dirty |= DirtyState::MATERIAL;
        }
    }

    pub fn mipmap_filtering(&self) -> Filtering {
        self.mipmap_filtering
    }

    pub fn wrap_modes(&self) -> (WrapMode, WrapMode) {
        (self.horizontal_wrap, self.vertical_wrap)
    }

    pub fn sub_source_rect(&self) -> Rect {
        self.sub_source_rect
    }

    pub fn target_rect(&self) -> Rect {
        self.target_rect
    }

    pub fn set_target_rect(&mut self, rect: Rect) {
        if self.target_rect != rect {
            self.target_rect = rect;
            self.dirty |= DirtyState::GEOMETRY;
        }
    }

    pub fn inner_target_rect(&self) -> Rect {
        self.inner_target_rect
    }

    pub fn set_inner_target_rect(&mut self, rect: Rect) {
        if self.inner_target_rect != rect {
            self.inner_target_rect = rect;
            self.dirty |= DirtyState::GEOMETRY;
        }
    }

    pub fn antialiasing(&self) -> bool {
        self.antialiasing
    }

    pub fn set_antialiasing(&mut self, antialiasing: bool) {
        if self.antialiasing != antialiasing {
            self.antialiasing = antialiasing;
            self.dirty |= DirtyState::GEOMETRY;
        }
    }

    pub fn mark_dirty(&mut self, state: DirtyState) {
        self.dirty |= state;
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn material_uploads(&self) -> u64 {
        self.material_uploads
    }

    /// Applies pending changes and returns what was flushed.
    pub fn update(&mut self) -> DirtyState {
        let flushed = std::mem::take(&mut self.dirty);
        if flushed.contains(DirtyState::MATERIAL) {
            self.material_uploads += 1;
        }
        flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceSize;

    fn texture() -> Arc<Texture> {
        Arc::new(Texture::new(SurfaceSize::new(8, 8)))
    }

    #[test]
    fn new_node_starts_fully_dirty_with_clamped_full_source() {
        let mut node = ImageNode::new(texture());
        assert_eq!(node.sub_source_rect(), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(node.wrap_modes(), (WrapMode::ClampToEdge, WrapMode::ClampToEdge));
        assert_eq!(node.mipmap_filtering(), Filtering::None);

        let flushed = node.update();
        assert!(flushed.contains(DirtyState::MATERIAL | DirtyState::GEOMETRY));
        assert_eq!(node.material_uploads(), 1);
        assert!(node.dirty_state().is_empty());
    }

    #[test]
    fn unchanged_setters_do_not_dirty() {
        let mut node = ImageNode::new(texture());
        node.set_target_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        node.update();

        node.set_target_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        node.set_filtering(Filtering::Nearest);
        node.set_antialiasing(false);
        assert!(node.update().is_empty());
        assert_eq!(node.material_uploads(), 1);
    }

    #[test]
    fn filtering_change_is_a_material_change() {
        let mut node = ImageNode::new(texture());
        node.update();
        node.set_filtering(Filtering::Linear);
        assert_eq!(node.update(), DirtyState::MATERIAL);
    }
}
