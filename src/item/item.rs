//! # SurfaceItem
//!
//! The toolkit-facing item showing one compositor surface.
//!
//! # Main Types
//!
//! - [`SurfaceItem`]: lives on the UI thread. Owns the touch normalizer, the
//!   item properties and the event bus, and shares a [`SurfaceBinding`] with the
//!   render thread.
//!
//! # Threads
//!
//! Everything here is UI-thread API except [`SurfaceItem::update_paint_node`]
//! and [`SurfaceItem::texture_provider`], which only go through the binding. A
//! render thread that cannot borrow the item uses a clone of
//! [`SurfaceItem::binding`] together with [`SurfaceItem::paint_params`].

use crate::config::ItemConfig;
use crate::errors::ItemError;
use crate::event::ItemEvent;
use crate::input::{
    HoverEvent, KeyEvent, KeyboardRegionSource, MouseButtons, MouseEvent, TouchBatch, TouchSequenceNormalizer,
    WheelEvent,
};
use crate::item::binding::{apply_desired_size, AttachContext, AttachReport, DesiredSize, SurfaceBinding};
use crate::render::{ImageNode, PaintParams, RenderStage, RenderWindow, TextureProvider};
use crate::surface::{
    OrientationAngle, SurfaceEvent, SurfaceHandle, SurfaceId, SurfaceSize, SurfaceState, SurfaceType,
};
use crate::tick::TickResult;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct SurfaceItem {
    binding: SurfaceBinding,
    normalizer: TouchSequenceNormalizer,
    keyboard: Arc<dyn KeyboardRegionSource>,
    window: Option<Arc<RenderWindow>>,

    // geometry and rendering hints
    width: f64,
    height: f64,
    implicit_size: SurfaceSize,
    smooth: bool,
    antialiasing: bool,

    // input
    consumes_input: bool,
    accepted_mouse_buttons: MouseButtons,
    accepts_hover_events: bool,
    has_active_focus: bool,

    // desired surface size, applied on the next tick
    surface_width: i32,
    surface_height: i32,
    resize_scheduled: bool,

    event_tx: broadcast::Sender<ItemEvent>,
}

impl std::fmt::Debug for SurfaceItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceItem")
            .field("surface", &self.binding.surface_id())
            .field("consumes_input", &self.consumes_input)
            .field("surface_width", &self.surface_width)
            .field("surface_height", &self.surface_height)
            .finish_non_exhaustive()
    }
}

impl SurfaceItem {
    /// Creates a detached item. `keyboard` is consulted to gate input on
    /// input-method surfaces.
    pub fn new(config: ItemConfig, keyboard: Arc<dyn KeyboardRegionSource>) -> Result<Self, ItemError> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        let mut item = Self {
            binding: SurfaceBinding::new(),
            normalizer: TouchSequenceNormalizer::new(keyboard.clone()),
            keyboard,
            window: None,
            width: 0.0,
            height: 0.0,
            implicit_size: SurfaceSize::default(),
            smooth: config.smooth,
            antialiasing: config.antialiasing,
            consumes_input: false,
            accepted_mouse_buttons: MouseButtons::empty(),
            accepts_hover_events: false,
            has_active_focus: false,
            surface_width: 0,
            surface_height: 0,
            resize_scheduled: false,
            event_tx,
        };
        item.binding.set_smooth(item.smooth);
        item.set_consumes_input(config.consumes_input);

        Ok(item)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.event_tx.subscribe()
    }

    /// Shared handle for the render thread.
    pub fn binding(&self) -> SurfaceBinding {
        self.binding.clone()
    }

    fn emit(&self, event: ItemEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn desired_size(&self) -> DesiredSize {
        DesiredSize {
            width: self.surface_width,
            height: self.surface_height,
        }
    }

    fn attach_context(&self) -> AttachContext<'_> {
        AttachContext {
            window: self.window.as_ref(),
            has_active_focus: self.has_active_focus,
            consumes_input: self.consumes_input,
            desired_size: self.desired_size(),
        }
    }

    /// The attached surface, if it may receive input and focus right now.
    fn input_target(&self) -> Option<Arc<dyn SurfaceHandle>> {
        if !self.consumes_input {
            return None;
        }
        self.binding.surface().filter(|surface| surface.live())
    }

    // ****************************************
    // ** Attached surface

    pub fn surface(&self) -> Option<Arc<dyn SurfaceHandle>> {
        self.binding.surface()
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.binding.surface_id()
    }

    /// Shows `surface` in this item, or nothing.
    pub fn set_surface(&mut self, surface: Option<Arc<dyn SurfaceHandle>>) {
        let Some(report) = self.binding.attach(surface, &self.attach_context()) else {
            return;
        };

        // A sequence started on the previous surface cannot continue here
        self.normalizer.reset();
        self.announce_attach(report);
    }

    fn announce_attach(&mut self, report: AttachReport) {
        let surface = report.attached.as_ref().map(|info| info.id);

        if let Some(info) = report.attached {
            self.set_implicit_size(info.size);

            self.emit(ItemEvent::TypeChanged {
                surface_type: info.surface_type,
            });
            self.emit(ItemEvent::LiveChanged { live: info.live });
            self.emit(ItemEvent::SurfaceStateChanged { state: info.state });
            if let Some(angle) = info.orientation {
                self.emit(ItemEvent::OrientationAngleChanged { angle });
            }
        }

        self.emit(ItemEvent::SurfaceChanged { surface });
    }

    pub fn surface_type(&self) -> SurfaceType {
        self.binding
            .surface()
            .map(|s| s.surface_type())
            .unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.binding.surface().map(|s| s.name()).unwrap_or_default()
    }

    pub fn app_id(&self) -> String {
        self.binding
            .surface()
            .map(|s| s.app_id())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn live(&self) -> bool {
        self.binding.surface().is_some_and(|s| s.live())
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.binding.surface().map(|s| s.state()).unwrap_or_default()
    }

    /// Forwarded to the attached surface; ignored while detached.
    pub fn set_surface_state(&self, state: SurfaceState) {
        if let Some(surface) = self.binding.surface() {
            surface.set_state(state);
        }
    }

    pub fn orientation_angle(&self) -> OrientationAngle {
        self.binding.orientation_angle()
    }

    pub fn set_orientation_angle(&mut self, angle: OrientationAngle) {
        log::debug!("Item: set orientation angle {}", angle.degrees());

        if self.binding.set_orientation_angle(angle) {
            self.emit(ItemEvent::OrientationAngleChanged { angle });
        }
    }

    // ****************************************
    // ** Size

    pub fn surface_width(&self) -> i32 {
        self.surface_width
    }

    pub fn set_surface_width(&mut self, width: i32) {
        if width == self.surface_width {
            return;
        }
        self.surface_width = width;
        self.resize_scheduled = true;
        self.emit(ItemEvent::SurfaceWidthChanged { width });
    }

    pub fn surface_height(&self) -> i32 {
        self.surface_height
    }

    pub fn set_surface_height(&mut self, height: i32) {
        if height == self.surface_height {
            return;
        }
        self.surface_height = height;
        self.resize_scheduled = true;
        self.emit(ItemEvent::SurfaceHeightChanged { height });
    }

    pub fn implicit_size(&self) -> SurfaceSize {
        self.implicit_size
    }

    fn set_implicit_size(&mut self, size: SurfaceSize) {
        if size == self.implicit_size {
            return;
        }
        self.implicit_size = size;
        self.emit(ItemEvent::ImplicitSizeChanged { size });
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Item geometry as laid out by the toolkit.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.binding.request_update();
    }

    // ****************************************
    // ** Rendering

    pub fn smooth(&self) -> bool {
        self.smooth
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        if smooth != self.smooth {
            self.smooth = smooth;
            self.binding.set_smooth(smooth);
            self.binding.request_update();
        }
    }

    pub fn antialiasing(&self) -> bool {
        self.antialiasing
    }

    pub fn set_antialiasing(&mut self, antialiasing: bool) {
        if antialiasing != self.antialiasing {
            self.antialiasing = antialiasing;
            self.binding.request_update();
        }
    }

    pub fn paint_params(&self) -> PaintParams {
        PaintParams {
            width: self.width,
            height: self.height,
            smooth: self.smooth,
            antialiasing: self.antialiasing,
        }
    }

    pub fn update_paint_node(&self, old: Option<ImageNode>) -> Option<ImageNode> {
        self.binding.update_paint_node(old, &self.paint_params())
    }

    pub fn texture_provider(&self) -> Option<Arc<TextureProvider>> {
        self.binding.texture_provider()
    }

    pub fn window(&self) -> Option<&Arc<RenderWindow>> {
        self.window.as_ref()
    }

    /// The item moved to another window (or out of any).
    pub fn set_window(&mut self, window: Option<Arc<RenderWindow>>) {
        let unchanged = match (&self.window, &window) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        log::debug!("Item: window changed to {:?}", window.as_ref().map(|w| w.id()));
        if let Some(old) = &self.window {
            self.binding.disconnect_window(old);
        }
        if let Some(window) = &window {
            self.binding.connect_window(window);
        }
        self.window = window;
    }

    /// Gives up the texture provider. While the item is in a window the
    /// provider is disposed of on the render thread, once it is done
    /// synchronizing.
    pub fn release_resources(&mut self) {
        let Some(provider) = self.binding.take_texture_provider() else {
            return;
        };

        match &self.window {
            Some(window) => {
                log::debug!("Item: deferring texture provider disposal to window {:?}", window.id());
                let job = Box::new(move || drop(provider));
                if let Err(e) = window.schedule_render_job(RenderStage::AfterSynchronizing, job) {
                    log::debug!("Item: {e}, texture provider disposed of immediately");
                }
            }
            None => drop(provider),
        }
    }

    /// The render thread's scene is gone. Render thread only.
    pub fn invalidate_scene_graph(&self) {
        if self.binding.take_texture_provider().is_some() {
            log::debug!("Item: scene graph invalidated, texture provider dropped");
        }
    }

    // ****************************************
    // ** Input

    pub fn consumes_input(&self) -> bool {
        self.consumes_input
    }

    pub fn set_consumes_input(&mut self, consumes_input: bool) {
        if consumes_input == self.consumes_input {
            return;
        }

        self.consumes_input = consumes_input;
        if consumes_input {
            self.accepted_mouse_buttons = MouseButtons::all();
            self.accepts_hover_events = true;
        } else {
            self.accepted_mouse_buttons = MouseButtons::empty();
            self.accepts_hover_events = false;
        }

        self.emit(ItemEvent::ConsumesInputChanged { consumes_input });
    }

    pub fn accepted_mouse_buttons(&self) -> MouseButtons {
        self.accepted_mouse_buttons
    }

    pub fn accepts_hover_events(&self) -> bool {
        self.accepts_hover_events
    }

    pub fn has_active_focus(&self) -> bool {
        self.has_active_focus
    }

    pub fn set_active_focus(&mut self, focused: bool) {
        if focused == self.has_active_focus {
            return;
        }
        self.has_active_focus = focused;

        if let Some(surface) = self.input_target() {
            surface.set_focus(focused);
        }
    }

    fn keyboard_contains(&self, event: &MouseEvent) -> bool {
        self.keyboard.region().contains(event.position)
    }

    /// Returns whether the event was consumed; unconsumed events fall back to
    /// the toolkit's default handling.
    pub fn mouse_press_event(&self, event: &MouseEvent) -> bool {
        let Some(surface) = self.input_target() else {
            return false;
        };

        if surface.surface_type() == SurfaceType::InputMethod && !self.keyboard_contains(event) {
            log::trace!("Surface[{}]: mouse press outside the keyboard region", surface.id());
            return false;
        }

        surface.mouse_press_event(event);
        true
    }

    pub fn mouse_move_event(&self, event: &MouseEvent) -> bool {
        self.forward(|surface| surface.mouse_move_event(event))
    }

    pub fn mouse_release_event(&self, event: &MouseEvent) -> bool {
        self.forward(|surface| surface.mouse_release_event(event))
    }

    /// Wheel input is never forwarded to surfaces.
    pub fn wheel_event(&self, _event: &WheelEvent) -> bool {
        false
    }

    pub fn hover_enter_event(&self, event: &HoverEvent) -> bool {
        self.forward(|surface| surface.hover_enter_event(event))
    }

    pub fn hover_move_event(&self, event: &HoverEvent) -> bool {
        self.forward(|surface| surface.hover_move_event(event))
    }

    pub fn hover_leave_event(&self, event: &HoverEvent) -> bool {
        self.forward(|surface| surface.hover_leave_event(event))
    }

    pub fn key_press_event(&self, event: &KeyEvent) -> bool {
        self.forward(|surface| surface.key_press_event(event))
    }

    pub fn key_release_event(&self, event: &KeyEvent) -> bool {
        self.forward(|surface| surface.key_release_event(event))
    }

    fn forward(&self, deliver: impl FnOnce(&dyn SurfaceHandle)) -> bool {
        match self.input_target() {
            Some(surface) => {
                deliver(&*surface);
                true
            }
            None => false,
        }
    }

    /// Feeds a touch batch through the sequence normalizer. Returns whether
    /// it was consumed.
    pub fn touch_event(&mut self, batch: TouchBatch) -> bool {
        match self.input_target() {
            Some(surface) => self.normalizer.process(&*surface, batch),
            None => false,
        }
    }

    pub fn touch_normalizer(&self) -> &TouchSequenceNormalizer {
        &self.normalizer
    }

    // ****************************************
    // ** UI thread pump

    /// Runs the deferred UI-thread work: the coalesced resize and the surface
    /// notifications received since the last tick.
    pub fn tick(&mut self) -> TickResult {
        let mut result = TickResult::default();

        if std::mem::take(&mut self.resize_scheduled) {
            if let Some(surface) = self.binding.surface() {
                result.surface_resized = apply_desired_size(&*surface, self.desired_size());
            }
        }

        let events = self.binding.drain_surface_events();
        result.surface_events = events.len();

        for event in events {
            match event {
                SurfaceEvent::FramesPosted => self.binding.request_update(),
                SurfaceEvent::StateChanged(state) => self.emit(ItemEvent::SurfaceStateChanged { state }),
                SurfaceEvent::LiveChanged(live) => self.emit(ItemEvent::LiveChanged { live }),
                SurfaceEvent::SizeChanged(size) => self.set_implicit_size(size),
                SurfaceEvent::OrientationAngleChanged(angle) => {
                    self.emit(ItemEvent::OrientationAngleChanged { angle })
                }
            }
        }

        result.needs_redraw = self.binding.is_update_requested();
        result
    }
}

impl Drop for SurfaceItem {
    fn drop(&mut self) {
        log::debug!("Item: dropped while showing {:?}", self.binding.surface_id());
        self.binding.detach(&self.attach_context());
    }
}
