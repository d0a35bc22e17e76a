//! Recording surface used by the unit tests.

use crate::input::{HoverEvent, KeyEvent, Modifiers, MouseEvent, TouchPoint, TouchPointStates};
use crate::render::Texture;
use crate::surface::{
    OrientationAngle, SurfaceEvent, SurfaceHandle, SurfaceId, SurfaceSize, SurfaceState, SurfaceType,
};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedTouch {
    pub modifiers: Modifiers,
    pub points: Vec<TouchPoint>,
    pub states: TouchPointStates,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordedInput {
    MousePress(MouseEvent),
    MouseMove(MouseEvent),
    MouseRelease(MouseEvent),
    HoverEnter(HoverEvent),
    HoverMove(HoverEvent),
    HoverLeave(HoverEvent),
    KeyPress(KeyEvent),
    KeyRelease(KeyEvent),
}

#[derive(Debug, Default)]
struct FakeState {
    live: bool,
    state: SurfaceState,
    orientation: OrientationAngle,
    orientation_writes: Vec<OrientationAngle>,
    size: SurfaceSize,
    resizes: Vec<(i32, i32)>,
    texture: Option<Arc<Texture>>,
    frame_number: u64,
    buffers_ready: usize,
    update_texture_calls: usize,
    swapped_buffers: usize,
    view_count: i32,
    view_count_changes: usize,
    focus: Vec<bool>,
    touches: Vec<RecordedTouch>,
    inputs: Vec<RecordedInput>,
}

pub(crate) struct FakeSurface {
    id: SurfaceId,
    surface_type: SurfaceType,
    state: Mutex<FakeState>,
    events: broadcast::Sender<SurfaceEvent>,
}

impl FakeSurface {
    pub fn new(surface_type: SurfaceType) -> Arc<Self> {
        let (events, _rx) = broadcast::channel(64);
        Arc::new(Self {
            id: SurfaceId::new(),
            surface_type,
            state: Mutex::new(FakeState {
                live: true,
                state: SurfaceState::Restored,
                size: SurfaceSize::new(320, 240),
                ..Default::default()
            }),
            events,
        })
    }

    pub fn with_texture(surface_type: SurfaceType) -> Arc<Self> {
        let surface = Self::new(surface_type);
        surface.set_texture(Some(Arc::new(Texture::new(SurfaceSize::new(320, 240)))));
        surface
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn emit(&self, event: SurfaceEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_live(&self, live: bool) {
        self.with(|s| s.live = live);
        self.emit(SurfaceEvent::LiveChanged(live));
    }

    pub fn set_texture(&self, texture: Option<Arc<Texture>>) {
        self.with(|s| s.texture = texture);
    }

    pub fn set_size(&self, size: SurfaceSize) {
        self.with(|s| s.size = size);
        self.emit(SurfaceEvent::SizeChanged(size));
    }

    pub fn post_frame(&self) {
        self.with(|s| s.frame_number += 1);
        self.emit(SurfaceEvent::FramesPosted);
    }

    pub fn set_buffers_ready(&self, count: usize) {
        self.with(|s| s.buffers_ready = count);
    }

    pub fn view_count(&self) -> i32 {
        self.with(|s| s.view_count)
    }

    pub fn view_count_changes(&self) -> usize {
        self.with(|s| s.view_count_changes)
    }

    pub fn focus_calls(&self) -> Vec<bool> {
        self.with(|s| s.focus.clone())
    }

    pub fn touches(&self) -> Vec<RecordedTouch> {
        self.with(|s| s.touches.clone())
    }

    pub fn inputs(&self) -> Vec<RecordedInput> {
        self.with(|s| s.inputs.clone())
    }

    pub fn resizes(&self) -> Vec<(i32, i32)> {
        self.with(|s| s.resizes.clone())
    }

    pub fn orientation_writes(&self) -> Vec<OrientationAngle> {
        self.with(|s| s.orientation_writes.clone())
    }

    pub fn update_texture_calls(&self) -> usize {
        self.with(|s| s.update_texture_calls)
    }

    pub fn swapped_buffers(&self) -> usize {
        self.with(|s| s.swapped_buffers)
    }

    pub fn receiver_count(&self) -> usize {
        self.events.receiver_count()
    }
}

impl SurfaceHandle for FakeSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn surface_type(&self) -> SurfaceType {
        self.surface_type
    }

    fn name(&self) -> String {
        "fake".to_string()
    }

    fn app_id(&self) -> String {
        "com.example.fake".to_string()
    }

    fn live(&self) -> bool {
        self.with(|s| s.live)
    }

    fn state(&self) -> SurfaceState {
        self.with(|s| s.state)
    }

    fn set_state(&self, state: SurfaceState) {
        self.with(|s| s.state = state);
        self.emit(SurfaceEvent::StateChanged(state));
    }

    fn orientation_angle(&self) -> OrientationAngle {
        self.with(|s| s.orientation)
    }

    fn set_orientation_angle(&self, angle: OrientationAngle) {
        self.with(|s| {
            s.orientation = angle;
            s.orientation_writes.push(angle);
        });
        self.emit(SurfaceEvent::OrientationAngleChanged(angle));
    }

    fn size(&self) -> SurfaceSize {
        self.with(|s| s.size)
    }

    fn resize(&self, width: i32, height: i32) {
        self.with(|s| s.resizes.push((width, height)));
    }

    fn texture(&self) -> Option<Arc<Texture>> {
        self.with(|s| s.texture.clone())
    }

    fn current_frame_number(&self) -> u64 {
        self.with(|s| s.frame_number)
    }

    fn num_buffers_ready_for_compositor(&self) -> usize {
        self.with(|s| s.buffers_ready)
    }

    fn update_texture(&self) {
        self.with(|s| {
            s.update_texture_calls += 1;
            s.buffers_ready = s.buffers_ready.saturating_sub(1);
        });
    }

    fn on_compositor_swapped_buffers(&self) {
        self.with(|s| s.swapped_buffers += 1);
    }

    fn increment_view_count(&self) {
        self.with(|s| {
            s.view_count += 1;
            s.view_count_changes += 1;
        });
    }

    fn decrement_view_count(&self) {
        self.with(|s| {
            s.view_count -= 1;
            s.view_count_changes += 1;
        });
    }

    fn is_being_displayed(&self) -> bool {
        self.with(|s| s.view_count > 0)
    }

    fn set_focus(&self, focused: bool) {
        self.with(|s| s.focus.push(focused));
    }

    fn mouse_press_event(&self, event: &MouseEvent) {
        self.with(|s| s.inputs.push(RecordedInput::MousePress(event.clone())));
    }

    fn mouse_move_event(&self, event: &MouseEvent) {
        self.with(|s| s.inputs.push(RecordedInput::MouseMove(event.clone())));
    }

    fn mouse_release_event(&self, event: &MouseEvent) {
        self.with(|s| s.inputs.push(RecordedInput::MouseRelease(event.clone())));
    }

    fn hover_enter_event(&self, event: &HoverEvent) {
        self.with(|s| s.inputs.push(RecordedInput::HoverEnter(event.clone())));
    }

    fn hover_move_event(&self, event: &HoverEvent) {
        self.with(|s| s.inputs.push(RecordedInput::HoverMove(event.clone())));
    }

    fn hover_leave_event(&self, event: &HoverEvent) {
        self.with(|s| s.inputs.push(RecordedInput::HoverLeave(event.clone())));
    }

    fn key_press_event(&self, event: &KeyEvent) {
        self.with(|s| s.inputs.push(RecordedInput::KeyPress(event.clone())));
    }

    fn key_release_event(&self, event: &KeyEvent) {
        self.with(|s| s.inputs.push(RecordedInput::KeyRelease(event.clone())));
    }

    fn touch_event(&self, modifiers: Modifiers, points: &[TouchPoint], states: TouchPointStates, timestamp: u64) {
        self.with(|s| {
            s.touches.push(RecordedTouch {
                modifiers,
                points: points.to_vec(),
                states,
                timestamp,
            })
        });
    }

    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.events.subscribe()
    }
}
