use surface_item::input::{
    HoverEvent, KeyEvent, KeyboardInfo, KeyboardRegion, Modifiers, MouseButtons, MouseEvent, TouchBatch,
    TouchEventKind, TouchPoint, TouchPointState, TouchPointStates,
};
use surface_item::render::{RenderStage, RenderWindow, Texture};
use surface_item::surface::{OrientationAngle, SurfaceEvent, SurfaceSize, SurfaceState, SurfaceType};
use surface_item::{ItemConfig, ItemEvent, SurfaceHandle, SurfaceId, SurfaceItem};
use std::sync::atomic::{AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Client surface backed by a single texture; each consumed buffer is a new frame.
struct DemoSurface {
    id: SurfaceId,
    size: Mutex<SurfaceSize>,
    state: Mutex<SurfaceState>,
    orientation: Mutex<OrientationAngle>,
    texture: Arc<Texture>,
    frame: AtomicU64,
    buffers_ready: AtomicUsize,
    view_count: AtomicI32,
    events: broadcast::Sender<SurfaceEvent>,
}

impl DemoSurface {
    fn new(width: i32, height: i32) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        let size = SurfaceSize::new(width, height);
        Arc::new(Self {
            id: SurfaceId::new(),
            size: Mutex::new(size),
            state: Mutex::new(SurfaceState::Restored),
            orientation: Mutex::new(OrientationAngle::default()),
            texture: Arc::new(Texture::new(size)),
            frame: AtomicU64::new(0),
            buffers_ready: AtomicUsize::new(0),
            view_count: AtomicI32::new(0),
            events,
        })
    }

    /// Client side: queue `count` buffers for the compositor.
    fn post_frames(&self, count: usize) {
        self.buffers_ready.fetch_add(count, Ordering::AcqRel);
        let _ = self.events.send(SurfaceEvent::FramesPosted);
    }
}

impl SurfaceHandle for DemoSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Normal
    }

    fn name(&self) -> String {
        "demo".into()
    }

    fn app_id(&self) -> String {
        "org.example.demo".into()
    }

    fn live(&self) -> bool {
        true
    }

    fn state(&self) -> SurfaceState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: SurfaceState) {
        *self.state.lock().unwrap() = state;
        let _ = self.events.send(SurfaceEvent::StateChanged(state));
    }

    fn orientation_angle(&self) -> OrientationAngle {
        *self.orientation.lock().unwrap()
    }

    fn set_orientation_angle(&self, angle: OrientationAngle) {
        *self.orientation.lock().unwrap() = angle;
        let _ = self.events.send(SurfaceEvent::OrientationAngleChanged(angle));
    }

    fn size(&self) -> SurfaceSize {
        *self.size.lock().unwrap()
    }

    fn resize(&self, width: i32, height: i32) {
        let size = SurfaceSize::new(width, height);
        *self.size.lock().unwrap() = size;
        let _ = self.events.send(SurfaceEvent::SizeChanged(size));
    }

    fn texture(&self) -> Option<Arc<Texture>> {
        Some(self.texture.clone())
    }

    fn current_frame_number(&self) -> u64 {
        self.frame.load(Ordering::Acquire)
    }

    fn num_buffers_ready_for_compositor(&self) -> usize {
        self.buffers_ready.load(Ordering::Acquire)
    }

    fn update_texture(&self) {
        let consumed = self
            .buffers_ready
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if consumed.is_ok() {
            self.frame.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn on_compositor_swapped_buffers(&self) {}

    fn increment_view_count(&self) {
        self.view_count.fetch_add(1, Ordering::AcqRel);
    }

    fn decrement_view_count(&self) {
        self.view_count.fetch_sub(1, Ordering::AcqRel);
    }

    fn is_being_displayed(&self) -> bool {
        self.view_count.load(Ordering::Acquire) > 0
    }

    fn set_focus(&self, focused: bool) {
        println!("surface focus: {focused}");
    }

    fn mouse_press_event(&self, event: &MouseEvent) {
        println!("surface mouse press at {:?}", event.position);
    }

    fn mouse_move_event(&self, _event: &MouseEvent) {}

    fn mouse_release_event(&self, event: &MouseEvent) {
        println!("surface mouse release at {:?}", event.position);
    }

    fn hover_enter_event(&self, _event: &HoverEvent) {}

    fn hover_move_event(&self, _event: &HoverEvent) {}

    fn hover_leave_event(&self, _event: &HoverEvent) {}

    fn key_press_event(&self, event: &KeyEvent) {
        println!("surface key press {:?}", event.text);
    }

    fn key_release_event(&self, _event: &KeyEvent) {}

    fn touch_event(&self, modifiers: Modifiers, points: &[TouchPoint], states: TouchPointStates, timestamp: u64) {
        let ids: Vec<i32> = points.iter().map(|p| p.id).collect();
        println!("surface touch t={timestamp} points={ids:?} states={states:?} modifiers={modifiers}");
    }

    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.events.subscribe()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let keyboard = Arc::new(KeyboardInfo::new(KeyboardRegion::new(0.0, 400.0, 640.0, 80.0)));
    let config = ItemConfig {
        consumes_input: true,
        ..Default::default()
    };

    let mut item = SurfaceItem::new(config, keyboard)?;
    let mut item_events = item.subscribe();

    let window = Arc::new(RenderWindow::new());
    item.set_window(Some(window.clone()));
    item.set_size(640.0, 480.0);
    item.set_orientation_angle(OrientationAngle::Angle90);

    let surface = DemoSurface::new(640, 480);
    let handle: Arc<dyn SurfaceHandle> = surface.clone();
    item.set_surface(Some(handle));
    item.set_active_focus(true);

    // Render thread: paint whenever the item asks for it
    let binding = item.binding();
    let params = item.paint_params();
    let render_window = window.clone();
    let render = tokio::spawn(async move {
        let mut node = None;
        for _ in 0..6 {
            if tokio::time::timeout(Duration::from_millis(200), binding.update_requested())
                .await
                .is_err()
            {
                break;
            }

            node = binding.update_paint_node(node, &params);
            render_window.run_render_jobs(RenderStage::AfterSynchronizing);
            render_window.frame_swapped();

            if let Some(node) = &node {
                println!("render: painted, {} material upload(s)", node.material_uploads());
            }
        }
    });

    // Client posts three buffers at once; the render thread drains them one per paint
    surface.post_frames(3);
    item.set_surface_width(800);

    for _ in 0..5 {
        let result = item.tick();
        if !result.is_idle() {
            println!("tick: {result:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    item.mouse_press_event(&MouseEvent::new(20.0, 20.0, MouseButtons::LEFT));
    item.mouse_release_event(&MouseEvent::new(20.0, 20.0, MouseButtons::LEFT));
    item.key_press_event(&KeyEvent::new(0x41, "a"));

    // A new touch begins before the previous sequence ended; the item repairs it
    let pressed = |id, x| TouchPoint::new(id, x, 10.0, TouchPointState::Pressed);
    item.touch_event(TouchBatch::new(TouchEventKind::Begin, 1, vec![pressed(1, 10.0)]));
    item.touch_event(TouchBatch::new(
        TouchEventKind::Update,
        2,
        vec![
            TouchPoint::new(1, 12.0, 10.0, TouchPointState::Moved),
            pressed(2, 50.0),
        ],
    ));
    item.touch_event(TouchBatch::new(TouchEventKind::Begin, 3, vec![pressed(3, 90.0)]));

    render.await?;

    item.release_resources();
    window.run_render_jobs(RenderStage::AfterSynchronizing);
    drop(item);

    while let Ok(event) = item_events.try_recv() {
        match event {
            ItemEvent::SurfaceChanged { surface } => println!("event: surface changed to {surface:?}"),
            other => println!("event: {other:?}"),
        }
    }

    println!("view count after teardown: displayed = {}", surface.is_being_displayed());
    Ok(())
}
