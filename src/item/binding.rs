//! Which surface an item displays, shared between the UI and render threads.
//!
//! The UI thread attaches and detaches surfaces; the render thread reads the
//! attached surface's texture and builds paint nodes from it. Both go through
//! one lock, held by [`SurfaceBinding`] around:
//!
//! - [`attach`](SurfaceBinding::attach) / [`detach`](SurfaceBinding::detach),
//! - [`texture_provider`](SurfaceBinding::texture_provider),
//! - [`update_paint_node`](SurfaceBinding::update_paint_node).
//!
//! None of them calls another, so the lock is never taken recursively.
//!
//! An orientation set while nothing is attached is staged in the
//! [`Attachment::Unattached`] variant and consumed by the next attach, so a
//! staged orientation and an attached surface can never coexist.

use crate::render::{DirtyState, Filtering, ImageNode, PaintParams, Rect, RenderWindow, TextureProvider};
use crate::surface::{
    OrientationAngle, SurfaceEvent, SurfaceHandle, SurfaceId, SurfaceSize, SurfaceState, SurfaceType,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, Notify};

/// Desired surface dimensions. Zero or less means "keep the surface's own value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesiredSize {
    pub width: i32,
    pub height: i32,
}

/// Item state an attach needs to know about.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachContext<'a> {
    /// Window the item is shown in, if any
    pub window: Option<&'a Arc<RenderWindow>>,
    pub has_active_focus: bool,
    pub consumes_input: bool,
    pub desired_size: DesiredSize,
}

/// Snapshot of a surface taken right after it was attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedSurfaceInfo {
    pub id: SurfaceId,
    pub surface_type: SurfaceType,
    pub live: bool,
    pub state: SurfaceState,
    pub size: SurfaceSize,
    /// Orientation to announce; `None` when a staged orientation was applied,
    /// since that value was announced when it was staged.
    pub orientation: Option<OrientationAngle>,
}

/// What an attach changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachReport {
    pub detached: Option<SurfaceId>,
    pub detached_was_live: bool,
    pub attached: Option<AttachedSurfaceInfo>,
}

struct AttachedSurface {
    surface: Arc<dyn SurfaceHandle>,
    /// Dropping the receiver disconnects the item from the surface's notifications
    events: broadcast::Receiver<SurfaceEvent>,
}

enum Attachment {
    Unattached { pending_orientation: Option<OrientationAngle> },
    Attached(AttachedSurface),
}

struct BindingState {
    attachment: Attachment,
    provider: Option<Arc<TextureProvider>>,
    /// Filtering applied to providers created before the next paint
    smooth: bool,
    last_frame_rendered: Option<u64>,
}

struct BindingInner {
    state: Mutex<BindingState>,
    update_requested: AtomicBool,
    update_notify: Notify,
}

/// Cloneable handle to an item's binding; clones share the same state.
#[derive(Clone)]
pub struct SurfaceBinding {
    inner: Arc<BindingInner>,
}

impl std::fmt::Debug for SurfaceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBinding")
            .field("surface", &self.surface_id())
            .field("update_requested", &self.inner.update_requested.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Default for SurfaceBinding {
    fn default() -> Self {
        Self::new()
    }
}

/// Resizes `surface` to the desired size, falling back to the surface's own
/// value for any dimension left unset. Does nothing for dead surfaces or when
/// neither dimension is set.
pub(crate) fn apply_desired_size(surface: &dyn SurfaceHandle, desired: DesiredSize) -> bool {
    if !surface.live() || (desired.width <= 0 && desired.height <= 0) {
        return false;
    }

    let current = surface.size();
    let width = if desired.width > 0 { desired.width } else { current.width };
    let height = if desired.height > 0 { desired.height } else { current.height };

    log::debug!("Surface[{}]: resizing to {}x{}", surface.id(), width, height);
    surface.resize(width, height);
    true
}

impl SurfaceBinding {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BindingInner {
                state: Mutex::new(BindingState {
                    attachment: Attachment::Unattached { pending_orientation: None },
                    provider: None,
                    smooth: true,
                    last_frame_rendered: None,
                }),
                update_requested: AtomicBool::new(false),
                update_notify: Notify::new(),
            }),
        }
    }

    // Every critical section leaves the state consistent, so a panic in another
    // holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, BindingState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn surface(&self) -> Option<Arc<dyn SurfaceHandle>> {
        match &self.lock().attachment {
            Attachment::Attached(attached) => Some(attached.surface.clone()),
            Attachment::Unattached { .. } => None,
        }
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        match &self.lock().attachment {
            Attachment::Attached(attached) => Some(attached.surface.id()),
            Attachment::Unattached { .. } => None,
        }
    }

    /// Orientation staged while unattached, if any.
    pub fn staged_orientation(&self) -> Option<OrientationAngle> {
        match &self.lock().attachment {
            Attachment::Unattached { pending_orientation } => *pending_orientation,
            Attachment::Attached(_) => None,
        }
    }

    pub fn orientation_angle(&self) -> OrientationAngle {
        match &self.lock().attachment {
            Attachment::Attached(attached) => attached.surface.orientation_angle(),
            Attachment::Unattached { pending_orientation } => pending_orientation.unwrap_or_default(),
        }
    }

    /// Writes through to the attached surface, or stages the angle when
    /// unattached. Returns `true` when a staged value changed; changes on an
    /// attached surface are announced by the surface itself.
    pub fn set_orientation_angle(&self, angle: OrientationAngle) -> bool {
        let mut state = self.lock();
        match &mut state.attachment {
            Attachment::Attached(attached) => {
                attached.surface.set_orientation_angle(angle);
                false
            }
            Attachment::Unattached { pending_orientation } => {
                if *pending_orientation == Some(angle) {
                    return false;
                }
                log::debug!("Binding: staging orientation {:?} until a surface is attached", angle);
                *pending_orientation = Some(angle);
                true
            }
        }
    }

    /// Attaches `surface` (or nothing), releasing the previously attached one.
    ///
    /// Returns `None` without touching anything when `surface` is already the
    /// attached one, including attaching nothing while nothing is attached.
    pub fn attach(&self, surface: Option<Arc<dyn SurfaceHandle>>, ctx: &AttachContext<'_>) -> Option<AttachReport> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let current_id = match &state.attachment {
            Attachment::Attached(attached) => Some(attached.surface.id()),
            Attachment::Unattached { .. } => None,
        };
        let new_id = surface.as_ref().map(|s| s.id());
        if current_id == new_id {
            return None;
        }

        log::debug!("Binding: attach {:?} (was {:?})", new_id, current_id);

        let mut report = AttachReport::default();
        let previous = std::mem::replace(
            &mut state.attachment,
            Attachment::Unattached { pending_orientation: None },
        );

        let pending_orientation = match previous {
            Attachment::Attached(AttachedSurface { surface: old, events }) => {
                drop(events);
                let live = old.live();

                if ctx.has_active_focus && ctx.consumes_input && live {
                    old.set_focus(false);
                }

                old.decrement_view_count();

                if let Some(window) = ctx.window {
                    if !old.is_being_displayed() {
                        window.disconnect_frame_swapped(old.id());
                    }
                }

                if let Some(provider) = &state.provider {
                    provider.release_texture();
                }

                report.detached = Some(old.id());
                report.detached_was_live = live;
                None
            }
            Attachment::Unattached { pending_orientation } => pending_orientation,
        };

        state.last_frame_rendered = None;

        if let Some(surface) = surface {
            surface.increment_view_count();

            let orientation = match pending_orientation {
                Some(angle) => {
                    log::debug!("Surface[{}]: applying staged orientation {:?}", surface.id(), angle);
                    surface.set_orientation_angle(angle);
                    None
                }
                None => Some(surface.orientation_angle()),
            };

            let events = surface.subscribe();

            if let Some(window) = ctx.window {
                window.connect_frame_swapped(&surface);
            }

            apply_desired_size(&*surface, ctx.desired_size);

            let live = surface.live();
            if ctx.consumes_input && live {
                surface.set_focus(ctx.has_active_focus);
            }

            report.attached = Some(AttachedSurfaceInfo {
                id: surface.id(),
                surface_type: surface.surface_type(),
                live,
                state: surface.state(),
                size: surface.size(),
                orientation,
            });

            state.attachment = Attachment::Attached(AttachedSurface { surface, events });
        }

        drop(guard);
        self.request_update();

        Some(report)
    }

    pub fn detach(&self, ctx: &AttachContext<'_>) -> Option<AttachReport> {
        self.attach(None, ctx)
    }

    /// Registers the attached surface with `window`'s frame-swapped signal.
    pub fn connect_window(&self, window: &Arc<RenderWindow>) -> bool {
        match &self.lock().attachment {
            Attachment::Attached(attached) => window.connect_frame_swapped(&attached.surface),
            Attachment::Unattached { .. } => false,
        }
    }

    /// Drops the attached surface's frame-swapped link on `window`.
    pub fn disconnect_window(&self, window: &RenderWindow) -> bool {
        match &self.lock().attachment {
            Attachment::Attached(attached) => window.disconnect_frame_swapped(attached.surface.id()),
            Attachment::Unattached { .. } => false,
        }
    }

    /// Filtering for providers and nodes built from now on.
    pub fn set_smooth(&self, smooth: bool) {
        let mut state = self.lock();
        state.smooth = smooth;
        if let Some(provider) = &state.provider {
            provider.set_smooth(smooth);
        }
    }

    fn ensure_provider(
        slot: &mut Option<Arc<TextureProvider>>,
        surface: &dyn SurfaceHandle,
        smooth: bool,
    ) -> Arc<TextureProvider> {
        match slot {
            Some(provider) => {
                if !provider.has_texture() {
                    provider.set_texture(surface.texture());
                }
                provider.clone()
            }
            None => {
                let provider = Arc::new(TextureProvider::new(surface.texture()));
                provider.set_smooth(smooth);
                *slot = Some(provider.clone());
                provider
            }
        }
    }

    /// Render thread: the provider for the attached surface's texture,
    /// created or refreshed on demand.
    pub fn texture_provider(&self) -> Option<Arc<TextureProvider>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        match &state.attachment {
            Attachment::Attached(attached) => {
                Some(Self::ensure_provider(&mut state.provider, &*attached.surface, state.smooth))
            }
            Attachment::Unattached { .. } => state.provider.clone(),
        }
    }

    /// Render thread: builds or updates the paint node for the attached
    /// surface. Returns `None` (dropping `old`) while there is nothing to show.
    pub fn update_paint_node(&self, old: Option<ImageNode>, params: &PaintParams) -> Option<ImageNode> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let surface = match &state.attachment {
            Attachment::Attached(attached) => attached.surface.clone(),
            Attachment::Unattached { .. } => return None,
        };

        state.smooth = params.smooth;
        let provider = Self::ensure_provider(&mut state.provider, &*surface, state.smooth);

        surface.update_texture();

        // Multi-buffered clients: come back for the next buffer right away
        if surface.num_buffers_ready_for_compositor() > 0 {
            self.request_update();
        }

        provider.set_smooth(params.smooth);
        let texture = provider.texture()?;
        let frame = surface.current_frame_number();

        let mut node = match old {
            None => ImageNode::new(texture),
            Some(mut node) => {
                if state.last_frame_rendered != Some(frame) {
                    node.mark_dirty(DirtyState::MATERIAL);
                }
                node.set_texture(texture);
                node
            }
        };

        let rect = Rect::new(0.0, 0.0, params.width, params.height);
        node.set_target_rect(rect);
        node.set_inner_target_rect(rect);
        node.set_filtering(if params.smooth {
            Filtering::Linear
        } else {
            Filtering::Nearest
        });
        node.set_antialiasing(params.antialiasing);

        let flushed = node.update();
        state.last_frame_rendered = Some(frame);

        log::trace!("Surface[{}]: painted frame {} ({:?})", surface.id(), frame, flushed);
        Some(node)
    }

    /// Removes the provider from the binding so the caller can dispose of it.
    pub fn take_texture_provider(&self) -> Option<Arc<TextureProvider>> {
        self.lock().provider.take()
    }

    /// Drains the attached surface's pending notifications. UI thread only.
    ///
    /// When the receiver lagged behind, the missed notifications are replaced
    /// by a resync built from the surface's current values.
    pub fn drain_surface_events(&self) -> Vec<SurfaceEvent> {
        let mut state = self.lock();
        let Attachment::Attached(attached) = &mut state.attachment else {
            return Vec::new();
        };

        let mut events = Vec::new();
        loop {
            match attached.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(missed)) => {
                    let surface = &attached.surface;
                    log::debug!("Surface[{}]: missed {} notification(s), resyncing", surface.id(), missed);
                    events.extend([
                        SurfaceEvent::FramesPosted,
                        SurfaceEvent::StateChanged(surface.state()),
                        SurfaceEvent::LiveChanged(surface.live()),
                        SurfaceEvent::SizeChanged(surface.size()),
                        SurfaceEvent::OrientationAngleChanged(surface.orientation_angle()),
                    ]);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Asks for a repaint. Callable from any thread.
    pub fn request_update(&self) {
        self.inner.update_requested.store(true, Ordering::Release);
        self.inner.update_notify.notify_one();
    }

    pub fn is_update_requested(&self) -> bool {
        self.inner.update_requested.load(Ordering::Acquire)
    }

    /// Returns and clears the pending repaint request.
    pub fn take_update_request(&self) -> bool {
        self.inner.update_requested.swap(false, Ordering::AcqRel)
    }

    /// Waits until a repaint is requested, then clears the request.
    pub async fn update_requested(&self) {
        loop {
            if self.take_update_request() {
                return;
            }
            self.inner.update_notify.notified().await;
        }
    }
}
