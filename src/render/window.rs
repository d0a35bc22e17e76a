//! The render surface an item is shown in.
//!
//! A [`RenderWindow`] owns two things the render thread drives:
//!
//! - the *frame-swapped* signal. Surfaces are connected to it directly: the
//!   render thread calls [`SurfaceHandle::on_compositor_swapped_buffers`]
//!   inline from [`RenderWindow::frame_swapped`], with no queueing. A surface
//!   is connected at most once no matter how many items attach it.
//! - a queue of one-shot render jobs, run by the render thread at a given
//!   [`RenderStage`] of the frame.

use crate::errors::ItemError;
use crate::surface::{SurfaceHandle, SurfaceId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WindowId(Uuid);

impl WindowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

/// Point in the render loop at which a scheduled job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Before the scene graph is synchronized with the items
    BeforeSynchronizing,
    /// After synchronization, while the UI thread is running again
    AfterSynchronizing,
}

pub type RenderJob = Box<dyn FnOnce() + Send + 'static>;

struct ScheduledJob {
    stage: RenderStage,
    job: RenderJob,
}

struct FrameSwappedLink {
    surface_id: SurfaceId,
    surface: Weak<dyn SurfaceHandle>,
}

pub struct RenderWindow {
    id: WindowId,
    links: Mutex<Vec<FrameSwappedLink>>,
    jobs: Mutex<Vec<ScheduledJob>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for RenderWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderWindow")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Default for RenderWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderWindow {
    pub fn new() -> Self {
        Self {
            id: WindowId::new(),
            links: Mutex::new(Vec::new()),
            jobs: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Connects `surface` to the frame-swapped signal. Returns `false` when it
    /// already was connected, in which case nothing changes.
    pub fn connect_frame_swapped(&self, surface: &Arc<dyn SurfaceHandle>) -> bool {
        let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
        let surface_id = surface.id();

        if links.iter().any(|l| l.surface_id == surface_id) {
            return false;
        }

        links.push(FrameSwappedLink {
            surface_id,
            surface: Arc::downgrade(surface),
        });
        true
    }

    /// Returns `false` when `surface_id` was not connected.
    pub fn disconnect_frame_swapped(&self, surface_id: SurfaceId) -> bool {
        let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
        let before = links.len();
        links.retain(|l| l.surface_id != surface_id);
        links.len() != before
    }

    pub fn is_frame_swapped_connected(&self, surface_id: SurfaceId) -> bool {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|l| l.surface_id == surface_id)
    }

    /// Emits the frame-swapped signal. Render thread only.
    ///
    /// Connected surfaces are called inline, after the link list lock has been
    /// released. Links to surfaces that no longer exist are pruned.
    pub fn frame_swapped(&self) -> usize {
        let targets: Vec<Arc<dyn SurfaceHandle>> = {
            let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
            links.retain(|l| l.surface.strong_count() > 0);
            links.iter().filter_map(|l| l.surface.upgrade()).collect()
        };

        for surface in &targets {
            surface.on_compositor_swapped_buffers();
        }
        targets.len()
    }

    /// Queues `job` to run on the render thread at `stage`.
    ///
    /// Fails once the window is closed; the job is dropped right away then.
    pub fn schedule_render_job(&self, stage: RenderStage, job: RenderJob) -> Result<(), ItemError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ItemError::WindowClosed);
        }

        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ScheduledJob { stage, job });
        Ok(())
    }

    pub fn pending_render_jobs(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs and removes every job queued for `stage`. Render thread only.
    pub fn run_render_jobs(&self, stage: RenderStage) -> usize {
        let due: Vec<ScheduledJob> = {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            let (due, keep): (Vec<ScheduledJob>, Vec<ScheduledJob>) = std::mem::take(&mut *jobs)
                .into_iter()
                .partition(|j| j.stage == stage);
            *jobs = keep;
            due
        };

        let count = due.len();
        for scheduled in due {
            (scheduled.job)();
        }
        count
    }

    /// Closes the window. Jobs still queued run immediately, since no render
    /// thread will pick them up anymore.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let remaining = std::mem::take(&mut *self.jobs.lock().unwrap_or_else(PoisonError::into_inner));
        log::debug!("Window[{:?}]: closing, running {} pending job(s)", self.id, remaining.len());
        for scheduled in remaining {
            (scheduled.job)();
        }

        self.links.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeSurface;
    use crate::surface::SurfaceType;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn frame_swapped_connection_is_unique() {
        let window = RenderWindow::new();
        let fake = FakeSurface::new(SurfaceType::Normal);
        let surface: Arc<dyn SurfaceHandle> = fake.clone();

        assert!(window.connect_frame_swapped(&surface));
        assert!(!window.connect_frame_swapped(&surface));

        assert_eq!(window.frame_swapped(), 1);
        assert_eq!(fake.swapped_buffers(), 1);
    }

    #[test]
    fn disconnected_surface_is_not_notified() {
        let window = RenderWindow::new();
        let fake = FakeSurface::new(SurfaceType::Normal);
        let surface: Arc<dyn SurfaceHandle> = fake.clone();

        window.connect_frame_swapped(&surface);
        assert!(window.disconnect_frame_swapped(surface.id()));
        assert!(!window.disconnect_frame_swapped(surface.id()));

        window.frame_swapped();
        assert_eq!(fake.swapped_buffers(), 0);
    }

    #[test]
    fn dropped_surfaces_are_pruned() {
        let window = RenderWindow::new();
        let surface: Arc<dyn SurfaceHandle> = FakeSurface::new(SurfaceType::Normal);
        let id = surface.id();
        window.connect_frame_swapped(&surface);
        drop(surface);

        assert_eq!(window.frame_swapped(), 0);
        assert!(!window.is_frame_swapped_connected(id));
    }

    #[test]
    fn jobs_run_only_at_their_stage() {
        let window = RenderWindow::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let r = ran.clone();
        window
            .schedule_render_job(RenderStage::AfterSynchronizing, Box::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert_eq!(window.run_render_jobs(RenderStage::BeforeSynchronizing), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(window.pending_render_jobs(), 1);

        assert_eq!(window.run_render_jobs(RenderStage::AfterSynchronizing), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(window.pending_render_jobs(), 0);
    }

    #[test]
    fn closing_runs_pending_jobs_and_rejects_new_ones() {
        let window = RenderWindow::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let r = ran.clone();
        window
            .schedule_render_job(RenderStage::AfterSynchronizing, Box::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        window.close();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(window.is_closed());

        let res = window.schedule_render_job(RenderStage::AfterSynchronizing, Box::new(|| {}));
        assert!(matches!(res, Err(ItemError::WindowClosed)));
    }
}
