//! Touch-sequence normalization.
//!
//! Surfaces expect a strict grammar: one Begin, any number of Updates, then
//! exactly one End, never two sequences interleaved. Upstream touch sources do
//! not always honour that (a Begin may arrive while the previous sequence was
//! never ended). The [`TouchSequenceNormalizer`] sits between the item and the
//! surface, repairs such streams by synthesizing the missing releases, and
//! keeps track of what the surface has actually seen.

use crate::input::{KeyboardRegionSource, TouchBatch, TouchEventKind, TouchPoint, TouchPointState};
use crate::surface::{SurfaceHandle, SurfaceType};
use std::sync::Arc;

/// What the surface has observed so far.
#[derive(Debug, Clone, Default)]
enum SequenceState {
    /// Nothing delivered yet
    #[default]
    Idle,
    /// Last delivered batch was a Begin or an Update
    Open(TouchBatch),
    /// Last delivered batch was an End
    Ended(TouchBatch),
}

pub struct TouchSequenceNormalizer {
    state: SequenceState,
    keyboard: Arc<dyn KeyboardRegionSource>,
}

impl std::fmt::Debug for TouchSequenceNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchSequenceNormalizer")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TouchSequenceNormalizer {
    pub fn new(keyboard: Arc<dyn KeyboardRegionSource>) -> Self {
        Self {
            state: SequenceState::Idle,
            keyboard,
        }
    }

    /// Last batch delivered to the surface, synthetic or not.
    pub fn last_delivered(&self) -> Option<&TouchBatch> {
        match &self.state {
            SequenceState::Idle => None,
            SequenceState::Open(batch) | SequenceState::Ended(batch) => Some(batch),
        }
    }

    pub fn is_sequence_open(&self) -> bool {
        matches!(self.state, SequenceState::Open(_))
    }

    /// Points of the open sequence that have not been delivered as released.
    pub fn active_points(&self) -> Vec<TouchPoint> {
        match &self.state {
            SequenceState::Open(batch) => batch
                .points
                .iter()
                .filter(|p| p.state != TouchPointState::Released)
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Forgets any sequence state, as if nothing had ever been delivered.
    pub fn reset(&mut self) {
        self.state = SequenceState::Idle;
    }

    /// Offers a batch for delivery and reports whether it was consumed.
    ///
    /// The caller has already checked that input is enabled and the surface is
    /// live. Rejected batches leave the state untouched:
    /// - Update and End batches with no open sequence,
    /// - a Begin on an input-method surface with no point inside the keyboard region.
    pub fn process(&mut self, surface: &dyn SurfaceHandle, batch: TouchBatch) -> bool {
        match batch.kind {
            TouchEventKind::Begin => {
                if surface.surface_type() == SurfaceType::InputMethod && !self.touches_keyboard(&batch) {
                    log::trace!(
                        "Surface[{}]: touch begin outside the keyboard region, not consumed",
                        surface.id()
                    );
                    return false;
                }
            }
            TouchEventKind::Update | TouchEventKind::End => {
                if !self.is_sequence_open() {
                    log::trace!(
                        "Surface[{}]: {:?} without an open touch sequence, not consumed",
                        surface.id(),
                        batch.kind
                    );
                    return false;
                }
            }
        }

        self.deliver(surface, batch);
        true
    }

    /// Forwards `batch` as-is, first closing a dangling sequence if `batch`
    /// starts a new one.
    pub fn deliver(&mut self, surface: &dyn SurfaceHandle, batch: TouchBatch) {
        if batch.kind == TouchEventKind::Begin {
            if let SequenceState::Open(open) = std::mem::take(&mut self.state) {
                log::warn!(
                    "Surface[{}] ({}): got a touch begin while there's still an active/unfinished touch sequence",
                    surface.id(),
                    surface.app_id()
                );
                self.end_sequence(surface, open, batch.timestamp);
            }
        }

        log::trace!(
            "Surface[{}]: touch {:?} with {} point(s) at {}",
            surface.id(),
            batch.kind,
            batch.points.len(),
            batch.timestamp
        );
        surface.touch_event(batch.modifiers, &batch.points, batch.states, batch.timestamp);
        self.record(batch);
    }

    /// Releases the points of `open` one per delivered batch, ending on an End.
    fn end_sequence(&mut self, surface: &dyn SurfaceHandle, open: TouchBatch, timestamp: u64) {
        let mut batch = open;
        batch.timestamp = timestamp;
        batch.points.retain(|p| p.state != TouchPointState::Released);

        if batch.points.is_empty() {
            log::debug!("Surface[{}]: dangling touch sequence had no active points left", surface.id());
            batch.kind = TouchEventKind::End;
            batch.states = Default::default();
            self.state = SequenceState::Ended(batch);
            return;
        }

        while !batch.points.is_empty() {
            batch.points[0].state = TouchPointState::Released;
            batch.refresh_states_and_kind();

            surface.touch_event(batch.modifiers, &batch.points, batch.states, batch.timestamp);
            self.record(batch.clone());

            batch.points.remove(0);
        }
    }

    fn record(&mut self, batch: TouchBatch) {
        self.state = match batch.kind {
            TouchEventKind::End => SequenceState::Ended(batch),
            TouchEventKind::Begin | TouchEventKind::Update => SequenceState::Open(batch),
        };
    }

    fn touches_keyboard(&self, batch: &TouchBatch) -> bool {
        let region = self.keyboard.region();
        batch.points.iter().any(|p| region.contains(p.position.rounded()))
    }
}
