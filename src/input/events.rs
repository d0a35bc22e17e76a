//! Input event types.
//!
//! # Main Types
//!
//! - [`Modifiers`]: Keyboard modifiers (Shift, Control, Alt, Meta, Keypad).
//! - [`MouseButtons`]: Set of mouse buttons, used both for a single button and for masks.
//! - [`TouchPoint`] / [`TouchBatch`]: One snapshot of all active touch points and their aggregate phase.

use bitflags::bitflags;
use std::fmt::Display;

bitflags! {
    #[derive(Default)]
    pub struct Modifiers: u8 {
        const SHIFT   = 0b00001;
        const CONTROL = 0b00010;
        const ALT     = 0b00100;
        const META    = 0b01000;
        const KEYPAD  = 0b10000;
    }
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if self.contains(Modifiers::SHIFT) {
            parts.push("Shift");
        }
        if self.contains(Modifiers::CONTROL) {
            parts.push("Control");
        }
        if self.contains(Modifiers::ALT) {
            parts.push("Alt");
        }
        if self.contains(Modifiers::META) {
            parts.push("Meta");
        }
        if self.contains(Modifiers::KEYPAD) {
            parts.push("Keypad");
        }

        if parts.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

bitflags! {
    #[derive(Default)]
    pub struct MouseButtons: u32 {
        const LEFT     = 1 << 0;
        const RIGHT    = 1 << 1;
        const MIDDLE   = 1 << 2;
        const EXTRA_1  = 1 << 3;
        const EXTRA_2  = 1 << 4;
        const EXTRA_3  = 1 << 5;
        const EXTRA_4  = 1 << 6;
        const EXTRA_5  = 1 << 7;
        const EXTRA_6  = 1 << 8;
        const EXTRA_7  = 1 << 9;
        const EXTRA_8  = 1 << 10;
        const EXTRA_9  = 1 << 11;
        const EXTRA_10 = 1 << 12;
        const EXTRA_11 = 1 << 13;
        const EXTRA_12 = 1 << 14;
        const EXTRA_13 = 1 << 15;
    }
}

/// Position in item-local coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Snaps to the nearest integer pixel.
    pub fn rounded(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }
}

/// Mouse press, move or release.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub position: Point,
    /// Button that changed state (empty for moves)
    pub button: MouseButtons,
    /// Buttons held down after this event
    pub buttons: MouseButtons,
    pub modifiers: Modifiers,
    pub timestamp: u64,
}

impl MouseEvent {
    pub fn new(x: f64, y: f64, button: MouseButtons) -> Self {
        Self {
            position: Point::new(x, y),
            button,
            buttons: button,
            modifiers: Modifiers::empty(),
            timestamp: 0,
        }
    }
}

/// Pointer hovering over the item without any button held.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverEvent {
    pub position: Point,
    pub old_position: Point,
    pub modifiers: Modifiers,
    pub timestamp: u64,
}

impl HoverEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            old_position: Point::new(x, y),
            modifiers: Modifiers::empty(),
            timestamp: 0,
        }
    }
}

/// Key press or release.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: u32,
    pub scan_code: u32,
    pub text: String,
    pub modifiers: Modifiers,
    pub auto_repeat: bool,
    pub timestamp: u64,
}

impl KeyEvent {
    pub fn new(key: u32, text: impl Into<String>) -> Self {
        Self {
            key,
            scan_code: 0,
            text: text.into(),
            modifiers: Modifiers::empty(),
            auto_repeat: false,
            timestamp: 0,
        }
    }
}

/// Scroll wheel rotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WheelEvent {
    pub position: Point,
    pub angle_delta: Point,
    pub modifiers: Modifiers,
    pub timestamp: u64,
}

/// Phase of one touch point within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPointState {
    Pressed,
    Moved,
    Stationary,
    Released,
}

bitflags! {
    #[derive(Default)]
    pub struct TouchPointStates: u8 {
        const PRESSED    = 0b0001;
        const MOVED      = 0b0010;
        const STATIONARY = 0b0100;
        const RELEASED   = 0b1000;
    }
}

impl From<TouchPointState> for TouchPointStates {
    fn from(state: TouchPointState) -> Self {
        match state {
            TouchPointState::Pressed => TouchPointStates::PRESSED,
            TouchPointState::Moved => TouchPointStates::MOVED,
            TouchPointState::Stationary => TouchPointStates::STATIONARY,
            TouchPointState::Released => TouchPointStates::RELEASED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchPoint {
    pub id: i32,
    pub position: Point,
    pub state: TouchPointState,
}

impl TouchPoint {
    pub fn new(id: i32, x: f64, y: f64, state: TouchPointState) -> Self {
        Self {
            id,
            position: Point::new(x, y),
            state,
        }
    }
}

/// Kind of a touch batch within a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEventKind {
    /// First batch of a sequence, every point newly pressed
    Begin,
    /// Any batch between Begin and End
    Update,
    /// Last batch of a sequence, every point released
    End,
}

/// One delivered snapshot of all active touch points.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchBatch {
    pub kind: TouchEventKind,
    pub timestamp: u64,
    pub modifiers: Modifiers,
    pub points: Vec<TouchPoint>,
    /// Union of the per-point phases
    pub states: TouchPointStates,
}

impl TouchBatch {
    /// Creates a batch whose aggregate states are computed from `points`.
    pub fn new(kind: TouchEventKind, timestamp: u64, points: Vec<TouchPoint>) -> Self {
        let states = Self::aggregate_states(&points);
        Self {
            kind,
            timestamp,
            modifiers: Modifiers::empty(),
            points,
            states,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn aggregate_states(points: &[TouchPoint]) -> TouchPointStates {
        points
            .iter()
            .fold(TouchPointStates::empty(), |acc, p| acc | TouchPointStates::from(p.state))
    }

    /// Recomputes `states` from the points and derives `kind` from it: all
    /// released is an End, all pressed is a Begin, anything else an Update.
    pub fn refresh_states_and_kind(&mut self) {
        self.states = Self::aggregate_states(&self.points);

        self.kind = if self.states == TouchPointStates::RELEASED {
            TouchEventKind::End
        } else if self.states == TouchPointStates::PRESSED {
            TouchEventKind::Begin
        } else {
            TouchEventKind::Update
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_display_empty_is_none() {
        assert_eq!(Modifiers::empty().to_string(), "None");
    }

    #[test]
    fn modifiers_display_combo_in_order() {
        let some = Modifiers::SHIFT | Modifiers::ALT | Modifiers::KEYPAD;
        assert_eq!(some.to_string(), "Shift+Alt+Keypad");
    }

    #[test]
    fn batch_computes_aggregate_states() {
        let batch = TouchBatch::new(
            TouchEventKind::Update,
            10,
            vec![
                TouchPoint::new(1, 0.0, 0.0, TouchPointState::Moved),
                TouchPoint::new(2, 5.0, 5.0, TouchPointState::Pressed),
            ],
        );
        assert_eq!(batch.states, TouchPointStates::MOVED | TouchPointStates::PRESSED);
    }

    #[test]
    fn refresh_derives_kind_from_point_phases() {
        let mut batch = TouchBatch::new(
            TouchEventKind::Update,
            0,
            vec![TouchPoint::new(1, 0.0, 0.0, TouchPointState::Pressed)],
        );
        batch.refresh_states_and_kind();
        assert_eq!(batch.kind, TouchEventKind::Begin);

        batch.points.push(TouchPoint::new(2, 0.0, 0.0, TouchPointState::Released));
        batch.refresh_states_and_kind();
        assert_eq!(batch.kind, TouchEventKind::Update);

        batch.points[0].state = TouchPointState::Released;
        batch.refresh_states_and_kind();
        assert_eq!(batch.kind, TouchEventKind::End);
        assert_eq!(batch.states, TouchPointStates::RELEASED);
    }

    #[test]
    fn rounded_point_snaps_to_nearest_pixel() {
        assert_eq!(Point::new(1.4, 2.6).rounded(), Point::new(1.0, 3.0));
    }
}
