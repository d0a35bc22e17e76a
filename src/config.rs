use crate::errors::ItemError;
use serde::{Deserialize, Serialize};

/// Capacity of the broadcast channel carrying [`ItemEvent`](crate::event::ItemEvent)s.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Construction-time settings for a [`SurfaceItem`](crate::item::SurfaceItem).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// Linear filtering when true, nearest otherwise
    pub smooth: bool,
    /// Antialias the edges of the paint node
    pub antialiasing: bool,
    /// Forward input to the attached surface from the start
    pub consumes_input: bool,
    /// How many item events may be buffered per subscriber before it lags
    pub event_channel_capacity: usize,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            smooth: true,
            antialiasing: false,
            consumes_input: false,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ItemConfig {
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.event_channel_capacity == 0 {
            return Err(ItemError::InvalidConfig(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
