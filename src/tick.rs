// A tick result reports what a UI-thread tick() of an item did
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    /// Does the item need to be repainted (new frames, or more buffers to drain)
    pub needs_redraw: bool,
    /// Was the deferred resize applied to the surface during this tick
    pub surface_resized: bool,
    /// How many surface notifications were processed
    pub surface_events: usize,
}

impl TickResult {
    pub fn is_idle(&self) -> bool {
        !self.needs_redraw && !self.surface_resized && self.surface_events == 0
    }
}
