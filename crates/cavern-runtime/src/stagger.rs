/// Spreads secondary work (collider attachment) over successive ticks.
///
/// Every `next()` call reserves one more step of delay; `on_tick()` gives one
/// back so the queue drains when nothing new is requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaggerCounter {
    busy: u32,
}

impl StaggerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current count, then increments it.
    pub fn next(&mut self) -> u32 {
        let n = self.busy;
        self.busy = self.busy.saturating_add(1);
        n
    }

    pub fn on_tick(&mut self) {
        self.busy = self.busy.saturating_sub(1);
    }

    #[inline]
    pub fn busy(&self) -> u32 {
        self.busy
    }
}
