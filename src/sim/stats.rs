//! Aggregate statistics and their fan-out to listeners

use serde::Serialize;

/// What the HUD shows: shapes near the field and their total area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VisibleStats {
    pub count: usize,
    /// Rounded sum of areas (px²)
    pub area: u64,
}

/// Handle returned by [`StatsBroadcast::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type StatsListener = Box<dyn FnMut(&VisibleStats)>;

/// Synchronous multi-subscriber notification
///
/// Listeners run in subscription order on the caller's stack. A panicking
/// listener unwinds through [`StatsBroadcast::notify`]; later listeners are
/// not called for that notification.
#[derive(Default)]
pub struct StatsBroadcast {
    listeners: Vec<(SubscriptionId, StatsListener)>,
    next_id: u64,
    last: Option<VisibleStats>,
}

impl std::fmt::Debug for StatsBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsBroadcast")
            .field("listeners", &self.listeners.len())
            .field("last", &self.last)
            .finish()
    }
}

impl StatsBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&VisibleStats) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Most recently broadcast stats
    pub fn last(&self) -> Option<VisibleStats> {
        self.last
    }

    pub fn notify(&mut self, stats: VisibleStats) {
        self.last = Some(stats);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&stats);
        }
    }
}
