//! Graphic recycling and memory reclamation
//!
//! Released graphics are reset and kept for reuse up to `max_size`. The
//! host calls [`GraphicPool::cleanup`] periodically; under heap pressure the
//! oldest half of the pool is destroyed.

use serde::Serialize;

use super::graphic::{Graphic, GraphicId};
use crate::consts::{
    CLEANUP_INTERVAL_MS, MAX_POOL_SIZE, MEMORY_PRESSURE_THRESHOLD, RECLAIM_INTERVAL_MS,
};

/// Heap usage in bytes as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapUsage {
    pub used: u64,
    pub total: u64,
}

impl HeapUsage {
    /// Used-to-total ratio, `None` when either count is missing (zero)
    pub fn ratio(&self) -> Option<f64> {
        if self.used == 0 || self.total == 0 {
            None
        } else {
            Some(self.used as f64 / self.total as f64)
        }
    }
}

/// Host memory capability. Not every platform can answer.
pub trait MemoryProbe {
    /// Current heap usage, `None` if unknown
    fn heap_usage(&self) -> Option<HeapUsage>;

    /// Best-effort hint that now is a good time to reclaim memory
    fn request_reclaim(&self) {}
}

/// What happened to a released graphic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Reset and stored for reuse
    Pooled,
    /// Pool was full; graphic destroyed
    Destroyed,
    /// Graphic was already destroyed; nothing done
    AlreadyDestroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub pooled: usize,
    pub max_size: usize,
    /// Graphics constructed because the pool was empty
    pub created: u64,
    /// Graphics destroyed by the pool
    pub destroyed: u64,
    pub pressure_detected: bool,
}

#[derive(Debug)]
pub struct GraphicPool {
    /// Oldest first; acquire pops from the back
    graphics: Vec<Graphic>,
    max_size: usize,
    next_id: u32,
    created: u64,
    destroyed: u64,
    last_cleanup_ms: f64,
    last_reclaim_ms: f64,
    pressure_detected: bool,
}

impl Default for GraphicPool {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicPool {
    pub fn new() -> Self {
        Self::with_max_size(MAX_POOL_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            graphics: Vec::with_capacity(max_size),
            max_size,
            next_id: 1,
            created: 0,
            destroyed: 0,
            last_cleanup_ms: 0.0,
            last_reclaim_ms: 0.0,
            pressure_detected: false,
        }
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the cap. Excess is trimmed by the next [`GraphicPool::cleanup`].
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    pub fn is_memory_pressure_detected(&self) -> bool {
        self.pressure_detected
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pooled: self.graphics.len(),
            max_size: self.max_size,
            created: self.created,
            destroyed: self.destroyed,
            pressure_detected: self.pressure_detected,
        }
    }

    /// Take a blank graphic, reusing a pooled one when available
    pub fn acquire(&mut self) -> Graphic {
        if let Some(mut graphic) = self.graphics.pop() {
            graphic.clear();
            return graphic;
        }
        let id = GraphicId(self.next_id);
        self.next_id += 1;
        self.created += 1;
        Graphic::new(id)
    }

    /// Hand a graphic back. It is stored if there is room, destroyed otherwise.
    pub fn release(&mut self, mut graphic: Graphic) -> ReleaseOutcome {
        if graphic.is_destroyed() {
            return ReleaseOutcome::AlreadyDestroyed;
        }
        graphic.reset();
        if self.graphics.len() < self.max_size {
            self.graphics.push(graphic);
            ReleaseOutcome::Pooled
        } else {
            self.destroy(&mut graphic);
            ReleaseOutcome::Destroyed
        }
    }

    fn destroy(&mut self, graphic: &mut Graphic) {
        if graphic.destroy() {
            self.destroyed += 1;
        }
    }

    /// Periodic maintenance, gated internally by the cleanup and reclaim
    /// intervals so that calling it more often is harmless.
    pub fn cleanup(&mut self, now_ms: f64, probe: &dyn MemoryProbe) {
        if now_ms - self.last_cleanup_ms >= CLEANUP_INTERVAL_MS {
            self.last_cleanup_ms = now_ms;

            if let Some(ratio) = probe.heap_usage().and_then(|usage| usage.ratio()) {
                self.pressure_detected = ratio >= MEMORY_PRESSURE_THRESHOLD;
                if self.pressure_detected {
                    log::warn!("Memory pressure at {:.0}% of heap", ratio * 100.0);
                    self.aggressive_cleanup(probe);
                }
            }

            if self.graphics.len() > self.max_size {
                let excess: Vec<Graphic> = self.graphics.drain(self.max_size..).collect();
                log::debug!("Trimming {} pooled graphics", excess.len());
                for mut graphic in excess {
                    self.destroy(&mut graphic);
                }
            }
        }

        if now_ms - self.last_reclaim_ms >= RECLAIM_INTERVAL_MS {
            self.last_reclaim_ms = now_ms;
            log::debug!("Requesting memory reclaim");
            probe.request_reclaim();
        }
    }

    /// Destroy the oldest half of the pool
    fn aggressive_cleanup(&mut self, probe: &dyn MemoryProbe) {
        let to_remove = self.graphics.len() / 2;
        let removed: Vec<Graphic> = self.graphics.drain(..to_remove).collect();
        for mut graphic in removed {
            self.destroy(&mut graphic);
        }
        log::warn!(
            "Aggressive cleanup destroyed {} graphics, {} remain pooled",
            to_remove,
            self.graphics.len()
        );
        probe.request_reclaim();
    }

    /// Destroy every pooled graphic
    pub fn clear(&mut self) {
        let all: Vec<Graphic> = self.graphics.drain(..).collect();
        for mut graphic in all {
            self.destroy(&mut graphic);
        }
    }
}
