//! Pointer ingestion
//!
//! Browsers deliver one press as several events (pointerdown, touchstart,
//! mousedown). The debouncer lets the first through per target and drops
//! the rest within the window, before anything reaches the simulation.

use std::collections::HashMap;

use glam::Vec2;

use crate::consts::POINTER_DEBOUNCE_MS;
use crate::sim::{EntityId, Field};

/// What a press landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerTarget {
    /// Empty field: spawn at the point
    Field,
    /// A live shape: remove it
    Entity(EntityId),
}

/// Clamp a host point into the field rectangle
pub fn clamp_to_field(field: &Field, x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y).clamp(Vec2::ZERO, Vec2::new(field.width, field.height))
}

/// Edge-trigger filter per target
#[derive(Debug, Clone)]
pub struct PointerDebouncer {
    window_ms: f64,
    last_accepted: HashMap<PointerTarget, f64>,
}

impl Default for PointerDebouncer {
    fn default() -> Self {
        Self::new(POINTER_DEBOUNCE_MS)
    }
}

impl PointerDebouncer {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            last_accepted: HashMap::new(),
        }
    }

    /// Whether a press on `target` at `now_ms` should be acted on
    pub fn accept(&mut self, target: PointerTarget, now_ms: f64) -> bool {
        if let Some(last) = self.last_accepted.get(&target) {
            if now_ms - last < self.window_ms {
                return false;
            }
        }
        self.last_accepted.insert(target, now_ms);
        self.evict(now_ms);
        true
    }

    /// Forget entries whose window has passed
    fn evict(&mut self, now_ms: f64) {
        let window = self.window_ms;
        self.last_accepted.retain(|_, last| now_ms - *last < window);
    }

    pub fn tracked(&self) -> usize {
        self.last_accepted.len()
    }
}
