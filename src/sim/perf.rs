//! Frame-rate tracking and adaptive quality
//!
//! Quality is a level in `0..=3` that scales spawned shape size. It steps
//! down after a short streak of slow frames and back up only after a much
//! longer streak of fast ones.

use rand::Rng;
use serde::Serialize;

use crate::consts::*;

/// Fixed-capacity ring of recent FPS samples
#[derive(Debug, Clone)]
pub struct FpsHistory {
    data: Vec<f32>,
    head: usize,
    len: usize,
}

impl FpsHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Append a sample, overwriting the oldest when full
    pub fn push(&mut self, value: f32) {
        let capacity = self.capacity();
        self.data[self.head] = value;
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Samples in chronological order
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let capacity = self.capacity();
        let start = if self.len < capacity { 0 } else { self.head };
        (0..self.len).map(move |i| self.data[(start + i) % capacity])
    }

    pub fn mean(&self) -> Option<f32> {
        if self.len == 0 {
            return None;
        }
        let sum: f64 = self.iter().map(f64::from).sum();
        Some((sum / self.len as f64) as f32)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

/// Snapshot for HUDs and logs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub fps: f32,
    pub average_fps: f32,
    pub frame_time_ms: f32,
    pub is_degraded: bool,
    pub quality_level: u8,
}

#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    target_fps: f32,
    frame_time_ms: f32,
    last_fps: f32,
    average_fps: f32,
    history: FpsHistory,
    quality_level: u8,
    low_streak: u32,
    high_streak: u32,
    frame_count: u64,
    last_stats_update_ms: Option<f64>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl PerformanceMonitor {
    pub fn new(target_fps: f32) -> Self {
        let mut monitor = Self {
            target_fps,
            frame_time_ms: 1000.0 / target_fps,
            last_fps: 60.0,
            average_fps: 60.0,
            history: FpsHistory::new(FPS_HISTORY_SIZE),
            quality_level: MAX_QUALITY,
            low_streak: 0,
            high_streak: 0,
            frame_count: 0,
            last_stats_update_ms: None,
        };
        monitor.initialize(target_fps);
        monitor
    }

    /// Reset everything and fix the target frame rate
    pub fn initialize(&mut self, target_fps: f32) {
        self.reset();
        self.target_fps = if target_fps > 0.0 { target_fps } else { 60.0 };
        self.frame_time_ms = 1000.0 / self.target_fps;
    }

    /// Restore counters, history and quality to their initial state
    pub fn reset(&mut self) {
        self.frame_count = 0;
        self.last_fps = 60.0;
        self.average_fps = 60.0;
        self.history.clear();
        self.quality_level = MAX_QUALITY;
        self.low_streak = 0;
        self.high_streak = 0;
        self.last_stats_update_ms = None;
    }

    /// Ingest one frame's elapsed time. Non-positive deltas are ignored.
    pub fn update_fps(&mut self, delta_ms: f32) {
        self.frame_count += 1;
        if delta_ms.is_nan() || delta_ms <= 0.0 {
            return;
        }

        self.frame_time_ms = delta_ms;
        self.last_fps = 1000.0 / delta_ms;
        self.history.push(self.last_fps);
        if let Some(mean) = self.history.mean() {
            self.average_fps = mean;
        }

        self.adjust_quality();
    }

    fn adjust_quality(&mut self) {
        if self.last_fps < LOW_FPS_THRESHOLD {
            self.low_streak += 1;
            self.high_streak = 0;
            if self.low_streak >= QUALITY_DOWN_STREAK && self.quality_level > 0 {
                self.quality_level -= 1;
                self.low_streak = 0;
                log::info!(
                    "Quality lowered to {} ({:.1} fps)",
                    self.quality_level,
                    self.last_fps
                );
            }
        } else if self.last_fps >= HIGH_FPS_THRESHOLD {
            self.high_streak += 1;
            self.low_streak = 0;
            if self.high_streak >= QUALITY_UP_STREAK && self.quality_level < MAX_QUALITY {
                self.quality_level += 1;
                self.high_streak = 0;
                log::info!(
                    "Quality raised to {} ({:.1} fps)",
                    self.quality_level,
                    self.last_fps
                );
            }
        } else {
            self.low_streak = self.low_streak.saturating_sub(1);
            self.high_streak = self.high_streak.saturating_sub(1);
        }
    }

    /// Stochastic frame thinning when running well above a sub-60 target
    pub fn should_skip_frame<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if self.target_fps < 60.0 && self.last_fps > self.target_fps * 1.1 {
            return rng.random_bool(FRAME_SKIP_CHANCE);
        }
        false
    }

    /// True at most once per `throttle_ms` window. The first query fires.
    pub fn should_update_stats(&mut self, throttle_ms: f64, now_ms: f64) -> bool {
        match self.last_stats_update_ms {
            Some(last) if now_ms - last < throttle_ms => false,
            _ => {
                self.last_stats_update_ms = Some(now_ms);
                true
            }
        }
    }

    pub fn quality_level(&self) -> u8 {
        self.quality_level
    }

    /// Size multiplier: 0.5 at quality 0, ~1.0 at quality 3
    pub fn quality_multiplier(&self) -> f32 {
        0.5 + self.quality_level as f32 * 0.1667
    }

    pub fn target_fps(&self) -> f32 {
        self.target_fps
    }

    pub fn fps(&self) -> f32 {
        self.last_fps
    }

    pub fn average_fps(&self) -> f32 {
        self.average_fps
    }

    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn history(&self) -> &FpsHistory {
        &self.history
    }

    pub fn streaks(&self) -> (u32, u32) {
        (self.low_streak, self.high_streak)
    }

    pub fn is_degraded(&self) -> bool {
        self.last_fps < LOW_FPS_THRESHOLD || self.average_fps < LOW_FPS_THRESHOLD
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            fps: self.last_fps,
            average_fps: self.average_fps,
            frame_time_ms: self.frame_time_ms,
            is_degraded: self.is_degraded(),
            quality_level: self.quality_level,
        }
    }
}
