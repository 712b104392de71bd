//! Shape Rain - falling shapes on a bounded canvas
//!
//! Core modules:
//! - `sim`: Simulation core (entities, object pool, adaptive quality, stats)
//! - `settings`: Spawn configuration and device capability snapshots
//! - `input`: Pointer ingestion (clamping, duplicate-event debounce)
//! - `platform`: Clock and memory-probe abstractions for browser/native

pub mod input;
pub mod platform;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use settings::{DeviceProfile, DeviceTier, SpawnConfig};
pub use sim::{Field, Simulation, TickReport, VisibleStats};

/// Simulation configuration constants
pub mod consts {
    /// Default playfield dimensions (px)
    pub const FIELD_WIDTH: f32 = 900.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Spawn rate defaults and range (shapes per second)
    pub const SPAWN_RATE_DEFAULT: f32 = 1.0;
    pub const MIN_SPAWN_RATE: f32 = 0.2;
    pub const MAX_SPAWN_RATE: f32 = 10.0;

    /// Gravity defaults and range (px/s²)
    pub const GRAVITY_DEFAULT: f32 = 400.0;
    pub const MIN_GRAVITY: f32 = 50.0;
    pub const MAX_GRAVITY: f32 = 1200.0;

    /// Ambient spawns appear this far above the field (y coordinate)
    pub const SPAWN_Y: f32 = -40.0;
    /// Entities below `height + PRUNE_MARGIN` are destroyed
    pub const PRUNE_MARGIN: f32 = 60.0;
    /// Margin around the field used when counting visible shapes
    pub const VISIBLE_MARGIN: f32 = 20.0;

    /// Sampled base size range before quality scaling (px)
    pub const BASE_SIZE_MIN: f32 = 18.0;
    pub const BASE_SIZE_MAX: f32 = 40.0;

    /// Object pool
    pub const MAX_POOL_SIZE: usize = 30;
    pub const CLEANUP_INTERVAL_MS: f64 = 5000.0;
    pub const RECLAIM_INTERVAL_MS: f64 = 10000.0;
    pub const MEMORY_PRESSURE_THRESHOLD: f64 = 0.85;

    /// Adaptive quality
    pub const FPS_HISTORY_SIZE: usize = 60;
    pub const MAX_QUALITY: u8 = 3;
    pub const LOW_FPS_THRESHOLD: f32 = 30.0;
    pub const HIGH_FPS_THRESHOLD: f32 = 55.0;
    pub const QUALITY_DOWN_STREAK: u32 = 5;
    pub const QUALITY_UP_STREAK: u32 = 30;
    pub const FRAME_SKIP_CHANCE: f64 = 0.1;

    /// Pointer events closer than this on the same target are duplicates (ms)
    pub const POINTER_DEBOUNCE_MS: f64 = 100.0;
}
