//! Spawn configuration and device capability snapshots
//!
//! Both are plain values handed to the simulation at construction. The
//! simulation never re-queries the device; hosts decide the tier.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Coarse device class used to pick a capability preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeviceTier {
    LowEnd,
    Mobile,
    #[default]
    Desktop,
}

impl DeviceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceTier::LowEnd => "LowEnd",
            DeviceTier::Mobile => "Mobile",
            DeviceTier::Desktop => "Desktop",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lowend" | "low-end" | "low" => Some(DeviceTier::LowEnd),
            "mobile" => Some(DeviceTier::Mobile),
            "desktop" => Some(DeviceTier::Desktop),
            _ => None,
        }
    }

    /// Maximum concurrent shapes for this tier
    pub fn max_shapes(&self) -> usize {
        match self {
            DeviceTier::LowEnd => 80,
            DeviceTier::Mobile => 120,
            DeviceTier::Desktop => 200,
        }
    }

    /// Minimum time between aggregate stats recomputations (ms)
    pub fn stats_throttle_ms(&self) -> f64 {
        match self {
            DeviceTier::LowEnd => 300.0,
            DeviceTier::Mobile => 200.0,
            DeviceTier::Desktop => 100.0,
        }
    }

    /// Frame rate the host aims for
    pub fn target_fps(&self) -> f32 {
        match self {
            DeviceTier::LowEnd => 30.0,
            DeviceTier::Mobile => 45.0,
            DeviceTier::Desktop => 60.0,
        }
    }
}

/// Capability snapshot supplied once when a session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub tier: DeviceTier,
    pub max_shapes: usize,
    pub stats_throttle_ms: f64,
    pub target_fps: f32,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::from_tier(DeviceTier::Desktop)
    }
}

impl DeviceProfile {
    /// Create a profile from a tier (applies tier defaults)
    pub fn from_tier(tier: DeviceTier) -> Self {
        Self {
            tier,
            max_shapes: tier.max_shapes(),
            stats_throttle_ms: tier.stats_throttle_ms(),
            target_fps: tier.target_fps(),
        }
    }

    /// Parse a profile from JSON; missing fields take Desktop defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Like [`DeviceProfile::from_json`], but falls back to defaults
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(profile) => {
                log::info!("Loaded {} device profile", profile.tier.as_str());
                profile
            }
            Err(e) => {
                log::warn!("Invalid device profile ({e}), using defaults");
                Self::default()
            }
        }
    }
}

/// Spawn rate and gravity. Both are clamped on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSpawnConfig")]
pub struct SpawnConfig {
    spawn_per_second: f32,
    gravity: f32,
}

/// Unclamped wire form, normalized through [`SpawnConfig::new`]
#[derive(Deserialize)]
struct RawSpawnConfig {
    spawn_per_second: f32,
    gravity: f32,
}

impl From<RawSpawnConfig> for SpawnConfig {
    fn from(raw: RawSpawnConfig) -> Self {
        Self::new(raw.spawn_per_second, raw.gravity)
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self::new(SPAWN_RATE_DEFAULT, GRAVITY_DEFAULT)
    }
}

impl SpawnConfig {
    pub fn new(spawn_per_second: f32, gravity: f32) -> Self {
        let mut config = Self {
            spawn_per_second: SPAWN_RATE_DEFAULT,
            gravity: GRAVITY_DEFAULT,
        };
        config.set_spawn_per_second(spawn_per_second);
        config.set_gravity(gravity);
        config
    }

    pub fn spawn_per_second(&self) -> f32 {
        self.spawn_per_second
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Set spawn rate, clamped to [MIN_SPAWN_RATE, MAX_SPAWN_RATE]
    pub fn set_spawn_per_second(&mut self, value: f32) {
        self.spawn_per_second = clamp_finite(value, MIN_SPAWN_RATE, MAX_SPAWN_RATE);
    }

    /// Set gravity, clamped to [MIN_GRAVITY, MAX_GRAVITY]
    pub fn set_gravity(&mut self, value: f32) {
        self.gravity = clamp_finite(value, MIN_GRAVITY, MAX_GRAVITY);
    }
}

/// `f32::clamp` passes NaN through; treat it as the lower bound instead.
fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_in_range() {
        let config = SpawnConfig::default();
        assert_eq!(config.spawn_per_second(), 1.0);
        assert_eq!(config.gravity(), 400.0);
    }

    #[test]
    fn test_nan_clamps_to_lower_bound() {
        let mut config = SpawnConfig::default();
        config.set_gravity(f32::NAN);
        assert_eq!(config.gravity(), MIN_GRAVITY);
    }

    #[test]
    fn test_deserialize_clamps() {
        let config: SpawnConfig =
            serde_json::from_str(r#"{"spawn_per_second": 99.0, "gravity": 1.0}"#).unwrap();
        assert_eq!(config.spawn_per_second(), MAX_SPAWN_RATE);
        assert_eq!(config.gravity(), MIN_GRAVITY);
    }

    #[test]
    fn test_tier_presets() {
        let low = DeviceProfile::from_tier(DeviceTier::LowEnd);
        assert_eq!(low.max_shapes, 80);
        assert_eq!(low.stats_throttle_ms, 300.0);
        assert_eq!(low.target_fps, 30.0);

        let mobile = DeviceProfile::from_tier(DeviceTier::Mobile);
        assert_eq!(mobile.max_shapes, 120);
        assert_eq!(mobile.target_fps, 45.0);

        assert_eq!(DeviceProfile::default().max_shapes, 200);
        assert_eq!(DeviceTier::from_str("LOW"), Some(DeviceTier::LowEnd));
        assert_eq!(DeviceTier::from_str("toaster"), None);
    }

    #[test]
    fn test_profile_json_partial() {
        let profile = DeviceProfile::from_json(r#"{"max_shapes": 5}"#).unwrap();
        assert_eq!(profile.max_shapes, 5);
        assert_eq!(profile.target_fps, 60.0);

        let fallback = DeviceProfile::from_json_or_default("not json");
        assert_eq!(fallback, DeviceProfile::default());
    }

    proptest! {
        #[test]
        fn spawn_rate_always_clamped(v in -1.0e6f32..1.0e6) {
            let mut config = SpawnConfig::default();
            config.set_spawn_per_second(v);
            let stored = config.spawn_per_second();
            prop_assert!((MIN_SPAWN_RATE..=MAX_SPAWN_RATE).contains(&stored));
            if v < MIN_SPAWN_RATE {
                prop_assert_eq!(stored, MIN_SPAWN_RATE);
            } else if v > MAX_SPAWN_RATE {
                prop_assert_eq!(stored, MAX_SPAWN_RATE);
            } else {
                prop_assert_eq!(stored, v);
            }
        }

        #[test]
        fn gravity_always_clamped(v in -1.0e6f32..1.0e6) {
            let mut config = SpawnConfig::default();
            config.set_gravity(v);
            let stored = config.gravity();
            prop_assert!((MIN_GRAVITY..=MAX_GRAVITY).contains(&stored));
            if v < MIN_GRAVITY {
                prop_assert_eq!(stored, MIN_GRAVITY);
            } else if v > MAX_GRAVITY {
                prop_assert_eq!(stored, MAX_GRAVITY);
            } else {
                prop_assert_eq!(stored, v);
            }
        }
    }
}
