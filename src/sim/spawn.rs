//! Spawn timing and placement

use glam::Vec2;
use rand::Rng;

use super::Field;
use super::geometry::{ShapeColor, ShapeKind};
use crate::consts::SPAWN_Y;

/// What to spawn and where
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    pub kind: ShapeKind,
    pub color: ShapeColor,
    pub pos: Vec2,
}

impl SpawnPlan {
    /// Random kind and color at a random x just above the field
    pub fn ambient<R: Rng + ?Sized>(field: &Field, rng: &mut R) -> Self {
        let kind = ShapeKind::random(rng);
        let color = ShapeColor::random(rng);
        let x = if field.width > 0.0 {
            rng.random_range(0.0..field.width)
        } else {
            0.0
        };
        Self {
            kind,
            color,
            pos: Vec2::new(x, SPAWN_Y),
        }
    }

    /// User-triggered spawn: always irregular, always a fresh color
    pub fn at_point<R: Rng + ?Sized>(pos: Vec2, rng: &mut R) -> Self {
        Self {
            kind: ShapeKind::Irregular,
            color: ShapeColor::random(rng),
            pos,
        }
    }
}

/// Fractional spawn credit
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    /// Always in `[0, 1)` between calls
    accumulator: f64,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Add `dt * rate` of credit and return how many whole spawns are due
    pub fn advance(&mut self, dt: f32, rate: f32) -> u32 {
        let credit = f64::from(dt) * f64::from(rate);
        if credit.is_finite() && credit > 0.0 {
            self.accumulator += credit;
        }
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        // Float-to-int `as` saturates at u32::MAX
        whole as u32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
