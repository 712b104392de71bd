//! Shape outlines and their exact areas
//!
//! Every shape kind maps to a [`DrawStrategy`] arm. Strategies for kinds
//! whose geometry depends only on `size` are cached per kind; star and
//! irregular outlines are drawn fresh on every call.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::graphic::Graphic;
use super::pool::GraphicPool;
use crate::consts::{BASE_SIZE_MAX, BASE_SIZE_MIN};

/// Closed set of spawnable shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Triangle,
    Square,
    Pentagon,
    Hexagon,
    Circle,
    Ellipse,
    Star,
    Irregular,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Triangle,
        ShapeKind::Square,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
        ShapeKind::Circle,
        ShapeKind::Ellipse,
        ShapeKind::Star,
        ShapeKind::Irregular,
    ];

    /// Uniformly pick a kind
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Fill color in HSL (hue in degrees, saturation/lightness in 0-1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl ShapeColor {
    pub const SATURATION: f32 = 0.75;
    pub const LIGHTNESS: f32 = 0.6;

    pub fn from_hue(hue: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: Self::SATURATION,
            lightness: Self::LIGHTNESS,
        }
    }

    /// Random hue with fixed saturation/lightness, so every color stays readable
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_hue(rng.random_range(0..360) as f32)
    }

    /// CSS color string for canvas hosts
    pub fn css(&self) -> String {
        format!(
            "hsl({}deg {}% {}%)",
            self.hue.round(),
            (self.saturation * 100.0).round(),
            (self.lightness * 100.0).round()
        )
    }

    /// Linear RGBA in 0-1
    pub fn to_rgba(&self) -> [f32; 4] {
        let c = (1.0 - (2.0 * self.lightness - 1.0).abs()) * self.saturation;
        let h = self.hue / 60.0;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = self.lightness - c / 2.0;
        [r + m, g + m, b + m, 1.0]
    }
}

/// Drawable outline in local coordinates (origin at the shape center)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    Polygon { points: Vec<Vec2> },
    Circle { radius: f32 },
    Ellipse { rx: f32, ry: f32 },
}

impl ShapeGeometry {
    /// Local axis-aligned bounds as (min, max)
    pub fn local_bounds(&self) -> (Vec2, Vec2) {
        match self {
            ShapeGeometry::Polygon { points } => {
                let mut min = Vec2::splat(f32::INFINITY);
                let mut max = Vec2::splat(f32::NEG_INFINITY);
                for p in points {
                    min = min.min(*p);
                    max = max.max(*p);
                }
                if points.is_empty() {
                    (Vec2::ZERO, Vec2::ZERO)
                } else {
                    (min, max)
                }
            }
            ShapeGeometry::Circle { radius } => (Vec2::splat(-radius), Vec2::splat(*radius)),
            ShapeGeometry::Ellipse { rx, ry } => (Vec2::new(-rx, -ry), Vec2::new(*rx, *ry)),
        }
    }
}

/// Per-variant drawing routine. Every arm returns the outline and its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStrategy {
    RegularPolygon { sides: u32 },
    Circle,
    Ellipse,
    Star,
    Irregular,
}

impl DrawStrategy {
    pub fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Triangle => DrawStrategy::RegularPolygon { sides: 3 },
            ShapeKind::Square => DrawStrategy::RegularPolygon { sides: 4 },
            ShapeKind::Pentagon => DrawStrategy::RegularPolygon { sides: 5 },
            ShapeKind::Hexagon => DrawStrategy::RegularPolygon { sides: 6 },
            ShapeKind::Circle => DrawStrategy::Circle,
            ShapeKind::Ellipse => DrawStrategy::Ellipse,
            ShapeKind::Star => DrawStrategy::Star,
            ShapeKind::Irregular => DrawStrategy::Irregular,
        }
    }

    /// Whether the strategy may be reused across calls
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, DrawStrategy::Star | DrawStrategy::Irregular)
    }

    pub fn draw<R: Rng + ?Sized>(&self, size: f32, rng: &mut R) -> (ShapeGeometry, f32) {
        match *self {
            DrawStrategy::RegularPolygon { sides } => regular_polygon(sides, size),
            DrawStrategy::Circle => (
                ShapeGeometry::Circle { radius: size },
                PI * size * size,
            ),
            DrawStrategy::Ellipse => {
                let ry = size * 0.7;
                (ShapeGeometry::Ellipse { rx: size, ry }, PI * size * ry)
            }
            DrawStrategy::Star => star(size),
            DrawStrategy::Irregular => irregular(rng),
        }
    }
}

fn regular_polygon(sides: u32, size: f32) -> (ShapeGeometry, f32) {
    let n = sides as f32;
    let points = (0..sides)
        .map(|i| {
            let angle = (i as f32 / n) * TAU - PI / 2.0;
            Vec2::new(angle.cos() * size, angle.sin() * size)
        })
        .collect();
    // Closed form, not shoelace: aggregate area must not drift
    let area = 0.5 * n * size * size * (TAU / n).sin();
    (ShapeGeometry::Polygon { points }, area)
}

fn star(size: f32) -> (ShapeGeometry, f32) {
    const POINTS: u32 = 5;
    let inner = size * 0.45;
    let step = PI / POINTS as f32;
    let points: Vec<Vec2> = (0..POINTS * 2)
        .map(|i| {
            let r = if i % 2 == 0 { size } else { inner };
            let angle = i as f32 * step - PI / 2.0;
            Vec2::new(angle.cos() * r, angle.sin() * r)
        })
        .collect();
    let area = polygon_area(&points);
    (ShapeGeometry::Polygon { points }, area)
}

fn irregular<R: Rng + ?Sized>(rng: &mut R) -> (ShapeGeometry, f32) {
    let count = rng.random_range(5..=8);
    let mut angle = rng.random::<f32>() * TAU;
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let radius = rng.random_range(16.0..=34.0);
        points.push(Vec2::new(angle.cos() * radius, angle.sin() * radius));
        angle += TAU / count as f32 + rng.random_range(-0.1..=0.1);
    }
    let area = polygon_area(&points);
    (ShapeGeometry::Polygon { points }, area)
}

/// Shoelace area of a simple polygon
pub fn polygon_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum.abs() * 0.5
}

/// Builds graphics for spawned shapes
#[derive(Debug, Default)]
pub struct GeometryProvider {
    cache: HashMap<ShapeKind, DrawStrategy>,
}

impl GeometryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn strategy(&mut self, kind: ShapeKind) -> DrawStrategy {
        if let Some(strategy) = self.cache.get(&kind) {
            return *strategy;
        }
        let strategy = DrawStrategy::for_kind(kind);
        if strategy.is_cacheable() {
            self.cache.insert(kind, strategy);
        }
        strategy
    }

    /// Number of cached strategies
    pub fn cached_strategies(&self) -> usize {
        self.cache.len()
    }

    /// Draw `kind` at an explicit size into `graphic`, returning the area
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        graphic: &mut Graphic,
        kind: ShapeKind,
        size: f32,
        color: ShapeColor,
        rng: &mut R,
    ) -> f32 {
        let (geometry, area) = self.strategy(kind).draw(size, rng);
        graphic.fill_with(geometry, color);
        area
    }

    /// Acquire a pooled graphic and draw a randomly sized `kind` into it
    pub fn create_graphic<R: Rng + ?Sized>(
        &mut self,
        kind: ShapeKind,
        color: ShapeColor,
        quality_multiplier: f32,
        pool: &mut GraphicPool,
        rng: &mut R,
    ) -> (Graphic, f32) {
        let mut graphic = pool.acquire();
        let base_size = rng.random_range(BASE_SIZE_MIN..BASE_SIZE_MAX);
        let area = self.draw(&mut graphic, kind, base_size * quality_multiplier, color, rng);
        (graphic, area)
    }
}
