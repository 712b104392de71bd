//! Renderable handle recycled through the object pool

use glam::Vec2;
use serde::Serialize;

use super::geometry::{ShapeColor, ShapeGeometry};

/// Stable identity of a graphic across pool round-trips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GraphicId(pub u32);

/// A drawable object: outline, fill and transform
///
/// The host renders it; the core only draws into it, moves it and resets it.
///
/// Move-only: one owner per slot until it goes back to the pool, so a slot
/// cannot be released twice.
///
/// ```compile_fail
/// let mut pool = shape_rain::sim::GraphicPool::new();
/// let graphic = pool.acquire();
/// pool.release(graphic.clone());
/// pool.release(graphic);
/// ```
#[derive(Debug, Serialize)]
pub struct Graphic {
    id: GraphicId,
    content: Option<ShapeGeometry>,
    fill: Option<ShapeColor>,
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub alpha: f32,
    pub visible: bool,
    /// Pointer listener attached (removal on press)
    interactive: bool,
    destroyed: bool,
}

impl Graphic {
    pub(crate) fn new(id: GraphicId) -> Self {
        Self {
            id,
            content: None,
            fill: None,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            alpha: 1.0,
            visible: true,
            interactive: false,
            destroyed: false,
        }
    }

    pub fn id(&self) -> GraphicId {
        self.id
    }

    pub fn content(&self) -> Option<&ShapeGeometry> {
        self.content.as_ref()
    }

    pub fn fill(&self) -> Option<ShapeColor> {
        self.fill
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Replace drawing content
    pub fn fill_with(&mut self, geometry: ShapeGeometry, color: ShapeColor) {
        self.content = Some(geometry);
        self.fill = Some(color);
    }

    /// Drop drawing content, keep transform
    pub fn clear(&mut self) {
        self.content = None;
        self.fill = None;
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Return to the neutral state: blank, identity transform, opaque, visible,
    /// no listeners
    pub fn reset(&mut self) {
        self.clear();
        self.interactive = false;
        self.position = Vec2::ZERO;
        self.scale = Vec2::ONE;
        self.rotation = 0.0;
        self.alpha = 1.0;
        self.visible = true;
    }

    /// Release buffers and listeners. Destroying twice is a no-op.
    ///
    /// Returns whether this call did the destruction.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.interactive = false;
        self.content = None;
        self.fill = None;
        self.destroyed = true;
        true
    }

    /// Whether the graphic is in the neutral state
    pub fn is_neutral(&self) -> bool {
        self.content.is_none()
            && self.fill.is_none()
            && !self.interactive
            && self.position == Vec2::ZERO
            && self.scale == Vec2::ONE
            && self.rotation == 0.0
            && self.alpha == 1.0
            && self.visible
    }

    /// World-space axis-aligned bounds as (min, max)
    ///
    /// Rotation is ignored; shapes never rotate in this simulation.
    pub fn world_bounds(&self) -> (Vec2, Vec2) {
        let (min, max) = self
            .content
            .as_ref()
            .map(ShapeGeometry::local_bounds)
            .unwrap_or((Vec2::ZERO, Vec2::ZERO));
        let a = min * self.scale;
        let b = max * self.scale;
        (self.position + a.min(b), self.position + a.max(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn() -> Graphic {
        let mut g = Graphic::new(GraphicId(1));
        g.fill_with(ShapeGeometry::Circle { radius: 5.0 }, ShapeColor::from_hue(90.0));
        g.position = Vec2::new(100.0, 50.0);
        g.scale = Vec2::splat(2.0);
        g.rotation = 1.0;
        g.alpha = 0.3;
        g.visible = false;
        g.set_interactive(true);
        g
    }

    #[test]
    fn test_reset_restores_neutral_state() {
        let mut g = drawn();
        assert!(!g.is_neutral());
        g.reset();
        assert!(g.is_neutral());
        assert_eq!(g.id(), GraphicId(1));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut g = drawn();
        assert!(g.destroy());
        assert!(g.is_destroyed());
        assert!(!g.is_interactive());
        assert!(g.content().is_none());
        assert!(!g.destroy());
    }

    #[test]
    fn test_world_bounds() {
        let g = drawn();
        let (min, max) = g.world_bounds();
        assert_eq!(min, Vec2::new(90.0, 40.0));
        assert_eq!(max, Vec2::new(110.0, 60.0));
    }
}
