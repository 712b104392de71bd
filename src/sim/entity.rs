//! Live shapes and their integration
//!
//! The store owns every live entity. Entities leave it only by pruning or
//! explicit removal, and their graphics go straight back to the pool.

use glam::Vec2;
use serde::Serialize;

use super::graphic::Graphic;
use super::pool::GraphicPool;
use super::stats::VisibleStats;
use super::{Field, RenderTarget};
use crate::consts::{PRUNE_MARGIN, VISIBLE_MARGIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u32);

/// A falling shape
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    pos: Vec2,
    velocity_y: f32,
    area: f32,
    graphic: Graphic,
}

impl Entity {
    pub fn new(id: EntityId, mut graphic: Graphic, area: f32, pos: Vec2) -> Self {
        graphic.position = pos;
        graphic.set_interactive(true);
        Self {
            id,
            pos,
            velocity_y: 0.0,
            area,
            graphic,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn velocity_y(&self) -> f32 {
        self.velocity_y
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn graphic(&self) -> &Graphic {
        &self.graphic
    }

    /// Semi-implicit Euler: velocity first, then position with the new velocity
    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        self.velocity_y += gravity * dt;
        self.pos.y += self.velocity_y * dt;
        self.graphic.position = self.pos;
    }

    /// Whether the world bounds overlap the field grown by `margin`
    pub fn intersects_field(&self, field: &Field, margin: f32) -> bool {
        let (min, max) = self.graphic.world_bounds();
        max.x > -margin
            && min.x < field.width + margin
            && max.y > -margin
            && min.y < field.height + margin
    }

    fn into_graphic(self) -> Graphic {
        self.graphic
    }
}

/// Owner of all live entities, in insertion order
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Allocate an id and take ownership of a freshly drawn graphic
    pub fn insert(&mut self, graphic: Graphic, area: f32, pos: Vec2) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.entities.push(Entity::new(id, graphic, area, pos));
        id
    }

    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        for entity in &mut self.entities {
            entity.integrate(dt, gravity);
        }
    }

    /// Destroy every entity below `field.height + PRUNE_MARGIN`
    ///
    /// Returns the number pruned.
    pub fn prune<T: RenderTarget + ?Sized>(
        &mut self,
        field: &Field,
        pool: &mut GraphicPool,
        target: &mut T,
    ) -> usize {
        let limit_y = field.height + PRUNE_MARGIN;
        let before = self.entities.len();
        let (gone, kept): (Vec<Entity>, Vec<Entity>) = std::mem::take(&mut self.entities)
            .into_iter()
            .partition(|e| e.pos.y > limit_y);
        self.entities = kept;
        for entity in gone {
            target.detach(entity.graphic());
            pool.release(entity.into_graphic());
        }
        before - self.entities.len()
    }

    /// Remove one entity, returning its graphic to the pool
    pub fn remove<T: RenderTarget + ?Sized>(
        &mut self,
        id: EntityId,
        pool: &mut GraphicPool,
        target: &mut T,
    ) -> bool {
        let Some(index) = self.entities.iter().position(|e| e.id == id) else {
            return false;
        };
        let entity = self.entities.remove(index);
        target.detach(entity.graphic());
        pool.release(entity.into_graphic());
        true
    }

    /// Take every entity's graphic out of the store
    pub fn drain(&mut self) -> impl Iterator<Item = Graphic> + '_ {
        self.entities.drain(..).map(Entity::into_graphic)
    }

    /// Count and rounded total area of shapes overlapping the field plus margin
    pub fn visible_stats(&self, field: &Field) -> VisibleStats {
        let mut count = 0;
        let mut area = 0.0f64;
        for entity in self
            .entities
            .iter()
            .filter(|e| e.intersects_field(field, VISIBLE_MARGIN))
        {
            count += 1;
            area += f64::from(entity.area);
        }
        VisibleStats {
            count,
            area: area.round() as u64,
        }
    }

    /// Shapes overlapping the field itself, without margin
    pub fn on_field_count(&self, field: &Field) -> usize {
        self.entities
            .iter()
            .filter(|e| e.intersects_field(field, 0.0))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::DisplayList;
    use crate::sim::geometry::{ShapeColor, ShapeGeometry};

    fn circle(pool: &mut GraphicPool, radius: f32) -> Graphic {
        let mut g = pool.acquire();
        g.fill_with(ShapeGeometry::Circle { radius }, ShapeColor::from_hue(200.0));
        g
    }

    #[test]
    fn test_semi_implicit_euler() {
        let mut pool = GraphicPool::new();
        let mut entity = Entity::new(EntityId(1), circle(&mut pool, 5.0), 1.0, Vec2::ZERO);
        for _ in 0..3 {
            entity.integrate(0.1, 400.0);
        }
        assert!((entity.velocity_y() - 120.0).abs() < 1e-3);
        assert!((entity.pos().y - 24.0).abs() < 1e-3);
        assert_eq!(entity.graphic().position, entity.pos());
    }

    #[test]
    fn test_prune_on_crossing_tick_only() {
        let field = Field::new(900.0, 600.0);
        let mut pool = GraphicPool::new();
        let mut target = DisplayList::default();
        let mut store = EntityStore::new();
        let g = circle(&mut pool, 5.0);
        target.attach(&g);
        store.insert(g, 78.5, Vec2::new(100.0, 650.0));

        // dt = 0.5, g = 40: y lands exactly on the limit (660) after one step
        store.integrate(0.5, 40.0);
        assert_eq!(store.prune(&field, &mut pool, &mut target), 0);
        assert_eq!(store.iter().next().map(|e| e.pos().y), Some(660.0));
        assert_eq!(target.len(), 1);

        store.integrate(0.5, 40.0);
        assert_eq!(store.prune(&field, &mut pool, &mut target), 1);
        assert!(store.is_empty());
        assert!(target.is_empty());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_prune_keeps_insertion_order() {
        let field = Field::new(100.0, 100.0);
        let mut pool = GraphicPool::new();
        let mut target = DisplayList::default();
        let mut store = EntityStore::new();
        let a = store.insert(circle(&mut pool, 1.0), 1.0, Vec2::new(0.0, 10.0));
        store.insert(circle(&mut pool, 1.0), 1.0, Vec2::new(0.0, 500.0));
        let c = store.insert(circle(&mut pool, 1.0), 1.0, Vec2::new(0.0, 20.0));
        assert_eq!(store.prune(&field, &mut pool, &mut target), 1);
        let ids: Vec<EntityId> = store.iter().map(Entity::id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_remove_returns_graphic_to_pool() {
        let mut pool = GraphicPool::new();
        let mut target = DisplayList::default();
        let mut store = EntityStore::new();
        let g = circle(&mut pool, 5.0);
        target.attach(&g);
        let id = store.insert(g, 1.0, Vec2::new(10.0, 10.0));
        assert!(store.remove(id, &mut pool, &mut target));
        assert!(!store.remove(id, &mut pool, &mut target));
        assert!(store.is_empty());
        assert!(target.is_empty());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_visible_stats_margin() {
        let field = Field::new(900.0, 600.0);
        let mut pool = GraphicPool::new();
        let mut store = EntityStore::new();
        // Fully inside
        store.insert(circle(&mut pool, 10.0), 100.4, Vec2::new(450.0, 300.0));
        // Above the field, bottom edge at -25: outside the 20 px margin
        store.insert(circle(&mut pool, 10.0), 50.0, Vec2::new(450.0, -35.0));
        // Above the field, bottom edge at -15: inside the margin only
        store.insert(circle(&mut pool, 10.0), 20.3, Vec2::new(450.0, -25.0));
        // Below the field but not yet pruned
        store.insert(circle(&mut pool, 10.0), 70.0, Vec2::new(450.0, 640.0));

        let stats = store.visible_stats(&field);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.area, 121);
        assert_eq!(store.on_field_count(&field), 1);
        assert_eq!(store.len(), 4);
    }
}
