//! One simulation session and its per-frame tick
//!
//! Tick order: performance monitor ingests the frame time, then (unless the
//! frame is thinned) spawn, integrate, prune, and the throttled stats
//! broadcast. Every admitted spawn also broadcasts stats right away.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{Entity, EntityId, EntityStore};
use super::geometry::GeometryProvider;
use super::perf::PerformanceMonitor;
use super::pool::{GraphicPool, MemoryProbe, PoolStats};
use super::spawn::{SpawnPlan, Spawner};
use super::stats::{StatsBroadcast, SubscriptionId, VisibleStats};
use super::{Field, RenderTarget};
use crate::platform::Clock;
use crate::settings::{DeviceProfile, SpawnConfig};

/// What one call to [`Simulation::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Session already shut down; nothing ran
    pub halted: bool,
    /// Frame thinned by the performance monitor; only timing was recorded
    pub skipped: bool,
    pub spawned: u32,
    /// Spawns due this tick but dropped at the shape cap
    pub dropped: u32,
    pub pruned: usize,
    /// Last stats broadcast this tick, by a spawn or the throttled refresh
    pub stats: Option<VisibleStats>,
}

pub struct Simulation<T: RenderTarget> {
    field: Field,
    config: SpawnConfig,
    device: DeviceProfile,
    seed: u64,
    rng: Pcg32,
    perf: PerformanceMonitor,
    pool: GraphicPool,
    geometry: GeometryProvider,
    store: EntityStore,
    spawner: Spawner,
    broadcast: StatsBroadcast,
    target: T,
    clock: Box<dyn Clock>,
    memory: Box<dyn MemoryProbe>,
    /// Host maintenance timers still live
    maintenance_active: bool,
    halted: bool,
    time_ticks: u64,
}

impl<T: RenderTarget> std::fmt::Debug for Simulation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("field", &self.field)
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("live", &self.store.len())
            .field("quality", &self.perf.quality_level())
            .field("halted", &self.halted)
            .finish()
    }
}

impl<T: RenderTarget> Simulation<T> {
    pub fn new(
        field: Field,
        config: SpawnConfig,
        device: DeviceProfile,
        seed: u64,
        target: T,
        clock: Box<dyn Clock>,
        memory: Box<dyn MemoryProbe>,
    ) -> Self {
        log::info!(
            "Starting session: {}x{} field, {} tier, max {} shapes, seed {}",
            field.width,
            field.height,
            device.tier.as_str(),
            device.max_shapes,
            seed
        );
        Self {
            field,
            config,
            perf: PerformanceMonitor::new(device.target_fps),
            device,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            pool: GraphicPool::new(),
            geometry: GeometryProvider::new(),
            store: EntityStore::new(),
            spawner: Spawner::new(),
            broadcast: StatsBroadcast::new(),
            target,
            clock,
            memory,
            maintenance_active: true,
            halted: false,
            time_ticks: 0,
        }
    }

    /// Advance the session by one frame of `dt` seconds
    pub fn tick(&mut self, dt: f32) -> TickReport {
        if self.halted {
            return TickReport {
                halted: true,
                ..Default::default()
            };
        }
        self.time_ticks += 1;

        self.perf.update_fps(dt * 1000.0);
        if self.perf.should_skip_frame(&mut self.rng) {
            return TickReport {
                skipped: true,
                ..Default::default()
            };
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut report = TickReport::default();

        let due = self.spawner.advance(dt, self.config.spawn_per_second());
        let room = self.device.max_shapes.saturating_sub(self.store.len());
        let admitted = due.min(u32::try_from(room).unwrap_or(u32::MAX));
        report.dropped = due - admitted;
        for _ in 0..admitted {
            let plan = SpawnPlan::ambient(&self.field, &mut self.rng);
            match self.spawn(plan) {
                Some(_) => {
                    report.spawned += 1;
                    report.stats = Some(self.publish_stats());
                }
                None => report.dropped += 1,
            }
        }

        self.store.integrate(dt, self.config.gravity());
        report.pruned = self
            .store
            .prune(&self.field, &mut self.pool, &mut self.target);

        let now = self.clock.now_ms();
        if self
            .perf
            .should_update_stats(self.device.stats_throttle_ms, now)
        {
            report.stats = Some(self.publish_stats());
        }

        report
    }

    /// Spawn an irregular shape at a host-supplied point (already clamped)
    pub fn spawn_at(&mut self, x: f32, y: f32) -> Option<EntityId> {
        if self.halted {
            return None;
        }
        let plan = SpawnPlan::at_point(Vec2::new(x, y), &mut self.rng);
        let id = self.spawn(plan)?;
        self.publish_stats();
        Some(id)
    }

    /// Remove a shape after a (debounced) press on it
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if self.halted {
            return false;
        }
        let removed = self.store.remove(id, &mut self.pool, &mut self.target);
        if removed {
            self.publish_stats();
        }
        removed
    }

    fn spawn(&mut self, plan: SpawnPlan) -> Option<EntityId> {
        if self.store.len() >= self.device.max_shapes {
            return None;
        }
        let (graphic, area) = self.geometry.create_graphic(
            plan.kind,
            plan.color,
            self.perf.quality_multiplier(),
            &mut self.pool,
            &mut self.rng,
        );
        let id = self.store.insert(graphic, area, plan.pos);
        if let Some(entity) = self.store.get(id) {
            self.target.attach(entity.graphic());
        }
        Some(id)
    }

    fn publish_stats(&mut self) -> VisibleStats {
        let stats = self.store.visible_stats(&self.field);
        self.broadcast.notify(stats);
        stats
    }

    /// Run pool maintenance. Returns false once timers are cancelled.
    ///
    /// Hosts call this on their cleanup interval; the pool applies its own
    /// cleanup and reclaim cadences on top.
    pub fn maintain(&mut self) -> bool {
        if !self.maintenance_active {
            return false;
        }
        let now = self.clock.now_ms();
        self.pool.cleanup(now, self.memory.as_ref());
        true
    }

    /// Stop maintenance, destroy every graphic and reset the monitor.
    /// No tick does anything afterwards.
    pub fn shutdown(&mut self) {
        if self.halted {
            return;
        }
        self.maintenance_active = false;

        let mut destroyed = 0;
        for mut graphic in self.store.drain() {
            self.target.detach(&graphic);
            graphic.destroy();
            destroyed += 1;
        }
        self.pool.clear();
        self.spawner.reset();
        self.perf.reset();
        self.halted = true;
        log::info!(
            "Session shut down after {} ticks ({} live shapes destroyed)",
            self.time_ticks,
            destroyed
        );
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn live_count(&self) -> usize {
        self.store.len()
    }

    /// Fresh stats for the current state, without broadcasting
    pub fn visible_stats(&self) -> VisibleStats {
        self.store.visible_stats(&self.field)
    }

    pub fn set_spawn_rate(&mut self, value: f32) {
        self.config.set_spawn_per_second(value);
    }

    pub fn set_gravity(&mut self, value: f32) {
        self.config.set_gravity(value);
    }

    pub fn spawn_rate(&self) -> f32 {
        self.config.spawn_per_second()
    }

    pub fn gravity(&self) -> f32 {
        self.config.gravity()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&VisibleStats) + 'static,
    {
        self.broadcast.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.broadcast.unsubscribe(id)
    }

    pub fn quality_level(&self) -> u8 {
        self.perf.quality_level()
    }

    pub fn performance(&self) -> &PerformanceMonitor {
        &self.perf
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.store.iter()
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ManualClock, NoMemoryProbe};
    use crate::settings::DeviceTier;
    use crate::sim::pool::HeapUsage;
    use crate::sim::{DisplayList, ShapeGeometry};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct PressureProbe;

    impl MemoryProbe for PressureProbe {
        fn heap_usage(&self) -> Option<HeapUsage> {
            Some(HeapUsage {
                used: 95,
                total: 100,
            })
        }
    }

    fn session(device: DeviceProfile, seed: u64) -> (Simulation<DisplayList>, ManualClock) {
        let clock = ManualClock::new();
        let sim = Simulation::new(
            Field::new(900.0, 600.0),
            SpawnConfig::new(1.0, 400.0),
            device,
            seed,
            DisplayList::default(),
            Box::new(clock.clone()),
            Box::new(NoMemoryProbe),
        );
        (sim, clock)
    }

    #[test]
    fn test_one_second_yields_one_ambient_spawn() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 1);
        let spawned: u32 = (0..10).map(|_| sim.tick(0.1).spawned).sum();
        assert_eq!(spawned, 1);
        assert_eq!(sim.live_count(), 1);
        assert_eq!(sim.target().len(), 1);

        let entity = sim.entities().next().expect("one entity");
        assert_eq!(entity.velocity_y(), 0.1 * 400.0);
        assert!(entity.pos().y < 0.0);
        assert!(entity.graphic().is_interactive());
    }

    #[test]
    fn test_spawn_at_respects_cap() {
        let device = DeviceProfile {
            max_shapes: 1,
            ..DeviceProfile::default()
        };
        let (mut sim, _clock) = session(device, 2);
        assert!(sim.spawn_at(100.0, 100.0).is_some());
        assert!(sim.spawn_at(200.0, 100.0).is_none());
        assert_eq!(sim.live_count(), 1);
    }

    #[test]
    fn test_spawn_at_is_irregular_at_point() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 3);
        let id = sim.spawn_at(120.0, 80.0).expect("spawned");
        let entity = sim.entities().find(|e| e.id() == id).expect("live");
        assert_eq!(entity.pos(), Vec2::new(120.0, 80.0));
        let Some(ShapeGeometry::Polygon { points }) = entity.graphic().content() else {
            panic!("point spawns are irregular polygons");
        };
        assert!((5..=8).contains(&points.len()));
    }

    #[test]
    fn test_ambient_spawns_dropped_at_cap() {
        let device = DeviceProfile {
            max_shapes: 2,
            ..DeviceProfile::default()
        };
        let (mut sim, _clock) = session(device, 4);
        sim.set_spawn_rate(10.0);
        let report = sim.tick(0.5);
        assert_eq!(report.spawned, 2);
        assert_eq!(report.dropped, 3);
        assert_eq!(sim.live_count(), 2);
    }

    #[test]
    fn test_huge_frame_spawns_up_to_cap() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 12);
        let report = sim.tick(1.0e7);
        assert_eq!(report.spawned, 200);
        assert_eq!(report.dropped, 10_000_000 - 200);
        // Everything fell far past the field in the same frame
        assert_eq!(report.pruned, 200);
        assert_eq!(sim.live_count(), 0);
        let pool = sim.pool_stats();
        assert_eq!(pool.pooled, 30);
        assert_eq!(pool.destroyed, 170);
    }

    #[test]
    fn test_ambient_spawn_publishes_stats() {
        let (mut sim, clock) = session(DeviceProfile::default(), 13);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sim.subscribe(move |s| sink.borrow_mut().push(*s));

        // First tick takes the throttled refresh
        assert!(sim.tick(0.016).stats.is_some());
        assert_eq!(seen.borrow().len(), 1);

        // Inside the throttle window, a spawn still broadcasts
        clock.advance(10.0);
        sim.set_spawn_rate(10.0);
        let report = sim.tick(0.1);
        assert_eq!(report.spawned, 1);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(report.stats, Some(seen.borrow()[1]));
    }

    #[test]
    fn test_interaction_publishes_stats() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 5);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sim.subscribe(move |s| sink.borrow_mut().push(*s));

        let id = sim.spawn_at(450.0, 300.0).expect("spawned");
        assert!(sim.remove_entity(id));
        assert!(!sim.remove_entity(id));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].count, 1);
        assert!(seen[0].area > 0);
        assert_eq!(seen[1], VisibleStats::default());
        assert_eq!(sim.pool_stats().pooled, 1);
        assert!(sim.target().is_empty());
    }

    #[test]
    fn test_stats_throttled_by_clock() {
        let (mut sim, clock) = session(DeviceProfile::default(), 6);
        assert!(sim.tick(0.016).stats.is_some());
        assert!(sim.tick(0.016).stats.is_none());
        clock.advance(99.0);
        assert!(sim.tick(0.016).stats.is_none());
        clock.advance(1.0);
        assert!(sim.tick(0.016).stats.is_some());
    }

    #[test]
    fn test_unsubscribed_listener_not_called() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 7);
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let id = sim.subscribe(move |_| *counter.borrow_mut() += 1);
        sim.tick(0.016);
        assert!(sim.unsubscribe(id));
        sim.spawn_at(1.0, 1.0);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_skipped_frames_do_nothing_but_record_timing() {
        let (mut sim, clock) = session(DeviceProfile::from_tier(DeviceTier::LowEnd), 8);
        sim.set_spawn_rate(10.0);
        let mut skipped = 0;
        for _ in 0..400 {
            clock.advance(1000.0);
            let frames_before = sim.performance().frame_count();
            let live_before = sim.live_count();
            let report = sim.tick(0.01);
            assert_eq!(sim.performance().frame_count(), frames_before + 1);
            if report.skipped {
                skipped += 1;
                assert_eq!(report.spawned, 0);
                assert_eq!(report.pruned, 0);
                assert!(report.stats.is_none());
                assert_eq!(sim.live_count(), live_before);
            } else {
                assert!(report.stats.is_some());
            }
        }
        assert!(skipped > 0);
    }

    #[test]
    fn test_desktop_never_skips() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 9);
        assert!((0..500).all(|_| !sim.tick(0.001).skipped));
    }

    #[test]
    fn test_slow_frames_lower_quality_and_size() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 10);
        for _ in 0..15 {
            sim.tick(0.05);
        }
        assert_eq!(sim.quality_level(), 0);

        sim.set_spawn_rate(10.0);
        for _ in 0..20 {
            sim.tick(0.05);
        }
        assert_eq!(sim.quality_level(), 0);
        assert!(sim.live_count() >= 9);

        // Quality 0 halves the sampled size, so sized shapes stay under 20 px
        for entity in sim.entities() {
            match entity.graphic().content() {
                Some(ShapeGeometry::Circle { radius }) => assert!(*radius < 20.0),
                Some(ShapeGeometry::Ellipse { rx, .. }) => assert!(*rx < 20.0),
                _ => {}
            }
        }
    }

    #[test]
    fn test_pruned_shapes_recycled() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 11);
        sim.set_gravity(1200.0);
        sim.set_spawn_rate(10.0);
        for _ in 0..200 {
            sim.tick(0.02);
        }
        let stats = sim.pool_stats();
        // Far fewer graphics built than spawned thanks to reuse
        assert!(stats.created < 30, "created {}", stats.created);
        assert_eq!(stats.destroyed, 0);
        assert_eq!(sim.live_count() + stats.pooled, stats.created as usize);
        for entity in sim.entities() {
            assert!(entity.pos().y <= 600.0 + crate::consts::PRUNE_MARGIN);
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let (mut a, _ca) = session(DeviceProfile::default(), 1234);
        let (mut b, _cb) = session(DeviceProfile::default(), 1234);
        for step in 0..120 {
            let dt = if step % 7 == 0 { 0.05 } else { 0.016 };
            a.tick(dt);
            b.tick(dt);
        }
        let pa: Vec<Vec2> = a.entities().map(Entity::pos).collect();
        let pb: Vec<Vec2> = b.entities().map(Entity::pos).collect();
        assert_eq!(pa, pb);
        assert_eq!(a.visible_stats(), b.visible_stats());
    }

    #[test]
    fn test_config_setters_clamp() {
        let (mut sim, _clock) = session(DeviceProfile::default(), 12);
        sim.set_spawn_rate(100.0);
        sim.set_gravity(-3.0);
        assert_eq!(sim.spawn_rate(), 10.0);
        assert_eq!(sim.gravity(), 50.0);
    }

    #[test]
    fn test_maintenance_under_pressure() {
        let clock = ManualClock::new();
        let mut sim = Simulation::new(
            Field::default(),
            SpawnConfig::default(),
            DeviceProfile::default(),
            13,
            DisplayList::default(),
            Box::new(clock.clone()),
            Box::new(PressureProbe),
        );
        let ids: Vec<EntityId> = (0..10)
            .filter_map(|i| sim.spawn_at(i as f32 * 50.0, 100.0))
            .collect();
        for id in ids {
            sim.remove_entity(id);
        }
        assert_eq!(sim.pool_stats().pooled, 10);

        clock.set(5000.0);
        assert!(sim.maintain());
        let stats = sim.pool_stats();
        assert!(stats.pressure_detected);
        assert_eq!(stats.pooled, 5);
    }

    #[test]
    fn test_shutdown_drains_everything() {
        let (mut sim, clock) = session(DeviceProfile::default(), 14);
        let first = sim.spawn_at(10.0, 10.0).expect("spawned");
        sim.spawn_at(20.0, 10.0);
        sim.remove_entity(first);
        assert_eq!(sim.pool_stats().pooled, 1);

        sim.shutdown();
        assert!(sim.is_halted());
        assert_eq!(sim.live_count(), 0);
        assert!(sim.target().is_empty());
        assert_eq!(sim.pool_stats().pooled, 0);
        assert!(!sim.maintain());

        clock.advance(10_000.0);
        let report = sim.tick(5.0);
        assert!(report.halted);
        assert_eq!(sim.live_count(), 0);
        assert!(sim.spawn_at(1.0, 1.0).is_none());
        // Idempotent
        sim.shutdown();
        assert_eq!(sim.performance().quality_level(), 3);
    }
}
