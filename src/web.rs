//! Browser entry points
//!
//! JS owns the canvas and the event listeners; it forwards frame times and
//! presses here and draws from [`WebSimulation::shapes_json`].

use wasm_bindgen::prelude::*;

use crate::input::{PointerDebouncer, PointerTarget, clamp_to_field};
use crate::platform::{BrowserMemoryProbe, Clock, SystemClock};
use crate::settings::{DeviceProfile, SpawnConfig};
use crate::sim::{DisplayList, EntityId, Field, ShapeGeometry, Simulation, SubscriptionId};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

#[derive(serde::Serialize)]
struct ShapeView<'a> {
    id: u32,
    x: f32,
    y: f32,
    color: Option<String>,
    geometry: Option<&'a ShapeGeometry>,
}

#[wasm_bindgen]
pub struct WebSimulation {
    sim: Simulation<DisplayList>,
    debouncer: PointerDebouncer,
    clock: SystemClock,
    /// JS-facing numeric handles for stats subscriptions
    subscriptions: Vec<Option<SubscriptionId>>,
}

#[wasm_bindgen]
impl WebSimulation {
    /// `profile_json` is a serialized `DeviceProfile`; invalid input falls
    /// back to desktop defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, profile_json: &str, seed: u64) -> WebSimulation {
        let profile = DeviceProfile::from_json_or_default(profile_json);
        let sim = Simulation::new(
            Field::new(width, height),
            SpawnConfig::default(),
            profile,
            seed,
            DisplayList::default(),
            Box::new(SystemClock),
            Box::new(BrowserMemoryProbe),
        );
        WebSimulation {
            sim,
            debouncer: PointerDebouncer::default(),
            clock: SystemClock,
            subscriptions: Vec::new(),
        }
    }

    /// Advance by `delta_ms`; returns true if stats were refreshed
    pub fn tick(&mut self, delta_ms: f32) -> bool {
        self.sim.tick(delta_ms / 1000.0).stats.is_some()
    }

    /// Press on empty field
    pub fn press_field(&mut self, x: f32, y: f32) -> bool {
        if !self.debouncer.accept(PointerTarget::Field, self.clock.now_ms()) {
            return false;
        }
        let p = clamp_to_field(&self.sim.field(), x, y);
        self.sim.spawn_at(p.x, p.y).is_some()
    }

    /// Press on a shape
    pub fn press_shape(&mut self, id: u32) -> bool {
        let target = PointerTarget::Entity(EntityId(id));
        if !self.debouncer.accept(target, self.clock.now_ms()) {
            return false;
        }
        self.sim.remove_entity(EntityId(id))
    }

    /// Called on the host's 5 s cleanup interval
    pub fn maintain(&mut self) -> bool {
        self.sim.maintain()
    }

    pub fn set_spawn_rate(&mut self, value: f32) -> f32 {
        self.sim.set_spawn_rate(value);
        self.sim.spawn_rate()
    }

    pub fn set_gravity(&mut self, value: f32) -> f32 {
        self.sim.set_gravity(value);
        self.sim.gravity()
    }

    pub fn live_count(&self) -> usize {
        self.sim.live_count()
    }

    pub fn visible_count(&self) -> usize {
        self.sim.visible_stats().count
    }

    pub fn visible_area(&self) -> f64 {
        self.sim.visible_stats().area as f64
    }

    pub fn quality_level(&self) -> u8 {
        self.sim.quality_level()
    }

    /// Register a JS callback `(count, area) => void` for stats updates.
    /// Exceptions thrown by the callback are logged, not rethrown.
    pub fn on_stats(&mut self, callback: js_sys::Function) -> f64 {
        let id = self.sim.subscribe(move |stats| {
            let count = JsValue::from_f64(stats.count as f64);
            let area = JsValue::from_f64(stats.area as f64);
            if let Err(e) = callback.call2(&JsValue::NULL, &count, &area) {
                log::error!("Stats listener failed: {:?}", e);
            }
        });
        self.subscriptions.push(Some(id));
        (self.subscriptions.len() - 1) as f64
    }

    pub fn off_stats(&mut self, handle: f64) -> bool {
        let id = self
            .subscriptions
            .get_mut(handle as usize)
            .and_then(Option::take);
        match id {
            Some(id) => self.sim.unsubscribe(id),
            None => false,
        }
    }

    /// Live shapes as JSON for drawing
    pub fn shapes_json(&self) -> Result<String, JsValue> {
        let shapes: Vec<ShapeView<'_>> = self
            .sim
            .entities()
            .map(|e| ShapeView {
                id: e.id().0,
                x: e.pos().x,
                y: e.pos().y,
                color: e.graphic().fill().map(|c| c.css()),
                geometry: e.graphic().content(),
            })
            .collect();
        serde_json::to_string(&shapes).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Cancel maintenance and release everything
    pub fn shutdown(&mut self) {
        self.sim.shutdown();
    }
}
