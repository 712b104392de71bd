//! Simulation core
//!
//! Everything here is driven by one caller, one tick at a time:
//! - Seeded RNG only, so a session replays exactly from its seed
//! - Entities iterate in insertion order
//! - No rendering or platform dependencies; the host supplies a
//!   [`RenderTarget`], a clock and a memory probe

pub mod entity;
pub mod geometry;
pub mod graphic;
pub mod perf;
pub mod pool;
pub mod session;
pub mod spawn;
pub mod stats;

use serde::{Deserialize, Serialize};

pub use entity::{Entity, EntityId, EntityStore};
pub use geometry::{DrawStrategy, GeometryProvider, ShapeColor, ShapeGeometry, ShapeKind};
pub use graphic::{Graphic, GraphicId};
pub use perf::{FpsHistory, PerformanceMetrics, PerformanceMonitor};
pub use pool::{GraphicPool, HeapUsage, MemoryProbe, PoolStats, ReleaseOutcome};
pub use session::{Simulation, TickReport};
pub use spawn::{SpawnPlan, Spawner};
pub use stats::{StatsBroadcast, SubscriptionId, VisibleStats};

/// The bounded playfield, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self::new(crate::consts::FIELD_WIDTH, crate::consts::FIELD_HEIGHT)
    }
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// Where live graphics are shown. The core never draws.
pub trait RenderTarget {
    fn attach(&mut self, graphic: &Graphic);
    fn detach(&mut self, graphic: &Graphic);
}

/// Ordered list of attached graphic ids
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    attached: Vec<GraphicId>,
}

impl DisplayList {
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.attached.contains(&id)
    }

    pub fn ids(&self) -> &[GraphicId] {
        &self.attached
    }
}

impl RenderTarget for DisplayList {
    fn attach(&mut self, graphic: &Graphic) {
        if !self.attached.contains(&graphic.id()) {
            self.attached.push(graphic.id());
        }
    }

    fn detach(&mut self, graphic: &Graphic) {
        self.attached.retain(|id| *id != graphic.id());
    }
}
