//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (for stats throttling and maintenance)
//! - Heap usage queries and reclaim hints

use std::cell::Cell;
use std::rc::Rc;

use crate::sim::{HeapUsage, MemoryProbe};

/// Monotonic milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Milliseconds since the clock was created
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// `performance.now()`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[cfg(target_arch = "wasm32")]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }
}

/// Platform without a heap signal: never reports pressure
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn heap_usage(&self) -> Option<HeapUsage> {
        None
    }
}

/// Reads the non-standard `performance.memory` and calls `window.gc` when
/// the page exposes it
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserMemoryProbe;

#[cfg(target_arch = "wasm32")]
impl MemoryProbe for BrowserMemoryProbe {
    fn heap_usage(&self) -> Option<HeapUsage> {
        use js_sys::Reflect;
        use wasm_bindgen::JsValue;

        let performance = web_sys::window()?.performance()?;
        let memory = Reflect::get(&performance, &JsValue::from_str("memory")).ok()?;
        if memory.is_undefined() || memory.is_null() {
            return None;
        }
        let field = |name: &str| {
            Reflect::get(&memory, &JsValue::from_str(name))
                .ok()
                .and_then(|v| v.as_f64())
                .map(|v| v as u64)
        };
        Some(HeapUsage {
            used: field("usedJSHeapSize")?,
            total: field("totalJSHeapSize")?,
        })
    }

    fn request_reclaim(&self) {
        use wasm_bindgen::{JsCast, JsValue};

        let Some(window) = web_sys::window() else { return };
        let Ok(gc) = js_sys::Reflect::get(&window, &JsValue::from_str("gc")) else {
            return;
        };
        if let Ok(gc) = gc.dyn_into::<js_sys::Function>() {
            if let Err(e) = gc.call0(&JsValue::NULL) {
                log::debug!("gc hint failed: {:?}", e);
            }
        }
    }
}
