//! Shape Rain entry point
//!
//! Native builds run a headless session against a manual clock and log what
//! happened. The browser build starts from `shape_rain::web`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run(headless::Options::from_env());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use shape_rain::consts::CLEANUP_INTERVAL_MS;
    use shape_rain::platform::{Clock, ManualClock, NoMemoryProbe};
    use shape_rain::sim::DisplayList;
    use shape_rain::{DeviceProfile, DeviceTier, Field, Simulation, SpawnConfig};

    const STEP_MS: f64 = 1000.0 / 60.0;

    pub struct Options {
        pub tier: DeviceTier,
        pub seed: u64,
        pub seconds: u32,
        pub spawn_rate: f32,
    }

    impl Options {
        /// `shape-rain [tier] [seconds] [spawn-rate]`, seed from `SHAPE_RAIN_SEED`
        pub fn from_env() -> Self {
            let mut args = std::env::args().skip(1);
            let tier = match args.next() {
                Some(s) => DeviceTier::from_str(&s).unwrap_or_else(|| {
                    log::warn!("Unknown device tier {:?}, using desktop", s);
                    DeviceTier::Desktop
                }),
                None => DeviceTier::Desktop,
            };
            let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);
            let spawn_rate = args
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SpawnConfig::default().spawn_per_second());
            let seed = std::env::var("SHAPE_RAIN_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0x5eed);
            Self {
                tier,
                seed,
                seconds,
                spawn_rate,
            }
        }
    }

    pub fn run(opts: Options) {
        log::info!(
            "Shape Rain (native) starting: tier={} seed={} seconds={}",
            opts.tier.as_str(),
            opts.seed,
            opts.seconds
        );

        let clock = ManualClock::new();
        let mut sim = Simulation::new(
            Field::default(),
            SpawnConfig::new(opts.spawn_rate, SpawnConfig::default().gravity()),
            DeviceProfile::from_tier(opts.tier),
            opts.seed,
            DisplayList::default(),
            Box::new(clock.clone()),
            Box::new(NoMemoryProbe),
        );
        sim.subscribe(|stats| {
            log::debug!("visible: {} shapes, area {}", stats.count, stats.area);
        });

        let frames = opts.seconds as u64 * 60;
        let mut next_maintenance = CLEANUP_INTERVAL_MS;
        let (mut spawned, mut dropped, mut pruned, mut skipped) = (0u32, 0u32, 0usize, 0u32);
        for _ in 0..frames {
            clock.advance(STEP_MS);
            let report = sim.tick((STEP_MS / 1000.0) as f32);
            spawned += report.spawned;
            dropped += report.dropped;
            pruned += report.pruned;
            skipped += u32::from(report.skipped);

            if clock.now_ms() >= next_maintenance {
                sim.maintain();
                next_maintenance += CLEANUP_INTERVAL_MS;
            }
        }

        let stats = sim.visible_stats();
        let pool = sim.pool_stats();
        log::info!(
            "{} frames: spawned={} dropped={} pruned={} skipped={} live={} visible={} area={}",
            frames,
            spawned,
            dropped,
            pruned,
            skipped,
            sim.live_count(),
            stats.count,
            stats.area
        );
        log::info!(
            "pool: pooled={} created={} destroyed={} quality={}",
            pool.pooled,
            pool.created,
            pool.destroyed,
            sim.quality_level()
        );

        sim.shutdown();
    }
}
