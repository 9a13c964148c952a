//! Fixed-timestep host loop.
//!
//! Each tick advances the counter and calls [`Registry::update`] with the
//! fixed delta derived from the configured tick rate. The loop sleeps off any
//! time left in the tick budget and warns when a tick overruns it.

use std::time::{Duration, Instant};

use ecs_registry::Registry;
use tracing::{debug, info, warn};

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl TickConfig {
    /// Seconds per tick. Falls back to the default rate when `tick_rate` is
    /// not a positive finite number.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        if self.tick_rate.is_finite() && self.tick_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.tick_rate)
        } else {
            warn!(
                tick_rate = self.tick_rate,
                "invalid tick rate, using default"
            );
            Self::default().tick_duration()
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Drives a [`Registry`] one tick at a time.
#[derive(Debug)]
pub struct TickLoop {
    /// Current tick counter.
    tick_id: u64,
    config: TickConfig,
    registry: Registry,
}

impl TickLoop {
    /// Create a tick loop around a fresh registry.
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self::with_registry(config, Registry::new())
    }

    /// Create a tick loop around an existing registry.
    #[must_use]
    pub fn with_registry(config: TickConfig, registry: Registry) -> Self {
        Self {
            tick_id: 0,
            config,
            registry,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns the loop configuration.
    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Returns a reference to the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gives the registry back, ending the loop.
    #[must_use]
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Run one tick with the given delta.
    pub fn tick(&mut self, dt: f64) {
        self.tick_id += 1;
        debug!(
            tick_id = self.tick_id,
            dt,
            systems = self.registry.system_count(),
            "tick start"
        );
        self.registry.update(dt as f32);
    }

    /// Run the loop for the configured number of ticks, or indefinitely.
    ///
    /// Blocks the calling thread. Every tick receives the same fixed delta.
    pub fn run(&mut self) {
        let tick_duration = self.config.tick_duration();
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64());

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
