//! Fixed-timestep driver.
//!
//! The simulation itself never looks at the clock: every
//! [`Simulation::tick`] advances exactly [`sim_math::DT`]. The
//! [`TickLoop`] paces those ticks against wall time and keeps a rolling
//! average of how long each one took.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use sim_math::TICK_RATE;
use tracing::{debug, info, warn};

use crate::simulation::{Simulation, TickReport};

/// Number of ticks in the frame-time rolling window.
const FRAME_WINDOW: usize = TICK_RATE as usize;

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: f64::from(TICK_RATE),
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// Wall-clock duration of one tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

/// Drives a [`Simulation`] at a fixed cadence.
#[derive(Debug)]
pub struct TickLoop {
    config: TickConfig,
    simulation: Simulation,
    frame_times: VecDeque<Duration>,
    ticks_run: u64,
}

impl TickLoop {
    /// Create a new tick loop with the given configuration.
    #[must_use]
    pub fn new(config: TickConfig, simulation: Simulation) -> Self {
        Self {
            config,
            simulation,
            frame_times: VecDeque::with_capacity(FRAME_WINDOW),
            ticks_run: 0,
        }
    }

    /// Returns a reference to the simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Returns a mutable reference to the simulation.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    /// Ticks run by this loop.
    #[must_use]
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Returns `true` once `max_ticks` ticks have run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.config.max_ticks > 0 && self.ticks_run >= self.config.max_ticks
    }

    /// Average duration of the recent ticks.
    #[must_use]
    pub fn average_frame_time(&self) -> Duration {
        if self.frame_times.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.frame_times.iter().sum();
        total / self.frame_times.len() as u32
    }

    /// Run one tick and record how long it took.
    pub fn step(&mut self) -> TickReport {
        let start = Instant::now();
        let report = self.simulation.tick();
        let elapsed = start.elapsed();
        self.ticks_run += 1;

        if self.frame_times.len() == FRAME_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(elapsed);

        let budget = self.config.tick_duration();
        if elapsed > budget {
            warn!(
                tick_id = report.tick,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "tick exceeded time budget"
            );
        }
        if report.tick % u64::from(TICK_RATE) == 0 {
            debug!(
                tick_id = report.tick,
                avg_frame_us = self.average_frame_time().as_micros() as u64,
                "frame time"
            );
        }
        report
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    ///
    /// This is a blocking loop; async callers drive [`TickLoop::step`] from
    /// their own timer instead.
    pub fn run(&mut self) {
        let tick_duration = self.config.tick_duration();

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();
            self.step();

            if self.is_finished() {
                info!(ticks = self.ticks_run, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sim_math::IVec3;
    use sim_physics::BlockGrid;
    use sim_script::ScriptRegistry;

    use super::*;
    use crate::config::SimConfig;
    use crate::level::Level;

    fn simulation() -> Simulation {
        let blocks = BlockGrid::new(IVec3::new(4, 4, 4)).unwrap();
        Simulation::new(SimConfig::default(), ScriptRegistry::new(), Level::new(blocks))
    }

    #[test]
    fn test_step_advances_simulation() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), simulation());
        assert_eq!(tick_loop.simulation().tick_id(), 0);
        tick_loop.step();
        tick_loop.step();
        assert_eq!(tick_loop.simulation().tick_id(), 2);
        assert_eq!(tick_loop.ticks_run(), 2);
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0, // fast for testing
            max_ticks: 5,
        };
        let mut tick_loop = TickLoop::new(config, simulation());
        tick_loop.run();
        assert_eq!(tick_loop.simulation().tick_id(), 5);
        assert!(tick_loop.is_finished());
    }

    #[test]
    fn test_frame_window_is_bounded() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), simulation());
        for _ in 0..(FRAME_WINDOW + 10) {
            tick_loop.step();
        }
        assert_eq!(tick_loop.frame_times.len(), FRAME_WINDOW);
        assert!(tick_loop.average_frame_time() > Duration::ZERO);
    }
}
