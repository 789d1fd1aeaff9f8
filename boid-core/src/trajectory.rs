//! Fixed-step trajectories from a seed-free starting lattice.
//!
//! Two builds (or two thread counts) fed the same lattice and step must
//! print the same rows.

use crate::agent::Agent;
use crate::clock::{FrameClock, ManualClock};
use crate::error::Result;
use crate::flock::Flock;
use crate::policy::UpdatePolicy;
use crate::pool::WorkerPool;
use crate::Vector2D;
use boid_shared::WorldSize;
use std::fmt;

pub const TRAJECTORY_BOIDS: usize = 128;
pub const TRAJECTORY_STEPS: u64 = 50;

/// Final state of one agent, printed as `index x y rotation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRow {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

impl fmt::Display for TrajectoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6}",
            self.index, self.x, self.y, self.rotation
        )
    }
}

/// Lay `count` agents out on a stride pattern that depends only on the index.
pub fn lattice_flock(count: usize, world: WorldSize) -> Result<Flock> {
    let width = (world.width.max(1.0) as usize).max(1);
    let height = (world.height.max(1.0) as usize).max(1);

    let agents = (0..count)
        .map(|i| {
            let origin = Vector2D::new(((i * 31) % width) as f32, ((i * 17) % height) as f32);
            let rotation = ((i * 7) % 314) as f32 / 100.0;
            Agent::new(origin, Vector2D::new(20.0, 20.0), rotation, 1.0)
        })
        .collect();
    Flock::from_agents(agents)
}

/// Step `flock` `steps` times, `step` seconds apart, and report where every
/// agent ended up.
pub fn run_trajectory<P>(
    flock: &mut Flock,
    policy: &P,
    pool: &WorkerPool,
    steps: u64,
    step: f64,
) -> Vec<TrajectoryRow>
where
    P: UpdatePolicy + ?Sized,
{
    let mut clock = ManualClock::new(0.0, step);
    for _ in 0..steps {
        flock.update_all(policy, pool, clock.now());
    }
    log::debug!(
        "Trajectory finished after {} steps at t={:.4}",
        steps,
        clock.peek()
    );

    flock
        .agents()
        .iter()
        .enumerate()
        .map(|(index, agent)| TrajectoryRow {
            index,
            x: agent.origin.x,
            y: agent.origin.y,
            rotation: agent.rotation,
        })
        .collect()
}
