//! Boid flock simulation core: agent state, the data-parallel update and
//! projection passes, the serial/parallel equivalence checker and the
//! per-phase performance sampler.

pub mod agent;
pub mod clock;
pub mod equivalence;
pub mod error;
pub mod flock;
pub mod frame_loop;
pub mod metrics;
pub mod policy;
pub mod pool;
pub mod trajectory;

pub use agent::{distance, heading_of, normalize_angle, Agent, BOID_SIZE};
pub use clock::{FrameClock, ManualClock, SystemClock};
pub use equivalence::{EquivalenceChecker, EquivalenceConfig, EquivalenceReport, Verdict};
pub use error::{Error, Result};
pub use flock::{Flock, SpawnParams, Triangle};
pub use frame_loop::{MetricLabel, Renderer, Simulation};
pub use metrics::{BenchmarkSummary, PerformanceSampler, PhaseAverages, ResultsLog};
pub use policy::{SteeringPolicy, StraightLinePolicy, UpdatePolicy};
pub use pool::{available_threads, static_ranges, WorkerPool};
pub use trajectory::{lattice_flock, run_trajectory, TrajectoryRow};

/// A 2D vector in screen coordinates (x right, y down).
///
/// Used for origins, velocities and triangle vertices alike.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Unit vector for a heading in radians: 0 faces -y, π/2 faces +x.
    pub fn from_heading(heading: f32) -> Self {
        let (sin, cos) = heading.sin_cos();
        Self { x: sin, y: -cos }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
            }
        } else {
            Self::zero()
        }
    }

    pub fn distance(&self, other: &Vector2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Rotate about the local origin by `theta` radians. With y pointing down
    /// a positive `theta` turns clockwise on screen, the same direction
    /// headings grow.
    pub fn rotated(&self, theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            x: cos * self.x - sin * self.y,
            y: sin * self.x + cos * self.y,
        }
    }

    /// Componentwise comparison; a difference equal to `tolerance` already
    /// counts as a mismatch.
    pub fn approx_eq(&self, other: &Vector2D, tolerance: f32) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Mul<f32> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}
