use crate::agent::Agent;
use crate::clock::{FrameClock, ManualClock};
use crate::error::Result;
use crate::flock::{Flock, SpawnParams, Triangle};
use crate::policy::UpdatePolicy;
use crate::pool::{available_threads, WorkerPool};
use crate::Vector2D;
use boid_shared::WorldSize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::fmt;

/// Agents reported in detail per mismatching frame
pub const MAX_REPORTED_PER_FRAME: usize = 3;

/// Parameters of one serial-versus-parallel experiment
#[derive(Debug, Clone, Copy)]
pub struct EquivalenceConfig {
    pub agents: usize,
    pub frames: u64,
    pub tolerance: f32,
    pub seed: u64,
    pub threads: usize,
    pub world: WorldSize,
    pub initial_speed: f32,
    pub angular_velocity: f32,
    /// Simulated seconds between frames
    pub frame_step: f64,
}

impl Default for EquivalenceConfig {
    fn default() -> Self {
        Self {
            agents: 50,
            frames: 100,
            tolerance: 1e-1,
            seed: 42690,
            threads: available_threads(),
            world: WorldSize::new(1920.0, 1200.0),
            initial_speed: 20.0,
            angular_velocity: 1.0,
            frame_step: 1.0 / 60.0,
        }
    }
}

impl EquivalenceConfig {
    fn spawn_params(&self) -> SpawnParams {
        SpawnParams {
            world: self.world,
            count: self.agents,
            initial_speed: self.initial_speed,
            angular_velocity: self.angular_velocity,
            created_at: 0.0,
        }
    }
}

/// Agent field compared between the two runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Origin,
    Rotation,
    Velocity,
    AngularVelocity,
    Vertex(usize),
    Projected(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Origin => write!(f, "origin"),
            Field::Rotation => write!(f, "rotation"),
            Field::Velocity => write!(f, "velocity"),
            Field::AngularVelocity => write!(f, "angular velocity"),
            Field::Vertex(i) => write!(f, "position[{i}]"),
            Field::Projected(i) => write!(f, "projected[{i}]"),
        }
    }
}

/// One field outside tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDiff {
    pub field: Field,
    pub baseline: Vector2D,
    pub candidate: Vector2D,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ({:.6}, {:.6}) vs ({:.6}, {:.6})",
            self.field, self.baseline.x, self.baseline.y, self.candidate.x, self.candidate.y
        )
    }
}

/// Detailed record of a mismatching agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMismatch {
    pub frame: u64,
    pub index: usize,
    pub fields: Vec<FieldDiff>,
}

/// Compare every state field and world-space vertex of two agents.
pub fn compare_agents(
    baseline: (&Agent, &Triangle),
    candidate: (&Agent, &Triangle),
    tolerance: f32,
) -> Vec<FieldDiff> {
    let (a, ta) = baseline;
    let (b, tb) = candidate;
    let scalar = |v: f32| Vector2D::new(v, 0.0);

    let mut pairs = vec![
        (Field::Origin, a.origin, b.origin),
        (Field::Rotation, scalar(a.rotation), scalar(b.rotation)),
        (Field::Velocity, a.velocity, b.velocity),
        (
            Field::AngularVelocity,
            scalar(a.angular_velocity),
            scalar(b.angular_velocity),
        ),
    ];
    for i in 0..3 {
        pairs.push((Field::Vertex(i), a.shape[i], b.shape[i]));
    }
    for (i, (va, vb)) in ta.vertices().into_iter().zip(tb.vertices()).enumerate() {
        pairs.push((Field::Projected(i), va, vb));
    }

    pairs
        .into_iter()
        .filter(|(_, va, vb)| !va.approx_eq(vb, tolerance))
        .map(|(field, baseline, candidate)| FieldDiff {
            field,
            baseline,
            candidate,
        })
        .collect()
}

/// Outcome of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// The very first frame already differs
    InitializationDefect,
    /// Runs agreed at first and diverged at `first_frame`
    ProbableRace { first_frame: u64 },
}

/// Statistics accumulated over every frame of an experiment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquivalenceReport {
    pub frames: u64,
    pub agents: usize,
    pub comparisons: u64,
    pub passed: u64,
    pub failed_frames: BTreeSet<u64>,
    pub mismatches: Vec<AgentMismatch>,
}

impl EquivalenceReport {
    pub fn failed(&self) -> u64 {
        self.comparisons - self.passed
    }

    pub fn first_failure(&self) -> Option<u64> {
        self.failed_frames.iter().next().copied()
    }

    pub fn verdict(&self) -> Verdict {
        match self.first_failure() {
            None => Verdict::Pass,
            Some(0) => Verdict::InitializationDefect,
            Some(first_frame) => Verdict::ProbableRace { first_frame },
        }
    }

    pub fn is_success(&self) -> bool {
        self.verdict() == Verdict::Pass
    }

    /// Process exit status: 0 when the runs matched, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_success())
    }

    fn percent(&self, count: u64) -> f64 {
        if self.comparisons == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.comparisons as f64
        }
    }
}

impl fmt::Display for EquivalenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total frames: {}", self.frames)?;
        writeln!(f, "Boids per frame: {}", self.agents)?;
        writeln!(f, "Total tests: {}", self.comparisons)?;
        writeln!(f, "Passed: {} ({:.2}%)", self.passed, self.percent(self.passed))?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed(), self.percent(self.failed()))?;
        write!(f, "Frames with error: {}", self.failed_frames.len())?;
        if let Some(first) = self.first_failure() {
            write!(f, "\nFirst failure: Frame {first}")?;
        }
        match self.verdict() {
            Verdict::Pass => write!(f, "\nSUCCESS: parallel run matches serial run"),
            Verdict::InitializationDefect => write!(
                f,
                "\nFAILURE: errors from frame 0 suggest an initialization problem"
            ),
            Verdict::ProbableRace { first_frame } => write!(
                f,
                "\nFAILURE: errors starting at frame {first_frame} suggest a race condition"
            ),
        }
    }
}

/// Runs the same seeded flock twice, once on a single thread and once on the
/// full pool, and diffs them after every frame.
///
/// Mismatches never stop the experiment; they are folded into the report.
pub struct EquivalenceChecker<P> {
    config: EquivalenceConfig,
    policy: P,
}

impl<P: UpdatePolicy> EquivalenceChecker<P> {
    pub fn new(config: EquivalenceConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &EquivalenceConfig {
        &self.config
    }

    pub fn run(&self) -> Result<EquivalenceReport> {
        let config = &self.config;
        let params = config.spawn_params();

        log::info!("Creating serial flock with {} boids", config.agents);
        let mut baseline = Flock::spawn(&mut StdRng::seed_from_u64(config.seed), &params)?;
        log::info!("Creating parallel flock");
        let mut candidate = Flock::spawn(&mut StdRng::seed_from_u64(config.seed), &params)?;

        let serial = WorkerPool::serial();
        let parallel = WorkerPool::new(config.threads)?;
        let mut baseline_triangles = baseline.triangle_buffer()?;
        let mut candidate_triangles = candidate.triangle_buffer()?;
        let mut clock = ManualClock::new(0.0, config.frame_step);

        let mut report = EquivalenceReport {
            frames: config.frames,
            agents: config.agents,
            ..Default::default()
        };

        log::info!(
            "Running {} frames ({} vs {} threads, tolerance {})",
            config.frames,
            serial.threads(),
            parallel.threads(),
            config.tolerance
        );

        for frame in 0..config.frames {
            let now = clock.now();
            baseline.update_all(&self.policy, &serial, now);
            candidate.update_all(&self.policy, &parallel, now);
            baseline.project_into(&serial, &mut baseline_triangles)?;
            candidate.project_into(&parallel, &mut candidate_triangles)?;

            let mut reported = 0;
            let mut frame_ok = true;
            let pairs = baseline
                .agents()
                .iter()
                .zip(baseline_triangles.iter())
                .zip(candidate.agents().iter().zip(candidate_triangles.iter()));

            for (index, (expected, actual)) in pairs.enumerate() {
                report.comparisons += 1;
                let fields = compare_agents(expected, actual, config.tolerance);
                if fields.is_empty() {
                    report.passed += 1;
                    continue;
                }

                if frame_ok {
                    log::warn!("Frame {}: MISMATCH", frame);
                    frame_ok = false;
                    report.failed_frames.insert(frame);
                }
                if reported < MAX_REPORTED_PER_FRAME {
                    log::warn!("  Boid {}:", index);
                    for diff in &fields {
                        log::warn!("    {}", diff);
                    }
                    report.mismatches.push(AgentMismatch {
                        frame,
                        index,
                        fields,
                    });
                } else if reported == MAX_REPORTED_PER_FRAME {
                    log::warn!("  ... (more errors not shown)");
                }
                reported += 1;
            }

            if frame_ok && (frame % 10 == 0 || frame + 1 == config.frames) {
                log::info!("Frame {}: OK", frame);
            }
        }

        for line in report.to_string().lines() {
            log::info!("{}", line);
        }
        Ok(report)
    }
}
