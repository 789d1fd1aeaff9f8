use crate::clock::FrameClock;
use crate::error::Result;
use crate::flock::{Flock, Triangle};
use crate::metrics::{BenchmarkSummary, PerformanceSampler, ResultsLog};
use crate::policy::UpdatePolicy;
use crate::pool::WorkerPool;
use std::fmt;
use std::time::Instant;

/// A labelled metric shown next to the flock
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLabel {
    pub name: &'static str,
    pub value: String,
}

impl MetricLabel {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

impl fmt::Display for MetricLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Owner of the graphics context.
///
/// Called once per frame on the simulation thread, after both parallel
/// passes have joined.
pub trait Renderer {
    fn render(&mut self, triangles: &[Triangle], labels: &[MetricLabel]);

    /// Checked once per frame boundary
    fn should_close(&self) -> bool;
}

/// Update, project, render; one frame at a time.
pub struct Simulation<P, R, C> {
    flock: Flock,
    triangles: Vec<Triangle>,
    pool: WorkerPool,
    policy: P,
    renderer: R,
    clock: C,
    sampler: PerformanceSampler,
    started: Instant,
    results: Option<ResultsLog>,
    summary: Option<BenchmarkSummary>,
}

impl<P, R, C> Simulation<P, R, C>
where
    P: UpdatePolicy,
    R: Renderer,
    C: FrameClock,
{
    pub fn new(flock: Flock, pool: WorkerPool, policy: P, renderer: R, clock: C) -> Result<Self> {
        let triangles = flock.triangle_buffer()?;
        let sampler = PerformanceSampler::new(pool.threads(), flock.len(), None, 0.0);
        Ok(Self {
            flock,
            triangles,
            pool,
            policy,
            renderer,
            clock,
            sampler,
            started: Instant::now(),
            results: None,
            summary: None,
        })
    }

    /// Produce a summary after `frames` frames, appending its speedup sample
    /// to `results` when given.
    pub fn with_benchmark(mut self, frames: u64, results: Option<ResultsLog>) -> Self {
        self.sampler =
            PerformanceSampler::new(self.pool.threads(), self.flock.len(), Some(frames), 0.0);
        self.results = results;
        self
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn sampler(&self) -> &PerformanceSampler {
        &self.sampler
    }

    pub fn summary(&self) -> Option<&BenchmarkSummary> {
        self.summary.as_ref()
    }

    fn labels(&self) -> Vec<MetricLabel> {
        let averages = self.sampler.averages();
        vec![
            MetricLabel::new("FPS", format!("{:.1}", averages.fps)),
            MetricLabel::new("Update", format!("{:.3} ms", averages.update_ms)),
            MetricLabel::new("Compute", format!("{:.3} ms", averages.compute_ms)),
            MetricLabel::new("Render", format!("{:.3} ms", averages.render_ms)),
            MetricLabel::new("Boids", self.flock.len().to_string()),
            MetricLabel::new("Threads", self.pool.threads().to_string()),
        ]
    }

    /// Run a single frame.
    pub fn step(&mut self) -> Result<()> {
        if self.sampler.frames() == 0 {
            self.started = Instant::now();
        }
        let now = self.clock.now();

        let t0 = Instant::now();
        self.flock.update_all(&self.policy, &self.pool, now);
        let update = t0.elapsed();

        let t1 = Instant::now();
        self.flock.project_into(&self.pool, &mut self.triangles)?;
        let compute = t1.elapsed();

        let labels = self.labels();
        let t2 = Instant::now();
        self.renderer.render(&self.triangles, &labels);
        let render = t2.elapsed();

        let wall = self.started.elapsed().as_secs_f64();
        if let Some(summary) = self.sampler.record_frame(update, compute, render, wall) {
            for line in summary.to_string().lines() {
                log::info!("{}", line);
            }
            if let Some(results) = &self.results {
                results.append(&summary.sample())?;
            }
            self.summary = Some(summary);
        }
        Ok(())
    }

    /// Run frames until the renderer asks to close.
    pub fn run(&mut self) -> Result<Option<BenchmarkSummary>> {
        log::info!(
            "Simulating {} boids on {} threads",
            self.flock.len(),
            self.pool.threads()
        );
        while !self.renderer.should_close() {
            self.step()?;
        }
        log::info!("Stopped after {} frames", self.sampler.frames());
        Ok(self.summary)
    }

    pub fn into_parts(self) -> (Flock, R) {
        (self.flock, self.renderer)
    }
}
