use crate::error::{Error, Result};
use boid_shared::SpeedupSample;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How often the displayed averages are recomputed, in seconds
pub const REFRESH_INTERVAL: f64 = 1.0;

/// Averages shown while the simulation runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseAverages {
    pub fps: f64,
    pub update_ms: f64,
    pub compute_ms: f64,
    pub render_ms: f64,
}

/// Final report once the benchmark horizon is reached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkSummary {
    pub threads: usize,
    pub agents: usize,
    pub frames: u64,
    pub total_secs: f64,
    pub update_secs: f64,
    pub compute_secs: f64,
    pub render_secs: f64,
}

impl BenchmarkSummary {
    fn per_frame_ms(&self, secs: f64) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            secs / self.frames as f64 * 1000.0
        }
    }

    fn share(&self, secs: f64) -> f64 {
        if self.total_secs > 0.0 {
            secs / self.total_secs * 100.0
        } else {
            0.0
        }
    }

    pub fn fps(&self) -> f64 {
        if self.total_secs > 0.0 {
            self.frames as f64 / self.total_secs
        } else {
            0.0
        }
    }

    pub fn avg_frame_ms(&self) -> f64 {
        self.per_frame_ms(self.total_secs)
    }

    pub fn update_ms(&self) -> f64 {
        self.per_frame_ms(self.update_secs)
    }

    pub fn compute_ms(&self) -> f64 {
        self.per_frame_ms(self.compute_secs)
    }

    pub fn render_ms(&self) -> f64 {
        self.per_frame_ms(self.render_secs)
    }

    pub fn update_percent(&self) -> f64 {
        self.share(self.update_secs)
    }

    pub fn compute_percent(&self) -> f64 {
        self.share(self.compute_secs)
    }

    pub fn render_percent(&self) -> f64 {
        self.share(self.render_secs)
    }

    /// Agent updates per second of update-phase time
    pub fn update_throughput(&self) -> f64 {
        if self.update_secs > 0.0 {
            (self.agents as f64 * self.frames as f64) / self.update_secs
        } else {
            0.0
        }
    }

    pub fn sample(&self) -> SpeedupSample {
        SpeedupSample {
            threads: self.threads,
            update_ms: self.update_ms(),
            compute_ms: self.compute_ms(),
            render_ms: self.render_ms(),
        }
    }
}

impl fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Threads: {}", self.threads)?;
        writeln!(f, "Boids: {}", self.agents)?;
        writeln!(f, "Time: {:.2} s", self.total_secs)?;
        writeln!(f, "FPS: {:.2}", self.fps())?;
        writeln!(f, "Avg frame: {:.3} ms", self.avg_frame_ms())?;
        writeln!(
            f,
            "Update: {:.3} ms ({:.1}%)",
            self.update_ms(),
            self.update_percent()
        )?;
        writeln!(
            f,
            "Compute: {:.3} ms ({:.1}%)",
            self.compute_ms(),
            self.compute_percent()
        )?;
        writeln!(
            f,
            "Render: {:.3} ms ({:.1}%)",
            self.render_ms(),
            self.render_percent()
        )?;
        write!(f, "Update throughput: {:.0} boids/s", self.update_throughput())
    }
}

/// Accumulates per-phase frame timings.
///
/// Averages are refreshed at most once per [`REFRESH_INTERVAL`] of wall
/// time; a summary is produced exactly once, on the frame that reaches the
/// configured horizon.
#[derive(Debug, Clone)]
pub struct PerformanceSampler {
    threads: usize,
    agents: usize,
    horizon: Option<u64>,
    frames: u64,
    total_update: f64,
    total_compute: f64,
    total_render: f64,
    start: f64,
    last_refresh: f64,
    averages: PhaseAverages,
}

impl PerformanceSampler {
    pub fn new(threads: usize, agents: usize, horizon: Option<u64>, start: f64) -> Self {
        Self {
            threads,
            agents,
            horizon,
            frames: 0,
            total_update: 0.0,
            total_compute: 0.0,
            total_render: 0.0,
            start,
            last_refresh: start,
            averages: PhaseAverages::default(),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn averages(&self) -> PhaseAverages {
        self.averages
    }

    fn refresh(&mut self, now: f64) {
        let frames = self.frames as f64;
        let elapsed = now - self.start;
        self.averages = PhaseAverages {
            fps: if elapsed > 0.0 { frames / elapsed } else { 0.0 },
            update_ms: self.total_update / frames * 1000.0,
            compute_ms: self.total_compute / frames * 1000.0,
            render_ms: self.total_render / frames * 1000.0,
        };
        self.last_refresh = now;
        log::debug!(
            "fps {:.1} | update {:.3} ms | compute {:.3} ms | render {:.3} ms",
            self.averages.fps,
            self.averages.update_ms,
            self.averages.compute_ms,
            self.averages.render_ms
        );
    }

    /// Record one completed frame, `now` being the wall time after render.
    pub fn record_frame(
        &mut self,
        update: Duration,
        compute: Duration,
        render: Duration,
        now: f64,
    ) -> Option<BenchmarkSummary> {
        self.total_update += update.as_secs_f64();
        self.total_compute += compute.as_secs_f64();
        self.total_render += render.as_secs_f64();
        self.frames += 1;

        if now - self.last_refresh >= REFRESH_INTERVAL {
            self.refresh(now);
        }

        (self.horizon == Some(self.frames)).then(|| BenchmarkSummary {
            threads: self.threads,
            agents: self.agents,
            frames: self.frames,
            total_secs: now - self.start,
            update_secs: self.total_update,
            compute_secs: self.total_compute,
            render_secs: self.total_render,
        })
    }
}

/// Append-only file of speedup samples, one line per benchmark run
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::Results {
            path: self.path.display().to_string(),
            source,
        }
    }

    pub fn append(&self, sample: &SpeedupSample) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{sample}").map_err(|e| self.io_error(e))?;
        log::info!("Appended speedup sample to {}", self.path.display());
        Ok(())
    }

    /// Every well-formed sample in the file; malformed lines are skipped.
    pub fn read_all(&self) -> Result<Vec<SpeedupSample>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match line.parse::<SpeedupSample>() {
                Ok(sample) => Some(sample),
                Err(e) => {
                    log::warn!("Skipping line in {}: {}", self.path.display(), e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_averages_wait_for_refresh_interval() {
        let mut sampler = PerformanceSampler::new(4, 100, None, 0.0);
        sampler.record_frame(ms(2), ms(1), ms(3), 0.5);
        assert_eq!(sampler.averages(), PhaseAverages::default());

        sampler.record_frame(ms(4), ms(1), ms(5), 1.0);
        let averages = sampler.averages();
        assert!((averages.fps - 2.0).abs() < 1e-9);
        assert!((averages.update_ms - 3.0).abs() < 1e-9);
        assert!((averages.compute_ms - 1.0).abs() < 1e-9);
        assert!((averages.render_ms - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_once_at_horizon() {
        let mut sampler = PerformanceSampler::new(2, 10, Some(3), 0.0);
        assert!(sampler.record_frame(ms(10), ms(0), ms(0), 0.1).is_none());
        assert!(sampler.record_frame(ms(10), ms(0), ms(0), 0.2).is_none());

        let summary = sampler.record_frame(ms(10), ms(0), ms(0), 0.3).unwrap();
        assert_eq!(summary.frames, 3);
        assert!((summary.update_ms() - 10.0).abs() < 1e-9);
        assert!((summary.fps() - 10.0).abs() < 1e-9);
        assert!((summary.update_percent() - 10.0).abs() < 1e-9);
        assert!((summary.update_throughput() - 1000.0).abs() < 1e-6);

        assert!(sampler.record_frame(ms(10), ms(0), ms(0), 0.4).is_none());
    }

    #[test]
    fn test_summary_text_and_sample() {
        let summary = BenchmarkSummary {
            threads: 8,
            agents: 5000,
            frames: 100,
            total_secs: 2.0,
            update_secs: 1.0,
            compute_secs: 0.1,
            render_secs: 0.5,
        };
        let text = summary.to_string();
        assert!(text.contains("Threads: 8"));
        assert!(text.contains("Update: 10.000 ms (50.0%)"));
        assert!(text.contains("Render: 5.000 ms (25.0%)"));

        let sample = summary.sample();
        assert_eq!(sample.threads, 8);
        assert!((sample.compute_ms - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_results_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultsLog::new(dir.path().join("speedup_data.txt"));
        assert!(log.read_all().unwrap().is_empty());

        let first = SpeedupSample {
            threads: 1,
            update_ms: 12.0,
            compute_ms: 0.5,
            render_ms: 4.0,
        };
        let second = SpeedupSample {
            threads: 8,
            ..first
        };
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        assert_eq!(log.read_all().unwrap(), vec![first, second]);
        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().next(), Some("1 12.000000 0.500000 4.000000"));
    }

    #[test]
    fn test_results_log_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speedup_data.txt");
        std::fs::write(&path, "garbage\n2 1.0 2.0 3.0\n").unwrap();
        let samples = ResultsLog::new(path).read_all().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].threads, 2);
    }
}
