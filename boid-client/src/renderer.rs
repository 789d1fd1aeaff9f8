use boid_core::{MetricLabel, Renderer, Triangle};
use std::time::{Duration, Instant};

/// Renderer without a window: counts frames, keeps the latest metric labels
/// and paces the loop to a target frame rate.
pub struct HeadlessRenderer {
    frames: u64,
    max_frames: Option<u64>,
    frame_budget: Option<Duration>,
    last_frame: Option<Instant>,
    triangles: usize,
    labels: Vec<String>,
}

impl HeadlessRenderer {
    pub fn new(max_frames: Option<u64>) -> Self {
        Self {
            frames: 0,
            max_frames,
            frame_budget: None,
            last_frame: None,
            triangles: 0,
            labels: Vec::new(),
        }
    }

    /// Sleep so frames are at least `1 / fps` seconds apart
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.frame_budget = (fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(fps)));
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn triangles_drawn(&self) -> usize {
        self.triangles
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn pace(&mut self) {
        if let (Some(budget), Some(last)) = (self.frame_budget, self.last_frame) {
            let spent = last.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, triangles: &[Triangle], labels: &[MetricLabel]) {
        self.triangles = triangles.len();
        self.labels = labels.iter().map(ToString::to_string).collect();
        self.frames += 1;
        log::trace!("frame {}: {}", self.frames, self.labels.join(" | "));
        self.pace();
    }

    fn should_close(&self) -> bool {
        self.max_frames.is_some_and(|max| self.frames >= max)
    }
}
