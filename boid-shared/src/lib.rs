use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Errors raised while loading settings or parsing results lines
#[derive(Debug, thiserror::Error)]
pub enum SharedError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed speedup sample line: {0:?}")]
    MalformedSample(String),
}

/// Size of the simulated world in screen units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldSize {
    pub width: f32,
    pub height: f32,
}

impl WorldSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Weights for the bundled steering policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockingWeights {
    pub view_radius: f32,
    pub separation_radius: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
}

impl Default for FlockingWeights {
    fn default() -> Self {
        Self {
            view_radius: 50.0,
            separation_radius: 15.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
        }
    }
}

/// Simulation configuration, loadable from a JSON file.
///
/// Every field is optional in the file; anything left out takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    pub width: u32,
    pub height: u32,
    pub boids: usize,
    pub initial_speed: f32,
    pub angular_velocity: f32,
    pub target_fps: u32,
    pub benchmark_frames: u64,
    pub results_path: String,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
    pub flocking: FlockingWeights,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1200,
            boids: 1024,
            initial_speed: 20.0,
            angular_velocity: 1.0,
            target_fps: 60,
            benchmark_frames: 100,
            results_path: "speedup_data.txt".to_string(),
            seed: None,
            threads: None,
            flocking: FlockingWeights::default(),
        }
    }
}

impl SimulationSettings {
    pub fn from_json(json: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SharedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SharedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn world(&self) -> WorldSize {
        WorldSize::new(self.width as f32, self.height as f32)
    }
}

/// One completed benchmark run: thread count and average per-frame phase costs.
///
/// Serialised as a single whitespace-separated line:
/// `<threads> <update_ms> <compute_ms> <render_ms>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpeedupSample {
    pub threads: usize,
    pub update_ms: f64,
    pub compute_ms: f64,
    pub render_ms: f64,
}

impl fmt::Display for SpeedupSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6}",
            self.threads, self.update_ms, self.compute_ms, self.render_ms
        )
    }
}

impl FromStr for SpeedupSample {
    type Err = SharedError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || SharedError::MalformedSample(line.to_string());
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(malformed());
        }

        let threads = fields[0].parse().map_err(|_| malformed())?;
        let mut phases = [0.0f64; 3];
        for (slot, field) in phases.iter_mut().zip(&fields[1..]) {
            *slot = field.parse().map_err(|_| malformed())?;
        }

        Ok(Self {
            threads,
            update_ms: phases[0],
            compute_ms: phases[1],
            render_ms: phases[2],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_defaults_match_reference_window() {
        let settings = SimulationSettings::default();
        assert_eq!(settings.width, 1920);
        assert_eq!(settings.height, 1200);
        assert_eq!(settings.boids, 1024);
        assert_eq!(settings.world(), WorldSize::new(1920.0, 1200.0));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings =
            SimulationSettings::from_json(r#"{ "boids": 64, "flocking": { "view_radius": 10.0 } }"#)
                .unwrap();
        assert_eq!(settings.boids, 64);
        assert_eq!(settings.width, 1920);
        assert_eq!(settings.flocking.view_radius, 10.0);
        assert_eq!(settings.flocking.cohesion_weight, 1.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "seed": 7, "threads": 2 }}"#).unwrap();

        let settings = SimulationSettings::load(file.path()).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.threads, Some(2));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SimulationSettings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SharedError::Io { .. }));
    }

    #[test]
    fn test_speedup_sample_line_format() {
        let sample = SpeedupSample {
            threads: 8,
            update_ms: 1.5,
            compute_ms: 0.25,
            render_ms: 3.0,
        };
        assert_eq!(sample.to_string(), "8 1.500000 0.250000 3.000000");
        assert_eq!(sample.to_string().parse::<SpeedupSample>().unwrap(), sample);
    }

    #[test]
    fn test_speedup_sample_rejects_garbage() {
        assert!("8 1.0 2.0".parse::<SpeedupSample>().is_err());
        assert!("x 1.0 2.0 3.0".parse::<SpeedupSample>().is_err());
    }
}
