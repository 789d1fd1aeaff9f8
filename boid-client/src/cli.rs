use boid_core::trajectory::{TRAJECTORY_BOIDS, TRAJECTORY_STEPS};
use boid_shared::SimulationSettings;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Boid count used by `bench` when no config file says otherwise
pub const BENCH_BOIDS: usize = 5000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Boid flock simulation and scaling benchmarks", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Defaults to `run` with the top-level arguments
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,

    /// JSON settings file; CLI values take precedence over it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,
}

impl Cli {
    /// The selected subcommand, with a bare invocation read as `run`
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(self.run.clone()))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the simulation until the renderer closes
    Run(RunArgs),
    /// Run a fixed number of frames and append a speedup sample
    Bench(RunArgs),
    /// Compare a single-threaded run against a multi-threaded run
    Check(CheckArgs),
    /// Print `index x y rotation` for every boid after fixed-step updates
    Dump(DumpArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// World width; malformed values fall back to the default
    #[arg(allow_negative_numbers = true)]
    pub width: Option<String>,

    /// World height; malformed values fall back to the default
    #[arg(allow_negative_numbers = true)]
    pub height: Option<String>,

    /// Number of boids; malformed values fall back to the default
    #[arg(allow_negative_numbers = true)]
    pub boids: Option<String>,

    /// Close after this many frames
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Seed for the initial positions; entropy when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Do not cap the frame rate at the configured target FPS
    #[arg(long)]
    pub uncapped: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(short, long, default_value_t = 50)]
    pub boids: usize,

    #[arg(short, long, default_value_t = 100)]
    pub frames: u64,

    /// Largest absolute difference still counted as equal
    #[arg(long, default_value_t = 1e-1)]
    pub tolerance: f32,

    #[arg(short, long, default_value_t = 42690)]
    pub seed: u64,

    /// Threads for the parallel run (defaults to available parallelism)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    #[arg(short, long, default_value_t = TRAJECTORY_BOIDS)]
    pub boids: usize,

    #[arg(long, default_value_t = TRAJECTORY_STEPS)]
    pub steps: u64,

    /// Worker threads; the rows must not depend on this
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,
}

/// Parse a positive number, falling back to `default` when the input is
/// missing, malformed or zero.
pub fn parse_positive<T>(raw: Option<&str>, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            log::warn!("Ignoring invalid value {:?}, using {}", raw, default);
            default
        }
    }
}

/// Layer the CLI values over `settings`.
pub fn apply_run_args(mut settings: SimulationSettings, args: &RunArgs) -> SimulationSettings {
    settings.width = parse_positive(args.width.as_deref(), settings.width);
    settings.height = parse_positive(args.height.as_deref(), settings.height);
    settings.boids = parse_positive(args.boids.as_deref(), settings.boids);
    if let Some(threads) = args.threads {
        settings.threads = Some(threads);
    }
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    if let Some(frames) = args.frames {
        settings.benchmark_frames = frames;
    }
    settings
}
