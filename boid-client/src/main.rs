use anyhow::{Context, Result};
use boid_client::{
    apply_run_args, CheckArgs, Cli, Command, DumpArgs, HeadlessRenderer, RunArgs, BENCH_BOIDS,
};
use boid_core::{
    available_threads, lattice_flock, run_trajectory, EquivalenceChecker, EquivalenceConfig, Flock,
    FrameClock, ResultsLog, Simulation, SpawnParams, SteeringPolicy, SystemClock, WorkerPool,
};
use boid_shared::SimulationSettings;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{BufWriter, Write};
use std::process::ExitCode;

fn load_settings(cli: &Cli) -> Result<Option<SimulationSettings>> {
    match &cli.config {
        Some(path) => {
            log::info!("Loading settings from {}", path.display());
            let settings = SimulationSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            Ok(Some(settings))
        }
        None => Ok(None),
    }
}

fn worker_pool(threads: Option<usize>) -> Result<WorkerPool> {
    let pool = match threads {
        Some(threads) => WorkerPool::new(threads),
        None => WorkerPool::with_available_parallelism(),
    };
    pool.context("Failed to start worker pool")
}

fn simulate(settings: SimulationSettings, args: &RunArgs, benchmark: bool) -> Result<()> {
    let settings = apply_run_args(settings, args);
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut clock = SystemClock::new();
    let params = SpawnParams::from_settings(&settings, clock.now());
    let flock = Flock::spawn(&mut rng, &params).context("Failed to create flock")?;
    let pool = worker_pool(settings.threads)?;
    let policy = SteeringPolicy::new(settings.flocking, settings.world());

    let max_frames = if benchmark {
        Some(settings.benchmark_frames)
    } else {
        args.frames
    };
    let mut renderer = HeadlessRenderer::new(max_frames);
    if !args.uncapped {
        renderer = renderer.with_target_fps(settings.target_fps);
    }

    let mut simulation = Simulation::new(flock, pool, policy, renderer, clock)
        .context("Failed to set up simulation")?;
    if benchmark {
        let results = ResultsLog::new(&settings.results_path);
        simulation = simulation.with_benchmark(settings.benchmark_frames, Some(results));
    }

    simulation.run().context("Simulation error")?;
    Ok(())
}

fn check(settings: SimulationSettings, args: &CheckArgs) -> Result<ExitCode> {
    let threads = args.threads.or(settings.threads).unwrap_or_else(available_threads);
    let config = EquivalenceConfig {
        agents: args.boids,
        frames: args.frames,
        tolerance: args.tolerance,
        seed: args.seed,
        threads,
        world: settings.world(),
        initial_speed: settings.initial_speed,
        angular_velocity: settings.angular_velocity,
        frame_step: 1.0 / f64::from(settings.target_fps.max(1)),
    };
    let policy = SteeringPolicy::new(settings.flocking, settings.world());

    log::info!("BOIDS CORRECTNESS TEST");
    let report = EquivalenceChecker::new(config, policy)
        .run()
        .context("Equivalence check could not run")?;
    Ok(ExitCode::from(report.exit_code()))
}

fn dump(settings: SimulationSettings, args: &DumpArgs) -> Result<()> {
    let mut flock =
        lattice_flock(args.boids, settings.world()).context("Failed to create flock")?;
    let pool = worker_pool(Some(args.threads))?;
    let policy = SteeringPolicy::new(settings.flocking, settings.world());
    let step = 1.0 / f64::from(settings.target_fps.max(1));

    let rows = run_trajectory(&mut flock, &policy, &pool, args.steps, step);
    let mut out = BufWriter::new(std::io::stdout().lock());
    for row in rows {
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let file_settings = load_settings(&cli)?;
    let has_file = file_settings.is_some();
    let settings = file_settings.unwrap_or_default();

    match cli.command() {
        Command::Run(args) => {
            simulate(settings, &args, false)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Bench(args) => {
            let settings = if has_file {
                settings
            } else {
                SimulationSettings {
                    boids: BENCH_BOIDS,
                    ..settings
                }
            };
            simulate(settings, &args, true)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => check(settings, &args),
        Command::Dump(args) => {
            dump(settings, &args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
