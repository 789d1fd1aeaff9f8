//! Command-line front end for the boid simulation: argument handling,
//! settings resolution and a windowless renderer.

pub mod cli;
pub mod renderer;

pub use cli::{
    apply_run_args, parse_positive, CheckArgs, Cli, Command, DumpArgs, RunArgs, BENCH_BOIDS,
};
pub use renderer::HeadlessRenderer;
