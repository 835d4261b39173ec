//! A dry, stratified, compressible, non-hydrostatic 2D atmospheric fluid
//! solver: 4th-order finite-volume Euler equations with hyper-viscosity,
//! 3-stage low-storage Runge-Kutta time integration under Strang dimensional
//! splitting, and a periodic-x/rigid-z domain decomposed across ranks.
//!
//! This crate is the stencil engine only — it owns no process, thread, or
//! file-system concerns. `miniweather-cli` is the external collaborator
//! that spawns rank threads, parses arguments, and writes output files.

pub mod config;
pub mod constants;
pub mod error;
mod halo;
mod hydrostatic;
mod integrator;
mod kernels;
mod reducer;
mod scenarios;
mod simulation;
pub mod state;
pub mod topology;

pub use config::{Config, DataSpec};
pub use error::MiniWeatherError;
pub use reducer::{global_mass_and_energy, local_mass_and_energy};
pub use simulation::Simulation;
pub use state::{NullSink, OutputSink, OutputSnapshot};
pub use topology::{build_ring, Topology};
