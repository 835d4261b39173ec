//! Command-line driver: parses run parameters, spawns one OS thread per
//! simulated rank, and reports wall-clock time plus conservation drift when
//! every rank has finished.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};

use miniweather::{build_ring, Config, DataSpec, NullSink, Simulation};
use output::NpzSink;

/// Run the miniweather stencil engine: a dry, stratified, compressible,
/// non-hydrostatic 2D atmosphere, decomposed across simulated ranks.
#[derive(Parser, Debug)]
#[command(name = "miniweather", version, about)]
struct Args {
    /// Number of grid cells in x.
    #[arg(long, default_value_t = 400)]
    nx: usize,

    /// Number of grid cells in z.
    #[arg(long, default_value_t = 200)]
    nz: usize,

    /// Simulated seconds to run for.
    #[arg(long, default_value_t = 1000.0)]
    sim_time: f64,

    /// Seconds between output snapshots; omit or set negative to disable output.
    #[arg(long, default_value_t = -1.0)]
    output_freq: f64,

    /// Initial-condition scenario: collision, thermal, gravity_waves, density_current, injection.
    #[arg(long, value_enum, default_value_t = Scenario::Thermal)]
    scenario: Scenario,

    /// Number of simulated ranks (OS threads standing in for MPI ranks).
    #[arg(long, default_value_t = 1)]
    nranks: usize,

    /// Hyper-viscosity coefficient scale.
    #[arg(long, default_value_t = miniweather::constants::HV_BETA)]
    hv_beta: f64,

    /// Abort the run the first time a cell value goes non-finite.
    #[arg(long, default_value_t = false)]
    check_finite: bool,

    /// Directory .npz output archives are written to, one per rank. Ignored
    /// when output is disabled.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Scenario {
    Collision,
    Thermal,
    GravityWaves,
    DensityCurrent,
    Injection,
}

impl From<Scenario> for DataSpec {
    fn from(s: Scenario) -> Self {
        match s {
            Scenario::Collision => DataSpec::Collision,
            Scenario::Thermal => DataSpec::Thermal,
            Scenario::GravityWaves => DataSpec::GravityWaves,
            Scenario::DensityCurrent => DataSpec::DensityCurrent,
            Scenario::Injection => DataSpec::Injection,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cfg = Config {
        nx_glob: args.nx,
        nz_glob: args.nz,
        sim_time: args.sim_time,
        output_freq: args.output_freq,
        data_spec: args.scenario.into(),
        nranks: args.nranks,
        hv_beta: args.hv_beta,
        check_finite: args.check_finite,
    };

    info!(nx = cfg.nx_glob, nz = cfg.nz_glob, nranks = cfg.nranks, scenario = ?cfg.data_spec, "starting run");

    let topologies = match build_ring(cfg.nranks, cfg.nx_glob) {
        Ok(t) => t,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let started = Instant::now();
    let output_enabled = cfg.output_freq > 0.0;
    let output_dir = args.output_dir.clone();

    let results: Vec<anyhow::Result<(usize, f64, f64)>> = std::thread::scope(|scope| {
        let handles: Vec<_> = topologies
            .into_iter()
            .map(|topo| {
                let cfg = cfg.clone();
                let output_dir = output_dir.clone();
                scope.spawn(move || -> anyhow::Result<(usize, f64, f64)> {
                    let rank_id = topo.rank_id;
                    let mut sim = Simulation::new(cfg, topo)?;
                    if output_enabled {
                        let mut sink = NpzSink::new(output_dir.join(format!("miniweather_rank{rank_id}.npz")));
                        let (d_mass, d_te) = sim.run(&mut sink)?;
                        sink.finish()?;
                        Ok((rank_id, d_mass, d_te))
                    } else {
                        let mut sink = NullSink;
                        let (d_mass, d_te) = sim.run(&mut sink)?;
                        Ok((rank_id, d_mass, d_te))
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(anyhow::anyhow!("rank thread panicked"))))
            .collect()
    });

    let elapsed = started.elapsed();
    let mut exit_code = ExitCode::SUCCESS;
    for result in results {
        match result {
            Ok((rank_id, d_mass, d_te)) => {
                info!(rank = rank_id, d_mass, d_te, "rank finished");
                println!("rank {rank_id}: d_mass = {d_mass:e}, d_te = {d_te:e}");
            }
            Err(e) => {
                error!("{e}");
                exit_code = ExitCode::FAILURE;
            }
        }
    }
    println!("elapsed wall time: {:.3}s", elapsed.as_secs_f64());

    exit_code
}
