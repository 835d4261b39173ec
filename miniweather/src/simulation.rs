//! Ties the grid, hydrostatic background, rank topology and time integrator
//! together into a single steppable run. This is the library's top-level
//! entry point; `miniweather-cli` owns everything else (process setup,
//! thread spawning, output file format).

use ndarray::Array2;
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::{CFL, DENS, GLL_POINTS, GLL_WEIGHTS, HS, MAX_SPEED, NUM_VARS, RHOT, UMOM, WMOM};
use crate::error::MiniWeatherError;
use crate::hydrostatic;
use crate::integrator;
use crate::reducer;
use crate::scenarios;
use crate::state::{new_state_array, HydrostaticProfile, OutputSink, OutputSnapshot, Scratch, StateArray};
use crate::topology::Topology;

/// Cell-averaged initial condition over this rank's local interior grid,
/// via a 3x3-point tensor-product Gauss-Legendre quadrature per cell.
fn initial_state(cfg: &Config, topo: &Topology, dx: f64, dz: f64) -> StateArray {
    let nz = cfg.nz_glob;
    let nx = topo.nx;
    let mut state = new_state_array(nx, nz);

    for k in 0..nz {
        for i in 0..nx {
            let mut acc = [0.0; NUM_VARS];
            for (qz, wz) in GLL_POINTS.iter().zip(GLL_WEIGHTS.iter()) {
                let z = (k as f64 + qz) * dz;
                for (qx, wx) in GLL_POINTS.iter().zip(GLL_WEIGHTS.iter()) {
                    let x = (topo.i_beg + i) as f64 * dx + qx * dx;
                    let s = scenarios::sample(cfg.data_spec, x, z);
                    let weight = wx * wz;
                    let r_total = s.rho_bkg + s.rho_pert;
                    let theta_total = s.theta_bkg + s.theta_pert;
                    acc[DENS] += s.rho_pert * weight;
                    acc[UMOM] += r_total * s.u * weight;
                    acc[WMOM] += r_total * s.w * weight;
                    acc[RHOT] += (r_total * theta_total - s.rho_bkg * s.theta_bkg) * weight;
                }
            }
            for (v, value) in acc.into_iter().enumerate() {
                state[[v, HS + k, HS + i]] = value;
            }
        }
    }
    state
}

/// A single rank's slice of a running simulation: owned state, scratch
/// buffers, and everything needed to advance it one timestep at a time.
pub struct Simulation {
    cfg: Config,
    topo: Topology,
    hydro: HydrostaticProfile,
    state: StateArray,
    state_tmp: StateArray,
    scratch: Scratch,
    dx: f64,
    dz: f64,
    dt: f64,
    etime: f64,
    direction_switch: bool,
    num_steps: u64,
}

impl Simulation {
    /// Build a rank's simulation from a validated config and its slice of
    /// the rank topology. Computes the hydrostatic background and the
    /// cell-averaged initial condition; does no I/O.
    pub fn new(cfg: Config, topo: Topology) -> Result<Self, MiniWeatherError> {
        let (dx, dz) = cfg.validate()?;
        let hydro = hydrostatic::build(cfg.data_spec, 0, cfg.nz_glob, dz);
        let state = initial_state(&cfg, &topo, dx, dz);
        let state_tmp = state.clone();
        let scratch = Scratch::new(topo.nx, cfg.nz_glob);
        let dt = dx.min(dz) / MAX_SPEED * CFL;

        debug!(rank = topo.rank_id, nx = topo.nx, nz = cfg.nz_glob, dx, dz, dt, "rank initialized");

        Ok(Self {
            cfg,
            topo,
            hydro,
            state,
            state_tmp,
            scratch,
            dx,
            dz,
            dt,
            etime: 0.0,
            direction_switch: true,
            num_steps: 0,
        })
    }

    /// Elapsed simulated time in seconds.
    pub fn etime(&self) -> f64 {
        self.etime
    }

    pub fn rank_id(&self) -> usize {
        self.topo.rank_id
    }

    /// Advance by one timestep, clipped so the run lands exactly on
    /// `cfg.sim_time` rather than overshooting it.
    pub fn step(&mut self) -> Result<(), MiniWeatherError> {
        let dt = self.dt.min(self.cfg.sim_time - self.etime);
        integrator::perform_timestep(
            &mut self.state,
            &mut self.state_tmp,
            &mut self.scratch,
            &self.hydro,
            &self.topo,
            &self.cfg,
            self.dx,
            self.dz,
            dt,
            self.direction_switch,
        )?;
        self.direction_switch = !self.direction_switch;
        self.etime += dt;
        self.num_steps += 1;

        if self.cfg.check_finite && self.state.iter().any(|v| !v.is_finite()) {
            return Err(MiniWeatherError::NonFinite { field: "state", etime: self.etime });
        }
        Ok(())
    }

    /// Run to `cfg.sim_time`, emitting an [`OutputSnapshot`] to `sink` every
    /// `cfg.output_freq` seconds of simulated time (including one at t=0),
    /// and returns the run's relative mass and energy drift
    /// `((mass_end - mass_start) / mass_start, (te_end - te_start) / te_start)`.
    ///
    /// Every rank in the topology must call `run` — the conservation
    /// diagnostics synchronize across ranks via an all-reduce.
    pub fn run(&mut self, sink: &mut dyn OutputSink) -> Result<(f64, f64), MiniWeatherError> {
        let (mass0, te0) = reducer::global_mass_and_energy(&self.state, &self.hydro, &self.topo, self.dx, self.dz)?;

        let mut next_output = (self.cfg.output_freq > 0.0).then_some(0.0);
        if next_output.is_some() {
            sink.emit(&self.snapshot())?;
            next_output = Some(self.cfg.output_freq);
        }

        while self.etime < self.cfg.sim_time {
            self.step()?;
            if let Some(next) = next_output {
                if self.etime >= next {
                    sink.emit(&self.snapshot())?;
                    next_output = Some(next + self.cfg.output_freq);
                }
            }
        }

        let (mass1, te1) = reducer::global_mass_and_energy(&self.state, &self.hydro, &self.topo, self.dx, self.dz)?;
        let d_mass = (mass1 - mass0) / mass0;
        let d_te = (te1 - te0) / te0;
        info!(rank = self.topo.rank_id, steps = self.num_steps, d_mass, d_te, "run complete");
        Ok((d_mass, d_te))
    }

    /// This rank's current diagnostic fields over its local interior grid:
    /// density perturbation, winds recovered from momentum, and theta
    /// perturbation.
    pub fn snapshot(&self) -> OutputSnapshot {
        let nz = self.cfg.nz_glob;
        let nx = self.topo.nx;
        let mut dens = Array2::zeros((nz, nx));
        let mut uwnd = Array2::zeros((nz, nx));
        let mut wwnd = Array2::zeros((nz, nx));
        let mut theta = Array2::zeros((nz, nx));

        for k in 0..nz {
            for i in 0..nx {
                let rho_pert = self.state[[DENS, HS + k, HS + i]];
                let r = rho_pert + self.hydro.cell_dens[HS + k];
                let u = self.state[[UMOM, HS + k, HS + i]] / r;
                let w = self.state[[WMOM, HS + k, HS + i]] / r;
                let theta_total = (self.state[[RHOT, HS + k, HS + i]] + self.hydro.cell_dens_theta[HS + k]) / r;
                let theta_bkg = self.hydro.cell_dens_theta[HS + k] / self.hydro.cell_dens[HS + k];
                let theta_pert = theta_total - theta_bkg;
                dens[[k, i]] = rho_pert;
                uwnd[[k, i]] = u;
                wwnd[[k, i]] = w;
                theta[[k, i]] = theta_pert;
            }
        }

        OutputSnapshot {
            etime: self.etime,
            i_beg: self.topo.i_beg,
            nx,
            nz,
            dens,
            uwnd,
            wwnd,
            theta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataSpec;
    use crate::state::NullSink;
    use crate::topology::build_ring;

    fn small_config() -> Config {
        Config {
            nx_glob: 20,
            nz_glob: 10,
            sim_time: 0.5,
            output_freq: -1.0,
            data_spec: DataSpec::Thermal,
            nranks: 1,
            hv_beta: 0.05,
            check_finite: true,
        }
    }

    #[test]
    fn run_advances_etime_to_sim_time_exactly() {
        let cfg = small_config();
        let topo = build_ring(1, cfg.nx_glob).unwrap().into_iter().next().unwrap();
        let mut sim = Simulation::new(cfg.clone(), topo).unwrap();
        let mut sink = NullSink;
        sim.run(&mut sink).unwrap();
        assert!((sim.etime() - cfg.sim_time).abs() < 1e-9);
    }

    #[test]
    fn a_short_thermal_run_conserves_mass_closely() {
        let cfg = small_config();
        let topo = build_ring(1, cfg.nx_glob).unwrap().into_iter().next().unwrap();
        let mut sim = Simulation::new(cfg, topo).unwrap();
        let mut sink = NullSink;
        let (d_mass, _d_te) = sim.run(&mut sink).unwrap();
        assert!(d_mass.abs() < 1e-6, "mass drift too large: {d_mass}");
    }
}
