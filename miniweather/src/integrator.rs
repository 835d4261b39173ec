//! Time integration: a 3-stage low-storage Runge-Kutta scheme applied once
//! per spatial direction per timestep, with Strang splitting alternating
//! which direction sweeps first from one timestep to the next.

use crate::config::{Config, DataSpec};
use crate::constants::{HS, NUM_VARS, WMOM};
use crate::error::MiniWeatherError;
use crate::halo;
use crate::kernels;
use crate::scenarios;
use crate::state::{HydrostaticProfile, Scratch, StateArray};
use crate::topology::Topology;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    X,
    Z,
}

/// Physical-coordinate context needed for the gravity_waves scenario's
/// standing WMOM forcing; everything else the integrator needs is either an
/// argument or already folded into `scratch.tend` by the kernels.
struct ForcingContext<'a> {
    spec: DataSpec,
    hydro: &'a HydrostaticProfile,
    i_beg: usize,
    dx: f64,
    dz: f64,
}

impl ForcingContext<'_> {
    fn wmom_forcing(&self, local_i: usize, local_k: usize) -> f64 {
        let x = (self.i_beg + local_i) as f64 * self.dx + 0.5 * self.dx;
        let z = local_k as f64 * self.dz + 0.5 * self.dz;
        scenarios::gravity_waves_wpert(self.spec, x, z) * self.hydro.cell_dens[HS + local_k]
    }
}

/// Advance `state` by one full timestep `dt`, applying a complete 3-stage
/// RK sweep in x and one in z, in an order that alternates between
/// successive calls (Strang splitting). `state_tmp` is scratch storage of
/// the same shape as `state`; its contents on return are unspecified.
pub fn perform_timestep(
    state: &mut StateArray,
    state_tmp: &mut StateArray,
    scratch: &mut Scratch,
    hydro: &HydrostaticProfile,
    topo: &Topology,
    cfg: &Config,
    dx: f64,
    dz: f64,
    dt: f64,
    direction_switch: bool,
) -> Result<(), MiniWeatherError> {
    let ctx = ForcingContext {
        spec: cfg.data_spec,
        hydro,
        i_beg: topo.i_beg,
        dx,
        dz,
    };

    let order = if direction_switch { [Direction::X, Direction::Z] } else { [Direction::Z, Direction::X] };
    for dir in order {
        rk3_dimension(dir, state, state_tmp, scratch, hydro, topo, cfg, dx, dz, dt, &ctx)?;
    }
    Ok(())
}

fn rk3_dimension(
    dir: Direction,
    state: &mut StateArray,
    state_tmp: &mut StateArray,
    scratch: &mut Scratch,
    hydro: &HydrostaticProfile,
    topo: &Topology,
    cfg: &Config,
    dx: f64,
    dz: f64,
    dt: f64,
    ctx: &ForcingContext,
) -> Result<(), MiniWeatherError> {
    // Stage 1: forcing and init are both `state`; output lands in `state_tmp`.
    apply_halo_and_compute(dir, state, hydro, topo, cfg, dx, dz, dt / 3.0, scratch)?;
    apply_tendencies(state, state_tmp, scratch, dt / 3.0, dir, ctx);

    // Stage 2: forcing and output are both `state_tmp`; init stays `state`.
    apply_halo_and_compute(dir, state_tmp, hydro, topo, cfg, dx, dz, dt / 2.0, scratch)?;
    apply_tendencies(state, state_tmp, scratch, dt / 2.0, dir, ctx);

    // Stage 3: forcing is `state_tmp`; init and output are both `state`.
    apply_halo_and_compute(dir, state_tmp, hydro, topo, cfg, dx, dz, dt, scratch)?;
    apply_tendencies_in_place(state, scratch, dt, dir, ctx);

    Ok(())
}

fn apply_halo_and_compute(
    dir: Direction,
    forcing: &mut StateArray,
    hydro: &HydrostaticProfile,
    topo: &Topology,
    cfg: &Config,
    dx: f64,
    dz: f64,
    substage_dt: f64,
    scratch: &mut Scratch,
) -> Result<(), MiniWeatherError> {
    match dir {
        Direction::X => {
            let nz = forcing.shape()[1] - 2 * HS;
            halo::exchange_x(forcing, topo, nz)?;
            if cfg.data_spec == DataSpec::Injection {
                halo::apply_injection_override(forcing, hydro, topo, dz);
            }
            kernels::compute_tendencies_x(forcing, hydro, scratch, dx, substage_dt, cfg.hv_beta);
        }
        Direction::Z => {
            halo::enforce_z_boundaries(forcing, hydro);
            kernels::compute_tendencies_z(forcing, hydro, scratch, dz, substage_dt, cfg.hv_beta);
        }
    }
    Ok(())
}

fn apply_tendencies(state_init: &StateArray, state_out: &mut StateArray, scratch: &Scratch, dt: f64, dir: Direction, ctx: &ForcingContext) {
    let nz = scratch.tend.shape()[1];
    let nx = scratch.tend.shape()[2];
    for k in 0..nz {
        for i in 0..nx {
            let wpert = if dir == Direction::Z { ctx.wmom_forcing(i, k) } else { 0.0 };
            for v in 0..NUM_VARS {
                let mut t = scratch.tend[[v, k, i]];
                if v == WMOM {
                    t += wpert;
                }
                state_out[[v, HS + k, HS + i]] = state_init[[v, HS + k, HS + i]] + dt * t;
            }
        }
    }
}

fn apply_tendencies_in_place(state: &mut StateArray, scratch: &Scratch, dt: f64, dir: Direction, ctx: &ForcingContext) {
    let nz = scratch.tend.shape()[1];
    let nx = scratch.tend.shape()[2];
    for k in 0..nz {
        for i in 0..nx {
            let wpert = if dir == Direction::Z { ctx.wmom_forcing(i, k) } else { 0.0 };
            for v in 0..NUM_VARS {
                let mut t = scratch.tend[[v, k, i]];
                if v == WMOM {
                    t += wpert;
                }
                state[[v, HS + k, HS + i]] += dt * t;
            }
        }
    }
}
