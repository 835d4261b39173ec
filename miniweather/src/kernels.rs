//! Interface flux reconstruction and cell tendency accumulation, one x-sweep
//! kernel and one z-sweep kernel. Both read the full padded state and the
//! precomputed hydrostatic background, and write into the caller's
//! [`Scratch`] buffers. Per-row work (rows being z for the x-kernel, z
//! interfaces for the z-kernel) is independent, so both kernels farm rows out
//! to rayon.

use rayon::prelude::*;

use crate::constants::{C0, DENS, GAMMA, GRAV, HS, NUM_VARS, RHOT, UMOM, WMOM};
use crate::state::{HydrostaticProfile, Scratch, StateArray};

/// Fourth-order-accurate interpolation of a 4-point stencil to the interface
/// it straddles.
fn interpolate4(s: [f64; 4]) -> f64 {
    (-s[0] + 7.0 * s[1] + 7.0 * s[2] - s[3]) / 12.0
}

/// Third-derivative proxy used to drive the hyper-viscosity flux term; zero
/// for any constant or linear stencil.
fn third_deriv_proxy(s: [f64; 4]) -> f64 {
    -s[0] + 3.0 * s[1] - 3.0 * s[2] + s[3]
}

/// x-direction interface fluxes and cell tendencies for the local interior
/// grid of `scratch.tend`'s shape `(NUM_VARS, nz, nx)`. `dt` is the
/// substage's own step, used only to scale the hyper-viscosity coefficient.
pub fn compute_tendencies_x(state: &StateArray, hydro: &HydrostaticProfile, scratch: &mut Scratch, dx: f64, dt: f64, hv_beta: f64) {
    let nz = scratch.tend.shape()[1];
    let nx = scratch.tend.shape()[2];
    let hv_coef = -hv_beta * dx / (16.0 * dt);

    let rows: Vec<Vec<[f64; NUM_VARS]>> = (0..nz)
        .into_par_iter()
        .map(|k| {
            let mut row = Vec::with_capacity(nx + 1);
            for i in 0..=nx {
                let mut vals = [0.0; NUM_VARS];
                let mut d3 = [0.0; NUM_VARS];
                for v in 0..NUM_VARS {
                    let s = [
                        state[[v, HS + k, i]],
                        state[[v, HS + k, i + 1]],
                        state[[v, HS + k, i + 2]],
                        state[[v, HS + k, i + 3]],
                    ];
                    vals[v] = interpolate4(s);
                    d3[v] = third_deriv_proxy(s);
                }
                let r = vals[DENS] + hydro.cell_dens[HS + k];
                let u = vals[UMOM] / r;
                let w = vals[WMOM] / r;
                let t = (vals[RHOT] + hydro.cell_dens_theta[HS + k]) / r;
                let p = C0 * (r * t).powf(GAMMA);
                row.push([
                    r * u - hv_coef * d3[DENS],
                    r * u * u + p - hv_coef * d3[UMOM],
                    r * u * w - hv_coef * d3[WMOM],
                    r * u * t - hv_coef * d3[RHOT],
                ]);
            }
            row
        })
        .collect();

    for (k, row) in rows.iter().enumerate() {
        for (i, vals) in row.iter().enumerate() {
            for (v, &val) in vals.iter().enumerate() {
                scratch.flux[[v, k, i]] = val;
            }
        }
    }

    for v in 0..NUM_VARS {
        for k in 0..nz {
            for i in 0..nx {
                scratch.tend[[v, k, i]] = -(scratch.flux[[v, k, i + 1]] - scratch.flux[[v, k, i]]) / dx;
            }
        }
    }
}

/// z-direction interface fluxes and cell tendencies, plus the gravitational
/// source term on `WMOM` and the rigid-lid/floor enforcement (zero vertical
/// velocity and zero hyper-viscosity density flux at the two physical
/// boundaries).
pub fn compute_tendencies_z(state: &StateArray, hydro: &HydrostaticProfile, scratch: &mut Scratch, dz: f64, dt: f64, hv_beta: f64) {
    let nz = scratch.tend.shape()[1];
    let nx = scratch.tend.shape()[2];
    let hv_coef = -hv_beta * dz / (16.0 * dt);

    let rows: Vec<Vec<[f64; NUM_VARS]>> = (0..=nz)
        .into_par_iter()
        .map(|k| {
            let mut row = Vec::with_capacity(nx);
            for i in 0..nx {
                let mut vals = [0.0; NUM_VARS];
                let mut d3 = [0.0; NUM_VARS];
                for v in 0..NUM_VARS {
                    let s = [
                        state[[v, k, HS + i]],
                        state[[v, k + 1, HS + i]],
                        state[[v, k + 2, HS + i]],
                        state[[v, k + 3, HS + i]],
                    ];
                    vals[v] = interpolate4(s);
                    d3[v] = third_deriv_proxy(s);
                }
                let r = vals[DENS] + hydro.iface_dens[k];
                let u = vals[UMOM] / r;
                let mut w = vals[WMOM] / r;
                let t = (vals[RHOT] + hydro.iface_dens_theta[k]) / r;
                let p = C0 * (r * t).powf(GAMMA) - hydro.iface_pressure[k];
                let mut d3_dens = d3[DENS];
                if k == 0 || k == nz {
                    w = 0.0;
                    d3_dens = 0.0;
                }
                row.push([
                    r * w - hv_coef * d3_dens,
                    r * w * u - hv_coef * d3[UMOM],
                    r * w * w + p - hv_coef * d3[WMOM],
                    r * w * t - hv_coef * d3[RHOT],
                ]);
            }
            row
        })
        .collect();

    for (k, row) in rows.iter().enumerate() {
        for (i, vals) in row.iter().enumerate() {
            for (v, &val) in vals.iter().enumerate() {
                scratch.flux[[v, k, i]] = val;
            }
        }
    }

    for k in 0..nz {
        for i in 0..nx {
            for v in 0..NUM_VARS {
                let mut t = -(scratch.flux[[v, k + 1, i]] - scratch.flux[[v, k, i]]) / dz;
                if v == WMOM {
                    t -= state[[DENS, HS + k, HS + i]] * GRAV;
                }
                scratch.tend[[v, k, i]] = t;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interpolate4_of_a_constant_is_that_constant() {
        assert_relative_eq!(interpolate4([5.0, 5.0, 5.0, 5.0]), 5.0);
    }

    #[test]
    fn interpolate4_is_exact_for_linear_data() {
        // x = 0, 1, 2, 3 -> interface sits between points 1 and 2, at x = 1.5.
        assert_relative_eq!(interpolate4([0.0, 1.0, 2.0, 3.0]), 1.5);
    }

    #[test]
    fn third_deriv_proxy_vanishes_on_constant_and_linear_data() {
        assert_relative_eq!(third_deriv_proxy([5.0, 5.0, 5.0, 5.0]), 0.0);
        assert_relative_eq!(third_deriv_proxy([0.0, 1.0, 2.0, 3.0]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn x_tendencies_vanish_for_a_resting_hydrostatic_state() {
        use crate::config::DataSpec;
        use crate::hydrostatic;
        use crate::state::new_state_array;

        let nx = 6;
        let nz = 4;
        let dz = 200.0;
        let hydro = hydrostatic::build(DataSpec::Thermal, 0, nz, dz);
        let mut state = new_state_array(nx, nz);
        for k in 0..nz + 2 * HS {
            for i in 0..nx + 2 * HS {
                state[[DENS, k, i]] = 0.0;
                state[[RHOT, k, i]] = 0.0;
            }
        }
        let mut scratch = Scratch::new(nx, nz);
        compute_tendencies_x(&state, &hydro, &mut scratch, 200.0, 1.0, 0.05);
        for v in 0..NUM_VARS {
            for k in 0..nz {
                for i in 0..nx {
                    assert_relative_eq!(scratch.tend[[v, k, i]], 0.0, epsilon = 1e-8);
                }
            }
        }
    }
}
