//! Boundary enforcement: periodic x via inter-rank halo exchange, rigid/
//! reflective z with no communication, and the injection scenario's left-edge
//! cold-jet override.

use crate::constants::{DENS, HS, NUM_VARS, RHOT, UMOM, WMOM, ZLEN};
use crate::error::MiniWeatherError;
use crate::state::{HydrostaticProfile, StateArray};
use crate::topology::Topology;

fn pack_columns(state: &StateArray, nz: usize, start_col: usize) -> Vec<f64> {
    let mut buf = vec![0.0; NUM_VARS * nz * HS];
    for v in 0..NUM_VARS {
        for z in 0..nz {
            for c in 0..HS {
                buf[(v * nz + z) * HS + c] = state[[v, HS + z, start_col + c]];
            }
        }
    }
    buf
}

fn unpack_columns(state: &mut StateArray, nz: usize, start_col: usize, buf: &[f64]) {
    for v in 0..NUM_VARS {
        for z in 0..nz {
            for c in 0..HS {
                state[[v, HS + z, start_col + c]] = buf[(v * nz + z) * HS + c];
            }
        }
    }
}

/// Periodic x-direction halo exchange with this rank's left and right
/// neighbors: pack, send both ways, block on both receives, unpack.
///
/// Running this twice in a row without any other mutation in between is a
/// no-op on the second call (the packed data is already what's there).
pub fn exchange_x(state: &mut StateArray, topo: &Topology, nz: usize) -> Result<(), MiniWeatherError> {
    let nx = topo.nx;

    let left_send = pack_columns(state, nz, HS);
    let right_send = pack_columns(state, nz, nx);
    topo.send_left(left_send);
    topo.send_right(right_send);

    let from_left = topo.recv_from_left()?;
    let from_right = topo.recv_from_right()?;

    unpack_columns(state, nz, 0, &from_left);
    unpack_columns(state, nz, nx + HS, &from_right);
    Ok(())
}

/// Reflective z boundaries: zero vertical momentum at the lid/floor ghost
/// rows, mass-flux-preserving extrapolation for horizontal momentum, and a
/// plain copy of the nearest interior row for density and density*theta.
/// Requires no inter-rank communication.
pub fn enforce_z_boundaries(state: &mut StateArray, hydro: &HydrostaticProfile) {
    let nz_rows = state.shape()[1];
    let nx_total = state.shape()[2];

    let pairs = [(0usize, HS), (1usize, HS), (nz_rows - 1, nz_rows - HS - 1), (nz_rows - 2, nz_rows - HS - 1)];

    for &(ghost, interior) in &pairs {
        let rho_ratio = hydro.cell_dens[ghost] / hydro.cell_dens[interior];
        for i in 0..nx_total {
            state[[WMOM, ghost, i]] = 0.0;
            state[[UMOM, ghost, i]] = state[[UMOM, interior, i]] * rho_ratio;
            state[[DENS, ghost, i]] = state[[DENS, interior, i]];
            state[[RHOT, ghost, i]] = state[[RHOT, interior, i]];
        }
    }
}

/// Physical center-z of cell row `k` of a local padded grid (z is never
/// rank-decomposed, so no `k_beg` offset is needed here).
pub fn cell_center_z(k: usize, dz: f64) -> f64 {
    (k as f64 - HS as f64 + 0.5) * dz
}

/// The injection scenario's left-edge cold jet: overrides the x-halo cells
/// just unpacked by `exchange_x` on the globally-leftmost rank, within a
/// band centered on 3/4 of the domain height. Must run after `exchange_x`,
/// and only modifies halo (not interior) cells.
pub fn apply_injection_override(state: &mut StateArray, hydro: &HydrostaticProfile, topo: &Topology, dz: f64) {
    if topo.i_beg != 0 {
        return;
    }
    let band_center = 3.0 * ZLEN / 4.0;
    let band_half_width = ZLEN / 16.0;

    for k in 0..hydro.cell_dens.len() {
        let z = cell_center_z(k, dz);
        if (z - band_center).abs() > band_half_width {
            continue;
        }
        let rho_bkg = hydro.cell_dens[k];
        let rho_theta_bkg = hydro.cell_dens_theta[k];
        for c in 0..HS {
            let rho_total = state[[DENS, k, c]] + rho_bkg;
            state[[UMOM, k, c]] = rho_total * 50.0;
            state[[RHOT, k, c]] = rho_total * 298.0 - rho_theta_bkg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataSpec;
    use crate::hydrostatic;
    use crate::state::new_state_array;
    use crate::topology::build_ring;
    use approx::assert_relative_eq;

    #[test]
    fn single_rank_periodic_halo_equals_own_interior() {
        let ring = build_ring(1, 8).unwrap();
        let topo = ring.into_iter().next().unwrap();
        let nz = 4;
        let nx = topo.nx;
        let mut state = new_state_array(nx, nz);
        for v in 0..NUM_VARS {
            for z in 0..nz + 2 * HS {
                for i in 0..nx + 2 * HS {
                    state[[v, z, i]] = (v * 1000 + z * 100 + i) as f64;
                }
            }
        }
        exchange_x(&mut state, &topo, nz).unwrap();
        for v in 0..NUM_VARS {
            for z in 0..nz {
                for c in 0..HS {
                    // left halo column c should equal the rightmost interior column.
                    assert_relative_eq!(state[[v, HS + z, c]], (v * 1000 + (HS + z) * 100 + (nx + c)) as f64);
                    // right halo column should equal the leftmost interior column.
                    assert_relative_eq!(
                        state[[v, HS + z, nx + HS + c]],
                        (v * 1000 + (HS + z) * 100 + (HS + c)) as f64
                    );
                }
            }
        }
    }

    #[test]
    fn halo_exchange_is_idempotent() {
        let ring = build_ring(1, 8).unwrap();
        let topo = ring.into_iter().next().unwrap();
        let nz = 4;
        let nx = topo.nx;
        let mut state = new_state_array(nx, nz);
        for (idx, v) in state.iter_mut().enumerate() {
            *v = idx as f64 * 0.5;
        }
        exchange_x(&mut state, &topo, nz).unwrap();
        let after_first = state.clone();
        exchange_x(&mut state, &topo, nz).unwrap();
        assert_eq!(state, after_first);
    }

    #[test]
    fn rigid_lid_zeroes_vertical_momentum() {
        let hydro = hydrostatic::build(DataSpec::Thermal, 0, 10, 100.0);
        let mut state = new_state_array(6, 10);
        state.fill(7.0);
        enforce_z_boundaries(&mut state, &hydro);
        let nz_rows = state.shape()[1];
        for i in 0..state.shape()[2] {
            assert_eq!(state[[WMOM, 0, i]], 0.0);
            assert_eq!(state[[WMOM, 1, i]], 0.0);
            assert_eq!(state[[WMOM, nz_rows - 1, i]], 0.0);
            assert_eq!(state[[WMOM, nz_rows - 2, i]], 0.0);
        }
    }
}
