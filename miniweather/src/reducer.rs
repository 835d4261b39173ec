//! Conservation diagnostics: total mass and total energy over a rank's
//! interior cells, then summed across every rank via the topology's
//! all-reduce.

use rayon::prelude::*;

use crate::constants::{C0, CP, CV, DENS, GAMMA, HS, P0, RD, RHOT, UMOM, WMOM};
use crate::error::MiniWeatherError;
use crate::state::{HydrostaticProfile, StateArray};
use crate::topology::Topology;

/// Sum of cell mass (`rho * dx * dz`) and cell total energy (kinetic plus
/// internal) over this rank's interior cells. Rows are folded independently
/// and reduced to avoid any cross-thread mutable state.
pub fn local_mass_and_energy(state: &StateArray, hydro: &HydrostaticProfile, dx: f64, dz: f64) -> (f64, f64) {
    let nz = state.shape()[1] - 2 * HS;
    let nx = state.shape()[2] - 2 * HS;

    (0..nz)
        .into_par_iter()
        .fold(
            || (0.0, 0.0),
            |mut acc, k| {
                for i in 0..nx {
                    let r = state[[DENS, HS + k, HS + i]] + hydro.cell_dens[HS + k];
                    let u = state[[UMOM, HS + k, HS + i]] / r;
                    let w = state[[WMOM, HS + k, HS + i]] / r;
                    let theta = (state[[RHOT, HS + k, HS + i]] + hydro.cell_dens_theta[HS + k]) / r;
                    let p = C0 * (r * theta).powf(GAMMA);
                    let t = theta / (P0 / p).powf(RD / CP);
                    let ke = r * (u * u + w * w);
                    let ie = r * CV * t;
                    acc.0 += r * dx * dz;
                    acc.1 += (ke + ie) * dx * dz;
                }
                acc
            },
        )
        .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1))
}

/// Domain-global (mass, total_energy), summed across every rank. Every rank
/// must call this — it blocks on the topology's all-reduce.
pub fn global_mass_and_energy(
    state: &StateArray,
    hydro: &HydrostaticProfile,
    topo: &Topology,
    dx: f64,
    dz: f64,
) -> Result<(f64, f64), MiniWeatherError> {
    let local = local_mass_and_energy(state, hydro, dx, dz);
    topo.all_reduce_sum(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataSpec;
    use crate::hydrostatic;
    use crate::state::new_state_array;
    use crate::topology::build_ring;

    #[test]
    fn resting_hydrostatic_state_has_positive_finite_mass_and_energy() {
        let dz = 200.0;
        let dx = 250.0;
        let nx = 10;
        let nz = 8;
        let hydro = hydrostatic::build(DataSpec::Thermal, 0, nz, dz);
        let state = new_state_array(nx, nz);
        let (mass, te) = local_mass_and_energy(&state, &hydro, dx, dz);
        assert!(mass > 0.0 && mass.is_finite());
        assert!(te > 0.0 && te.is_finite());
    }

    #[test]
    fn global_reduction_sums_every_ranks_local_mass() {
        let dz = 200.0;
        let dx = 250.0;
        let nz = 8;
        let nx_glob = 20;
        let hydro = hydrostatic::build(DataSpec::Thermal, 0, nz, dz);
        let ring = build_ring(2, nx_glob).unwrap();

        std::thread::scope(|scope| {
            let hydro = &hydro;
            for topo in ring {
                let state = new_state_array(topo.nx, nz);
                scope.spawn(move || {
                    let (mass, _) = local_mass_and_energy(&state, hydro, dx, dz);
                    let (global_mass, _) = global_mass_and_energy(&state, hydro, &topo, dx, dz).unwrap();
                    assert!(global_mass >= mass);
                });
            }
        });
    }
}
