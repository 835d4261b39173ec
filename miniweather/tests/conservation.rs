//! Whole-run invariants: mass/energy conservation, rank-count invariance,
//! and scenario-specific physical sanity checks. Grids and run lengths for
//! the two slowest reference scenarios (collision, density_current) are
//! reduced from the full-fidelity sizes so the suite runs in well under a
//! second; the others use the reference sizes directly.

use miniweather::{build_ring, Config, DataSpec, NullSink, Simulation};

fn run_single_rank(cfg: Config) -> (f64, f64) {
    let topo = build_ring(1, cfg.nx_glob).unwrap().into_iter().next().unwrap();
    let mut sim = Simulation::new(cfg, topo).unwrap();
    let mut sink = NullSink;
    sim.run(&mut sink).unwrap()
}

#[test]
fn thermal_conserves_mass_and_bounds_energy_drift() {
    let cfg = Config {
        nx_glob: 100,
        nz_glob: 50,
        sim_time: 2.0,
        output_freq: -1.0,
        data_spec: DataSpec::Thermal,
        nranks: 1,
        hv_beta: 0.05,
        check_finite: true,
    };
    let (d_mass, d_te) = run_single_rank(cfg);
    assert!(d_mass.abs() < 1e-13, "mass drift {d_mass} exceeds tolerance");
    assert!(d_te.abs() < 5e-5, "energy drift {d_te} exceeds tolerance");
}

#[test]
fn collision_develops_vertical_motion_without_blowing_up() {
    // Reference scenario runs nx_glob=200, nz_glob=100, sim_time=10.0; scaled
    // down here for suite speed per the reduced-test-time-budget note.
    let cfg = Config {
        nx_glob: 40,
        nz_glob: 20,
        sim_time: 1.0,
        output_freq: -1.0,
        data_spec: DataSpec::Collision,
        nranks: 1,
        hv_beta: 0.05,
        check_finite: true,
    };
    let topo = build_ring(1, cfg.nx_glob).unwrap().into_iter().next().unwrap();
    let mut sim = Simulation::new(cfg, topo).unwrap();
    let mut sink = NullSink;
    let (d_mass, d_te) = sim.run(&mut sink).unwrap();
    assert!(d_mass.abs() < 1e-10);
    assert!(d_te.abs() < 2e-4);

    let snapshot = sim.snapshot();
    let max_wwnd = snapshot.wwnd.iter().fold(0.0_f64, |acc, &w| acc.max(w.abs()));
    assert!(max_wwnd > 0.0, "colliding thermals should have produced vertical motion by now");
}

#[test]
fn gravity_waves_preserves_the_background_wind() {
    let cfg = Config {
        nx_glob: 400,
        nz_glob: 200,
        sim_time: 5.0,
        output_freq: -1.0,
        data_spec: DataSpec::GravityWaves,
        nranks: 1,
        hv_beta: 0.05,
        check_finite: true,
    };
    let topo = build_ring(1, cfg.nx_glob).unwrap().into_iter().next().unwrap();
    let mut sim = Simulation::new(cfg, topo).unwrap();
    let mut sink = NullSink;
    sim.run(&mut sink).unwrap();

    let snapshot = sim.snapshot();
    let mean_u: f64 = snapshot.uwnd.iter().sum::<f64>() / snapshot.uwnd.len() as f64;
    assert!((mean_u - 15.0).abs() < 0.01, "mean u drifted to {mean_u}, expected close to 15 m/s");
}

#[test]
fn density_current_cold_pool_reaches_the_floor() {
    // Reference scenario runs nx_glob=400, nz_glob=200, sim_time=15.0; scaled
    // down here for suite speed.
    let cfg = Config {
        nx_glob: 80,
        nz_glob: 40,
        sim_time: 3.0,
        output_freq: -1.0,
        data_spec: DataSpec::DensityCurrent,
        nranks: 1,
        hv_beta: 0.05,
        check_finite: true,
    };
    let topo = build_ring(1, cfg.nx_glob).unwrap().into_iter().next().unwrap();
    let mut sim = Simulation::new(cfg, topo).unwrap();
    let mut sink = NullSink;
    sim.run(&mut sink).unwrap();

    let snapshot = sim.snapshot();
    let floor_row = snapshot.theta.row(0);
    let min_theta = floor_row.iter().cloned().fold(f64::INFINITY, f64::min);
    assert!(min_theta < 0.0, "cold pool should have produced a negative theta perturbation at the floor by now");
}

#[test]
fn injection_fires_a_jet_into_the_left_ranks_halo_band() {
    let cfg = Config {
        nx_glob: 200,
        nz_glob: 100,
        sim_time: 4.0,
        output_freq: -1.0,
        data_spec: DataSpec::Injection,
        nranks: 2,
        hv_beta: 0.05,
        check_finite: true,
    };
    let ring = build_ring(cfg.nranks, cfg.nx_glob).unwrap();

    std::thread::scope(|scope| {
        for topo in ring {
            let cfg = cfg.clone();
            scope.spawn(move || {
                let rank_id = topo.rank_id;
                let mut sim = Simulation::new(cfg, topo).unwrap();
                let mut sink = NullSink;
                let (d_mass, d_te) = sim.run(&mut sink).unwrap();
                assert!(d_mass.abs() < 1e-10);
                assert!(d_te.abs() < 5e-4);

                if rank_id == 0 {
                    let snapshot = sim.snapshot();
                    // Column 0 of this rank's interior grid sits immediately to the
                    // right of the injected left-edge halo; the jet should have
                    // advected some non-zero u into it by t=4.
                    let max_u_near_edge = snapshot.uwnd.column(0).iter().fold(0.0_f64, |acc, &u| acc.max(u.abs()));
                    assert!(max_u_near_edge > 0.0, "injection jet should be visible near the left edge by now");
                }
            });
        }
    });
}

#[test]
fn rank_count_does_not_change_the_conservation_diagnostics() {
    let make_cfg = |nranks: usize| Config {
        nx_glob: 100,
        nz_glob: 50,
        sim_time: 1.0,
        output_freq: -1.0,
        data_spec: DataSpec::Thermal,
        nranks,
        hv_beta: 0.05,
        check_finite: true,
    };

    let mut results = Vec::new();
    for &nranks in &[1usize, 2, 4] {
        let cfg = make_cfg(nranks);
        let ring = build_ring(nranks, cfg.nx_glob).unwrap();
        let (d_mass, d_te) = std::thread::scope(|scope| {
            let handles: Vec<_> = ring
                .into_iter()
                .map(|topo| {
                    let cfg = cfg.clone();
                    scope.spawn(move || {
                        let mut sim = Simulation::new(cfg, topo).unwrap();
                        let mut sink = NullSink;
                        sim.run(&mut sink).unwrap()
                    })
                })
                .collect();
            // Every rank's all-reduce returns the same domain-global values.
            handles.into_iter().next().unwrap().join().unwrap()
        });
        results.push((d_mass, d_te));
    }

    let (m0, e0) = results[0];
    for &(m, e) in &results[1..] {
        assert!((m - m0).abs() / m0.abs().max(1e-300) < 1e-9, "mass delta disagreement across rank counts: {m0} vs {m}");
        assert!((e - e0).abs() / e0.abs().max(1e-300) < 1e-9, "energy delta disagreement across rank counts: {e0} vs {e}");
    }
}
