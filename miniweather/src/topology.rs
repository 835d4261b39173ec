//! Ring decomposition of the x direction across ranks, and the channel
//! endpoints used for halo exchange and the conservation all-reduce.
//!
//! Ranks are simulated as OS threads within one process rather than MPI
//! processes — see the design note in `SPEC_FULL.md` §9 — but the channel
//! protocol mirrors what an MPI send/recv pair would carry: flat `Vec<f64>`
//! buffers with no shared mutable state between ranks.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::MiniWeatherError;

enum ReduceLink {
    Root {
        from_children: Vec<Receiver<(f64, f64)>>,
        to_children: Vec<Sender<(f64, f64)>>,
    },
    Leaf {
        to_root: Sender<(f64, f64)>,
        from_root: Receiver<(f64, f64)>,
    },
}

/// This rank's slice of the global x extent, plus its wired-up links to its
/// ring neighbors and to the reduction root.
pub struct Topology {
    pub rank_id: usize,
    pub nranks: usize,
    /// Starting global column index this rank owns.
    pub i_beg: usize,
    /// Number of local columns this rank owns.
    pub nx: usize,
    /// Rank id of the left (periodic) neighbor.
    pub left_rank: usize,
    /// Rank id of the right (periodic) neighbor.
    pub right_rank: usize,
    right_tx: Sender<Vec<f64>>,
    right_rx: Receiver<Vec<f64>>,
    left_tx: Sender<Vec<f64>>,
    left_rx: Receiver<Vec<f64>>,
    reduce: ReduceLink,
}

impl Topology {
    /// Send this rank's packed right-halo columns to its right neighbor.
    /// Buffered (unbounded) channel send: never blocks the caller.
    pub fn send_right(&self, buf: Vec<f64>) {
        // A disconnected receiver here would mean a peer rank already
        // panicked; the corresponding recv_left/recv_right call downstream
        // surfaces that as `ChannelClosed`, so a dropped send is fine to ignore.
        let _ = self.right_tx.send(buf);
    }

    /// Send this rank's packed left-halo columns to its left neighbor.
    pub fn send_left(&self, buf: Vec<f64>) {
        let _ = self.left_tx.send(buf);
    }

    /// Block until the left neighbor's right-bound halo buffer arrives.
    pub fn recv_from_left(&self) -> Result<Vec<f64>, MiniWeatherError> {
        self.left_rx.recv().map_err(|_| MiniWeatherError::ChannelClosed { peer: self.left_rank })
    }

    /// Block until the right neighbor's left-bound halo buffer arrives.
    pub fn recv_from_right(&self) -> Result<Vec<f64>, MiniWeatherError> {
        self.right_rx.recv().map_err(|_| MiniWeatherError::ChannelClosed { peer: self.right_rank })
    }

    /// Domain-global SUM all-reduce: every rank gets back the same
    /// elementwise sum of (mass, total_energy) across all ranks.
    pub fn all_reduce_sum(&self, local: (f64, f64)) -> Result<(f64, f64), MiniWeatherError> {
        match &self.reduce {
            ReduceLink::Root { from_children, to_children } => {
                let mut total = local;
                for rx in from_children {
                    let (m, e) = rx.recv().map_err(|_| MiniWeatherError::ChannelClosed { peer: self.rank_id })?;
                    total.0 += m;
                    total.1 += e;
                }
                for tx in to_children {
                    let _ = tx.send(total);
                }
                Ok(total)
            }
            ReduceLink::Leaf { to_root, from_root } => {
                to_root
                    .send(local)
                    .map_err(|_| MiniWeatherError::ChannelClosed { peer: 0 })?;
                from_root.recv().map_err(|_| MiniWeatherError::ChannelClosed { peer: 0 })
            }
        }
    }
}

/// Build the ring topology for `nranks` ranks sharing a global x extent of
/// `nx_glob` columns. Rank r owns columns `[i_beg(r), i_beg(r) + nx(r))`
/// where `i_beg(r) = floor(r * nx_glob / nranks)`.
///
/// Returns one `Topology` per rank, in rank order, each already wired to its
/// neighbors and to the reduction root (rank 0).
pub fn build_ring(nranks: usize, nx_glob: usize) -> Result<Vec<Topology>, MiniWeatherError> {
    if nranks == 0 {
        return Err(MiniWeatherError::RankLayout { message: "nranks must be at least 1".to_string() });
    }
    if nranks > nx_glob {
        return Err(MiniWeatherError::RankLayout {
            message: format!("nranks ({nranks}) exceeds nx_glob ({nx_glob})"),
        });
    }

    let mut i_begs = Vec::with_capacity(nranks + 1);
    for r in 0..=nranks {
        i_begs.push(r * nx_glob / nranks);
    }

    // One "forward" (rank e -> rank e+1) and one "backward" (rank e+1 ->
    // rank e) channel per ring edge e in 0..nranks. With nranks == 1 the
    // single edge is a genuine self-loop: rank 0's right neighbor is itself.
    let mut fwd_tx: Vec<Option<Sender<Vec<f64>>>> = Vec::with_capacity(nranks);
    let mut fwd_rx: Vec<Option<Receiver<Vec<f64>>>> = Vec::with_capacity(nranks);
    let mut bwd_tx: Vec<Option<Sender<Vec<f64>>>> = Vec::with_capacity(nranks);
    let mut bwd_rx: Vec<Option<Receiver<Vec<f64>>>> = Vec::with_capacity(nranks);
    for _ in 0..nranks {
        let (tx, rx) = unbounded();
        fwd_tx.push(Some(tx));
        fwd_rx.push(Some(rx));
        let (tx, rx) = unbounded();
        bwd_tx.push(Some(tx));
        bwd_rx.push(Some(rx));
    }

    // Reduction star: rank 0 is the root, every other rank a leaf.
    let mut root_from_children = Vec::with_capacity(nranks.saturating_sub(1));
    let mut root_to_children = Vec::with_capacity(nranks.saturating_sub(1));
    let mut leaf_links: Vec<Option<(Sender<(f64, f64)>, Receiver<(f64, f64)>)>> = vec![None; nranks];
    for r in 1..nranks {
        let (to_root_tx, to_root_rx) = unbounded();
        let (bcast_tx, bcast_rx) = unbounded();
        root_from_children.push(to_root_rx);
        root_to_children.push(bcast_tx);
        leaf_links[r] = Some((to_root_tx, bcast_rx));
    }
    let mut root_from_children = Some(root_from_children);
    let mut root_to_children = Some(root_to_children);

    let mut topologies = Vec::with_capacity(nranks);
    for r in 0..nranks {
        let left_edge = (r + nranks - 1) % nranks;
        let right_edge = r;

        let right_tx = fwd_tx[right_edge].take().expect("right edge tx taken twice");
        let right_rx = bwd_rx[right_edge].take().expect("right edge rx taken twice");
        let left_tx = bwd_tx[left_edge].take().expect("left edge tx taken twice");
        let left_rx = fwd_rx[left_edge].take().expect("left edge rx taken twice");

        let reduce = if r == 0 {
            ReduceLink::Root {
                from_children: root_from_children.take().unwrap(),
                to_children: root_to_children.take().unwrap(),
            }
        } else {
            let (to_root, from_root) = leaf_links[r].take().expect("leaf link taken twice");
            ReduceLink::Leaf { to_root, from_root }
        };

        topologies.push(Topology {
            rank_id: r,
            nranks,
            i_beg: i_begs[r],
            nx: i_begs[r + 1] - i_begs[r],
            left_rank: left_edge,
            right_rank: (r + 1) % nranks,
            right_tx,
            right_rx,
            left_tx,
            left_rx,
            reduce,
        });
    }

    Ok(topologies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_is_its_own_neighbor() {
        let ring = build_ring(1, 100).unwrap();
        assert_eq!(ring[0].left_rank, 0);
        assert_eq!(ring[0].right_rank, 0);
        assert_eq!(ring[0].nx, 100);
    }

    #[test]
    fn columns_partition_the_global_extent() {
        let ring = build_ring(3, 100).unwrap();
        let total: usize = ring.iter().map(|t| t.nx).sum();
        assert_eq!(total, 100);
        assert_eq!(ring[0].i_beg, 0);
        for w in ring.windows(2) {
            assert_eq!(w[0].i_beg + w[0].nx, w[1].i_beg);
        }
    }

    #[test]
    fn too_many_ranks_is_a_layout_error() {
        assert!(build_ring(5, 4).is_err());
    }

    #[test]
    fn halo_exchange_round_trips_in_process() {
        let ring = build_ring(2, 10).unwrap();
        let mut iter = ring.into_iter();
        let a = iter.next().unwrap();
        let b = iter.next().unwrap();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                a.send_right(vec![1.0, 2.0, 3.0]);
                let got = a.recv_from_left().unwrap();
                assert_eq!(got, vec![4.0, 5.0, 6.0]);
            });
            scope.spawn(|| {
                b.send_left(vec![4.0, 5.0, 6.0]);
                let got = b.recv_from_right().unwrap();
                assert_eq!(got, vec![1.0, 2.0, 3.0]);
            });
        });
    }

    #[test]
    fn all_reduce_sums_across_ranks() {
        let ring = build_ring(4, 100).unwrap();
        std::thread::scope(|scope| {
            for (r, topo) in ring.into_iter().enumerate() {
                scope.spawn(move || {
                    let total = topo.all_reduce_sum((r as f64 + 1.0, 10.0)).unwrap();
                    assert_eq!(total, (1.0 + 2.0 + 3.0 + 4.0, 40.0));
                });
            }
        });
    }
}
