//! Unit tests for ts-net.
//!
//! All tests use hand-crafted networks so they run without any input file.

#[cfg(test)]
mod helpers {
    use crate::{Network, NetworkBuilder};

    /// Build a small diamond with a shortcut for routing tests.
    ///
    /// Nodes (physical coords):
    ///   A:(0,0)  B:(1,0)  C:(0,1)  D:(1,1)
    ///
    /// Directed links (length m, speed m/s, capacity):
    ///   AB: A→B  100 m @ 10     CD: C→D  100 m @ 10
    ///   AC: A→C  300 m @ 10     BD: B→D  100 m @ 10
    ///
    /// Fastest A→D is A→B→D (20 s) vs A→C→D (40 s).
    pub fn diamond() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_node("A", 0.0, 0.0).unwrap();
        b.add_node("B", 1.0, 0.0).unwrap();
        b.add_node("C", 0.0, 1.0).unwrap();
        b.add_node("D", 1.0, 1.0).unwrap();
        b.add_link("AB", "A", "B", 100.0, 10.0, 1_000.0).unwrap();
        b.add_link("AC", "A", "C", 300.0, 10.0, 1_000.0).unwrap();
        b.add_link("BD", "B", "D", 100.0, 10.0, 1_000.0).unwrap();
        b.add_link("CD", "C", "D", 100.0, 10.0, 1_000.0).unwrap();
        b.build()
    }
}

// ── Builder & network structure ───────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use crate::{NetError, NetworkBuilder};

    #[test]
    fn empty_build() {
        let net = NetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.link_count(), 0);
    }

    #[test]
    fn out_links_follow_insertion() {
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        assert_eq!(net.out_degree(a), 2);
        let out: Vec<&str> = net.node(a).links_out.iter().map(|&l| net.link(l).id.as_str()).collect();
        assert_eq!(out, ["AB", "AC"]);
    }

    #[test]
    fn link_references_resolve() {
        let net = super::helpers::diamond();
        let bd = net.link_id("BD").unwrap();
        assert_eq!(net.link(bd).from, net.node_id("B").unwrap());
        assert_eq!(net.link(bd).to, net.node_id("D").unwrap());
    }

    #[test]
    fn unknown_node_in_link_rejected() {
        let mut b = NetworkBuilder::new();
        b.add_node("A", 0.0, 0.0).unwrap();
        let err = b.add_link("AX", "A", "X", 1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, NetError::UnknownNode(id) if id == "X"));
    }

    #[test]
    fn duplicates_rejected() {
        let mut b = NetworkBuilder::new();
        b.add_node("A", 0.0, 0.0).unwrap();
        assert!(matches!(b.add_node("A", 1.0, 1.0), Err(NetError::DuplicateNode(_))));
        b.add_node("B", 1.0, 0.0).unwrap();
        b.add_link("AB", "A", "B", 1.0, 1.0, 1.0).unwrap();
        assert!(matches!(
            b.add_link("AB", "B", "A", 1.0, 1.0, 1.0),
            Err(NetError::DuplicateLink(_))
        ));
    }

    #[test]
    fn unknown_lookups_error() {
        let net = super::helpers::diamond();
        assert!(matches!(net.node_id("Z"), Err(NetError::UnknownNode(_))));
        assert!(matches!(net.link_id("ZZ"), Err(NetError::UnknownLink(_))));
    }

    #[test]
    fn bounding_box_over_physical_coords() {
        let net = super::helpers::diamond();
        let bbox = net.bounding_box();
        assert_eq!((bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y), (0.0, 0.0, 1.0, 1.0));
    }
}

// ── Congestion model ──────────────────────────────────────────────────────────

#[cfg(test)]
mod congestion {
    #[test]
    fn free_flow_time_from_speed() {
        let net = super::helpers::diamond();
        let ac = net.link_id("AC").unwrap();
        assert_eq!(net.link(ac).free_flow_time, 30.0); // 300 m at 10 m/s
    }

    #[test]
    fn bpr_travel_time() {
        let mut net = super::helpers::diamond();
        let ab = net.link_id("AB").unwrap();

        // Empty link travels at free flow.
        assert_eq!(net.link(ab).travel_time(), 10.0);

        // 2000 agents on capacity 1000: t = 10 * (1 + 0.15 * 2^4) = 34.
        for _ in 0..2_000 {
            net.increment_occupancy(ab);
        }
        assert!((net.link(ab).travel_time() - 34.0).abs() < 1e-9);
        assert_eq!(net.link(ab).occupancy(), 2_000);
        assert!((net.link(ab).saturation() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn occupancy_round_trip() {
        let mut net = super::helpers::diamond();
        let ab = net.link_id("AB").unwrap();
        net.increment_occupancy(ab);
        net.increment_occupancy(ab);
        net.decrement_occupancy(ab);
        assert_eq!(net.link(ab).occupancy(), 1);
    }
}

// ── Coordinate shuffle ────────────────────────────────────────────────────────

#[cfg(test)]
mod shuffle {
    use ts_core::Point;

    #[test]
    fn round_robin_strips() {
        let mut net = super::helpers::diamond();
        net.shuffle_coordinates(2);
        let coords: Vec<Point> = net.nodes().map(|(_, n)| n.pos).collect();
        assert_eq!(coords[0], Point::new(0.5, 0.5));
        assert_eq!(coords[1], Point::new(1.5, 0.5));
        assert_eq!(coords[2], Point::new(0.5, 0.5));
        assert_eq!(coords[3], Point::new(1.5, 0.5));
    }

    #[test]
    fn physical_coords_preserved() {
        let mut net = super::helpers::diamond();
        let before: Vec<Point> = net.nodes().map(|(_, n)| n.phys).collect();
        net.shuffle_coordinates(3);
        let after: Vec<Point> = net.nodes().map(|(_, n)| n.phys).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn rerun_is_identical() {
        let mut a = super::helpers::diamond();
        let mut b = super::helpers::diamond();
        a.shuffle_coordinates(4);
        b.shuffle_coordinates(4);
        a.shuffle_coordinates(4); // idempotent
        for ((_, na), (_, nb)) in a.nodes().zip(b.nodes()) {
            assert_eq!(na.pos, nb.pos);
        }
    }

    #[test]
    fn heuristic_uses_physical_coords() {
        let mut net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        let before = net.heuristic(a, d);
        net.shuffle_coordinates(2);
        assert_eq!(net.heuristic(a, d), before);
        assert_eq!(before, 2.0); // |1-0| + |1-0| on physical coords
    }
}

// ── Planner ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod planner {
    use ts_core::NodeId;

    use crate::{astar, astar_avoiding, shortest_path, CostMetric, NetError, NetworkBuilder};

    #[test]
    fn trivial_same_node() {
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        for metric in [CostMetric::Length, CostMetric::FreeFlowTime] {
            let p = shortest_path(&net, a, a, metric).unwrap();
            assert!(p.is_trivial());
            assert_eq!(p.cost, 0.0);
            assert!(astar(&net, a, a, metric).unwrap().is_trivial());
        }
    }

    #[test]
    fn fastest_path_in_reverse_order() {
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        let p = shortest_path(&net, a, d, CostMetric::FreeFlowTime).unwrap();

        // A→B→D at free flow: 10 s + 10 s.
        assert_eq!(p.cost, 20.0);
        let ids: Vec<&str> = p.links.iter().map(|&l| net.link(l).id.as_str()).collect();
        assert_eq!(ids, ["BD", "AB"]); // reverse traversal order
    }

    #[test]
    fn path_closure() {
        // Walking the links from the back must form a connected chain from
        // source to destination.
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        let p = astar(&net, a, d, CostMetric::Length).unwrap();

        let mut at = a;
        for &lid in p.links.iter().rev() {
            assert_eq!(net.link(lid).from, at);
            at = net.link(lid).to;
        }
        assert_eq!(at, d);
    }

    #[test]
    fn no_path_to_unreachable_node() {
        let mut b = NetworkBuilder::new();
        b.add_node("A", 0.0, 0.0).unwrap();
        b.add_node("B", 1.0, 0.0).unwrap();
        b.add_node("C", 2.0, 0.0).unwrap();
        b.add_link("AB", "A", "B", 100.0, 10.0, 1.0).unwrap();
        // C has no incoming links.
        let net = b.build();
        let a = net.node_id("A").unwrap();
        let c = net.node_id("C").unwrap();
        assert!(matches!(
            shortest_path(&net, a, c, CostMetric::Length),
            Err(NetError::NoPath { .. })
        ));
        assert!(matches!(
            astar(&net, a, c, CostMetric::Length),
            Err(NetError::NoPath { .. })
        ));
    }

    #[test]
    fn astar_matches_plain_on_diamond() {
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        for metric in [CostMetric::Length, CostMetric::FreeFlowTime] {
            let plain = shortest_path(&net, a, d, metric).unwrap();
            let star = astar(&net, a, d, metric).unwrap();
            assert_eq!(plain.cost, star.cost);
            assert_eq!(plain.links, star.links);
        }
    }

    #[test]
    fn avoided_link_is_soft() {
        let mut net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        let ab = net.link_id("AB").unwrap();
        let bd = net.link_id("BD").unwrap();

        // Avoiding BD reroutes through C.
        let p = astar_avoiding(&mut net, a, d, bd, CostMetric::FreeFlowTime).unwrap();
        let ids: Vec<&str> = p.links.iter().map(|&l| net.link(l).id.as_str()).collect();
        assert_eq!(ids, ["CD", "AC"]);

        // Costs restored afterwards.
        assert_eq!(net.link(bd).free_flow_time, 10.0);

        // Avoiding AB too leaves no alternative to CD's branch.
        let p2 = astar_avoiding(&mut net, a, d, ab, CostMetric::FreeFlowTime).unwrap();
        let ids2: Vec<&str> = p2.links.iter().map(|&l| net.link(l).id.as_str()).collect();
        assert_eq!(ids2, ["CD", "AC"]);
    }

    #[test]
    fn avoided_link_taken_when_sole_option() {
        let mut b = NetworkBuilder::new();
        b.add_node("A", 0.0, 0.0).unwrap();
        b.add_node("B", 1.0, 0.0).unwrap();
        b.add_link("AB", "A", "B", 100.0, 10.0, 1.0).unwrap();
        let mut net = b.build();
        let a = net.node_id("A").unwrap();
        let bn = net.node_id("B").unwrap();
        let ab = net.link_id("AB").unwrap();

        let p = astar_avoiding(&mut net, a, bn, ab, CostMetric::FreeFlowTime).unwrap();
        assert_eq!(p.links, vec![ab]);
        assert_eq!(net.link(ab).free_flow_time, 10.0);
    }

    /// A* cost equals plain shortest-path cost over many random queries on a
    /// random grid (admissible heuristic: every link is at least as long as
    /// the coordinate distance it spans).
    #[test]
    fn astar_matches_plain_on_random_grid() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        const SIDE: usize = 20;
        let mut rng = SmallRng::seed_from_u64(0xD1CE);
        let mut b = NetworkBuilder::new();

        for row in 0..SIDE {
            for col in 0..SIDE {
                b.add_node(&format!("n{row}_{col}"), col as f64, row as f64).unwrap();
            }
        }
        let mut add = |b: &mut NetworkBuilder, from: (usize, usize), to: (usize, usize), len: f64| {
            let id = format!("l{}_{}__{}_{}", from.0, from.1, to.0, to.1);
            b.add_link(
                &id,
                &format!("n{}_{}", from.0, from.1),
                &format!("n{}_{}", to.0, to.1),
                len,
                10.0,
                1_000.0,
            )
            .unwrap();
        };
        for row in 0..SIDE {
            for col in 0..SIDE {
                // Grid spacing is 1, so any length >= 1 keeps L1 admissible.
                if col + 1 < SIDE {
                    let len = 1.0 + rng.gen_range(0.0..3.0);
                    add(&mut b, (row, col), (row, col + 1), len);
                    add(&mut b, (row, col + 1), (row, col), len);
                }
                if row + 1 < SIDE {
                    let len = 1.0 + rng.gen_range(0.0..3.0);
                    add(&mut b, (row, col), (row + 1, col), len);
                    add(&mut b, (row + 1, col), (row, col), len);
                }
            }
        }
        let net = b.build();
        let n = net.node_count() as u32;

        for _ in 0..100 {
            let s = NodeId(rng.gen_range(0..n));
            let d = NodeId(rng.gen_range(0..n));
            if s == d {
                continue;
            }
            let plain = shortest_path(&net, s, d, CostMetric::Length).unwrap();
            let star = astar(&net, s, d, CostMetric::Length).unwrap();
            assert!(
                (plain.cost - star.cost).abs() < 1e-9,
                "cost mismatch {s}→{d}: plain {} vs A* {}",
                plain.cost,
                star.cost
            );
        }
    }
}

// ── Path cache ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod cache {
    use crate::{CostMetric, PathCache};

    #[test]
    fn second_query_is_memoised() {
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        let mut cache = PathCache::new();

        let first = cache.get_or_compute(&net, a, d, CostMetric::FreeFlowTime).unwrap();
        assert_eq!(cache.len(), 1);
        let second = cache.get_or_compute(&net, a, d, CostMetric::FreeFlowTime).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn directions_cached_separately() {
        let net = super::helpers::diamond();
        let a = net.node_id("A").unwrap();
        let d = net.node_id("D").unwrap();
        let mut cache = PathCache::new();

        cache.get_or_compute(&net, a, d, CostMetric::FreeFlowTime).unwrap();
        // D→A has no links in this directed diamond.
        assert!(cache.get_or_compute(&net, d, a, CostMetric::FreeFlowTime).is_err());
        assert_eq!(cache.len(), 1);
    }
}
