//! Unit tests for ts-core.

#[cfg(test)]
mod ids {
    use crate::{AgentId, LinkId, NodeId};

    #[test]
    fn index_roundtrip() {
        assert_eq!(NodeId(7).index(), 7);
        assert_eq!(LinkId(0).index(), 0);
        assert_eq!(AgentId(1_234_567_890_123).index(), 1_234_567_890_123);
    }

    #[test]
    fn invalid_is_default() {
        assert_eq!(NodeId::default(), NodeId::INVALID);
        assert_eq!(LinkId::default(), LinkId::INVALID);
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(AgentId::INVALID.0, u64::MAX);
    }

    #[test]
    fn ordering_follows_inner() {
        assert!(NodeId(1) < NodeId(2));
        assert!(AgentId(100) < AgentId::INVALID);
    }

    #[test]
    fn display_names_the_type() {
        assert_eq!(NodeId(3).to_string(), "NodeId(3)");
        assert_eq!(AgentId(42).to_string(), "AgentId(42)");
    }
}

#[cfg(test)]
mod point {
    use crate::Point;

    #[test]
    fn manhattan_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, -4.0);
        assert_eq!(a.manhattan(b), 7.0);
        assert_eq!(b.manhattan(a), 7.0);
        assert_eq!(a.manhattan(a), 0.0);
    }
}

#[cfg(test)]
mod params {
    use crate::SimParams;

    #[test]
    fn bucket_counts() {
        let p = SimParams { record_interval_aggregate: 15, record_interval_snapshot: 60, ..SimParams::default() };
        assert_eq!(p.aggregate_buckets(), 96);
        assert_eq!(p.snapshot_slots(), 24);
    }

    #[test]
    fn world_size_is_grid_product() {
        let p = SimParams { proc_x: 4, proc_y: 2, ..SimParams::default() };
        assert_eq!(p.world_size(), 8);
    }

    #[test]
    fn default_validates() {
        assert!(SimParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_divisor_interval() {
        let p = SimParams { record_interval_aggregate: 7, ..SimParams::default() };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_zero_grid() {
        let p = SimParams { proc_x: 0, ..SimParams::default() };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_bad_strategic_fraction() {
        let p = SimParams { prop_strategic_agents: 1.5, ..SimParams::default() };
        assert!(p.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::WorkerRng;

    #[test]
    fn same_rank_same_sequence() {
        let mut a = WorkerRng::for_rank(3);
        let mut b = WorkerRng::for_rank(3);
        for _ in 0..32 {
            assert_eq!(a.uniform().to_bits(), b.uniform().to_bits());
        }
    }

    #[test]
    fn different_ranks_diverge() {
        let mut a = WorkerRng::for_rank(0);
        let mut b = WorkerRng::for_rank(1);
        let draws_a: Vec<u64> = (0..8).map(|_| a.uniform().to_bits()).collect();
        let draws_b: Vec<u64> = (0..8).map(|_| b.uniform().to_bits()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn uniform_in_unit_interval() {
        let mut rng = WorkerRng::for_rank(0);
        for _ in 0..100 {
            let x = rng.uniform();
            assert!((0.0..1.0).contains(&x));
        }
    }
}
