//! Unit tests for ts-agent.

#[cfg(test)]
mod helpers {
    use ts_core::NodeId;
    use ts_net::{Network, NetworkBuilder};

    use crate::Trip;

    /// Two nodes, one 1 km link at 10 m/s with capacity 10.
    pub fn one_link_network() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_node("A", 0.0, 0.0).unwrap();
        b.add_node("B", 1.0, 0.0).unwrap();
        b.add_link("AB", "A", "B", 1_000.0, 10.0, 10.0).unwrap();
        b.build()
    }

    pub fn trip(start: f64) -> Trip {
        Trip::new(NodeId(0), NodeId(1), start)
    }
}

#[cfg(test)]
mod strategy {
    use crate::Strategy;

    #[test]
    fn default_is_inert() {
        let s = Strategy::default();
        assert!(!s.optimized);
    }

    #[test]
    fn precomputes_trig() {
        let s = Strategy::new(0.0, 0.5);
        assert!(s.optimized);
        assert_eq!(s.cos_alpha, 1.0);
        assert_eq!(s.sin_alpha, 0.0);
        assert_eq!(s.theta, 0.5);
    }

    #[test]
    fn linear_threshold() {
        // alpha = 0: decision depends on x1 alone.
        let s = Strategy::new(0.0, 0.5);
        assert!(!s.decides_reroute(0.5, 100.0)); // 0.5 - 0.5 = 0, not > 0
        assert!(s.decides_reroute(0.6, 0.0));

        // alpha = pi/2: decision depends on x2 alone.
        let s = Strategy::new(std::f64::consts::FRAC_PI_2, 0.5);
        assert!(s.decides_reroute(100.0, 0.6));
        assert!(!s.decides_reroute(100.0, 0.4));
    }

    /// Monotonicity: in the first quadrant of α, growing either signal never
    /// flips a reroute decision back to "stay".
    #[test]
    fn monotone_in_both_signals() {
        for &alpha in &[0.0, 0.3, 0.7, std::f64::consts::FRAC_PI_2] {
            for &theta in &[-0.5, 0.0, 0.4, 1.0] {
                let s = Strategy::new(alpha, theta);
                for x1 in 0..8 {
                    for x2 in 0..8 {
                        let base = s.decides_reroute(x1 as f64 / 4.0, x2 as f64 / 4.0);
                        if base {
                            assert!(s.decides_reroute(x1 as f64 / 4.0 + 1.0, x2 as f64 / 4.0));
                            assert!(s.decides_reroute(x1 as f64 / 4.0, x2 as f64 / 4.0 + 1.0));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod agent {
    use ts_core::{AgentId, LinkId, NodeId, Point};

    use crate::{Agent, Strategy, Trip};

    #[test]
    fn waits_for_first_trip_start() {
        let agent = Agent::new(AgentId(1), 0, vec![super::helpers::trip(3_600.0)]);
        assert_eq!(agent.remaining_time, 3_600.0);
        assert!(agent.at_node);
        assert!(!agent.en_route);
        assert_eq!(agent.n_paths, 1);
    }

    #[test]
    fn no_trips_means_no_wait() {
        let agent = Agent::new(AgentId(1), 0, vec![]);
        assert_eq!(agent.remaining_time, 0.0);
    }

    #[test]
    fn remaining_time_clamps_at_zero() {
        let mut agent = Agent::new(AgentId(1), 0, vec![super::helpers::trip(0.5)]);
        agent.decrease_remaining_time(1.0);
        assert_eq!(agent.remaining_time, 0.0);
        agent.decrease_remaining_time(1.0);
        assert_eq!(agent.remaining_time, 0.0);
    }

    #[test]
    fn path_consumed_from_the_back() {
        let mut agent = Agent::new(AgentId(1), 0, vec![super::helpers::trip(0.0)]);
        agent.path = vec![LinkId(2), LinkId(1), LinkId(0)];
        assert_eq!(agent.next_link_and_remove(), Some(LinkId(0)));
        assert_eq!(agent.next_link_and_remove(), Some(LinkId(1)));
        assert_eq!(agent.n_link_in_path, 2);
        assert_eq!(agent.next_link_and_remove(), Some(LinkId(2)));
        assert_eq!(agent.next_link_and_remove(), None);
    }

    #[test]
    fn reroute_requires_optimized_strategy() {
        let net = super::helpers::one_link_network();
        let ab = net.link_id("AB").unwrap();
        let mut agent = Agent::new(AgentId(1), 0, vec![super::helpers::trip(0.0)]);
        agent.trip_duration_theo = 100.0;

        // Saturated link, but inert strategy.
        let mut congested = net.clone();
        for _ in 0..50 {
            congested.increment_occupancy(ab);
        }
        assert!(!agent.wants_reroute(&congested, ab, 1_000.0));

        // Optimised strategy fires on the same signals.
        agent.strategy = Strategy::new(0.0, 0.0);
        assert!(agent.wants_reroute(&congested, ab, 1_000.0));
    }

    #[test]
    fn empty_next_link_suppresses_reroute() {
        let net = super::helpers::one_link_network();
        let ab = net.link_id("AB").unwrap();
        let mut agent = Agent::new(AgentId(1), 0, vec![super::helpers::trip(0.0)]);
        agent.strategy = Strategy::new(0.0, 0.0);
        agent.trip_duration_theo = 100.0;
        // x1 is large, but the next link is empty (x2 = 0).
        assert!(!agent.wants_reroute(&net, ab, 10_000.0));
    }

    #[test]
    fn install_next_trip_resets_per_trip_state() {
        let mut agent = Agent::new(
            AgentId(1),
            0,
            vec![Trip::new(NodeId(0), NodeId(1), 0.0), Trip::new(NodeId(1), NodeId(0), 500.0)],
        );
        agent.en_route = true;
        agent.at_node = false;
        agent.cur_link = Some(LinkId(0));
        agent.trip_duration_theo = 100.0;
        agent.n_link_in_path = 3;

        agent.trips.pop_front();
        agent.install_next_trip(vec![LinkId(9)], Point::new(1.5, 0.5), 400.0);

        assert!(!agent.en_route);
        assert!(agent.at_node);
        assert_eq!(agent.cur_link, None);
        assert_eq!(agent.trip_duration_theo, 0.0);
        assert_eq!(agent.remaining_time, 100.0); // 500 - 400
        assert_eq!((agent.x, agent.y), (1.5, 0.5));
        assert_eq!(agent.n_paths, 2);
        assert_eq!(agent.n_link_in_path, 0);
        assert_eq!(agent.path, vec![LinkId(9)]);
    }

    #[test]
    fn late_agent_departs_immediately() {
        let mut agent = Agent::new(AgentId(1), 0, vec![
            Trip::new(NodeId(0), NodeId(1), 0.0),
            Trip::new(NodeId(1), NodeId(0), 100.0),
        ]);
        agent.trips.pop_front();
        // The clock is already past the next trip's start time.
        agent.install_next_trip(vec![], Point::new(0.5, 0.5), 250.0);
        assert_eq!(agent.remaining_time, 0.0);
    }
}

#[cfg(test)]
mod package {
    use ts_core::{AgentId, LinkId};

    use crate::{Agent, AgentPackage, Strategy};

    #[test]
    fn round_trip_preserves_state() {
        let mut agent = Agent::new(AgentId(77), 0, vec![super::helpers::trip(120.0)]);
        agent.strategy = Strategy::new(0.25, 0.5);
        agent.path = vec![LinkId(3), LinkId(1)];
        agent.en_route = true;
        agent.at_node = false;
        agent.cur_link = Some(LinkId(1));
        agent.x = 1.5;
        agent.y = 0.5;
        agent.remaining_time = 42.0;
        agent.trip_duration_theo = 17.0;
        agent.n_paths = 2;
        agent.n_link_in_path = 1;

        let pkg = AgentPackage::for_destination(&agent, 1);
        assert_eq!(pkg.rank, 1);

        let restored: Agent = pkg.into();
        assert_eq!(restored.id, agent.id);
        assert_eq!(restored.home_rank, 0);
        assert_eq!(restored.rank, 1);
        assert_eq!(restored.trips, agent.trips);
        assert_eq!(restored.path, agent.path);
        assert_eq!(restored.cur_link, agent.cur_link);
        assert_eq!(restored.remaining_time, agent.remaining_time);
        assert_eq!(restored.trip_duration_theo, agent.trip_duration_theo);
        assert_eq!(restored.strategy, agent.strategy);
        assert_eq!(restored.n_paths, 2);
        assert_eq!(restored.n_link_in_path, 1);
    }
}
