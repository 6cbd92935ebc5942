//! Feasible utilization range of one group given the others

use wattplan_core::{ClusterSpec, UtilizationPolicy};

/// Closed interval of aggregate group utilization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupBounds {
    pub low: f64,
    pub high: f64,
}

impl GroupBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Derives per-group utilization bounds from the rate requirement.
///
/// Groups above the one being bounded hold their tentative values, groups
/// below contribute their current `[low, high]` range.
pub struct GroupBoundPropagator<'a> {
    cluster: &'a ClusterSpec,
    policy: UtilizationPolicy,
    rate: f64,
}

impl<'a> GroupBoundPropagator<'a> {
    pub fn new(cluster: &'a ClusterSpec, policy: UtilizationPolicy, rate: f64) -> Self {
        Self {
            cluster,
            policy,
            rate,
        }
    }

    /// Capacity range `[n * util_min, n * util_max]` of group `index`
    pub fn capacity(&self, index: usize) -> GroupBounds {
        let (low, high) = self.cluster.groups[index].capacity_range(&self.policy);
        GroupBounds { low, high }
    }

    /// Bounds of group `index`, or `None` when the range is empty
    pub fn propagate(
        &self,
        index: usize,
        low: &[f64],
        high: &[f64],
        tentative: &[f64],
    ) -> Option<GroupBounds> {
        let groups = &self.cluster.groups;
        let coefficient = groups[index].throughput;
        let capacity = self.capacity(index);

        let fixed: f64 = groups
            .iter()
            .enumerate()
            .skip(index + 1)
            .map(|(j, g)| g.throughput * tentative[j])
            .sum();
        let below_high: f64 = groups[..index]
            .iter()
            .zip(high)
            .map(|(g, &h)| g.throughput * h)
            .sum();
        let below_low: f64 = groups[..index]
            .iter()
            .zip(low)
            .map(|(g, &l)| g.throughput * l)
            .sum();

        let bounds = GroupBounds {
            low: capacity
                .low
                .max((self.rate - below_high - fixed) / coefficient),
            high: capacity
                .high
                .min((self.rate - below_low - fixed) / coefficient),
        };

        if bounds.low > bounds.high {
            None
        } else {
            Some(bounds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wattplan_core::{Server, ServerGroup};

    fn group(name: &str, throughput: f64, ids: &[u32]) -> ServerGroup {
        ids.iter().fold(ServerGroup::new(name, throughput), |g, &id| {
            g.with_server(Server::new(id, 50.0, 20.0, 100.0))
        })
    }

    fn cluster() -> ClusterSpec {
        ClusterSpec::new(vec![
            group("g0", 1.0, &[1, 2]),
            group("g1", 2.0, &[3, 4]),
        ])
    }

    #[test]
    fn test_top_group_bounds() {
        let cluster = cluster();
        let propagator =
            GroupBoundPropagator::new(&cluster, UtilizationPolicy::default(), 300.0);

        let low = vec![60.0, 60.0];
        let high = vec![200.0, 200.0];
        let bounds = propagator
            .propagate(1, &low, &high, &[0.0, 0.0])
            .unwrap();

        // low: (300 - 200) / 2 = 50 -> capacity floor 60; high: (300 - 60) / 2 = 120
        assert_eq!(bounds, GroupBounds { low: 60.0, high: 120.0 });
    }

    #[test]
    fn test_fixed_groups_shift_bounds() {
        let cluster = ClusterSpec::new(vec![
            group("g0", 1.0, &[1, 2]),
            group("g1", 1.0, &[3, 4]),
            group("g2", 1.0, &[5, 6]),
        ]);
        let propagator =
            GroupBoundPropagator::new(&cluster, UtilizationPolicy::default(), 400.0);

        let bounds = propagator
            .propagate(1, &[60.0; 3], &[200.0; 3], &[0.0, 0.0, 180.0])
            .unwrap();
        // low: 400 - 200 - 180 = 20 -> 60; high: 400 - 60 - 180 = 160
        assert_eq!(bounds, GroupBounds { low: 60.0, high: 160.0 });
    }

    #[test]
    fn test_empty_range_is_pruned() {
        let cluster = cluster();
        let propagator =
            GroupBoundPropagator::new(&cluster, UtilizationPolicy::default(), 1000.0);

        // even with group 0 at full capacity group 1 would need 400
        assert!(propagator
            .propagate(1, &[60.0, 60.0], &[200.0, 200.0], &[0.0, 0.0])
            .is_none());
    }

    #[test]
    fn test_capacity() {
        let cluster = cluster();
        let propagator = GroupBoundPropagator::new(&cluster, UtilizationPolicy::default(), 1.0);
        let capacity = propagator.capacity(0);
        assert_eq!(capacity, GroupBounds { low: 60.0, high: 200.0 });
        assert!(capacity.contains(60.0));
        assert!(!capacity.contains(201.0));
    }
}
