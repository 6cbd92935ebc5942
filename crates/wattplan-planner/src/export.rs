//! Export of a utilization assignment as per-server operating points

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wattplan_core::{ClusterSpec, PlannerResult, ServerId, UtilizationPolicy};

use crate::distributor::UtilDistributor;
use crate::power::{baseline_power, power};
use crate::search::UtilizationAssignment;

/// Operating point of one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerAllocation {
    /// Share of rated capacity in use (0.0 - 1.0)
    pub utilization: f64,
    /// Rated compute capacity in Mflop/s
    pub flops: f64,
    /// Utilization-dependent power coefficient
    pub alpha: f64,
    /// Power at full utilization (alpha + beta)
    pub peak_power: f64,
}

impl ServerAllocation {
    /// Effective host speed in Mflop/s
    pub fn speed_mflops(&self) -> f64 {
        (self.utilization * self.flops).round()
    }

    /// Wattage range rendered as `"low:high"`
    pub fn watt_per_state(&self) -> String {
        format!("{}:{}", self.alpha, self.peak_power)
    }
}

/// Per-server allocation for a whole cluster, ordered by server id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub servers: BTreeMap<ServerId, ServerAllocation>,
    /// Modeled power of the allocation in watts
    pub total_power: f64,
}

impl AllocationResult {
    pub fn get(&self, id: ServerId) -> Option<&ServerAllocation> {
        self.servers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServerId, &ServerAllocation)> {
        self.servers.iter()
    }
}

/// Spread each group's utilization over its servers and record the result
pub(crate) fn export(
    cluster: &ClusterSpec,
    policy: UtilizationPolicy,
    assignment: &UtilizationAssignment,
) -> PlannerResult<AllocationResult> {
    let distributor = UtilDistributor::new(policy);
    let mut servers = BTreeMap::new();
    let mut total_power = 0.0;

    for (group, &target) in cluster.groups.iter().zip(assignment.groups()) {
        let utils = distributor.distribute(target, group.len())?;
        for (server, util) in group.servers.iter().zip(utils) {
            total_power += power(util, server.alpha, server.beta);
            servers.insert(
                server.id,
                ServerAllocation {
                    utilization: util / 100.0,
                    flops: server.flops,
                    alpha: server.alpha,
                    peak_power: server.peak_power(),
                },
            );
        }
    }

    Ok(AllocationResult {
        servers,
        total_power,
    })
}

/// Every server at `util_max`, the reference point for planned allocations.
///
/// Its total power matches [`baseline_power`], the search's starting threshold.
pub fn baseline_allocation(cluster: &ClusterSpec, policy: &UtilizationPolicy) -> AllocationResult {
    let servers = cluster
        .servers()
        .map(|s| {
            (
                s.id,
                ServerAllocation {
                    utilization: policy.util_max / 100.0,
                    flops: s.flops,
                    alpha: s.alpha,
                    peak_power: s.peak_power(),
                },
            )
        })
        .collect();

    AllocationResult {
        servers,
        total_power: baseline_power(cluster, policy),
    }
}

/// Aggregate service rate delivered by `allocation` on `cluster`
pub fn realized_rate(cluster: &ClusterSpec, allocation: &AllocationResult) -> f64 {
    cluster
        .groups
        .iter()
        .map(|g| {
            let points: f64 = g
                .servers
                .iter()
                .filter_map(|s| allocation.get(s.id))
                .map(|a| a.utilization * 100.0)
                .sum();
            g.throughput * points
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::UtilizationSearch;
    use wattplan_core::{Server, ServerGroup};

    fn cluster() -> ClusterSpec {
        ClusterSpec::new(vec![ServerGroup::new("g0", 1.0)
            .with_server(Server::new(7, 80.0, 20.0, 500.0))
            .with_server(Server::new(3, 60.0, 10.0, 250.0))])
    }

    #[test]
    fn test_export_follows_group_order() {
        let cluster = cluster();
        let policy = UtilizationPolicy::default();
        let assignment = UtilizationSearch::new(&cluster, policy, 140.0)
            .run()
            .unwrap();

        let result = export(&cluster, policy, &assignment).unwrap();
        assert_eq!(result.len(), 2);

        // first server in group order saturates regardless of id
        let first = result.get(7).unwrap();
        assert_eq!(first.utilization, 1.0);
        assert_eq!(first.peak_power, 100.0);
        assert_eq!(first.speed_mflops(), 500.0);

        let second = result.get(3).unwrap();
        assert!((second.utilization - 0.4).abs() < 1e-12);
        assert_eq!(second.speed_mflops(), 100.0);
        assert_eq!(second.watt_per_state(), "60:70");

        // 80 * 1.0 + 20 + 60 * 0.4 + 10
        assert!((result.total_power - 134.0).abs() < 1e-9);
        assert!((realized_rate(&cluster, &result) - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_allocation() {
        let cluster = cluster();
        let baseline = baseline_allocation(&cluster, &UtilizationPolicy::default());

        assert!(baseline.iter().all(|(_, a)| a.utilization == 1.0));
        assert_eq!(baseline.total_power, 170.0);
        assert_eq!(realized_rate(&cluster, &baseline), 200.0);
    }

    #[test]
    fn test_baseline_follows_util_max() {
        let cluster = cluster();
        let policy = UtilizationPolicy::new(30.0, 80.0).unwrap();
        let baseline = baseline_allocation(&cluster, &policy);

        assert!(baseline.iter().all(|(_, a)| a.utilization == 0.8));
        // 80 * 0.8 + 20 + 60 * 0.8 + 10
        assert!((baseline.total_power - 142.0).abs() < 1e-9);
        assert_eq!(baseline.total_power, baseline_power(&cluster, &policy));
        assert!((realized_rate(&cluster, &baseline) - 160.0).abs() < 1e-9);
        assert_eq!(baseline.get(7).unwrap().speed_mflops(), 400.0);
    }
}
