//! Planner facade tying search and export together

use tracing::{debug, info, warn};
use wattplan_core::{ClusterSpec, PlannerError, PlannerResult, UtilizationPolicy};

use crate::export::{baseline_allocation, export, AllocationResult};
use crate::search::UtilizationSearch;

/// Result of planning one rate in a sweep
#[derive(Debug)]
pub struct SweepOutcome {
    pub rate: f64,
    pub result: PlannerResult<AllocationResult>,
}

/// Validated cluster plus policy, ready to plan any number of rates.
///
/// Every call runs its own search; a `Planner` holds no search state and can
/// be shared across threads.
#[derive(Debug, Clone)]
pub struct Planner {
    cluster: ClusterSpec,
    policy: UtilizationPolicy,
}

impl Planner {
    /// Create a planner, validating the cluster and policy
    pub fn new(cluster: ClusterSpec, policy: UtilizationPolicy) -> PlannerResult<Self> {
        policy.validate()?;
        cluster.validate()?;

        debug!(
            groups = cluster.groups.len(),
            servers = cluster.server_count(),
            util_min = policy.util_min,
            util_max = policy.util_max,
            "Planner initialized"
        );

        Ok(Self { cluster, policy })
    }

    pub fn cluster(&self) -> &ClusterSpec {
        &self.cluster
    }

    pub fn policy(&self) -> UtilizationPolicy {
        self.policy
    }

    /// Minimum-power allocation meeting `rate`
    pub fn plan(&self, rate: f64) -> PlannerResult<AllocationResult> {
        let assignment = UtilizationSearch::new(&self.cluster, self.policy, rate).run()?;
        let allocation = export(&self.cluster, self.policy, &assignment)?;

        info!(
            rate,
            total_power = allocation.total_power,
            groups = ?assignment.groups(),
            "Allocation planned"
        );

        Ok(allocation)
    }

    /// Static allocation with every server at `util_max`
    pub fn baseline(&self) -> AllocationResult {
        baseline_allocation(&self.cluster, &self.policy)
    }

    /// Plan each rate independently, in the order given
    pub fn sweep(&self, rates: &[f64]) -> Vec<SweepOutcome> {
        rates
            .iter()
            .map(|&rate| {
                let result = self.plan(rate);
                if let Err(PlannerError::InfeasibleRequest { .. }) = &result {
                    warn!(rate, "Rate not achievable with current capacity");
                }
                SweepOutcome { rate, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::realized_rate;
    use wattplan_core::{Server, ServerGroup};

    fn two_groups() -> ClusterSpec {
        ClusterSpec::new(vec![
            ServerGroup::new("slow", 1.0)
                .with_server(Server::new(1, 100.0, 30.0, 100.0))
                .with_server(Server::new(2, 100.0, 30.0, 100.0))
                .with_server(Server::new(3, 100.0, 30.0, 100.0)),
            ServerGroup::new("fast", 2.0)
                .with_server(Server::new(4, 120.0, 40.0, 200.0))
                .with_server(Server::new(5, 120.0, 40.0, 200.0)),
        ])
    }

    #[test]
    fn test_new_rejects_invalid_cluster() {
        let result = Planner::new(ClusterSpec::default(), UtilizationPolicy::default());
        assert!(matches!(result, Err(PlannerError::InvalidCluster(_))));
    }

    #[test]
    fn test_single_group_example() {
        let cluster = ClusterSpec::new(vec![ServerGroup::new("g", 1.0)
            .with_server(Server::new(1, 90.0, 50.0, 300.0))
            .with_server(Server::new(2, 70.0, 40.0, 300.0))]);
        let planner = Planner::new(cluster, UtilizationPolicy::default()).unwrap();

        let allocation = planner.plan(140.0).unwrap();
        assert_eq!(allocation.get(1).unwrap().utilization, 1.0);
        assert!((allocation.get(2).unwrap().utilization - 0.4).abs() < 1e-12);

        let expected = 90.0 * 1.0 + 50.0 + 70.0 * 0.4 + 40.0;
        assert!((allocation.total_power - expected).abs() < 1e-9);
    }

    #[test]
    fn test_plan_meets_rate_below_baseline_power() {
        let planner = Planner::new(two_groups(), UtilizationPolicy::default()).unwrap();
        let baseline = planner.baseline();

        for rate in [210.0, 350.0, 500.0, 650.0] {
            let allocation = planner.plan(rate).unwrap();
            assert_eq!(allocation.len(), 5);
            assert!(realized_rate(planner.cluster(), &allocation) >= rate - 1e-6);
            assert!(allocation.total_power <= baseline.total_power);
            assert!(allocation
                .iter()
                .all(|(_, a)| a.utilization >= 0.3 - 1e-12 && a.utilization <= 1.0 + 1e-12));
        }
    }

    #[test]
    fn test_infeasible_rate() {
        let planner = Planner::new(two_groups(), UtilizationPolicy::default()).unwrap();
        // full capacity: 300 * 1 + 200 * 2
        assert!(matches!(
            planner.plan(701.0),
            Err(PlannerError::InfeasibleRequest { .. })
        ));
        assert!(planner.plan(700.0).is_ok());
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let planner = Planner::new(two_groups(), UtilizationPolicy::default()).unwrap();
        let first = planner.plan(480.0).unwrap();
        let second = Planner::new(two_groups(), UtilizationPolicy::default())
            .unwrap()
            .plan(480.0)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_sweep_keeps_order_and_errors() {
        let planner = Planner::new(two_groups(), UtilizationPolicy::default()).unwrap();
        let outcomes = planner.sweep(&[300.0, 9000.0, 500.0]);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].rate, 9000.0);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(PlannerError::InfeasibleRequest { .. })
        ));
        assert!(outcomes[2].result.is_ok());
    }
}
