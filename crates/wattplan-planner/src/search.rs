//! Branch-and-bound search for the minimum-power group utilization

use tracing::debug;
use wattplan_core::{ClusterSpec, PlannerError, PlannerResult, UtilizationPolicy};

use crate::bounds::GroupBoundPropagator;
use crate::distributor::UtilDistributor;
use crate::power::{baseline_power, group_power};

/// Per-group aggregate utilization chosen at a search leaf
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationAssignment {
    groups: Vec<f64>,
}

impl UtilizationAssignment {
    /// Aggregate utilization of each group, in group order
    pub fn groups(&self) -> &[f64] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<f64> {
        self.groups.get(index).copied()
    }
}

/// One pending node of the depth-first search
#[derive(Debug, Clone)]
struct SearchFrame {
    group_index: usize,
    low: Vec<f64>,
    high: Vec<f64>,
    tentative: Vec<f64>,
}

/// Cheapest leaf seen so far, threshold seeded with the all-max power
struct BestSoFar {
    power: f64,
    assignment: Option<UtilizationAssignment>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SearchStats {
    pub frames: usize,
    pub leaves_evaluated: usize,
    pub pruned_bounds: usize,
    pub pruned_leaves: usize,
}

/// Minimum-power search over group utilizations for one rate.
///
/// Groups are resolved from the highest index down. Every group above 0 is
/// fixed at the rounded low or high end of its propagated bounds; group 0 is
/// the free group and absorbs whatever rate remains. Each leaf is costed with
/// [`UtilDistributor`] and the linear power model.
///
/// A leaf replaces the incumbent when its power is less than *or equal to*
/// the incumbent's, so among equally cheap leaves the one visited last is
/// kept. The low end is visited before the high end at every level.
pub struct UtilizationSearch<'a> {
    cluster: &'a ClusterSpec,
    policy: UtilizationPolicy,
    rate: f64,
    distributor: UtilDistributor,
    propagator: GroupBoundPropagator<'a>,
}

impl<'a> UtilizationSearch<'a> {
    pub fn new(cluster: &'a ClusterSpec, policy: UtilizationPolicy, rate: f64) -> Self {
        Self {
            cluster,
            policy,
            rate,
            distributor: UtilDistributor::new(policy),
            propagator: GroupBoundPropagator::new(cluster, policy, rate),
        }
    }

    /// Run the search to completion
    pub fn run(&self) -> PlannerResult<UtilizationAssignment> {
        self.execute().0
    }

    pub(crate) fn execute(&self) -> (PlannerResult<UtilizationAssignment>, SearchStats) {
        let mut stats = SearchStats::default();

        if !self.rate.is_finite() || self.rate <= 0.0 {
            return (
                Err(PlannerError::InvalidRequest(format!(
                    "rate must be a positive number, got {}",
                    self.rate
                ))),
                stats,
            );
        }
        if self.cluster.groups.is_empty() {
            return (
                Err(PlannerError::InvalidCluster(
                    "cluster has no server groups".to_string(),
                )),
                stats,
            );
        }

        let capacity_rate = self.cluster.full_capacity_rate(&self.policy);
        if self.rate > capacity_rate {
            debug!(
                rate = self.rate,
                capacity_rate, "Rate exceeds full cluster capacity"
            );
            return (
                Err(PlannerError::InfeasibleRequest { rate: self.rate }),
                stats,
            );
        }

        let (low, high): (Vec<f64>, Vec<f64>) = (0..self.cluster.groups.len())
            .map(|i| {
                let capacity = self.propagator.capacity(i);
                (capacity.low, capacity.high)
            })
            .unzip();

        let mut best = BestSoFar {
            power: baseline_power(self.cluster, &self.policy),
            assignment: None,
        };

        let group_count = self.cluster.groups.len();
        let mut stack = vec![SearchFrame {
            group_index: group_count - 1,
            low,
            high,
            tentative: vec![0.0; group_count],
        }];

        while let Some(frame) = stack.pop() {
            stats.frames += 1;

            if frame.group_index == 0 {
                self.visit_leaf(frame, &mut best, &mut stats);
                continue;
            }

            let i = frame.group_index;
            let Some(bounds) =
                self.propagator
                    .propagate(i, &frame.low, &frame.high, &frame.tentative)
            else {
                stats.pruned_bounds += 1;
                continue;
            };

            // LIFO: push the high end first so the low end is explored first
            for value in [bounds.high.round(), bounds.low.round()] {
                let mut child = frame.clone();
                child.group_index = i - 1;
                child.low[i] = bounds.low;
                child.high[i] = bounds.high;
                child.tentative[i] = value;
                stack.push(child);
            }
        }

        debug!(
            rate = self.rate,
            frames = stats.frames,
            leaves = stats.leaves_evaluated,
            pruned_bounds = stats.pruned_bounds,
            pruned_leaves = stats.pruned_leaves,
            best_power = best.power,
            "Utilization search finished"
        );

        let result = best
            .assignment
            .ok_or(PlannerError::InfeasibleRequest { rate: self.rate });
        (result, stats)
    }

    /// Resolve the free group and cost the leaf
    fn visit_leaf(&self, mut frame: SearchFrame, best: &mut BestSoFar, stats: &mut SearchStats) {
        let groups = &self.cluster.groups;
        let fixed: f64 = groups
            .iter()
            .zip(&frame.tentative)
            .skip(1)
            .map(|(g, &t)| g.throughput * t)
            .sum();

        let coefficient = groups[0].throughput;
        let mut free = ((self.rate - fixed) / coefficient).round();
        let tolerance = 1e-9 * self.rate.max(1.0);
        if coefficient * free + fixed < self.rate - tolerance {
            free += 1.0;
        }

        if free < frame.low[0] || free > frame.high[0] {
            stats.pruned_leaves += 1;
            return;
        }
        frame.tentative[0] = free;

        let power = match self.assignment_power(&frame.tentative) {
            Ok(power) => power,
            Err(e) => {
                debug!(error = %e, tentative = ?frame.tentative, "Leaf dropped");
                stats.pruned_leaves += 1;
                return;
            }
        };
        stats.leaves_evaluated += 1;

        if power <= best.power {
            best.power = power;
            best.assignment = Some(UtilizationAssignment {
                groups: frame.tentative,
            });
        }
    }

    fn assignment_power(&self, tentative: &[f64]) -> PlannerResult<f64> {
        let mut total = 0.0;
        for (group, &target) in self.cluster.groups.iter().zip(tentative) {
            let utils = self.distributor.distribute(target, group.len())?;
            total += group_power(&group.servers, &utils);
        }
        Ok(total)
    }
}
