//! Spreading a group's aggregate utilization over its servers

use wattplan_core::{PlannerError, PlannerResult, UtilizationPolicy};

/// Slack absorbed when comparing a target against the group range
const RANGE_EPSILON: f64 = 1e-9;

/// Closed-form intra-group utilization distribution.
///
/// Servers are filled in group order: the first ones saturate at `util_max`,
/// at most one takes the partial remainder, and the rest stay at `util_min`.
/// The result is one canonical choice among the feasible distributions and
/// is monotone in the target.
#[derive(Debug, Clone, Copy)]
pub struct UtilDistributor {
    policy: UtilizationPolicy,
}

impl UtilDistributor {
    pub fn new(policy: UtilizationPolicy) -> Self {
        Self { policy }
    }

    /// Distribute `target` percentage points over `n` servers
    pub fn distribute(&self, target: f64, n: usize) -> PlannerResult<Vec<f64>> {
        let UtilizationPolicy { util_min, util_max } = self.policy;
        let count = n as f64;
        let total_min = count * util_min;
        let total_max = count * util_max;

        if !target.is_finite()
            || target < total_min - RANGE_EPSILON
            || target > total_max + RANGE_EPSILON
        {
            return Err(PlannerError::InvalidUtilizationRange {
                target,
                min: total_min,
                max: total_max,
            });
        }

        let saturated = ((target - total_min) / self.policy.span())
            .floor()
            .max(0.0) as usize;
        let saturated = saturated.min(n);
        if saturated == n {
            return Ok(vec![util_max; n]);
        }

        let floored = n - saturated - 1;
        let remainder = (target - saturated as f64 * util_max - floored as f64 * util_min)
            .clamp(util_min, util_max);

        let mut utils = Vec::with_capacity(n);
        utils.extend(std::iter::repeat(util_max).take(saturated));
        utils.push(remainder);
        utils.extend(std::iter::repeat(util_min).take(floored));
        Ok(utils)
    }
}
