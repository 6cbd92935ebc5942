//! Linear server power model

use wattplan_core::{ClusterSpec, Server, UtilizationPolicy};

/// Power draw of a server at `util` percent: `alpha * util / 100 + beta`
pub fn power(util: f64, alpha: f64, beta: f64) -> f64 {
    alpha * util / 100.0 + beta
}

/// Summed power of `servers` at the matching per-server utilizations
pub fn group_power(servers: &[Server], utils: &[f64]) -> f64 {
    servers
        .iter()
        .zip(utils)
        .map(|(s, &u)| power(u, s.alpha, s.beta))
        .sum()
}

/// Power of the whole cluster with every server at `util_max`
pub fn baseline_power(cluster: &ClusterSpec, policy: &UtilizationPolicy) -> f64 {
    cluster
        .servers()
        .map(|s| power(policy.util_max, s.alpha, s.beta))
        .sum()
}
