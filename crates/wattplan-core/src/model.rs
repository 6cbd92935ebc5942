//! Cluster, server group and utilization policy type definitions

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{PlannerError, PlannerResult};

/// Default lower utilization bound in percentage points
pub const DEFAULT_UTIL_MIN: f64 = 30.0;

/// Default upper utilization bound in percentage points
pub const DEFAULT_UTIL_MAX: f64 = 100.0;

/// Identifier of a server, unique across a cluster
pub type ServerId = u32;

/// A single server with a linear power model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server identifier
    pub id: ServerId,
    /// Utilization-dependent power coefficient (watts at 100% above idle)
    pub alpha: f64,
    /// Static power draw in watts
    pub beta: f64,
    /// Rated compute capacity in Mflop/s
    pub flops: f64,
}

impl Server {
    /// Create a new server
    pub fn new(id: ServerId, alpha: f64, beta: f64, flops: f64) -> Self {
        Self {
            id,
            alpha,
            beta,
            flops,
        }
    }

    /// Power draw at full utilization (alpha + beta)
    pub fn peak_power(&self) -> f64 {
        self.alpha + self.beta
    }
}

/// Ordered set of servers sharing one throughput coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerGroup {
    /// Human-readable group name
    pub name: String,
    /// Service rate contributed per utilization point
    pub throughput: f64,
    /// Servers in allocation order
    pub servers: Vec<Server>,
}

impl ServerGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>, throughput: f64) -> Self {
        Self {
            name: name.into(),
            throughput,
            servers: Vec::new(),
        }
    }

    /// Append a server, keeping insertion order
    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    /// Number of servers in the group
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Aggregate utilization range `[n * util_min, n * util_max]`
    pub fn capacity_range(&self, policy: &UtilizationPolicy) -> (f64, f64) {
        let n = self.len() as f64;
        (n * policy.util_min, n * policy.util_max)
    }
}

/// Ordered list of server groups making up a cluster
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub groups: Vec<ServerGroup>,
}

impl ClusterSpec {
    pub fn new(groups: Vec<ServerGroup>) -> Self {
        Self { groups }
    }

    /// Total number of servers across all groups
    pub fn server_count(&self) -> usize {
        self.groups.iter().map(ServerGroup::len).sum()
    }

    /// Iterate all servers in group order
    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.groups.iter().flat_map(|g| g.servers.iter())
    }

    /// Rate reached with every server at `util_max`
    pub fn full_capacity_rate(&self, policy: &UtilizationPolicy) -> f64 {
        self.groups
            .iter()
            .map(|g| g.throughput * g.capacity_range(policy).1)
            .sum()
    }

    /// Rate reached with every server at `util_min`
    pub fn floor_rate(&self, policy: &UtilizationPolicy) -> f64 {
        self.groups
            .iter()
            .map(|g| g.throughput * g.capacity_range(policy).0)
            .sum()
    }

    /// Check structural and numeric sanity of the cluster
    pub fn validate(&self) -> PlannerResult<()> {
        if self.groups.is_empty() {
            return Err(PlannerError::InvalidCluster(
                "cluster has no server groups".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.is_empty() {
                return Err(PlannerError::InvalidCluster(format!(
                    "group '{}' has no servers",
                    group.name
                )));
            }
            if !group.throughput.is_finite() || group.throughput <= 0.0 {
                return Err(PlannerError::InvalidCluster(format!(
                    "group '{}' has invalid throughput coefficient {}",
                    group.name, group.throughput
                )));
            }
            for server in &group.servers {
                if !seen.insert(server.id) {
                    return Err(PlannerError::InvalidCluster(format!(
                        "duplicate server id {}",
                        server.id
                    )));
                }
                if !server.alpha.is_finite()
                    || !server.beta.is_finite()
                    || server.alpha < 0.0
                    || server.beta < 0.0
                {
                    return Err(PlannerError::InvalidCluster(format!(
                        "server {} has invalid power coefficients ({}, {})",
                        server.id, server.alpha, server.beta
                    )));
                }
                if !server.flops.is_finite() || server.flops <= 0.0 {
                    return Err(PlannerError::InvalidCluster(format!(
                        "server {} has invalid flops {}",
                        server.id, server.flops
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Per-server utilization bounds in percentage points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationPolicy {
    pub util_min: f64,
    pub util_max: f64,
}

impl Default for UtilizationPolicy {
    fn default() -> Self {
        Self {
            util_min: DEFAULT_UTIL_MIN,
            util_max: DEFAULT_UTIL_MAX,
        }
    }
}

impl UtilizationPolicy {
    pub fn new(util_min: f64, util_max: f64) -> PlannerResult<Self> {
        let policy = Self { util_min, util_max };
        policy.validate()?;
        Ok(policy)
    }

    /// Width of the per-server utilization band
    pub fn span(&self) -> f64 {
        self.util_max - self.util_min
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if !self.util_min.is_finite()
            || !self.util_max.is_finite()
            || self.util_min < 0.0
            || self.util_min >= self.util_max
        {
            return Err(PlannerError::Config(format!(
                "utilization bounds must satisfy 0 <= min < max, got [{}, {}]",
                self.util_min, self.util_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cluster() -> ClusterSpec {
        ClusterSpec::new(vec![
            ServerGroup::new("slow", 1.0)
                .with_server(Server::new(1, 50.0, 40.0, 100.0))
                .with_server(Server::new(2, 50.0, 40.0, 100.0)),
            ServerGroup::new("fast", 2.0).with_server(Server::new(3, 90.0, 60.0, 200.0)),
        ])
    }

    #[test]
    fn test_capacity_rates() {
        let cluster = sample_cluster();
        let policy = UtilizationPolicy::default();

        assert_eq!(cluster.server_count(), 3);
        assert_eq!(cluster.groups[0].capacity_range(&policy), (60.0, 200.0));
        assert_eq!(cluster.full_capacity_rate(&policy), 200.0 + 200.0);
        assert_eq!(cluster.floor_rate(&policy), 60.0 + 60.0);
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_cluster().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut cluster = sample_cluster();
        cluster.groups[1].servers[0].id = 1;

        let err = cluster.validate().unwrap_err();
        assert!(matches!(err, PlannerError::InvalidCluster(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let mut cluster = sample_cluster();
        cluster.groups.push(ServerGroup::new("empty", 1.0));
        assert!(cluster.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_coefficients() {
        let mut cluster = sample_cluster();
        cluster.groups[0].throughput = 0.0;
        assert!(cluster.validate().is_err());

        let mut cluster = sample_cluster();
        cluster.groups[0].servers[1].alpha = -1.0;
        assert!(cluster.validate().is_err());

        let mut cluster = sample_cluster();
        cluster.groups[1].servers[0].flops = f64::NAN;
        assert!(cluster.validate().is_err());

        assert!(ClusterSpec::default().validate().is_err());
    }

    #[test]
    fn test_policy_validation() {
        assert!(UtilizationPolicy::new(30.0, 100.0).is_ok());
        assert!(UtilizationPolicy::new(100.0, 100.0).is_err());
        assert!(UtilizationPolicy::new(-5.0, 100.0).is_err());
        assert_eq!(UtilizationPolicy::default().span(), 70.0);
    }
}
