//! Configuration and cluster file formats for wattplan

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ClusterSpec, PlannerError, PlannerResult, Server, ServerGroup, UtilizationPolicy};

/// Divisor turning a group's mean flops into its throughput coefficient
/// when the cluster file does not give one.
pub const THROUGHPUT_FLOPS_DIVISOR: f64 = 10.0;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Utilization policy applied to every plan
    #[serde(default)]
    pub policy: PolicyConfig,
    /// API server configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> PlannerResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlannerError::Config(format!("Failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PlannerError::Config(format!("Failed to parse config: {}", e)))?;
        config.policy.to_policy()?;
        Ok(config)
    }
}

/// Utilization policy section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Lower per-server utilization bound (percentage points)
    pub util_min: f64,
    /// Upper per-server utilization bound (percentage points)
    pub util_max: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = UtilizationPolicy::default();
        Self {
            util_min: policy.util_min,
            util_max: policy.util_max,
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> PlannerResult<UtilizationPolicy> {
        UtilizationPolicy::new(self.util_min, self.util_max)
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind the REST API server
    pub address: String,
    /// Port for the REST API server
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 9190,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Cluster description file format (TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterFile {
    /// Default service rate to plan for
    pub rate: Option<f64>,
    /// Server groups in resolution order
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    pub throughput: Option<f64>,
    #[serde(default)]
    pub servers: Vec<Server>,
}

impl GroupEntry {
    fn into_group(self) -> ServerGroup {
        let throughput = self.throughput.unwrap_or_else(|| {
            if self.servers.is_empty() {
                return 0.0;
            }
            let mean_flops =
                self.servers.iter().map(|s| s.flops).sum::<f64>() / self.servers.len() as f64;
            mean_flops / THROUGHPUT_FLOPS_DIVISOR
        });

        ServerGroup {
            name: self.name,
            throughput,
            servers: self.servers,
        }
    }
}

impl ClusterFile {
    /// Load a cluster file from disk
    pub fn from_file(path: &Path) -> PlannerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlannerError::Config(format!(
                "Failed to read cluster file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse a cluster file from TOML text
    pub fn parse(content: &str) -> PlannerResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Convert into a validated cluster description
    pub fn into_cluster(self) -> PlannerResult<ClusterSpec> {
        let cluster = ClusterSpec::new(
            self.groups
                .into_iter()
                .map(GroupEntry::into_group)
                .collect(),
        );
        cluster.validate()?;
        Ok(cluster)
    }
}
