//! Error types for wattplan

use thiserror::Error;

/// Main error type for wattplan
#[derive(Error, Debug)]
pub enum PlannerError {
    /// No utilization assignment satisfies the requested rate
    #[error("Infeasible request: no assignment reaches rate {rate}")]
    InfeasibleRequest { rate: f64 },

    /// Group utilization target outside what its servers can hold
    #[error("Invalid utilization range: target {target} outside [{min}, {max}]")]
    InvalidUtilizationRange { target: f64, min: f64, max: f64 },

    /// Malformed cluster description
    #[error("Invalid cluster: {0}")]
    InvalidCluster(String),

    /// Malformed planning request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for wattplan operations
pub type PlannerResult<T> = Result<T, PlannerError>;

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PlannerError {
    fn from(err: toml::de::Error) -> Self {
        PlannerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::InfeasibleRequest { rate: 500.0 };
        assert_eq!(
            err.to_string(),
            "Infeasible request: no assignment reaches rate 500"
        );

        let err = PlannerError::InvalidUtilizationRange {
            target: 20.0,
            min: 60.0,
            max: 200.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid utilization range: target 20 outside [60, 200]"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlannerError = io_err.into();
        assert!(matches!(err, PlannerError::Io(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let err: PlannerError = toml::from_str::<toml::Value>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(err, PlannerError::Config(_)));
    }
}
