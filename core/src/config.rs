//! Analysis settings shared by the library and the bench binary.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Default cap on the dense distance matrix (MB).
pub const DEFAULT_MAX_MATRIX_MEMORY_MB: u32 = 4096;
pub const MIN_MAX_MATRIX_MEMORY_MB: u32 = 64;
pub const MAX_MAX_MATRIX_MEMORY_MB: u32 = 131_072; // 128 GB

/// Default share of nodes used as betweenness pivots.
pub const DEFAULT_BETWEENNESS_PERCENTAGE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Closeness refuses graphs whose n×n matrix would exceed this.
    pub max_matrix_memory_mb: u32,
    /// Wall-clock budget for subgraph enumeration. None = unbounded.
    pub esu_deadline: Option<Duration>,
    /// Seed for sampling. None = seeded from OS entropy.
    pub sample_seed: Option<u64>,
    /// Fraction of nodes used as pivots for approximate betweenness.
    pub betweenness_percentage: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_matrix_memory_mb: DEFAULT_MAX_MATRIX_MEMORY_MB,
            esu_deadline: None,
            sample_seed: None,
            betweenness_percentage: DEFAULT_BETWEENNESS_PERCENTAGE,
        }
    }
}

impl AnalysisConfig {
    /// Check every setting against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MAX_MATRIX_MEMORY_MB..=MAX_MAX_MATRIX_MEMORY_MB).contains(&self.max_matrix_memory_mb) {
            return Err(GraphError::invalid(format!(
                "max_matrix_memory_mb must be within {MIN_MAX_MATRIX_MEMORY_MB}..={MAX_MAX_MATRIX_MEMORY_MB}, got {}",
                self.max_matrix_memory_mb
            )));
        }
        check_percentage(self.betweenness_percentage)
    }

    /// Bytes available to a dense distance matrix.
    pub fn max_matrix_bytes(&self) -> usize {
        (self.max_matrix_memory_mb as usize).saturating_mul(1024 * 1024)
    }
}

pub(crate) fn check_percentage(percentage: f64) -> Result<()> {
    if (0.0..=1.0).contains(&percentage) {
        Ok(())
    } else {
        Err(GraphError::invalid(format!(
            "percentage must be between 0.0 and 1.0, got {percentage}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_matrix_bytes(), 4096 * 1024 * 1024);
    }

    #[test]
    fn test_memory_bounds() {
        let low = AnalysisConfig {
            max_matrix_memory_mb: 10,
            ..AnalysisConfig::default()
        };
        assert!(matches!(low.validate(), Err(GraphError::InvalidArgument(_))));

        let high = AnalysisConfig {
            max_matrix_memory_mb: MAX_MAX_MATRIX_MEMORY_MB + 1,
            ..AnalysisConfig::default()
        };
        assert!(high.validate().is_err());
    }

    #[test]
    fn test_percentage_bounds() {
        for bad in [-0.1, 1.5, f64::NAN] {
            let cfg = AnalysisConfig {
                betweenness_percentage: bad,
                ..AnalysisConfig::default()
            };
            assert!(cfg.validate().is_err(), "{bad} accepted");
        }
        assert!(check_percentage(0.0).is_ok());
        assert!(check_percentage(1.0).is_ok());
    }
}
