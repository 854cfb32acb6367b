//! Benchmark configuration module.
//!
//! Parameters of the false-positive-rate sweep run by the `bench` command.

use super::{ConfigResult, Validate};
use crate::config::filter::FilterConfig;
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One table geometry to sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchGeometry {
    /// Number of buckets
    pub num_buckets: usize,

    /// Fingerprint width in bits
    pub fingerprint_bits: u32,
}

/// Benchmark configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Geometries to sweep
    pub configurations: Vec<BenchGeometry>,

    /// Target number of UTXOs per run
    pub utxo_counts: Vec<usize>,

    /// Entries per bucket
    pub bucket_size: usize,

    /// Maximum evictions per insert
    pub max_relocations: usize,

    /// Random absent keys queried per run
    pub num_queries: usize,

    /// Load factor at which inserting stops
    pub stop_load_factor: f64,

    /// One inserted key in this many is deleted to time deletes
    pub delete_every: usize,

    /// Records per window when replaying a dataset
    pub checkpoint_every: usize,

    /// Random absent keys queried at each replay checkpoint
    pub replay_queries: usize,

    /// Seed for key generation and eviction
    pub seed: Option<u64>,

    /// CSV report path
    pub output: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            configurations: vec![
                BenchGeometry {
                    num_buckets: 1 << 18,
                    fingerprint_bits: 13,
                },
                BenchGeometry {
                    num_buckets: 1 << 19,
                    fingerprint_bits: 13,
                },
                // A 32-bit digest leaves 2^20 buckets at most 12 fingerprint
                // bits; wider widths at that size are truncated to 12 anyway.
                BenchGeometry {
                    num_buckets: 1 << 20,
                    fingerprint_bits: 12,
                },
                BenchGeometry {
                    num_buckets: 1 << 17,
                    fingerprint_bits: 15,
                },
            ],
            utxo_counts: vec![100_000, 500_000, 1_000_000, 2_000_000, 5_000_000],
            bucket_size: 4,
            max_relocations: 100,
            num_queries: 1_000_000,
            stop_load_factor: 0.90,
            delete_every: 1_000,
            checkpoint_every: 100_000,
            replay_queries: 10_000,
            seed: None,
            output: PathBuf::from("fpr_results.csv"),
        }
    }
}

impl BenchConfig {
    /// Filter settings for one geometry of the sweep.
    pub fn filter_config(&self, geometry: BenchGeometry, seed: Option<u64>) -> FilterConfig {
        FilterConfig {
            num_buckets: geometry.num_buckets,
            bucket_size: self.bucket_size,
            fingerprint_bits: geometry.fingerprint_bits,
            max_relocations: self.max_relocations,
            seed,
            ..FilterConfig::default()
        }
    }
}

impl Validate for BenchConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.configurations.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one bench configuration is required".to_string(),
            ));
        }
        for geometry in &self.configurations {
            self.filter_config(*geometry, None).validate()?;
        }

        if self.utxo_counts.is_empty() {
            return Err(ConfigError::ValidationError(
                "utxo_counts must not be empty".to_string(),
            ));
        }

        if self.num_queries == 0 {
            return Err(ConfigError::ValidationError(
                "num_queries must be greater than 0".to_string(),
            ));
        }

        if self.stop_load_factor <= 0.0 || self.stop_load_factor > 1.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "bench.stop_load_factor".to_string(),
                message: "must be in (0.0, 1.0]".to_string(),
            });
        }

        if self.delete_every == 0 {
            return Err(ConfigError::ValidationError(
                "delete_every must be greater than 0".to_string(),
            ));
        }

        if self.checkpoint_every == 0 || self.replay_queries == 0 {
            return Err(ConfigError::ValidationError(
                "checkpoint_every and replay_queries must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BenchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_geometries_fit_digest() {
        let config = BenchConfig::default();
        assert_eq!(config.configurations.len(), 4);
        for geometry in &config.configurations {
            let filter = config.filter_config(*geometry, None);
            assert!(filter.validate().is_ok(), "{geometry:?}");
            assert!(filter.to_filter_config().bucket_bits() + geometry.fingerprint_bits <= 32);
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = BenchConfig::default();
        config.stop_load_factor = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));

        let mut config = BenchConfig::default();
        config.configurations.push(BenchGeometry {
            num_buckets: 1 << 24,
            fingerprint_bits: 13,
        });
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.utxo_counts.clear();
        assert!(config.validate().is_err());

        let mut config = BenchConfig::default();
        config.checkpoint_every = 0;
        assert!(config.validate().is_err());
    }
}
