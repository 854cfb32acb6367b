//! Filter configuration module.
//!
//! Table geometry and relocation behaviour, fixed when the filter is built.

use super::{ConfigResult, Validate};
use crate::data_structures::perfect_cuckoo_filter::{
    CuckooFilterConfig, FailurePolicy, DEFAULT_BUCKET_SIZE, DEFAULT_FINGERPRINT_BITS,
    DEFAULT_MAX_RELOCATIONS, DEFAULT_NUM_BUCKETS,
};
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Number of buckets
    pub num_buckets: usize,

    /// Entries per bucket
    pub bucket_size: usize,

    /// Fingerprint width in bits
    pub fingerprint_bits: u32,

    /// Maximum evictions per insert
    pub max_relocations: usize,

    /// What a failed cascade leaves behind
    pub failure_policy: FailurePolicy,

    /// Eviction seed; unset means seeded from OS entropy
    pub seed: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            num_buckets: DEFAULT_NUM_BUCKETS,
            bucket_size: DEFAULT_BUCKET_SIZE,
            fingerprint_bits: DEFAULT_FINGERPRINT_BITS,
            max_relocations: DEFAULT_MAX_RELOCATIONS,
            failure_policy: FailurePolicy::default(),
            seed: None,
        }
    }
}

impl FilterConfig {
    /// Builds the filter's construction parameters.
    pub fn to_filter_config(&self) -> CuckooFilterConfig {
        let config = CuckooFilterConfig::new()
            .with_num_buckets(self.num_buckets)
            .with_bucket_size(self.bucket_size)
            .with_fingerprint_bits(self.fingerprint_bits)
            .with_max_relocations(self.max_relocations)
            .with_failure_policy(self.failure_policy);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

impl Validate for FilterConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.to_filter_config()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
