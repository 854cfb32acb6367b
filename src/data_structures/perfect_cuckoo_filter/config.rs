// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Construction-time parameters for the Perfect Cuckoo Filter.

use serde::{Deserialize, Serialize};

use crate::data_structures::perfect_cuckoo_filter::error::{FilterError, Result};

/// Default number of buckets (2^19).
pub const DEFAULT_NUM_BUCKETS: usize = 1 << 19;

/// Default number of entries per bucket.
pub const DEFAULT_BUCKET_SIZE: usize = 4;

/// Default fingerprint width in bits (32 - 19).
pub const DEFAULT_FINGERPRINT_BITS: u32 = 13;

/// Default cap on displacement steps during a single insert.
pub const DEFAULT_MAX_RELOCATIONS: usize = 500;

/// Width of the checksum the digest is carved out of.
pub const UNIVERSE_BITS: u32 = 32;

/// What happens to already-displaced entries when a cascade hits its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Undo every swap of the failed cascade; only the new entry is rejected.
    #[default]
    Rollback,

    /// Keep displaced entries where they were moved and drop whichever entry
    /// is in hand when the cap is reached.
    LeaveDisplaced,
}

/// Configuration for a [`PerfectCuckooFilter`](super::PerfectCuckooFilter).
///
/// All values are fixed for the lifetime of the table; there is no resize.
#[derive(Debug, Clone, PartialEq)]
pub struct CuckooFilterConfig {
    /// Number of buckets. Any value is accepted; index width is
    /// `ceil(log2(num_buckets))`.
    pub num_buckets: usize,

    /// Maximum entries per bucket.
    pub bucket_size: usize,

    /// Fingerprint width in bits.
    pub fingerprint_bits: u32,

    /// Maximum number of evictions a single insert may perform.
    pub max_relocations: usize,

    /// Behaviour of a cascade that exceeds `max_relocations`.
    pub failure_policy: FailurePolicy,

    /// Seed for the eviction-victim generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl CuckooFilterConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of buckets.
    pub fn with_num_buckets(mut self, num_buckets: usize) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    /// Sets the per-bucket capacity.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Sets the fingerprint width in bits.
    pub fn with_fingerprint_bits(mut self, fingerprint_bits: u32) -> Self {
        self.fingerprint_bits = fingerprint_bits;
        self
    }

    /// Sets the relocation depth cap.
    pub fn with_max_relocations(mut self, max_relocations: usize) -> Self {
        self.max_relocations = max_relocations;
        self
    }

    /// Sets the cascade failure policy.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Fixes the eviction generator seed, making relocation reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of low checksum bits used for the bucket index.
    pub fn bucket_bits(&self) -> u32 {
        bucket_bits_for(self.num_buckets)
    }

    /// Total entry capacity of the table.
    pub fn capacity(&self) -> usize {
        self.num_buckets.saturating_mul(self.bucket_size)
    }

    /// Checks that the parameters describe a constructible table.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidConfiguration`] when a size is zero or the
    /// bucket and fingerprint fields do not fit in the 32-bit checksum.
    pub fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            return Err(FilterError::InvalidConfiguration(
                "num_buckets must be greater than 0".to_string(),
            ));
        }
        if self.bucket_size == 0 {
            return Err(FilterError::InvalidConfiguration(
                "bucket_size must be greater than 0".to_string(),
            ));
        }
        if self.fingerprint_bits == 0 {
            return Err(FilterError::InvalidConfiguration(
                "fingerprint_bits must be greater than 0".to_string(),
            ));
        }
        let bucket_bits = self.bucket_bits();
        if bucket_bits + self.fingerprint_bits > UNIVERSE_BITS {
            return Err(FilterError::InvalidConfiguration(format!(
                "bucket bits ({bucket_bits}) + fingerprint bits ({}) exceed {UNIVERSE_BITS}",
                self.fingerprint_bits
            )));
        }
        Ok(())
    }
}

impl Default for CuckooFilterConfig {
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

/// `ceil(log2(num_buckets))`, with 0 and 1 both mapping to zero bits.
pub fn bucket_bits_for(num_buckets: usize) -> u32 {
    if num_buckets <= 1 {
        0
    } else {
        usize::BITS - (num_buckets - 1).leading_zeros()
    }
}
