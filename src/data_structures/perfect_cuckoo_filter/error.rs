// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the Perfect Cuckoo Filter.

/// Error types for Perfect Cuckoo Filter operations
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum FilterError {
    /// An entry with the same fingerprint already occupies the key's slot.
    /// With colliding fingerprints this is a false positive on insert.
    #[error("Fingerprint {fingerprint} already present for bucket {bucket}")]
    Duplicate {
        /// Fingerprint of the rejected key
        fingerprint: u32,
        /// Primary bucket of the rejected key
        bucket: u32,
    },

    /// The eviction cascade found no free slot within the depth cap
    #[error("Relocation limit of {max_relocations} exceeded")]
    RelocationLimitExceeded {
        /// The configured cap
        max_relocations: usize,
    },

    /// A digest produced an index outside the table. Only reachable when the
    /// bucket count is not a power of two.
    #[error("Bucket index {index} out of range for {num_buckets} buckets")]
    BucketOutOfRange {
        /// The offending index
        index: u32,
        /// Number of buckets in the table
        num_buckets: usize,
    },

    /// Configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for Perfect Cuckoo Filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
