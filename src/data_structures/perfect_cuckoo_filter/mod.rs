// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Perfect Cuckoo Filter: a fixed-capacity, fingerprint-keyed value store.
//!
//! Each key is reduced to a primary bucket and a short fingerprint. The entry
//! lives in the primary bucket or in the alternate bucket derived from the
//! fingerprint, tagged with a selector bit saying which. The key itself is
//! never stored, which keeps memory bounded at the price of false positives
//! when two keys share a bucket and fingerprint.
//!
//! # Features
//!
//! - CRC-32 digest split into bucket index and fingerprint
//! - Two candidate buckets per key with a bounded, randomized eviction cascade
//! - Optional rollback of a failed cascade
//! - Payload retrieval, deletion and occupancy statistics
//! - Seedable eviction for reproducible runs
//!
//! # Example
//!
//! ```
//! use perfect_cuckoo_lib::data_structures::perfect_cuckoo_filter::{
//!     CuckooFilterConfig, FilterError, PerfectCuckooFilter,
//! };
//!
//! let config = CuckooFilterConfig::new()
//!     .with_num_buckets(1 << 12)
//!     .with_fingerprint_bits(13)
//!     .with_seed(42);
//! let mut filter = PerfectCuckooFilter::with_config(config).unwrap();
//!
//! assert!(filter.insert("hello", 42).is_ok());
//! assert_eq!(filter.get("hello"), Some(&42));
//!
//! // Same key again: its fingerprint already holds the slot
//! assert!(matches!(filter.insert("hello", 100), Err(FilterError::Duplicate { .. })));
//! assert_eq!(filter.get("hello"), Some(&42));
//! ```

// Module declarations
mod bucket;
mod config;
mod digest;
mod error;
mod shared;
mod table;

// Re-exports
pub use bucket::{Entry, Selector};
pub use config::{
    bucket_bits_for, CuckooFilterConfig, FailurePolicy, DEFAULT_BUCKET_SIZE,
    DEFAULT_FINGERPRINT_BITS, DEFAULT_MAX_RELOCATIONS, DEFAULT_NUM_BUCKETS,
};
pub use digest::{crc32, Digest, KeyDigester, ALT_BUCKET_MULTIPLIER};
pub use error::{FilterError, Result};
pub use shared::SharedCuckooFilter;
pub use table::{FilterStats, PerfectCuckooFilter, Placement};
