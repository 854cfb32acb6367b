//! Data structures for the Perfect Cuckoo crate.
//!
//! Implementations here are payload-agnostic and free of unsafe code.

pub mod perfect_cuckoo_filter;

pub use perfect_cuckoo_filter::{PerfectCuckooFilter, SharedCuckooFilter};
