//! Perfect Cuckoo Filter library
//!
//! A fixed-capacity cuckoo filter that stores a payload next to each
//! fingerprint, sized for Bitcoin UTXO sets. The library also carries the
//! pieces the `perfect_cuckoo` binary is built from: UTXO record parsing and
//! loading, the false-positive-rate sweep, layered configuration and the
//! crate-wide error type.
//!
//! # Architecture
//!
//! - `data_structures::perfect_cuckoo_filter` owns the table and knows nothing
//!   about UTXOs; keys are raw bytes and payloads are generic.
//! - `utxo` turns dataset lines into `(key, UtxoValue)` pairs.
//! - `bench` drives fresh tables with random keys and reports timings.
//! - `config` and `error` are shared by all of the above.

pub mod bench;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod utxo;

pub use data_structures::perfect_cuckoo_filter::{
    CuckooFilterConfig, FailurePolicy, FilterError, FilterStats, PerfectCuckooFilter, Placement,
    SharedCuckooFilter,
};
pub use error::{PcfError, PcfResult};

/// Version information for the Perfect Cuckoo crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization function.
///
/// Installs the tracing-backed error reporter.
pub fn init() {
    error::set_error_reporter(std::sync::Arc::new(error::TracingErrorReporter));
}
