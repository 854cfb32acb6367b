//! Bitcoin UTXO records and dataset loading.
//!
//! The filter itself is payload-agnostic; this module supplies the payload
//! used by the binary and benchmarks, along with the tolerant line parser and
//! the loader that feeds parsed records into a table.

pub mod loader;
pub mod record;

pub use loader::{load_dataset, load_file, scan_dataset, LoadReport};
pub use record::{
    is_header, parse_fields, parse_record, sniff_fields, split_fields, RecordError, UtxoRecord,
    UtxoValue,
};
