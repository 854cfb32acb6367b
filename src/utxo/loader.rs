//! Streams a UTXO dataset into a filter.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data_structures::perfect_cuckoo_filter::PerfectCuckooFilter;
use crate::error::{PcfError, PcfResult};
use crate::utxo::record::{is_header, parse_record, UtxoRecord, UtxoValue};

/// Outcome of loading one dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Lines read, header included
    pub lines: usize,
    /// Records stored in the filter
    pub loaded: usize,
    /// Well-formed records the filter refused (duplicate or full)
    pub rejected: usize,
    /// Lines that failed to parse
    pub malformed: usize,
    /// Empty lines
    pub blank: usize,
    /// Whether the first line was skipped as a header
    pub header_skipped: bool,
}

impl LoadReport {
    /// Lines that did not end up in the filter.
    pub fn skipped(&self) -> usize {
        self.rejected + self.malformed + self.blank
    }
}

/// Loads every record from `reader` into `filter`.
///
/// Malformed lines and refused inserts are counted and logged; they never
/// stop the load.
///
/// # Errors
///
/// Returns [`PcfError::Io`] if reading from `reader` fails. A line that is
/// not valid UTF-8 is counted as malformed.
pub fn load_dataset<R: BufRead>(
    filter: &mut PerfectCuckooFilter<UtxoValue>,
    reader: R,
) -> PcfResult<LoadReport> {
    let report = scan_dataset(reader, |line_num, record| {
        match filter.insert(&record.key, record.value) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(line = line_num, key = %record.key, error = %e, "UTXO not stored");
                Ok(false)
            }
        }
    })?;

    info!(
        lines = report.lines,
        loaded = report.loaded,
        skipped = report.skipped(),
        "Dataset loaded"
    );
    Ok(report)
}

/// Parses every record in `reader` and hands it to `on_record` with its line
/// number.
///
/// The callback reports whether the record was stored, which is counted as
/// `loaded` or `rejected`. Header, blank and malformed lines are counted and
/// skipped.
///
/// # Errors
///
/// Returns [`PcfError::Io`] if reading fails, or the first error returned by
/// `on_record`.
pub fn scan_dataset<R, F>(mut reader: R, mut on_record: F) -> PcfResult<LoadReport>
where
    R: BufRead,
    F: FnMut(usize, UtxoRecord) -> PcfResult<bool>,
{
    let mut report = LoadReport::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        report.lines += 1;
        let line_num = report.lines;

        let line = match std::str::from_utf8(trim_line_end(&buf)) {
            Ok(line) => line,
            Err(e) => {
                warn!(line = line_num, error = %e, "UTXO record is not valid UTF-8");
                report.malformed += 1;
                continue;
            }
        };

        if line_num == 1 && is_header(line) {
            debug!("Skipping header row");
            report.header_skipped = true;
            continue;
        }
        if line.trim().is_empty() {
            report.blank += 1;
            continue;
        }

        let record = match parse_record(line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_num, error = %e, "Malformed UTXO record");
                report.malformed += 1;
                continue;
            }
        };

        if on_record(line_num, record)? {
            report.loaded += 1;
        } else {
            report.rejected += 1;
        }
    }

    Ok(report)
}

fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Opens `path` and loads it with [`load_dataset`].
///
/// # Errors
///
/// Returns [`PcfError::Io`] if the file cannot be opened or read.
pub fn load_file<P: AsRef<Path>>(
    filter: &mut PerfectCuckooFilter<UtxoValue>,
    path: P,
) -> PcfResult<LoadReport> {
    let path = path.as_ref();
    info!("Loading UTXO dataset from {}", path.display());
    let file = File::open(path).map_err(PcfError::Io)?;
    load_dataset(filter, BufReader::new(file))
}
