//! False-positive-rate and timing measurements.
//!
//! Two drivers share the timing and CSV code:
//!
//! - the sweep fills a fresh filter per configured geometry and target UTXO
//!   count with random `txid:index` keys, yielding one [`BenchRow`] per run;
//! - the replay streams a real dataset through the configured filter in
//!   windows of `checkpoint_every` records, yielding one [`ReplayRow`] per
//!   window.
//!
//! Both measure false positives with keys that were never inserted.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::bench::{BenchConfig, BenchGeometry};
use crate::config::filter::FilterConfig;
use crate::data_structures::perfect_cuckoo_filter::PerfectCuckooFilter;
use crate::error::PcfResult;
use crate::utxo::{scan_dataset, LoadReport, UtxoRecord, UtxoValue};

/// CSV header matching [`BenchRow::to_csv`].
pub const CSV_HEADER: &str = "Filter_Size,Fingerprint_Bits,UTXO_Count,Inserted,Rejected,Load_Factor,PCF_FPR,Insert_ns,Query_ns,Delete_ns";

/// CSV header matching [`ReplayRow::to_csv`].
pub const REPLAY_CSV_HEADER: &str =
    "Window,UTXO_Count,Inserted,Rejected,Load_Factor,PCF_FPR,Insert_ns,Query_ns,Delete_ns";

/// A result row that can be written with [`write_csv`].
pub trait CsvRow {
    /// Header line for this row type.
    fn header() -> &'static str;

    /// The row as one CSV line, without a trailing newline.
    fn to_csv(&self) -> String;
}

/// Measurements of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchRow {
    /// Buckets in the filter
    pub num_buckets: usize,
    /// Fingerprint width
    pub fingerprint_bits: u32,
    /// Keys offered to the filter
    pub target_count: usize,
    /// Keys stored
    pub inserted: usize,
    /// Keys refused (duplicate fingerprint or cascade failure)
    pub rejected: usize,
    /// Load factor once inserting stopped
    pub load_factor: f64,
    /// Fraction of absent-key queries that hit
    pub fpr: f64,
    /// Mean insert latency
    pub insert_ns: f64,
    /// Mean lookup latency
    pub query_ns: f64,
    /// Mean delete latency
    pub delete_ns: f64,
}

impl CsvRow for BenchRow {
    fn header() -> &'static str {
        CSV_HEADER
    }

    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.8},{:.1},{:.1},{:.1}",
            self.num_buckets,
            self.fingerprint_bits,
            self.target_count,
            self.inserted,
            self.rejected,
            self.load_factor,
            self.fpr,
            self.insert_ns,
            self.query_ns,
            self.delete_ns
        )
    }
}

/// Measurements of one replay window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRow {
    /// 1-based window number
    pub window: usize,
    /// Records read in this window
    pub records: usize,
    /// Records stored
    pub inserted: usize,
    /// Records refused
    pub rejected: usize,
    /// Load factor at the end of the window
    pub load_factor: f64,
    /// Fraction of absent-key queries that hit
    pub fpr: f64,
    /// Mean insert latency
    pub insert_ns: f64,
    /// Mean lookup latency
    pub query_ns: f64,
    /// Mean delete latency
    pub delete_ns: f64,
}

impl CsvRow for ReplayRow {
    fn header() -> &'static str {
        REPLAY_CSV_HEADER
    }

    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{:.6},{:.8},{:.1},{:.1},{:.1}",
            self.window,
            self.records,
            self.inserted,
            self.rejected,
            self.load_factor,
            self.fpr,
            self.insert_ns,
            self.query_ns,
            self.delete_ns
        )
    }
}

/// Generates a random key shaped like `txid:index`.
pub fn random_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:016x}:{}", rng.gen::<u64>(), rng.gen_range(0..1000u32))
}

/// Generates a random full-length transaction id with output index 0.
pub fn random_txid_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{:016x}{:016x}{:016x}{:016x}:0",
        rng.gen::<u64>(),
        rng.gen::<u64>(),
        rng.gen::<u64>(),
        rng.gen::<u64>()
    )
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[derive(Debug, Default)]
struct Timer {
    total: Duration,
    samples: u32,
}

impl Timer {
    fn time<T>(&mut self, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = op();
        self.total += start.elapsed();
        self.samples += 1;
        result
    }

    fn mean_ns(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total.as_nanos() as f64 / f64::from(self.samples)
        }
    }
}

/// Runs one geometry at one target count on a fresh filter.
///
/// # Errors
///
/// Fails only if the geometry does not describe a valid filter.
pub fn run_single<R: Rng + ?Sized>(
    config: &BenchConfig,
    geometry: BenchGeometry,
    target_count: usize,
    rng: &mut R,
) -> PcfResult<BenchRow> {
    let filter_config = config
        .filter_config(geometry, Some(rng.gen()))
        .to_filter_config();
    let mut filter = PerfectCuckooFilter::<UtxoValue>::with_config(filter_config)?;

    let mut offered: HashSet<String> = HashSet::with_capacity(target_count);
    let mut stored = Vec::with_capacity(target_count);
    let mut rejected = 0;
    let mut insert_timer = Timer::default();

    while offered.len() < target_count {
        if filter.load_factor() >= config.stop_load_factor {
            debug!(load_factor = filter.load_factor(), "Stop load factor reached");
            break;
        }
        let key = random_key(rng);
        if !offered.insert(key.clone()) {
            continue;
        }
        let value = UtxoValue::new(
            true,
            rng.gen_range(0..1_000_000),
            rng.gen_range(0..100_000_000),
            "",
            "",
        );
        match insert_timer.time(|| filter.insert(&key, value)) {
            Ok(_) => stored.push(key),
            Err(_) => rejected += 1,
        }
    }
    let load_factor = filter.load_factor();

    let mut query_timer = Timer::default();
    let mut false_positives = 0usize;
    let mut queried = 0;
    while queried < config.num_queries {
        let key = random_key(rng);
        if offered.contains(&key) {
            continue;
        }
        queried += 1;
        if query_timer.time(|| filter.contains(&key)) {
            false_positives += 1;
        }
    }

    let mut delete_timer = Timer::default();
    for key in stored.iter().step_by(config.delete_every) {
        delete_timer.time(|| filter.delete(key));
    }

    let row = BenchRow {
        num_buckets: geometry.num_buckets,
        fingerprint_bits: geometry.fingerprint_bits,
        target_count,
        inserted: stored.len(),
        rejected,
        load_factor,
        fpr: false_positives as f64 / config.num_queries as f64,
        insert_ns: insert_timer.mean_ns(),
        query_ns: query_timer.mean_ns(),
        delete_ns: delete_timer.mean_ns(),
    };
    info!(
        num_buckets = row.num_buckets,
        fingerprint_bits = row.fingerprint_bits,
        inserted = row.inserted,
        load_factor = row.load_factor,
        fpr = row.fpr,
        "Benchmark run complete"
    );
    Ok(row)
}

/// Runs every geometry at every target count.
pub fn run_sweep(config: &BenchConfig) -> PcfResult<Vec<BenchRow>> {
    let mut rng = seeded_rng(config.seed);

    let mut rows = Vec::with_capacity(config.configurations.len() * config.utxo_counts.len());
    for &geometry in &config.configurations {
        for &count in &config.utxo_counts {
            info!(
                count,
                num_buckets = geometry.num_buckets,
                fingerprint_bits = geometry.fingerprint_bits,
                "Starting benchmark run"
            );
            rows.push(run_single(config, geometry, count, &mut rng)?);
        }
    }
    Ok(rows)
}

/// One replay window: a fresh filter and the keys read into it.
struct ReplayWindow {
    filter: PerfectCuckooFilter<UtxoValue>,
    keys: Vec<String>,
    seen: HashSet<String>,
    inserted: usize,
    rejected: usize,
    insert_timer: Timer,
    delete_timer: Timer,
}

impl ReplayWindow {
    fn new<R: Rng + ?Sized>(filter_config: &FilterConfig, rng: &mut R) -> PcfResult<Self> {
        let config = FilterConfig {
            seed: Some(filter_config.seed.unwrap_or_else(|| rng.gen())),
            ..filter_config.clone()
        };
        Ok(Self {
            filter: PerfectCuckooFilter::with_config(config.to_filter_config())?,
            keys: Vec::new(),
            seen: HashSet::new(),
            inserted: 0,
            rejected: 0,
            insert_timer: Timer::default(),
            delete_timer: Timer::default(),
        })
    }

    fn records(&self) -> usize {
        self.keys.len()
    }

    fn insert<R: Rng + ?Sized>(&mut self, record: UtxoRecord, delete_every: usize, rng: &mut R) -> bool {
        let UtxoRecord { key, value } = record;
        let stored = self
            .insert_timer
            .time(|| self.filter.insert(&key, value))
            .is_ok();
        if stored {
            self.inserted += 1;
        } else {
            self.rejected += 1;
        }
        self.seen.insert(key.clone());
        self.keys.push(key);

        // Deletes pick any key read so far in the window, stored or not.
        if self.records() % delete_every == 0 {
            let victim = &self.keys[rng.gen_range(0..self.keys.len())];
            self.delete_timer.time(|| self.filter.delete(victim));
        }
        stored
    }

    fn finish<R: Rng + ?Sized>(self, window: usize, num_queries: usize, rng: &mut R) -> ReplayRow {
        let mut query_timer = Timer::default();
        let mut false_positives = 0usize;
        let mut queried = 0;
        while queried < num_queries {
            let key = random_txid_key(rng);
            if self.seen.contains(&key) {
                continue;
            }
            queried += 1;
            if query_timer.time(|| self.filter.contains(&key)) {
                false_positives += 1;
            }
        }

        let row = ReplayRow {
            window,
            records: self.records(),
            inserted: self.inserted,
            rejected: self.rejected,
            load_factor: self.filter.load_factor(),
            fpr: false_positives as f64 / num_queries as f64,
            insert_ns: self.insert_timer.mean_ns(),
            query_ns: query_timer.mean_ns(),
            delete_ns: self.delete_timer.mean_ns(),
        };
        info!(
            window = row.window,
            records = row.records,
            load_factor = row.load_factor,
            fpr = row.fpr,
            "Replay checkpoint"
        );
        row
    }
}

/// Streams a UTXO dataset through filters built from `filter_config`.
///
/// Every `checkpoint_every` records the current window is measured and a new,
/// empty filter takes over; a trailing partial window is measured too. One
/// key in every `delete_every` records is deleted again to time deletes.
///
/// # Errors
///
/// Fails if reading `reader` fails or `filter_config` is not a valid filter.
pub fn run_replay<R: BufRead>(
    config: &BenchConfig,
    filter_config: &FilterConfig,
    reader: R,
) -> PcfResult<(Vec<ReplayRow>, LoadReport)> {
    let mut rng = seeded_rng(config.seed);
    let mut window = ReplayWindow::new(filter_config, &mut rng)?;
    let mut rows = Vec::new();

    let report = scan_dataset(reader, |_, record| {
        let stored = window.insert(record, config.delete_every, &mut rng);
        if window.records() == config.checkpoint_every {
            let full = std::mem::replace(&mut window, ReplayWindow::new(filter_config, &mut rng)?);
            rows.push(full.finish(rows.len() + 1, config.replay_queries, &mut rng));
        }
        Ok(stored)
    })?;

    if window.records() > 0 {
        rows.push(window.finish(rows.len() + 1, config.replay_queries, &mut rng));
    }
    Ok((rows, report))
}

/// Writes `rows` as CSV with a header line.
pub fn write_csv<T: CsvRow, W: Write>(rows: &[T], mut writer: W) -> PcfResult<()> {
    writeln!(writer, "{}", T::header())?;
    for row in rows {
        writeln!(writer, "{}", row.to_csv())?;
    }
    writer.flush()?;
    Ok(())
}
