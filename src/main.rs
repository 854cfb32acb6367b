//! Perfect Cuckoo - Main entrypoint.
//!
//! Loads UTXO datasets into a filter, serves an interactive lookup menu and
//! measures false-positive rates and operation latencies.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use perfect_cuckoo_lib::bench::{run_replay, run_sweep, write_csv};
use perfect_cuckoo_lib::config::{ConfigLoader, LogConfig, PcfConfig, ENV_PREFIX};
use perfect_cuckoo_lib::data_structures::perfect_cuckoo_filter::{FilterStats, PerfectCuckooFilter};
use perfect_cuckoo_lib::error::{set_error_reporter, TracingErrorReporter};
use perfect_cuckoo_lib::utxo::record::parse_u64;
use perfect_cuckoo_lib::utxo::{load_file, LoadReport, UtxoValue};

/// Command line arguments for Perfect Cuckoo.
#[derive(Parser, Debug)]
#[clap(name = "perfect_cuckoo", version, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Command to execute
    #[clap(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Load a UTXO dataset and print statistics
    Load {
        /// Dataset file
        #[clap(value_parser)]
        file: PathBuf,

        /// Print the report as JSON
        #[clap(long)]
        json: bool,
    },

    /// Load a UTXO dataset, then look up, add and remove UTXOs
    Interactive {
        /// Dataset file
        #[clap(value_parser)]
        file: PathBuf,
    },

    /// Run the false-positive-rate sweep, or replay a dataset
    Bench {
        /// CSV output path, overriding the configured one
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,

        /// Replay this UTXO dataset through the configured filter instead
        #[clap(short, long, value_parser)]
        dataset: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Initialize the logging system.
fn init_logging(log: &LogConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(log.source_location)
        .with_line_number(log.source_location);

    let result = if log.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set global tracing subscriber")
}

/// Main entry point for the application.
fn main() -> Result<()> {
    let args = Args::parse();

    let config_loader = ConfigLoader::new(args.config.as_deref(), ENV_PREFIX);
    let loaded = config_loader.load();

    let default_log = LogConfig::default();
    init_logging(loaded.as_ref().map(|c| &c.log).unwrap_or(&default_log))?;
    set_error_reporter(Arc::new(TracingErrorReporter));

    if let Command::GenConfig { output } = &args.command {
        return gen_config(output);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };

    match args.command {
        Command::Load { file, json } => {
            let (filter, report) = load(&config, &file)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if json {
                let body = serde_json::json!({
                    "report": report,
                    "stats": filter.stats(),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
            } else {
                print_report(&mut out, &report)?;
                print_stats(&mut out, &filter.stats())?;
            }
            Ok(())
        }
        Command::Interactive { file } => {
            let (mut filter, report) = load(&config, &file)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut out = stdout.lock();
            print_report(&mut out, &report)?;
            if report.loaded == 0 {
                writeln!(
                    out,
                    "No UTXOs were loaded. Check that {} exists and has one \
                     `txid:index coinbase height amount script address` record per line.",
                    file.display()
                )?;
                return Ok(());
            }
            run_menu(&mut filter, &mut stdin.lock(), &mut out)
        }
        Command::Bench { output, dataset } => {
            let output = output.unwrap_or_else(|| config.bench.output.clone());
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let rows = match dataset {
                Some(dataset) => {
                    info!("Replaying {:?}", dataset);
                    let reader = File::open(&dataset)
                        .with_context(|| format!("Failed to open {}", dataset.display()))?;
                    let (rows, report) =
                        run_replay(&config.bench, &config.filter, BufReader::new(reader))?;
                    print_report(&mut io::stdout().lock(), &report)?;
                    write_csv(&rows, BufWriter::new(file))?;
                    rows.len()
                }
                None => {
                    info!("Running benchmark sweep");
                    let rows = run_sweep(&config.bench)?;
                    write_csv(&rows, BufWriter::new(file))?;
                    rows.len()
                }
            };

            info!(rows, "Results written to {:?}", output);
            Ok(())
        }
        Command::Validate => {
            info!("Configuration validated successfully");
            Ok(())
        }
        Command::GenConfig { .. } => Ok(()),
    }
}

fn gen_config(output: &Path) -> Result<()> {
    info!("Generating default configuration");
    let default_config = PcfConfig::default();

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(&default_config).context("Failed to serialize config")?;
    fs::write(output, toml)?;

    info!("Default configuration written to {:?}", output);
    Ok(())
}

fn load(config: &PcfConfig, file: &Path) -> Result<(PerfectCuckooFilter<UtxoValue>, LoadReport)> {
    let mut filter = PerfectCuckooFilter::with_config(config.filter.to_filter_config())?;
    let report = load_file(&mut filter, file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    Ok((filter, report))
}

fn print_report<W: Write>(out: &mut W, report: &LoadReport) -> io::Result<()> {
    writeln!(out, "Lines read:      {}", report.lines)?;
    writeln!(out, "UTXOs loaded:    {}", report.loaded)?;
    writeln!(out, "Rejected:        {}", report.rejected)?;
    writeln!(out, "Malformed:       {}", report.malformed)?;
    writeln!(out, "Blank:           {}", report.blank)
}

fn print_stats<W: Write>(out: &mut W, stats: &FilterStats) -> io::Result<()> {
    writeln!(out, "Filter statistics")?;
    writeln!(out, "  Entries:         {} / {}", stats.count, stats.capacity)?;
    writeln!(out, "  Load factor:     {:.4}", stats.load_factor)?;
    writeln!(out, "  Primary:         {}", stats.primary_count)?;
    writeln!(out, "  Alternate:       {}", stats.alternate_count)?;
    writeln!(
        out,
        "  Empty buckets:   {} / {} ({:.2}%)",
        stats.empty_buckets,
        stats.num_buckets,
        stats.empty_bucket_ratio() * 100.0
    )
}

fn print_utxo<W: Write>(out: &mut W, key: &str, value: &UtxoValue) -> io::Result<()> {
    writeln!(out, "UTXO {key}")?;
    writeln!(out, "  Coinbase: {}", if value.coinbase { "yes" } else { "no" })?;
    writeln!(out, "  Height:   {}", value.height)?;
    writeln!(out, "  Amount:   {}", value.amount)?;
    writeln!(out, "  Script:   {}", value.script)?;
    writeln!(out, "  Address:  {}", value.address)
}

/// Reads one trimmed line, or `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn read_value<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<UtxoValue>> {
    let mut fields = Vec::with_capacity(5);
    for label in [
        "Coinbase (1/0): ",
        "Height: ",
        "Amount: ",
        "Script: ",
        "Address: ",
    ] {
        match prompt(input, out, label)? {
            Some(field) => fields.push(field),
            None => return Ok(None),
        }
    }

    let height = match parse_u64("height", &fields[1]) {
        Ok(height) => height,
        Err(e) => {
            writeln!(out, "Invalid input: {e}")?;
            return Ok(None);
        }
    };
    let amount = match parse_u64("amount", &fields[2]) {
        Ok(amount) => amount,
        Err(e) => {
            writeln!(out, "Invalid input: {e}")?;
            return Ok(None);
        }
    };

    Ok(Some(UtxoValue::new(
        fields[0] == "1",
        height,
        amount,
        fields[3].as_str(),
        fields[4].as_str(),
    )))
}

/// Menu loop over `input`; returns on `5` or end of input.
fn run_menu<R: BufRead, W: Write>(
    filter: &mut PerfectCuckooFilter<UtxoValue>,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    loop {
        writeln!(out)?;
        writeln!(out, "1. Lookup UTXO")?;
        writeln!(out, "2. Add UTXO")?;
        writeln!(out, "3. Remove UTXO")?;
        writeln!(out, "4. Show statistics")?;
        writeln!(out, "5. Exit")?;

        let Some(choice) = prompt(input, out, "Choice: ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => {
                let Some(key) = prompt(input, out, "txid:index: ")? else {
                    return Ok(());
                };
                match filter.get(&key) {
                    Some(value) => print_utxo(out, &key, value)?,
                    None => writeln!(out, "UTXO {key} not found")?,
                }
            }
            "2" => {
                let Some(key) = prompt(input, out, "txid:index: ")? else {
                    return Ok(());
                };
                let Some(value) = read_value(input, out)? else {
                    continue;
                };
                match filter.insert(&key, value) {
                    Ok(placement) => writeln!(out, "UTXO {key} added ({placement:?})")?,
                    Err(e) => writeln!(out, "Could not add UTXO {key}: {e}")?,
                }
            }
            "3" => {
                let Some(key) = prompt(input, out, "txid:index: ")? else {
                    return Ok(());
                };
                if filter.delete(&key) {
                    writeln!(out, "UTXO {key} removed")?;
                } else {
                    writeln!(out, "UTXO {key} not found")?;
                }
            }
            "4" => print_stats(out, &filter.stats())?,
            "5" => return Ok(()),
            other => writeln!(out, "Unknown option: {other}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfect_cuckoo_lib::data_structures::perfect_cuckoo_filter::CuckooFilterConfig;
    use std::io::Cursor;

    fn small_filter() -> PerfectCuckooFilter<UtxoValue> {
        PerfectCuckooFilter::with_config(
            CuckooFilterConfig::new()
                .with_num_buckets(1 << 10)
                .with_fingerprint_bits(16)
                .with_seed(1),
        )
        .unwrap()
    }

    fn run(filter: &mut PerfectCuckooFilter<UtxoValue>, script: &str) -> String {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        run_menu(filter, &mut input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_menu_add_lookup_remove() {
        let mut filter = small_filter();
        let output = run(
            &mut filter,
            "2\nabc:0\n1\n700000\n625000000\n76a914\n1BoatSLRHtKNngkdXEeobR76b53LETtpyT\n\
             1\nabc:0\n3\nabc:0\n1\nabc:0\n5\n",
        );

        assert!(output.contains("UTXO abc:0 added"));
        assert!(output.contains("Height:   700000"));
        assert!(output.contains("Address:  1BoatSLRHtKNngkdXEeobR76b53LETtpyT"));
        assert!(output.contains("UTXO abc:0 removed"));
        assert!(output.contains("UTXO abc:0 not found"));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_menu_reports_invalid_number() {
        let mut filter = small_filter();
        let output = run(&mut filter, "2\nabc:1\n0\nlots\n1\nscript\naddr\n4\n5\n");

        assert!(output.contains("Invalid input"));
        assert!(output.contains("Entries:         0 / 4096"));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_menu_duplicate_and_unknown_option() {
        let mut filter = small_filter();
        filter.insert("abc:2", UtxoValue::default()).unwrap();

        let output = run(&mut filter, "9\n2\nabc:2\n0\n1\n1\ns\na\n");
        assert!(output.contains("Unknown option: 9"));
        assert!(output.contains("Could not add UTXO abc:2"));
        assert_eq!(filter.count(), 1);
    }

    #[test]
    fn test_generated_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcf.toml");
        gen_config(&path).unwrap();

        let config = ConfigLoader::new(Some(&path), "PCF_TEST_GEN").load().unwrap();
        assert_eq!(config, PcfConfig::default());
    }

    #[test]
    fn test_menu_stops_at_end_of_input() {
        let mut filter = small_filter();
        let output = run(&mut filter, "1\n");
        assert!(output.contains("txid:index: "));
    }
}
