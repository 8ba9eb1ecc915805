//! Human-readable text output

use crate::config::{Config, PhaseKind};
use crate::coordinator::{BlockProgress, RunObserver, RunSummary};
use crate::stats::{report_interval, PhaseSummary};
use crate::util::time::{format_bytes, format_duration};
use std::time::Duration;

/// Prints a progress line every `interval` blocks of a phase
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    interval: u64,
    iterations: u64,
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(config: &Config) -> Self {
        Self {
            interval: report_interval(config.run.block_size),
            iterations: config.run.iterations,
            quiet: config.output.quiet,
        }
    }

    /// Whether `progress` falls on a reporting boundary
    pub fn should_report(&self, progress: &BlockProgress) -> bool {
        !self.quiet && progress.blocks_done % self.interval == 0
    }

    /// Progress line for one block
    pub fn progress_line(&self, progress: &BlockProgress) -> String {
        let verb = match progress.kind {
            PhaseKind::Write => "Wrote",
            PhaseKind::Verify => "Verified",
        };
        let percent = if progress.block_count > 0 {
            progress.index as f64 / progress.block_count as f64 * 100.0
        } else {
            0.0
        };
        format!(
            "{} block {}, iteration {}/{} ({:.2}%, {:.2} MB/sec, {:.2} MB/sec overall)",
            verb,
            progress.index,
            progress.iteration,
            self.iterations,
            percent,
            progress.rate.instant_mb_per_sec(),
            progress.rate.cumulative_mb_per_sec(),
        )
    }
}

impl RunObserver for ConsoleReporter {
    fn phase_started(&mut self, kind: PhaseKind, iteration: u64, workers: usize) {
        if !self.quiet {
            println!(
                "Starting {} phase, iteration {}/{} ({} generator workers)",
                kind, iteration, self.iterations, workers
            );
        }
    }

    fn block_done(&mut self, progress: &BlockProgress) {
        if self.should_report(progress) {
            println!("{}", self.progress_line(progress));
        }
    }

    fn phase_finished(&mut self, summary: &PhaseSummary) {
        println!("{}", phase_line(summary));
    }
}

fn phase_line(summary: &PhaseSummary) -> String {
    let verb = match summary.kind {
        PhaseKind::Write => "Write",
        PhaseKind::Verify => "Verify",
    };
    format!(
        "{} phase complete, iteration {}: {} blocks ({}) at {:.2} MB/sec",
        verb,
        summary.iteration,
        format_number(summary.blocks),
        format_bytes(summary.bytes),
        summary.throughput_mb_per_sec,
    )
}

/// Print the effective configuration
pub fn print_configuration(config: &Config) {
    let run = &config.run;
    println!("Configuration:");
    println!("  Run:");
    println!("    Mode: {}", run.mode);
    println!("    Seed: {:?}", run.seed);
    println!("    Block size: {} bytes ({} digest)", run.block_size, run.digest);
    println!(
        "    Blocks: {} to {} ({} blocks, {})",
        run.start_block,
        run.block_count,
        format_number(run.phase_blocks()),
        format_bytes(run.phase_bytes())
    );
    println!("    Iterations: {}", run.iterations);
    println!("    Generator workers: {}", run.worker_count());
    println!("  Target:");
    println!("    Path: {}", config.target.path.display());
    println!(
        "    Direct IO: {}, O_SYNC: {}, flush after write: {}",
        config.target.direct, config.target.sync, config.target.flush
    );
}

/// Print the results of a completed run
pub fn print_results(summary: &RunSummary) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    TEST RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "Elapsed Time: {}",
        format_duration(Duration::from_secs_f64(summary.wall_secs))
    );
    println!();

    for kind in [PhaseKind::Write, PhaseKind::Verify] {
        let phases: Vec<&PhaseSummary> = summary.phases.iter().filter(|p| p.kind == kind).collect();
        if phases.is_empty() {
            continue;
        }

        let blocks: u64 = phases.iter().map(|p| p.blocks).sum();
        let bytes: u64 = phases.iter().map(|p| p.bytes).sum();
        let secs: f64 = phases.iter().map(|p| p.transfer_secs).sum();
        let overall = if secs > 0.0 {
            bytes as f64 / secs / crate::util::time::MEGABYTE
        } else {
            0.0
        };
        let p99 = phases.iter().map(|p| p.latency_p99_us).fold(0.0, f64::max);
        let max = phases.iter().map(|p| p.latency_max_us).fold(0.0, f64::max);

        match kind {
            PhaseKind::Write => println!("Write:"),
            PhaseKind::Verify => println!("Verify:"),
        }
        println!("  Blocks:     {} ({})", format_number(blocks), format_bytes(bytes));
        println!("  Throughput: {:.2} MB/sec", overall);
        println!("  Latency:    p99 {:.1}us, max {:.1}us", p99, max);
        println!();
    }

    if summary.phases.iter().any(|p| p.kind == PhaseKind::Verify) {
        println!("All blocks verified.");
    }
    println!("═══════════════════════════════════════════════════════════");
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, OutputConfig, RunConfig, TargetConfig};
    use crate::content::DigestAlgorithm;
    use crate::stats::BlockRate;
    use std::path::PathBuf;

    fn config(block_size: usize) -> Config {
        Config {
            run: RunConfig {
                seed: "abc".to_string(),
                block_size,
                block_count: 100_000,
                start_block: 0,
                mode: Mode::Both,
                iterations: 2,
                digest: DigestAlgorithm::Sha256,
                workers: None,
            },
            target: TargetConfig {
                path: PathBuf::from("/tmp/target"),
                direct: false,
                sync: false,
                flush: false,
            },
            output: OutputConfig::default(),
        }
    }

    fn progress(index: u64, blocks_done: u64) -> BlockProgress {
        BlockProgress {
            kind: PhaseKind::Verify,
            iteration: 1,
            index,
            blocks_done,
            phase_blocks: 100_000,
            block_count: 100_000,
            rate: BlockRate {
                instant: 2.0 * 1_048_576.0,
                cumulative: 1_048_576.0,
            },
        }
    }

    #[test]
    fn test_progress_line() {
        let reporter = ConsoleReporter::new(&config(512));
        assert_eq!(
            reporter.progress_line(&progress(50_000, 50_001)),
            "Verified block 50000, iteration 1/2 (50.00%, 2.00 MB/sec, 1.00 MB/sec overall)"
        );
    }

    #[test]
    fn test_report_cadence() {
        let reporter = ConsoleReporter::new(&config(1024 * 1024));
        assert!(!reporter.should_report(&progress(6, 7)));
        assert!(reporter.should_report(&progress(7, 8)));
        assert!(reporter.should_report(&progress(15, 16)));
    }

    #[test]
    fn test_quiet_suppresses_progress() {
        let mut config = config(1024 * 1024);
        config.output.quiet = true;
        let reporter = ConsoleReporter::new(&config);
        assert!(!reporter.should_report(&progress(7, 8)));
    }

    #[test]
    fn test_phase_line() {
        let summary = PhaseSummary {
            kind: PhaseKind::Write,
            iteration: 1,
            blocks: 4096,
            bytes: 2 * 1024 * 1024,
            transfer_secs: 1.0,
            wall_secs: 1.5,
            throughput_mb_per_sec: 2.0,
            latency_p50_us: 10.0,
            latency_p99_us: 20.0,
            latency_max_us: 30.0,
        };
        assert_eq!(
            phase_line(&summary),
            "Write phase complete, iteration 1: 4,096 blocks (2.00 MB) at 2.00 MB/sec"
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
