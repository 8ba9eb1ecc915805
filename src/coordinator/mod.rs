//! Run loop
//!
//! A run is `iterations` repetitions of the phases selected by the mode
//! (write, then read-verify). Each phase walks the block range in ascending
//! order on the calling thread, pulling content from a fresh
//! [`GeneratorPool`] and moving it through the [`DiskDriver`].
//!
//! # Phase states
//!
//! ```text
//! Idle -> PoolStarted -> Consuming { next } -> Complete
//!                              |
//!                              +-> Aborted { block }
//! ```
//!
//! `Complete` and `Aborted` are terminal. The first fault aborts the phase and
//! the whole run; nothing is retried or skipped.

use crate::config::{PhaseKind, RunConfig};
use crate::engine::DiskDriver;
use crate::error::StressError;
use crate::stats::{BlockRate, PhaseStats, PhaseSummary};
use crate::target::Target;
use crate::util::time::{measure, Timestamp};
use crate::worker::GeneratorPool;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Idle,
    PoolStarted,
    Consuming { next: u64 },
    Complete,
    Aborted { block: Option<u64> },
}

impl PhaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseState::Complete | PhaseState::Aborted { .. })
    }
}

/// Progress after one block
#[derive(Debug, Clone, Copy)]
pub struct BlockProgress {
    pub kind: PhaseKind,
    /// 1-based iteration number
    pub iteration: u64,
    /// Block just processed
    pub index: u64,
    /// Blocks processed so far in this phase
    pub blocks_done: u64,
    /// Blocks in the phase
    pub phase_blocks: u64,
    /// Exclusive end of the block range
    pub block_count: u64,
    pub rate: BlockRate,
}

/// Receives run events; every method defaults to doing nothing
pub trait RunObserver {
    fn phase_started(&mut self, _kind: PhaseKind, _iteration: u64, _workers: usize) {}

    fn block_done(&mut self, _progress: &BlockProgress) {}

    fn phase_finished(&mut self, _summary: &PhaseSummary) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// One ascending pass over the block range
pub struct Phase<'c> {
    config: &'c RunConfig,
    kind: PhaseKind,
    iteration: u64,
    flush: bool,
    state: PhaseState,
    stats: PhaseStats,
    pool: Option<GeneratorPool>,
}

impl<'c> Phase<'c> {
    pub fn new(config: &'c RunConfig, kind: PhaseKind, iteration: u64) -> Self {
        Self {
            config,
            kind,
            iteration,
            flush: false,
            state: PhaseState::Idle,
            stats: PhaseStats::new(config.block_size),
            pool: None,
        }
    }

    /// fsync the target before a write phase reports completion
    pub fn flush_on_complete(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    pub fn stats(&self) -> &PhaseStats {
        &self.stats
    }

    /// Worker count of the running pool, or 0 before start / after the end
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(0, GeneratorPool::worker_count)
    }

    /// Start the generator pool
    ///
    /// # Panics
    /// Panics unless the phase is `Idle`.
    pub fn start(&mut self) -> Result<(), StressError> {
        assert_eq!(self.state, PhaseState::Idle, "phase already started");
        self.stats.reset();
        match GeneratorPool::start(self.config) {
            Ok(pool) => {
                self.pool = Some(pool);
                self.state = PhaseState::PoolStarted;
                Ok(())
            }
            Err(e) => {
                self.state = PhaseState::Aborted { block: None };
                Err(e)
            }
        }
    }

    /// Process the next block in ascending order
    ///
    /// Returns the block's progress, or `None` once the phase is complete.
    /// Any error leaves the phase `Aborted` and stops its workers.
    ///
    /// # Panics
    /// Panics if called before `start` or after an abort.
    pub fn step(&mut self, driver: &mut DiskDriver<'_>) -> Result<Option<BlockProgress>, StressError> {
        let index = match self.state {
            PhaseState::PoolStarted => self.config.start_block,
            PhaseState::Consuming { next } => next,
            PhaseState::Complete => return Ok(None),
            PhaseState::Idle | PhaseState::Aborted { .. } => {
                panic!("step called on a phase in state {:?}", self.state)
            }
        };

        if index >= self.config.block_count {
            return self.complete(driver).map(|()| None);
        }

        match self.transfer(index, driver) {
            Ok(elapsed) => {
                let rate = self.stats.record(elapsed);
                self.state = PhaseState::Consuming { next: index + 1 };
                Ok(Some(BlockProgress {
                    kind: self.kind,
                    iteration: self.iteration,
                    index,
                    blocks_done: self.stats.blocks(),
                    phase_blocks: self.config.phase_blocks(),
                    block_count: self.config.block_count,
                    rate,
                }))
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    fn transfer(&mut self, index: u64, driver: &mut DiskDriver<'_>) -> Result<Duration, StressError> {
        let pool = self
            .pool
            .as_mut()
            .expect("pool is present while consuming");
        let block = pool.next(index)?;

        let (result, elapsed) = match self.kind {
            PhaseKind::Write => measure(|| driver.write_block(index, block.content())),
            PhaseKind::Verify => measure(|| driver.verify_block(index, block.content())),
        };
        pool.recycle(block);
        result.map(|()| elapsed)
    }

    fn complete(&mut self, driver: &mut DiskDriver<'_>) -> Result<(), StressError> {
        // Workers have all finished their sequences
        self.pool = None;
        if self.flush && self.kind == PhaseKind::Write {
            if let Err(e) = driver.flush() {
                return Err(self.abort(e));
            }
        }
        self.state = PhaseState::Complete;
        Ok(())
    }

    fn abort(&mut self, error: StressError) -> StressError {
        self.state = PhaseState::Aborted {
            block: error.block(),
        };
        // Dropping the pool disconnects the slots and joins the workers
        self.pool = None;
        error
    }
}

/// Totals of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub phases: Vec<PhaseSummary>,
    pub wall_secs: f64,
}

/// Drives every iteration and phase of a run against one target
pub struct Coordinator<'c> {
    config: &'c RunConfig,
    flush_writes: bool,
}

impl<'c> Coordinator<'c> {
    pub fn new(config: &'c RunConfig) -> Self {
        Self {
            config,
            flush_writes: false,
        }
    }

    /// fsync the target at the end of every write phase
    pub fn flush_writes(mut self, flush: bool) -> Self {
        self.flush_writes = flush;
        self
    }

    /// Run every iteration, stopping at the first fault
    pub fn run(
        &self,
        target: &mut dyn Target,
        observer: &mut dyn RunObserver,
    ) -> Result<RunSummary, StressError> {
        let started = Timestamp::now();
        let mut phases = Vec::new();

        for iteration in 1..=self.config.iterations {
            for &kind in self.config.mode.phases() {
                let summary = self.run_phase(kind, iteration, target, observer)?;
                phases.push(summary);
            }
        }

        Ok(RunSummary {
            phases,
            wall_secs: started.elapsed().as_secs_f64(),
        })
    }

    /// Run a single phase to completion
    pub fn run_phase(
        &self,
        kind: PhaseKind,
        iteration: u64,
        target: &mut dyn Target,
        observer: &mut dyn RunObserver,
    ) -> Result<PhaseSummary, StressError> {
        let started = Timestamp::now();
        let mut driver = DiskDriver::new(target, self.config);
        let mut phase = Phase::new(self.config, kind, iteration).flush_on_complete(self.flush_writes);

        phase.start()?;
        info!(
            %kind,
            iteration,
            workers = phase.workers(),
            start = self.config.start_block,
            end = self.config.block_count,
            "phase started"
        );
        observer.phase_started(kind, iteration, phase.workers());

        loop {
            match phase.step(&mut driver) {
                Ok(Some(progress)) => observer.block_done(&progress),
                Ok(None) => break,
                Err(e) => {
                    warn!(%kind, iteration, state = ?phase.state(), "phase aborted");
                    return Err(e);
                }
            }
        }

        let summary = phase.stats().summary(kind, iteration, started.elapsed());
        debug!(?summary, "phase complete");
        observer.phase_finished(&summary);
        Ok(summary)
    }
}
