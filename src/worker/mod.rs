//! Generator worker pool
//!
//! Content generation runs on `W` worker threads while the consumer thread
//! performs IO. Worker `r` owns every block index `i` in the phase range with
//! `i % W == r` and produces them in ascending order, so the consumer always
//! knows which worker holds the block it needs next.
//!
//! # Handoff
//!
//! Each worker talks to the consumer through its own zero-capacity channel:
//! a worker offers one generated block and stays blocked until the consumer
//! takes it, and only then starts on its next index. No worker is ever more
//! than one block ahead. Consumed buffers travel back to their worker over a
//! second channel so steady state allocates nothing.
//!
//! A pool is good for exactly one phase. Its sequences are finite and cannot
//! be rewound; the next phase starts a new pool. Dropping a pool mid-phase
//! (after a fatal error) disconnects every slot, which stops the workers.
//!
//! # Example
//!
//! ```
//! use blockstress::config::{Mode, RunConfig};
//! use blockstress::content::DigestAlgorithm;
//! use blockstress::worker::GeneratorPool;
//!
//! let config = RunConfig {
//!     seed: "abc".to_string(),
//!     block_size: 64,
//!     block_count: 8,
//!     start_block: 0,
//!     mode: Mode::Write,
//!     iterations: 1,
//!     digest: DigestAlgorithm::Sha256,
//!     workers: Some(3),
//! };
//!
//! let mut pool = GeneratorPool::start(&config)?;
//! for index in 0..8 {
//!     let block = pool.next(index)?;
//!     assert_eq!(block.worker, (index % 3) as usize);
//!     pool.recycle(block);
//! }
//! # Ok::<(), blockstress::error::StressError>(())
//! ```

use crate::config::RunConfig;
use crate::content::ContentGenerator;
use crate::error::StressError;
use crate::util::buffer::AlignedBuffer;
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// One generated block, owned by whoever holds it
#[derive(Debug)]
pub struct GeneratedBlock {
    /// Block index the content belongs to
    pub index: u64,
    /// Worker that generated it
    pub worker: usize,
    /// Block content, exactly one block long
    pub buffer: AlignedBuffer,
}

impl GeneratedBlock {
    #[inline]
    pub fn content(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

/// Consumer end of one worker's handoff slot
struct Slot {
    blocks: Receiver<GeneratedBlock>,
    recycle: Sender<AlignedBuffer>,
}

/// Pool of generator workers for one phase
pub struct GeneratorPool {
    slots: Vec<Slot>,
    handles: Vec<JoinHandle<()>>,
    generated: Arc<AtomicU64>,
}

impl GeneratorPool {
    /// Start `config.worker_count()` workers over the configured block range
    pub fn start(config: &RunConfig) -> Result<Self, StressError> {
        Self::with_generator(
            config.generator(),
            config.start_block,
            config.block_count,
            config.worker_count(),
        )
    }

    /// Start `worker_count` workers producing blocks `start..end`
    pub fn with_generator(
        generator: ContentGenerator,
        start: u64,
        end: u64,
        worker_count: usize,
    ) -> Result<Self, StressError> {
        assert!(worker_count > 0, "pool needs at least one worker");

        let generated = Arc::new(AtomicU64::new(0));
        let mut slots = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for worker in 0..worker_count {
            let (block_tx, block_rx) = channel::bounded(0);
            let (recycle_tx, recycle_rx) = channel::unbounded();
            let generator = generator.clone();
            let generated = Arc::clone(&generated);
            let indices = assigned_blocks(worker, worker_count, start, end);

            let handle = thread::Builder::new()
                .name(format!("generator-{}", worker))
                .spawn(move || {
                    run_worker(worker, indices, generator, block_tx, recycle_rx, generated)
                })
                .map_err(|source| StressError::Spawn { worker, source })?;

            slots.push(Slot {
                blocks: block_rx,
                recycle: recycle_tx,
            });
            handles.push(handle);
        }

        debug!(workers = worker_count, start, end, "generator pool started");

        Ok(Self {
            slots,
            handles,
            generated,
        })
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Worker responsible for block `index`
    #[inline]
    pub fn owner_of(&self, index: u64) -> usize {
        (index % self.slots.len() as u64) as usize
    }

    /// Take block `index` from its owner, waiting until it has been generated
    ///
    /// Blocks must be requested in ascending order; a worker delivering any
    /// other index is a broken invariant and panics.
    pub fn next(&mut self, index: u64) -> Result<GeneratedBlock, StressError> {
        let worker = self.owner_of(index);
        let block = self.slots[worker]
            .blocks
            .recv()
            .map_err(|_| StressError::WorkerLost { worker, block: index })?;
        assert_eq!(
            block.index, index,
            "generator worker {} delivered block {} out of order",
            worker, block.index
        );
        Ok(block)
    }

    /// Hand a consumed block's buffer back to the worker that made it
    pub fn recycle(&self, block: GeneratedBlock) {
        // A worker that already finished its sequence no longer listens
        let _ = self.slots[block.worker].recycle.send(block.buffer);
    }

    /// Blocks generated so far across all workers
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }
}

impl Drop for GeneratorPool {
    fn drop(&mut self) {
        // Disconnect every slot first so blocked workers wake up and exit
        self.slots.clear();
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("generator").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "generator worker panicked");
            }
        }
    }
}

/// Block indices worker `worker` of `worker_count` produces for `start..end`
///
/// These are the indices `i` in the range with `i % worker_count == worker`,
/// in ascending order.
pub fn assigned_blocks(
    worker: usize,
    worker_count: usize,
    start: u64,
    end: u64,
) -> impl Iterator<Item = u64> {
    let w = worker_count as u64;
    let r = worker as u64;
    let first = start + (r + w - start % w) % w;
    (first..end).step_by(worker_count)
}

fn run_worker(
    worker: usize,
    indices: impl Iterator<Item = u64>,
    generator: ContentGenerator,
    blocks: Sender<GeneratedBlock>,
    recycle: Receiver<AlignedBuffer>,
    generated: Arc<AtomicU64>,
) {
    let block_size = generator.block_size();
    let mut produced = 0u64;

    for index in indices {
        let mut buffer = recycle
            .try_recv()
            .unwrap_or_else(|_| AlignedBuffer::for_block(block_size));
        generator.fill(index, buffer.as_mut_slice());
        generated.fetch_add(1, Ordering::Relaxed);

        let block = GeneratedBlock {
            index,
            worker,
            buffer,
        };
        if blocks.send(block).is_err() {
            debug!(worker, index, "consumer went away, generator stopping");
            return;
        }
        produced += 1;
    }

    debug!(worker, produced, "generator finished");
}
