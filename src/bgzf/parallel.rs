//! Parallel BGZF stream reader.
//!
//! Architecture:
//! - One coordinator owns the input stream and a pool of per-worker
//!   [`BlockReader`]s.
//! - Each `read_more` call fans out across W scoped worker threads that
//!   cooperate through a single mutex and condition variable.
//! - A serial *load slot* hands members out in stream order and assigns
//!   each its destination offset; *compute slots* bound concurrent
//!   decompression. Both I/O and inflate run with the mutex released.
//! - A member that would overflow the destination's capacity is deferred
//!   and placed at the front of the next call's output (back-pressure).
//!
//! Blocks therefore land in the destination in exact BGZF stream order, and
//! the only per-call allocation is growing the caller's buffer when a
//! deferred member does not fit it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{Condvar, Mutex, MutexGuard};

use log::{debug, trace};
use sync_cell_slice::{SyncCell, SyncSlice};

use super::reader::BlockReader;
use crate::error::{Error, Result};

const MAX_WORKERS: usize = 32;

/// Delivery state of one worker's block, tracked under the state mutex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    /// No undelivered block.
    Empty,
    /// Loaded last call but did not fit the destination; its placement is
    /// patched to the front of the next call's output.
    Pending { size: usize },
    /// Loaded and assigned a destination range, not yet decompressed.
    Ready { offset: usize, size: usize },
}

struct ReaderState {
    slots: Vec<Slot>,
    /// Absolute destination offset where the next loaded member lands.
    next_offset: usize,
    /// Destination length covered by successfully placed members.
    committed: usize,
    /// Size of the member that did not fit the last destination buffer.
    pending_block_size: usize,
    /// Single-producer gate serializing input I/O and offset assignment.
    load_slot_free: bool,
    /// Counting semaphore bounding concurrent decompression.
    compute_slots_free: usize,
    eof: bool,
    failed: bool,
}

struct Shared {
    state: Mutex<ReaderState>,
    state_changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().expect("reader state mutex poisoned")
    }

    /// Returns `None` if the read failed on another worker while waiting.
    fn wait_for_load_slot<'a>(
        &'a self,
        mut state: MutexGuard<'a, ReaderState>,
    ) -> Option<MutexGuard<'a, ReaderState>> {
        while !state.load_slot_free {
            if state.failed {
                return None;
            }
            state = self.state_changed.wait(state).expect("reader state mutex poisoned");
        }
        if state.failed {
            return None;
        }
        state.load_slot_free = false;
        Some(state)
    }

    fn release_load_slot(&self, state: &mut ReaderState) {
        debug_assert!(!state.load_slot_free, "releasing a load slot that is not held");
        state.load_slot_free = true;
        self.state_changed.notify_all();
    }

    fn wait_for_compute_slot<'a>(
        &'a self,
        mut state: MutexGuard<'a, ReaderState>,
    ) -> Option<MutexGuard<'a, ReaderState>> {
        while state.compute_slots_free == 0 {
            if state.failed {
                return None;
            }
            state = self.state_changed.wait(state).expect("reader state mutex poisoned");
        }
        if state.failed {
            return None;
        }
        state.compute_slots_free -= 1;
        Some(state)
    }

    fn release_compute_slot(&self, state: &mut ReaderState) {
        state.compute_slots_free += 1;
        self.state_changed.notify_all();
    }

    fn fail(&self, state: &mut ReaderState) {
        state.failed = true;
        self.state_changed.notify_all();
    }
}

/// Streams concatenated BGZF members into caller-supplied buffers using a
/// fixed pool of worker decompressors.
///
/// `read_more` appends whole decompressed members to the destination,
/// bounded by its capacity; the destination therefore controls batch size.
/// After an error the reader is unusable and must be reconstructed.
pub struct ParallelBgzfReader<R> {
    /// Accessed only while holding the load slot; the mutex satisfies the
    /// compiler, the slot provides the actual exclusion.
    input: Mutex<R>,
    readers: Vec<BlockReader>,
    shared: Shared,
}

impl<R: Read + Send> ParallelBgzfReader<R> {
    /// Binds the reader to `input` with `workers` decompression threads
    /// (0 = one per CPU, capped at 32).
    pub fn new(input: R, workers: usize) -> Self {
        let workers = match workers {
            0 => num_cpus::get().clamp(1, MAX_WORKERS),
            n => n.clamp(1, MAX_WORKERS),
        };
        debug!("parallel BGZF reader with {} workers", workers);
        Self {
            input: Mutex::new(input),
            readers: (0..workers).map(|_| BlockReader::new()).collect(),
            shared: Shared {
                state: Mutex::new(ReaderState {
                    slots: vec![Slot::Empty; workers],
                    next_offset: 0,
                    committed: 0,
                    pending_block_size: 0,
                    load_slot_free: true,
                    compute_slots_free: workers,
                    eof: false,
                    failed: false,
                }),
                state_changed: Condvar::new(),
            },
        }
    }

    /// True once the input stream is exhausted.
    pub fn is_eof(&self) -> bool {
        self.shared.lock().eof
    }

    /// Appends at least one more decompressed member to `dest`, bounded by
    /// its capacity.
    ///
    /// A member that does not fit is loaded anyway and deferred: the next
    /// call places it at the then-current end of `dest`, growing the buffer
    /// if even an empty `dest` cannot hold it. Returns `false` only at end
    /// of input with nothing deferred, so `while reader.read_more(&mut buf)?`
    /// drains the stream regardless of capacity.
    pub fn read_more(&mut self, dest: &mut Vec<u8>) -> Result<bool> {
        assert!(dest.capacity() > 0, "destination buffer must have capacity");
        let start_len = dest.len();
        let (baseline, had_pending) = {
            let mut state = self.shared.lock();
            assert!(!state.failed, "BGZF reader is unusable after a failure; reopen the stream");

            // Patch the deferred member (at most one) to land where the
            // caller's data currently ends.
            let mut had_pending = false;
            for slot in state.slots.iter_mut() {
                if let Slot::Pending { size } = *slot {
                    *slot = Slot::Ready { offset: start_len, size };
                    had_pending = true;
                }
            }
            let baseline = start_len + state.pending_block_size;
            state.pending_block_size = 0;
            state.next_offset = baseline;
            state.committed = baseline;
            (baseline, had_pending)
        };

        // The deferred member must fit even if the caller's capacity does
        // not cover it; everything else is bounded by the capacity.
        if dest.capacity() < baseline {
            dest.reserve(baseline - dest.len());
        }
        let capacity = dest.capacity();
        dest.resize(capacity, 0);
        let cells = dest.as_mut_slice().as_sync_slice();

        let shared = &self.shared;
        let input = &self.input;
        let joined = crossbeam::scope(|scope| {
            let mut handles = Vec::with_capacity(self.readers.len());
            for (index, reader) in self.readers.iter_mut().enumerate() {
                handles
                    .push(scope.spawn(move |_| run_worker(index, reader, input, shared, cells)));
            }
            handles.into_iter().map(|handle| handle.join()).collect::<Vec<_>>()
        })
        .map_err(|_| Error::WorkerPanicked)?;

        let mut first_error = None;
        for result in joined {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => first_error = first_error.or(Some(e)),
                Err(_) => first_error = first_error.or(Some(Error::WorkerPanicked)),
            }
        }

        let (committed, deferred) = {
            let state = self.shared.lock();
            (state.committed, state.pending_block_size != 0)
        };
        dest.truncate(committed);
        trace!("read_more delivered {} bytes, deferred: {}", committed - start_len, deferred);

        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(had_pending || committed != baseline || deferred)
    }
}

impl ParallelBgzfReader<BufReader<File>> {
    /// Opens a BGZF file with `workers` decompression threads (0 = auto).
    pub fn open<P: AsRef<Path>>(path: P, workers: usize) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!("opened BGZF stream on {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file), workers))
    }
}

/// The cooperative worker loop: deliver any block this worker holds, then
/// load the next member and claim its destination range, deferring it when
/// the destination is full.
fn run_worker<R: Read>(
    index: usize,
    reader: &mut BlockReader,
    input: &Mutex<R>,
    shared: &Shared,
    dest: &[SyncCell<u8>],
) -> Result<()> {
    let mut state = shared.lock();
    loop {
        if state.failed {
            return Ok(());
        }

        // First get rid of any block that is pending delivery.
        if let Slot::Ready { offset, size } = state.slots[index] {
            state = match shared.wait_for_compute_slot(state) {
                Some(state) => state,
                None => return Ok(()),
            };
            drop(state);
            // SAFETY: destination ranges are assigned under the load slot
            // from a strictly advancing cursor, so no two workers ever hold
            // overlapping ranges, and `offset + size` was checked against
            // the destination capacity at assignment.
            let out =
                unsafe { std::slice::from_raw_parts_mut(dest[offset].as_ptr(), size) };
            let delivered = reader.decompress(out);
            state = shared.lock();
            shared.release_compute_slot(&mut state);
            match delivered {
                Ok(()) => state.slots[index] = Slot::Empty,
                Err(e) => {
                    shared.fail(&mut state);
                    return Err(e);
                }
            }
        }

        if state.eof {
            trace!("worker {} terminating at eof", index);
            return Ok(());
        }

        // Load the next member.
        state = match shared.wait_for_load_slot(state) {
            Some(state) => state,
            None => return Ok(()),
        };
        if state.next_offset >= dest.len() {
            // Destination already spoken for up to capacity.
            shared.release_load_slot(&mut state);
            return Ok(());
        }
        drop(state);

        // BGZF allows empty terminator members anywhere; drain them until a
        // real member or end of input.
        let mut block_size = 0usize;
        let mut at_eof = false;
        let loaded: Result<()> = {
            let mut input = input.lock().expect("input stream mutex poisoned");
            loop {
                match reader.read_block(&mut *input) {
                    Ok(Some(0)) => continue,
                    Ok(Some(size)) => {
                        block_size = size as usize;
                        break Ok(());
                    }
                    Ok(None) => {
                        at_eof = true;
                        break Ok(());
                    }
                    Err(e) => break Err(e),
                }
            }
        };

        state = shared.lock();
        if at_eof {
            state.eof = true;
        }
        if let Err(e) = loaded {
            shared.release_load_slot(&mut state);
            shared.fail(&mut state);
            return Err(e);
        }
        if block_size == 0 {
            debug_assert!(at_eof, "stopped loading before end of input");
            shared.release_load_slot(&mut state);
            debug!("worker {} reached eof while skipping empty members", index);
            return Ok(());
        }

        let offset = state.next_offset;
        state.next_offset += block_size;
        if state.next_offset <= dest.len() {
            state.slots[index] = Slot::Ready { offset, size: block_size };
            state.committed = state.next_offset;
            state.pending_block_size = 0;
            shared.release_load_slot(&mut state);
        } else {
            // Back-pressure: remember the member for the next call.
            state.slots[index] = Slot::Pending { size: block_size };
            state.pending_block_size = block_size;
            trace!("worker {} deferring {} bytes, destination full", index, block_size);
            shared.release_load_slot(&mut state);
            return Ok(());
        }
    }
}
