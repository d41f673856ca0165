use flipper_mem::{ConsoleMemory, MemResult};

use crate::dma::{DmaEngine, DmaOp};
use crate::request::{field, DEFAULT_CHUNK_SIZE, KIND_MRAM_TO_ARAM, PRIORITY_HIGH, PRIORITY_LOW};

/// One priority lane: a FIFO of queued requests plus a single in-flight
/// slot. Addresses are console addresses, `0` = none. The tail goes stale
/// when the queue drains; only the head decides emptiness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Lane {
    head: u32,
    tail: u32,
    pending: u32,
    callback_due: bool,
}

impl Lane {
    fn reset(&mut self) {
        *self = Lane::default();
    }

    fn enqueue<M: ConsoleMemory>(&mut self, mem: &mut M, req: u32) -> MemResult<()> {
        if self.head != 0 {
            store_field(mem, self.tail, field::NEXT, req)?;
        } else {
            self.head = req;
        }
        self.tail = req;
        Ok(())
    }
}

/// The ARAM request scheduler.
///
/// One instance per replay scenario; all operations take the console memory
/// and the DMA capability explicitly so parallel scenarios stay independent.
#[derive(Debug)]
pub struct ArqScheduler {
    hi: Lane,
    lo: Lane,
    chunk_size: u32,
    callback_count: u32,
}

impl Default for ArqScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ArqScheduler {
    pub fn new() -> Self {
        Self {
            hi: Lane::default(),
            lo: Lane::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            callback_count: 0,
        }
    }

    /// Returns the scheduler to its post-init state: both lanes empty,
    /// default chunk size, instrumentation cleared.
    pub fn reset(&mut self) {
        self.hi.reset();
        self.lo.reset();
        self.chunk_size = DEFAULT_CHUNK_SIZE;
        self.callback_count = 0;
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Overrides the low-priority split size. Takes effect from the next
    /// chunk; an in-flight request keeps draining at the new size.
    pub fn set_chunk_size(&mut self, chunk_size: u32) {
        self.chunk_size = chunk_size;
    }

    /// Number of completion callbacks fired so far.
    pub fn callback_count(&self) -> u32 {
        self.callback_count
    }

    /// In-flight high-priority request, if any.
    pub fn pending_hi(&self) -> Option<u32> {
        (self.hi.pending != 0).then_some(self.hi.pending)
    }

    /// In-flight low-priority request, if any.
    pub fn pending_lo(&self) -> Option<u32> {
        (self.lo.pending != 0).then_some(self.lo.pending)
    }

    /// Writes the request record at `req` and appends it to the lane named
    /// by `priority`, then dispatches immediately if both lanes are idle
    /// (high tried first, low only if high stayed idle).
    ///
    /// An unrecognized `priority` writes the record but queues nothing; the
    /// call still succeeds. `_has_callback` exists for surface parity: a
    /// null caller callback is backed by the internal completion hook, so
    /// the stored flag is unconditionally `1`.
    #[allow(clippy::too_many_arguments)]
    pub fn post_request<M: ConsoleMemory, D: DmaEngine>(
        &mut self,
        mem: &mut M,
        dma: &mut D,
        req: u32,
        owner: u32,
        kind: u32,
        priority: u32,
        source: u32,
        dest: u32,
        length: u32,
        _has_callback: bool,
    ) -> MemResult<()> {
        store_field(mem, req, field::NEXT, 0)?;
        store_field(mem, req, field::OWNER, owner)?;
        store_field(mem, req, field::KIND, kind)?;
        store_field(mem, req, field::PRIORITY, priority)?;
        store_field(mem, req, field::SOURCE, source)?;
        store_field(mem, req, field::DEST, dest)?;
        store_field(mem, req, field::LENGTH, length)?;
        store_field(mem, req, field::HAS_CALLBACK, 1)?;

        match priority {
            PRIORITY_LOW => self.lo.enqueue(mem, req)?,
            PRIORITY_HIGH => self.hi.enqueue(mem, req)?,
            _ => {}
        }

        if self.hi.pending == 0 && self.lo.pending == 0 {
            self.pop_task_queue_hi(mem, dma)?;
            if self.hi.pending == 0 {
                self.service_queue_lo(mem, dma)?;
            }
        }
        Ok(())
    }

    /// Dispatches the head of the high-priority queue, if any: emits the
    /// whole transfer as one operation, marks it in flight, and flags the
    /// completion callback for the next interrupt tick.
    pub fn pop_task_queue_hi<M: ConsoleMemory, D: DmaEngine>(
        &mut self,
        mem: &mut M,
        dma: &mut D,
    ) -> MemResult<()> {
        if self.hi.head == 0 {
            return Ok(());
        }
        let req = self.hi.head;
        let kind = load_field(mem, req, field::KIND)?;
        let source = load_field(mem, req, field::SOURCE)?;
        let dest = load_field(mem, req, field::DEST)?;
        let length = load_field(mem, req, field::LENGTH)?;

        start_dma(dma, kind, source, dest, length);

        self.hi.callback_due = true;
        self.hi.pending = req;
        self.hi.head = load_field(mem, req, field::NEXT)?;
        Ok(())
    }

    /// Advances the low-priority lane by one chunk.
    ///
    /// Adopts the queue head as the in-flight request if the slot is free,
    /// then emits either the full remaining length (final chunk, completion
    /// flagged) or one `chunk_size` slice. The transfer cursor is rewritten
    /// unconditionally afterwards, final chunk included; the wrapped-around
    /// values are never read again once the completion flag is set.
    pub fn service_queue_lo<M: ConsoleMemory, D: DmaEngine>(
        &mut self,
        mem: &mut M,
        dma: &mut D,
    ) -> MemResult<()> {
        if self.lo.pending == 0 && self.lo.head != 0 {
            self.lo.pending = self.lo.head;
            self.lo.head = load_field(mem, self.lo.head, field::NEXT)?;
        }
        if self.lo.pending == 0 {
            return Ok(());
        }

        let req = self.lo.pending;
        let kind = load_field(mem, req, field::KIND)?;
        let source = load_field(mem, req, field::SOURCE)?;
        let dest = load_field(mem, req, field::DEST)?;
        let length = load_field(mem, req, field::LENGTH)?;

        if length <= self.chunk_size {
            start_dma(dma, kind, source, dest, length);
            self.lo.callback_due = true;
        } else {
            start_dma(dma, kind, source, dest, self.chunk_size);
        }

        store_field(mem, req, field::LENGTH, length.wrapping_sub(self.chunk_size))?;
        store_field(mem, req, field::SOURCE, source.wrapping_add(self.chunk_size))?;
        store_field(mem, req, field::DEST, dest.wrapping_add(self.chunk_size))?;
        Ok(())
    }

    /// One simulated hardware-completion tick.
    ///
    /// Fires at most one completion callback (high lane checked first),
    /// then always attempts a high-priority dispatch, and services the low
    /// lane only if the high lane did not just go busy.
    pub fn interrupt_service_routine<M: ConsoleMemory, D: DmaEngine>(
        &mut self,
        mem: &mut M,
        dma: &mut D,
    ) -> MemResult<()> {
        if self.hi.callback_due {
            self.callback_count += 1;
            self.hi.pending = 0;
            self.hi.callback_due = false;
        } else if self.lo.callback_due {
            self.callback_count += 1;
            self.lo.pending = 0;
            self.lo.callback_due = false;
        }

        self.pop_task_queue_hi(mem, dma)?;

        if self.hi.pending == 0 {
            self.service_queue_lo(mem, dma)?;
        }
        Ok(())
    }
}

fn load_field<M: ConsoleMemory>(mem: &M, req: u32, offset: u32) -> MemResult<u32> {
    mem.load_u32(req.wrapping_add(offset))
}

fn store_field<M: ConsoleMemory>(mem: &mut M, req: u32, offset: u32, value: u32) -> MemResult<()> {
    mem.store_u32(req.wrapping_add(offset), value)
}

fn start_dma<D: DmaEngine>(dma: &mut D, kind: u32, source: u32, dest: u32, length: u32) {
    let op = if kind == KIND_MRAM_TO_ARAM {
        DmaOp {
            kind,
            mainmem: source,
            aram: dest,
            length,
        }
    } else {
        DmaOp {
            kind,
            mainmem: dest,
            aram: source,
            length,
        }
    };
    dma.start(op);
}
