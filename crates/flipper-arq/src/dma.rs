/// One logical ARAM DMA operation, emitted exactly once per dispatch or
/// chunk.
///
/// `mainmem`/`aram` are already direction-ordered: for an ARAM→MRAM request
/// the scheduler swaps the caller's source/dest before emitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaOp {
    pub kind: u32,
    pub mainmem: u32,
    pub aram: u32,
    pub length: u32,
}

/// Capability that starts a hardware ARAM transfer.
///
/// A production build pokes the real DMA engine registers here; harness
/// builds inject [`RecordingDma`] and assert on the emitted sequence.
pub trait DmaEngine {
    fn start(&mut self, op: DmaOp);
}

/// Upper bound on the recorded operation log.
pub const DMA_LOG_CAPACITY: usize = 2048;

/// [`DmaEngine`] that records every emitted operation, bounded at
/// [`DMA_LOG_CAPACITY`]; operations past the bound are dropped.
#[derive(Debug, Default, Clone)]
pub struct RecordingDma {
    ops: Vec<DmaOp>,
}

impl RecordingDma {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operations emitted since construction or the last [`clear`](Self::clear).
    pub fn ops(&self) -> &[DmaOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl DmaEngine for RecordingDma {
    fn start(&mut self, op: DmaOp) {
        if self.ops.len() < DMA_LOG_CAPACITY {
            self.ops.push(op);
        }
    }
}
