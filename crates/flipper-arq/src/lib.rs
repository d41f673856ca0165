#![forbid(unsafe_code)]

//! ARAM Request Queue: the dual-priority auxiliary-RAM DMA scheduler.
//!
//! Callers post transfer requests as 32-byte records in console memory; the
//! scheduler keeps two FIFO lanes (high and low priority), dispatches at
//! most one in-flight request per lane, splits oversized low-priority
//! transfers into chunks, and completes work one step per simulated
//! interrupt tick. Only the control plane is modeled: a dispatch emits a
//! [`DmaOp`] through the injected [`DmaEngine`], no bytes move.
//!
//! Calling discipline is post-then-pump: after posting, drive
//! [`ArqScheduler::interrupt_service_routine`] once per completion (once per
//! chunk for a chunked transfer) exactly as the hardware interrupt would.

mod dma;
mod request;
mod scheduler;

pub use dma::{DmaEngine, DmaOp, RecordingDma, DMA_LOG_CAPACITY};
pub use request::{
    field, DEFAULT_CHUNK_SIZE, KIND_ARAM_TO_MRAM, KIND_MRAM_TO_ARAM, PRIORITY_HIGH, PRIORITY_LOW,
    REQUEST_SIZE,
};
pub use scheduler::ArqScheduler;
