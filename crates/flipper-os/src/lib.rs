#![forbid(unsafe_code)]

//! Deterministic OS-level collaborators shared by the scheduler models.
//!
//! The console's OS layer contributes two things the schedulers observe:
//! the timebase (a monotonic counter clocked at a quarter of the bus clock)
//! and the interrupt-enable state manipulated by critical sections. Both are
//! modeled as plain values a harness seeds and inspects; nothing here runs
//! on its own.

mod clock;
mod interrupts;

pub use clock::{millis_to_ticks, seconds_to_ticks, Clock, BUS_CLOCK_HZ, TIMER_CLOCK_HZ};
pub use interrupts::Interrupts;
