#![forbid(unsafe_code)]

//! Serial Interface transfer/alarm scheduler.
//!
//! The SI bus carries deferred controller and peripheral I/O over four
//! channels. Issuing a transfer either completes immediately against the
//! hardware (fast path, nothing recorded) or parks a packet record in
//! console memory for a later retry, arming the channel's alarm when the
//! transfer is not yet due. Response words latched by the hardware are consumed
//! at most once per [`SiScheduler::get_response`] call, and the controller
//! polling cadence comes from the TV-format-keyed sampling-rate tables.
//!
//! Hardware registers have no host-side equivalent, so their reads are
//! injected capabilities: [`ResponseSource`] for per-channel status and
//! response words, [`SiHardware`] for the immediate-transfer attempt, and
//! [`VideoSource`] for the TV format and interlace state. Harness builds
//! seed [`SeededResponses`], [`SeededSiHardware`], and [`SeededVideo`].

mod layout;
mod scheduler;
mod seed;
mod status;

pub use layout::{alarm_field, packet_field, SiMemoryMap, ALARM_STRIDE, PACKET_STRIDE};
pub use scheduler::{
    tv, ResponseSource, SiError, SiHardware, SiScheduler, VideoSource, SI_CHANNELS,
};
pub use seed::{SeededResponses, SeededSiHardware, SeededVideo};
pub use status::SiStatus;
