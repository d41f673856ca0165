use flipper_mem::{ConsoleMemory, MemError, MemResult};
use flipper_os::{Clock, Interrupts};
use thiserror::Error;
use tracing::warn;

use crate::layout::{alarm_field, packet_field, SiMemoryMap};
use crate::status::SiStatus;

/// Number of SI channels.
pub const SI_CHANNELS: usize = 4;

/// TV formats as reported by the video interface.
pub mod tv {
    pub const NTSC: u32 = 0;
    pub const PAL: u32 = 1;
    pub const MPAL: u32 = 2;
    pub const EURGB60: u32 = 5;
}

/// Sampling schedules keyed by the requested poll interval in milliseconds
/// (0..=11): `(scan line, polls per frame)`.
///
/// Row 0 polls once per field: the whole field height minus the vblank
/// lead-in.
const XY_NTSC: [(u16, u8); 12] = [
    (246, 2),
    (15, 18),
    (30, 9),
    (44, 6),
    (52, 5),
    (65, 4),
    (87, 3),
    (87, 3),
    (87, 3),
    (131, 2),
    (131, 2),
    (131, 2),
];

const XY_PAL: [(u16, u8); 12] = [
    (296, 2),
    (15, 21),
    (29, 11),
    (45, 7),
    (52, 6),
    (63, 5),
    (78, 4),
    (104, 3),
    (104, 3),
    (104, 3),
    (104, 3),
    (156, 2),
];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SiError {
    #[error("invalid SI channel {chan}")]
    InvalidChannel { chan: i32 },

    #[error(transparent)]
    Mem(#[from] MemError),
}

/// Per-channel hardware status and latched response words.
///
/// Stands in for the memory-mapped SI status/response registers; a harness
/// seeds the words a real bus read would return.
pub trait ResponseSource {
    fn status(&self, chan: usize) -> u32;
    fn response(&self, chan: usize) -> (u32, u32);
}

/// The immediate-transfer attempt against the SI engine.
///
/// Returning `true` means the hardware accepted the transfer and the
/// scheduler records nothing. On the host no hardware exists, so harness
/// builds seed the outcome; a production port polls the real engine status
/// behind this same boundary.
pub trait SiHardware {
    fn try_transfer(&mut self, chan: usize, output: u32, output_bytes: u32) -> bool;
}

/// TV format and interlace state from the video interface.
pub trait VideoSource {
    fn tv_format(&self) -> u32;
    /// Low bit of the video clock-select register; doubles the sampling
    /// scan line when set.
    fn interlace_bit(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
struct Channel {
    xfer_time: u64,
    input_buffer: (u32, u32),
    input_buffer_valid: bool,
    alarm_armed: bool,
}

/// The SI transfer/alarm scheduler.
///
/// Owns the four channel records, the sampling-rate state, and the alarm
/// re-arm delta. Console memory, the clock, and the hardware capabilities
/// are passed into each operation so independent replay scenarios can share
/// nothing.
#[derive(Debug)]
pub struct SiScheduler {
    map: SiMemoryMap,
    channels: [Channel; SI_CHANNELS],
    /// Offset added to a deferred packet's due time when arming its alarm;
    /// models the slightly later second time read the real scheduler does
    /// between computing the due time and programming the alarm.
    rearm_delta: u64,
    sampling_rate: u32,
    xy_line: u32,
    xy_count: u32,
    set_xy_calls: u32,
}

impl Default for SiScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SiScheduler {
    pub fn new() -> Self {
        Self::with_map(SiMemoryMap::default())
    }

    pub fn with_map(map: SiMemoryMap) -> Self {
        Self {
            map,
            channels: [Channel::default(); SI_CHANNELS],
            rearm_delta: 0,
            sampling_rate: 0,
            xy_line: 0,
            xy_count: 0,
            set_xy_calls: 0,
        }
    }

    /// Clears all channel state and instrumentation; the memory map and
    /// console memory contents are left alone.
    pub fn reset(&mut self) {
        self.channels = [Channel::default(); SI_CHANNELS];
        self.rearm_delta = 0;
        self.sampling_rate = 0;
        self.xy_line = 0;
        self.xy_count = 0;
        self.set_xy_calls = 0;
    }

    pub fn memory_map(&self) -> SiMemoryMap {
        self.map
    }

    /// Seeds channel `chan`'s last-transfer timestamp, the base for
    /// delay-relative due times.
    pub fn set_xfer_time(&mut self, chan: usize, ticks: u64) {
        self.channels[chan].xfer_time = ticks;
    }

    pub fn xfer_time(&self, chan: usize) -> u64 {
        self.channels[chan].xfer_time
    }

    /// Seeds the alarm re-arm delta, in ticks.
    pub fn set_rearm_delta(&mut self, ticks: u64) {
        self.rearm_delta = ticks;
    }

    pub fn alarm_armed(&self, chan: usize) -> bool {
        self.channels[chan].alarm_armed
    }

    pub fn input_buffer_valid(&self, chan: usize) -> bool {
        self.channels[chan].input_buffer_valid
    }

    /// Seeds channel `chan`'s input buffer and valid flag, e.g. to replay a
    /// trace captured mid-exchange.
    pub fn seed_input_buffer(&mut self, chan: usize, words: (u32, u32), valid: bool) {
        self.channels[chan].input_buffer = words;
        self.channels[chan].input_buffer_valid = valid;
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Last recorded `(line, count)` sampling schedule.
    pub fn xy(&self) -> (u32, u32) {
        (self.xy_line, self.xy_count)
    }

    pub fn set_xy_calls(&self) -> u32 {
        self.set_xy_calls
    }

    /// Issues a transfer on `chan`.
    ///
    /// The transfer is due at `now` when `delay` is zero, otherwise at the
    /// channel's last transfer time plus `delay`. A due transfer the
    /// hardware accepts completes on the fast path with zero memory writes.
    /// Otherwise the packet record is written, and a not-yet-due transfer
    /// additionally arms the channel's alarm for the retry.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer<M: ConsoleMemory>(
        &mut self,
        mem: &mut M,
        clock: &Clock,
        hw: &mut impl SiHardware,
        chan: i32,
        output: u32,
        output_bytes: u32,
        input: u32,
        input_bytes: u32,
        callback: u32,
        delay: u64,
    ) -> Result<(), SiError> {
        let idx = channel_index(chan)?;
        let now = clock.now();
        let fire = if delay == 0 {
            now
        } else {
            self.channels[idx].xfer_time.wrapping_add(delay)
        };

        if now >= fire && hw.try_transfer(idx, output, output_bytes) {
            // Fast path: the hardware took it, nothing is recorded.
            return Ok(());
        }

        self.write_packet(mem, idx, output, output_bytes, input, input_bytes, callback, fire)?;
        if now < fire {
            self.arm_alarm(mem, idx, fire)?;
        }
        Ok(())
    }

    /// Consumes the latched response for `chan` into `out`.
    ///
    /// Fresh hardware response words (status RDST set) are latched into the
    /// channel's input buffer first. The buffer's valid flag is then read
    /// and unconditionally cleared, so a response is consumed at most once;
    /// the words are copied out only if it was set. Returns whether `out`
    /// was filled.
    pub fn get_response(
        &mut self,
        ints: &mut Interrupts,
        source: &impl ResponseSource,
        chan: i32,
        out: &mut [u32; 2],
    ) -> Result<bool, SiError> {
        let idx = channel_index(chan)?;

        let prev = ints.disable();
        let status = SiStatus::from_bits_retain(source.status(idx));
        if status.contains(SiStatus::RDST) {
            self.channels[idx].input_buffer = source.response(idx);
            self.channels[idx].input_buffer_valid = true;
        }

        let valid = self.channels[idx].input_buffer_valid;
        self.channels[idx].input_buffer_valid = false;
        if valid {
            let (w0, w1) = self.channels[idx].input_buffer;
            out[0] = w0;
            out[1] = w1;
        }
        ints.restore(prev);
        Ok(valid)
    }

    /// Sets the controller sampling rate, `msec` clamped to `0..=11`.
    ///
    /// Looks up the `(line, count)` schedule in the table for the current
    /// TV format, doubling the line when the interlace bit is set. An
    /// unrecognized format falls back to NTSC row 0 with a diagnostic
    /// rather than failing.
    pub fn set_sampling_rate(
        &mut self,
        ints: &mut Interrupts,
        video: &impl VideoSource,
        msec: u32,
    ) {
        let msec = msec.min(11);

        let prev = ints.disable();
        self.sampling_rate = msec;

        let (table, row) = match video.tv_format() {
            tv::NTSC | tv::MPAL | tv::EURGB60 => (&XY_NTSC, msec as usize),
            tv::PAL => (&XY_PAL, msec as usize),
            format => {
                warn!(format, "unknown TV format, using NTSC default");
                (&XY_NTSC, 0)
            }
        };
        let (line, count) = table[row];
        let factor = if video.interlace_bit() { 2 } else { 1 };
        self.set_xy(factor * u32::from(line), count);
        ints.restore(prev);
    }

    /// Re-applies the stored sampling rate, e.g. after a TV-format change.
    pub fn refresh_sampling_rate(&mut self, ints: &mut Interrupts, video: &impl VideoSource) {
        let rate = self.sampling_rate;
        self.set_sampling_rate(ints, video, rate);
    }

    fn set_xy(&mut self, line: u32, count: u8) {
        self.xy_line = line;
        self.xy_count = u32::from(count);
        self.set_xy_calls += 1;
    }

    #[allow(clippy::too_many_arguments)]
    fn write_packet<M: ConsoleMemory>(
        &mut self,
        mem: &mut M,
        idx: usize,
        output: u32,
        output_bytes: u32,
        input: u32,
        input_bytes: u32,
        callback: u32,
        fire: u64,
    ) -> MemResult<()> {
        let pkt = self.map.packet(idx);
        mem.store_u32(pkt + packet_field::CHAN, idx as u32)?;
        mem.store_u32(pkt + packet_field::OUTPUT, output)?;
        mem.store_u32(pkt + packet_field::OUTPUT_BYTES, output_bytes)?;
        mem.store_u32(pkt + packet_field::INPUT, input)?;
        mem.store_u32(pkt + packet_field::INPUT_BYTES, input_bytes)?;
        mem.store_u32(pkt + packet_field::CALLBACK, callback)?;
        mem.store_u64(pkt + packet_field::FIRE, fire)?;
        Ok(())
    }

    fn arm_alarm<M: ConsoleMemory>(&mut self, mem: &mut M, idx: usize, fire: u64) -> MemResult<()> {
        let alarm = self.map.alarm(idx);
        mem.store_u32(alarm + alarm_field::HANDLER, self.map.alarm_handler)?;
        mem.store_u64(alarm + alarm_field::FIRE, fire.wrapping_add(self.rearm_delta))?;
        mem.store_u32(alarm + alarm_field::QUEUE, self.map.alarm_queue)?;
        self.channels[idx].alarm_armed = true;
        Ok(())
    }
}

fn channel_index(chan: i32) -> Result<usize, SiError> {
    usize::try_from(chan)
        .ok()
        .filter(|&idx| idx < SI_CHANNELS)
        .ok_or(SiError::InvalidChannel { chan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{SeededResponses, SeededSiHardware, SeededVideo};
    use flipper_mem::Ram;

    fn ram() -> Ram {
        // Covers the default packet/alarm record arrays.
        Ram::new(0x801A_0000, 0x1_0000).unwrap()
    }

    #[test]
    fn invalid_channel_is_rejected_without_state_change() {
        let mut si = SiScheduler::new();
        let mut mem = ram();
        let clock = Clock::new();
        let mut hw = SeededSiHardware::accepting(false);

        for chan in [-1, 4, 5] {
            let got = si.transfer(&mut mem, &clock, &mut hw, chan, 0, 0, 0, 0, 0, 0);
            assert_eq!(got, Err(SiError::InvalidChannel { chan }));
        }
        assert_eq!(hw.attempts(), 0);

        let mut ints = Interrupts::new();
        let responses = SeededResponses::default();
        let mut out = [0u32; 2];
        assert_eq!(
            si.get_response(&mut ints, &responses, 4, &mut out),
            Err(SiError::InvalidChannel { chan: 4 })
        );
        // Rejection happens before the guarded region.
        assert_eq!(ints.disable_calls(), 0);
    }

    #[test]
    fn response_is_consumed_exactly_once() {
        let mut si = SiScheduler::new();
        let mut ints = Interrupts::new();
        let mut responses = SeededResponses::default();
        responses.set_status(1, SiStatus::RDST.bits());
        responses.set_response(1, 0x11, 0x22);

        let mut out = [0u32; 2];
        assert_eq!(si.get_response(&mut ints, &responses, 1, &mut out), Ok(true));
        assert_eq!(out, [0x11, 0x22]);
        assert!(!si.input_buffer_valid(1));

        // The latch refills from RDST on every call, so drop the bit first.
        responses.set_status(1, 0);
        out = [0xAAAA_AAAA, 0xBBBB_BBBB];
        assert_eq!(si.get_response(&mut ints, &responses, 1, &mut out), Ok(false));
        assert_eq!(out, [0xAAAA_AAAA, 0xBBBB_BBBB]);

        // One disable/restore pair per call.
        assert_eq!(ints.disable_calls(), 2);
        assert_eq!(ints.restore_calls(), 2);
    }

    #[test]
    fn stale_valid_flag_is_consumed_when_rdst_is_clear() {
        let mut si = SiScheduler::new();
        let mut ints = Interrupts::new();
        let mut responses = SeededResponses::default();
        responses.set_status(2, SiStatus::NO_RESPONSE.bits());

        // A seeded still-valid buffer is served without a fresh latch, and
        // the flag goes down either way.
        si.seed_input_buffer(2, (7, 8), true);
        let mut out = [0u32; 2];
        assert_eq!(si.get_response(&mut ints, &responses, 2, &mut out), Ok(true));
        assert_eq!(out, [7, 8]);
        assert!(!si.input_buffer_valid(2));

        assert_eq!(si.get_response(&mut ints, &responses, 2, &mut out), Ok(false));
    }

    #[test]
    fn sampling_rate_clamps_and_doubles_for_interlace() {
        let mut si = SiScheduler::new();
        let mut ints = Interrupts::new();

        let video = SeededVideo {
            format: tv::NTSC,
            interlace: false,
        };
        si.set_sampling_rate(&mut ints, &video, 35);
        assert_eq!(si.sampling_rate(), 11);
        assert_eq!(si.xy(), (131, 2));

        let video = SeededVideo {
            format: tv::PAL,
            interlace: true,
        };
        si.set_sampling_rate(&mut ints, &video, 0);
        assert_eq!(si.xy(), (2 * 296, 2));
        assert_eq!(si.set_xy_calls(), 2);
    }

    #[test]
    fn unknown_tv_format_falls_back_to_ntsc_row_zero() {
        let mut si = SiScheduler::new();
        let mut ints = Interrupts::new();

        let video = SeededVideo {
            format: 7,
            interlace: false,
        };
        si.set_sampling_rate(&mut ints, &video, 5);
        // The requested rate is still stored; only the lookup defaults.
        assert_eq!(si.sampling_rate(), 5);
        assert_eq!(si.xy(), (246, 2));
    }

    #[test]
    fn refresh_reapplies_the_stored_rate() {
        let mut si = SiScheduler::new();
        let mut ints = Interrupts::new();

        let ntsc = SeededVideo {
            format: tv::NTSC,
            interlace: false,
        };
        si.set_sampling_rate(&mut ints, &ntsc, 3);
        assert_eq!(si.xy(), (44, 6));

        let pal = SeededVideo {
            format: tv::PAL,
            interlace: false,
        };
        si.refresh_sampling_rate(&mut ints, &pal);
        assert_eq!(si.sampling_rate(), 3);
        assert_eq!(si.xy(), (45, 7));
        assert_eq!(si.set_xy_calls(), 2);
    }
}
