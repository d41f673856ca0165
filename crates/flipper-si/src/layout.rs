//! Console-memory layout of the per-channel SI records.

/// Size of one packet record, in bytes.
pub const PACKET_STRIDE: u32 = 0x20;

/// Size of one alarm record, in bytes.
pub const ALARM_STRIDE: u32 = 0x28;

/// Byte offsets inside a packet record.
pub mod packet_field {
    pub const CHAN: u32 = 0x00;
    pub const OUTPUT: u32 = 0x04;
    pub const OUTPUT_BYTES: u32 = 0x08;
    pub const INPUT: u32 = 0x0C;
    pub const INPUT_BYTES: u32 = 0x10;
    pub const CALLBACK: u32 = 0x14;
    /// Absolute due time, u64 ticks.
    pub const FIRE: u32 = 0x18;
}

/// Byte offsets inside an alarm record.
pub mod alarm_field {
    pub const HANDLER: u32 = 0x00;
    /// Absolute fire time, u64 ticks.
    pub const FIRE: u32 = 0x08;
    pub const QUEUE: u32 = 0x14;
}

/// Base addresses of the channel record arrays.
///
/// Defaults are the retail console addresses so RAM dumps line up against
/// real traces; a harness replaying a differently-linked image overrides
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SiMemoryMap {
    pub packet_base: u32,
    pub alarm_base: u32,
    /// Handler address written into every armed alarm.
    pub alarm_handler: u32,
    /// Queue-pointer token written into every armed alarm.
    pub alarm_queue: u32,
}

impl Default for SiMemoryMap {
    fn default() -> Self {
        Self {
            packet_base: 0x801A_6F98,
            alarm_base: 0x801A_7018,
            alarm_handler: 0x800D_9C38,
            alarm_queue: 0x801A_5E68,
        }
    }
}

impl SiMemoryMap {
    /// Address of channel `chan`'s packet record.
    pub fn packet(&self, chan: usize) -> u32 {
        self.packet_base + chan as u32 * PACKET_STRIDE
    }

    /// Address of channel `chan`'s alarm record.
    pub fn alarm(&self, chan: usize) -> u32 {
        self.alarm_base + chan as u32 * ALARM_STRIDE
    }
}
