use bitflags::bitflags;

bitflags! {
    /// Per-channel SI status/error bits, as reported by the hardware status
    /// register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SiStatus: u32 {
        const UNDER_RUN = 0x0001;
        const OVER_RUN = 0x0002;
        const COLLISION = 0x0004;
        const NO_RESPONSE = 0x0008;
        /// Write in progress / last write pending.
        const WRST = 0x0010;
        /// Read status: fresh response words are latched.
        const RDST = 0x0020;
    }
}
