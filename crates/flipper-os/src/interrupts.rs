/// Interrupt-enable state with observable disable/restore counters.
///
/// Critical sections follow the disable → work → restore pattern. `disable`
/// and `restore` both return the state that was in effect before the call,
/// so nesting composes: a disable inside an already-disabled region hands
/// back `false`, and the matching restore keeps interrupts disabled.
///
/// The model is single-threaded; the counters exist because replayed traces
/// observe how many times each primitive ran, not because anything needs
/// guarding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interrupts {
    enabled: bool,
    disable_calls: u32,
    restore_calls: u32,
}

impl Interrupts {
    pub const fn new() -> Self {
        Self {
            enabled: true,
            disable_calls: 0,
            restore_calls: 0,
        }
    }

    /// Disables interrupts; returns whether they were enabled before.
    pub fn disable(&mut self) -> bool {
        let prev = self.enabled;
        self.disable_calls += 1;
        self.enabled = false;
        prev
    }

    /// Enables interrupts; returns whether they were enabled before.
    pub fn enable(&mut self) -> bool {
        let prev = self.enabled;
        self.enabled = true;
        prev
    }

    /// Restores the state returned by a matching [`disable`](Self::disable);
    /// returns whether interrupts were enabled before this call.
    pub fn restore(&mut self, prev: bool) -> bool {
        let was = self.enabled;
        self.restore_calls += 1;
        self.enabled = prev;
        was
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub const fn disable_calls(&self) -> u32 {
        self.disable_calls
    }

    pub const fn restore_calls(&self) -> u32 {
        self.restore_calls
    }
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}
