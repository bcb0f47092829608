use std::sync::atomic::{AtomicBool, Ordering};

/// Clock and preemption state shared between the guest-CPU context and the
/// host timer context.
///
/// The timer fires on its own thread at the guest's configured tick rate and
/// must never block on the CPU loop (or vice versa), so both flags are
/// lock-free atomics rather than mutex-guarded state.
#[derive(Debug, Default)]
pub struct ClockFlags {
    tick_enabled: AtomicBool,
    preempted: AtomicBool,
}

impl ClockFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set by the guest's START CLOCK / STOP CLOCK entry points.
    pub fn set_tick_enabled(&self, enabled: bool) {
        self.tick_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn tick_enabled(&self) -> bool {
        self.tick_enabled.load(Ordering::SeqCst)
    }

    /// Marks a timer/interrupt emulation as conceptually in progress;
    /// EXIT REGION consults this before re-enabling guest interrupts.
    pub fn set_preempted(&self, preempted: bool) {
        self.preempted.store(preempted, Ordering::SeqCst);
    }

    pub fn preempted(&self) -> bool {
        self.preempted.load(Ordering::SeqCst)
    }

    /// Periodic timer hook (MP/M runs it at 60 Hz). Returns true iff the
    /// guest has asked for tick delivery; actually raising the guest's tick
    /// flag is the interrupt emulation's job.
    pub fn timer_tick(&self) -> bool {
        self.tick_enabled()
    }
}
