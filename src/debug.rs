//! # Debug trace sink
//!
//! Models the firmware's `DEBUG_SET(channel, slot, value)` trace macro as
//! a plain trait so the scheduler core stays decoupled from whatever
//! trace backend (ITM, a ring buffer, nothing at all) the target wires
//! up. Slots 0 and 1 are written by the gyro/PID task bodies themselves
//! (outside this crate); the scheduler only ever writes slots 2 and 3.

/// One of the four debug trace slots the flight-control firmware reserves
/// for scheduler-related timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSlot {
    /// Time spent in `gyroUpdate()`. Written by the gyro task itself.
    GyroUpdate = 0,
    /// Time spent in the PID controller. Written by the PID task itself.
    PidController = 1,
    /// Wall time spent in the scheduler tick, excluding task execution.
    SchedulerOverhead = 2,
    /// Wall time spent in the most recent check-function call.
    CheckFuncTime = 3,
}

/// A sink for scheduler trace timings.
pub trait DebugSink {
    /// Record `value` for `slot`. Implementations must not block or
    /// allocate — this may be called from the hot path on every tick.
    fn set(&self, slot: DebugSlot, value: i32);
}

/// A [`DebugSink`] that discards everything. The default when no trace
/// backend is wired up, mirroring a firmware build without
/// `SCHEDULER_DEBUG` defined.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDebugSink;

impl DebugSink for NoopDebugSink {
    #[inline]
    fn set(&self, _slot: DebugSlot, _value: i32) {}
}
