//! # Scheduler Configuration
//!
//! Compile-time constants governing scheduler behavior. All limits are
//! fixed at compile time — no dynamic allocation, no runtime tuning
//! beyond the explicit control-surface toggles in [`crate::scheduler`].

/// Floor for `desired_period_us`, in microseconds. `reschedule()` clamps
/// any requested period below this to prevent a misbehaving task from
/// clogging the scheduler with a sub-100us cadence.
pub const SCHEDULER_DELAY_LIMIT: u32 = 100;

/// Minimum slack (in microseconds) before the next realtime deadline
/// required for Phase B (dynamic-priority selection) to run at all when
/// the realtime pipeline did not execute this tick. Below this, the
/// scheduler skips straight past non-realtime work rather than risk
/// eating into gyro sampling jitter.
pub const GYRO_TASK_GUARD_INTERVAL_US: u32 = 10;

/// Assumed task execution time (microseconds) used for the admission
/// test when statistics are disabled and no measured average is
/// available.
pub const TASK_AVERAGE_EXECUTE_FALLBACK_US: u32 = 30;

/// Padding added to a task's measured average execution time before
/// the admission test, to absorb minor scheduling jitter.
pub const TASK_AVERAGE_EXECUTE_PADDING_US: u32 = 5;

/// Divisor `N` for the moving-sum statistics recurrence
/// `s <- s + (x - s/N)`. Larger values smooth more aggressively at the
/// cost of slower convergence (see property P5 in the design docs).
pub const TASK_STATS_MOVING_SUM_COUNT: u32 = 32;

/// Exponential smoothing factor for `moving_average_cycle_time`.
pub const MOVING_AVERAGE_CYCLE_TIME_ALPHA: f32 = 0.05;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
/// Consumed by the `arch` DWT-based microsecond clock.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Size of the global task table owned by [`crate::kernel`]'s singleton
/// scheduler instance. A firmware integration with a different task
/// count forks this constant (or bypasses `kernel` and builds its own
/// `Scheduler<N>` directly — the library itself is generic over `N`).
pub const TASK_COUNT: usize = 8;
