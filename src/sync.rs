//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions for the Cortex-M4. The
//! scheduler itself has no concurrency (single-threaded cooperative,
//! no preemption) — but [`crate::kernel`]'s singleton instance is
//! reachable from both the firmware main loop and any ISR that calls
//! into the control surface (e.g. a `check_func` signaling from an
//! interrupt context), so every access to that shared instance is wrapped
//! in a critical section here.

use cortex_m::interrupt;

/// Execute a closure within a critical section (interrupts disabled).
///
/// This is the primary mechanism for safely accessing the global
/// scheduler instance in [`crate::kernel`]. Interrupts are disabled on
/// entry and restored on exit, ensuring atomicity of the enclosed
/// operation.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|_cs| {
///     // Access shared state safely
/// });
/// ```
///
/// # Performance
/// Keep critical sections as short as possible to minimize interrupt latency.
/// The Cortex-M4's interrupt tail-chaining makes short critical sections
/// relatively inexpensive.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
