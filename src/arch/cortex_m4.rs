//! # Cortex-M4 Clock Port
//!
//! The only platform-specific collaborator the scheduler core actually
//! consumes is a monotonic microsecond clock (the `Clock` trait).
//! On real hardware that clock is derived from the Cortex-M4's DWT cycle
//! counter, which free-runs at the core clock frequency independent of
//! SysTick and survives interrupts without any reload bookkeeping.
//!
//! There is no context-switch, PendSV, or SysTick-reload machinery here:
//! the scheduler is cooperative and non-preemptive, so the per-tick
//! entry point is called directly from the firmware's main loop, not
//! from an interrupt handler.

use cortex_m::peripheral::DWT;

use crate::config::SYSTEM_CLOCK_HZ;
use crate::time::Clock;

/// Enable the DWT cycle counter. Must be called once at startup, before
/// any [`DwtClock`] is read. Takes the DCB and DWT peripherals by
/// exclusive reference so the caller can only call this once per
/// `cortex_m::Peripherals::take()`.
pub fn enable_cycle_counter(dcb: &mut cortex_m::peripheral::DCB, dwt: &mut cortex_m::peripheral::DWT) {
    dcb.enable_trace();
    unsafe { dwt.cyccnt.write(0) };
    dwt.enable_cycle_counter();
}

/// A [`Clock`] backed by the DWT cycle counter, scaled to microseconds
/// by [`SYSTEM_CLOCK_HZ`]. `CYCCNT` is a free-running 32-bit counter
/// that wraps silently; `now_us` divides before truncating, which wraps
/// proportionally more often but preserves the same wrap-safety
/// property relied on elsewhere (`cmp_time_us`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DwtClock;

impl Clock for DwtClock {
    fn now_us(&self) -> u32 {
        let cycles = DWT::cycle_count();
        cycles / (SYSTEM_CLOCK_HZ / 1_000_000)
    }
}
