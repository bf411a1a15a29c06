//! # Kernel
//!
//! The firmware-facing control surface: a single global [`Scheduler`]
//! instance, owned here rather than hidden inside `scheduler.rs` itself,
//! and guarded by the same critical-section discipline the rest of this
//! crate uses for state reachable from both the main loop and interrupt
//! context.
//!
//! ## Startup sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::scheduler_init(configs, roles) ← build the task table
//!         ├─► kernel::scheduler_enable_gyro()         ← once the gyro driver is up
//!         └─► loop { kernel::scheduler(&clock, &debug, &pipeline) } ← hot loop, no return
//! ```
//!
//! Every function here silently does nothing if called before
//! `scheduler_init`, matching the rest of the crate's "invalid input is
//! ignored, nothing panics" error-handling design.

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;

use crate::config::TASK_COUNT;
use crate::debug::DebugSink;
use crate::error::SchedulerError;
use crate::scheduler::{RealtimePipeline, Scheduler};
use crate::stats::CheckFuncInfo;
use crate::sync;
use crate::task::{TaskConfig, TaskId, TaskInfo};
use crate::time::Clock;

static SCHEDULER: Mutex<RefCell<Option<Scheduler<TASK_COUNT>>>> = Mutex::new(RefCell::new(None));

/// Build the global task table from `configs` and the four distinguished
/// role indices (system, gyro, filter, PID — see
/// [`Scheduler::new`]) and install it as the kernel's singleton
/// instance. Must be called exactly once, before any other function in
/// this module, from the main thread.
pub fn scheduler_init(
    configs: [TaskConfig; TASK_COUNT],
    system_task: usize,
    gyro_task: usize,
    filter_task: usize,
    pid_task: usize,
) -> Result<(), SchedulerError> {
    let scheduler = Scheduler::new(configs, system_task, gyro_task, filter_task, pid_task)?;
    sync::critical_section(|cs| {
        SCHEDULER.borrow(cs).replace(Some(scheduler));
    });
    Ok(())
}

/// Enable the realtime gyro/filter/PID slot. Call once the gyro driver
/// has finished its own startup sequence.
pub fn scheduler_enable_gyro() {
    with_scheduler(|s| s.enable_gyro());
}

/// Run one scheduling cycle. Call from the firmware's hot loop — this
/// does not return until the tick completes, and there is no
/// preemption, so it must be called often enough to keep the realtime
/// pipeline on cadence.
pub fn scheduler<C: Clock, D: DebugSink, P: RealtimePipeline>(clock: &C, debug: &D, pipeline: &P) {
    with_scheduler(|s| s.tick(clock, debug, pipeline));
}

/// Apply a closure to the global scheduler instance inside a critical
/// section, if it has been initialized. The single chokepoint every
/// control-surface function below routes through.
fn with_scheduler<R>(f: impl FnOnce(&mut Scheduler<TASK_COUNT>) -> R) -> Option<R> {
    sync::critical_section(|cs| SCHEDULER.borrow(cs).borrow_mut().as_mut().map(f))
}

pub fn reschedule(id: TaskId, new_period_us: u32) {
    with_scheduler(|s| s.reschedule(id, new_period_us));
}

pub fn set_enabled(id: TaskId, enabled: bool) {
    with_scheduler(|s| s.set_enabled(id, enabled));
}

pub fn is_enabled(id: TaskId) -> bool {
    with_scheduler(|s| s.is_enabled(id)).unwrap_or(false)
}

pub fn get_delta_time(id: TaskId) -> u32 {
    with_scheduler(|s| s.get_delta_time(id)).unwrap_or(0)
}

pub fn get_task_info(id: TaskId) -> Option<TaskInfo> {
    with_scheduler(|s| s.get_task_info(id)).flatten()
}

pub fn get_check_func_info() -> CheckFuncInfo {
    with_scheduler(|s| s.get_check_func_info()).unwrap_or_default()
}

pub fn reset_task_statistics(id: TaskId) {
    with_scheduler(|s| s.reset_task_statistics(id));
}

pub fn reset_task_max_execution_time(id: TaskId) {
    with_scheduler(|s| s.reset_task_max_execution_time(id));
}

pub fn reset_check_function_max_execution_time() {
    with_scheduler(|s| s.reset_check_function_max_execution_time());
}

/// Select the realtime-pipeline period basis: `true` phase-locks to
/// `last_desired_at` (never loses a sample), `false` anchors to
/// `last_executed_at` (never accumulates lag).
pub fn optimize_rate(enabled: bool) {
    with_scheduler(|s| s.set_rate_optimized(enabled));
}

pub fn set_calculate_task_statistics(enabled: bool) {
    with_scheduler(|s| s.set_calculate_task_statistics(enabled));
}

/// Sample and reset the system load accumulators. Intended to be called
/// from a low-priority task registered for that purpose, not from
/// arbitrary code, since sampling resets the counters for the next
/// window.
pub fn task_system_load() -> u16 {
    with_scheduler(|s| s.task_system_load()).unwrap_or(0)
}

// No `#[cfg(test)]` module here: every function in this file goes
// through `sync::critical_section`, which needs real Cortex-M interrupt
// primitives. The scheduling behavior this wraps is exercised directly
// against `Scheduler<N>` in `scheduler.rs`'s host tests instead.
