//! # Flight-control task scheduler
//!
//! A cooperative, priority-aged task scheduler for a hard-realtime
//! flight-control loop on a single-core microcontroller. Every tick
//! either services the realtime gyro/filter/PID pipeline on its
//! cadence, or opportunistically runs one lower-priority task from a
//! ready set — whichever fits in the slack before the next realtime
//! deadline.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 Firmware (demos/, out of scope)          │
//! ├────────────────────────────────────────────────────────┤
//! │               Kernel API (kernel.rs)                    │
//! │     scheduler_init() · scheduler_enable_gyro() · tick    │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │   Ready Queue      │  Statistics       │
//! │  scheduler.rs│   queue.rs         │  stats.rs         │
//! │  ─ tick()    │   ─ add/remove     │  ─ moving sums    │
//! │  ─ execute() │   ─ first/next     │  ─ system load    │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │              Task Model (task.rs)                       │
//! │    TaskDescriptor · StaticPriority · TaskId              │
//! ├────────────────────────────────────────────────────────┤
//! │         Clock / Debug (time.rs, debug.rs)                │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                 │
//! │            DWT cycle counter → microseconds             │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling algorithm
//!
//! Each tick runs two phases:
//!
//! 1. **Realtime slot.** If the gyro subsystem is enabled and due,
//!    execute gyro → (conditionally) filter → (conditionally) PID with
//!    absolute priority, bypassing the ready queue entirely.
//! 2. **Dynamic-priority selection.** Walk the ready queue, age each
//!    waiting task's dynamic priority (`1 + static_priority *
//!    age_cycles`), and run the highest-priority candidate — but only
//!    if it is predicted to finish before the next realtime deadline.
//!
//! ## Memory model
//!
//! - **No heap**: all state is statically sized by a const generic
//!   task-table capacity.
//! - **No `alloc`**: pure `core` only.
//! - **No dynamic task creation**: the task table is built once, at
//!   `Scheduler::new`, from a caller-supplied array of `TaskConfig`.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod debug;
pub mod error;
pub mod kernel;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod sync;
pub mod task;
pub mod time;

pub use debug::{DebugSink, DebugSlot};
pub use error::SchedulerError;
pub use scheduler::{RealtimePipeline, Scheduler};
pub use stats::CheckFuncInfo;
pub use task::{StaticPriority, TaskConfig, TaskId, TaskInfo, TASK_SELF};
pub use time::{cmp_time_us, Clock};
