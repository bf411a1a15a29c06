//! # Task descriptors
//!
//! A task is either **time-driven** (runs on a period, no `check_func`)
//! or **event-driven** (`check_func` present; the scheduler polls it and
//! ages the task once it has signaled). Every descriptor lives in the
//! scheduler's static task table for the process lifetime — there is no
//! task creation after startup.

use crate::config::SCHEDULER_DELAY_LIMIT;
use crate::stats::TaskStats;

/// A task body: takes the current timestamp, runs to completion before
/// returning. Plain `fn` pointers rather than closures — no allocation,
/// no captured state beyond what the task reaches via its own globals.
pub type TaskFn = fn(now_us: u32);

/// An event-driven task's readiness predicate: `(now, age_since_last_exec)
/// -> ready`.
pub type CheckFn = fn(now_us: u32, age_us: u32) -> bool;

/// Static scheduling priority. `Realtime` is a distinguished sentinel:
/// only the three realtime-pipeline tasks (gyro, filter, PID) may carry
/// it, and such tasks are scheduled exclusively by the realtime slot
/// (Phase A), never selected by dynamic-priority aging (Phase B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum StaticPriority {
    Idle = 0,
    Low = 1,
    Medium = 3,
    High = 5,
    Realtime = 6,
}

impl StaticPriority {
    #[inline]
    pub const fn weight(self) -> u32 {
        self as u32
    }
}

/// Either a concrete task index, or the sentinel that resolves to
/// whichever task is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    Task(usize),
    SelfTask,
}

/// The `TASK_SELF` sentinel, for use from inside a running task body.
pub const TASK_SELF: TaskId = TaskId::SelfTask;

/// Static, at-registration configuration for one task.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Task body. `None` marks an unpopulated slot: `set_enabled` will
    /// silently refuse to enable it.
    pub task_func: Option<TaskFn>,
    /// Presence marks the task event-driven; absence marks it
    /// time-driven.
    pub check_func: Option<CheckFn>,
    /// Target interval between executions, in microseconds. Floored to
    /// `SCHEDULER_DELAY_LIMIT` at construction and on every `reschedule`.
    pub desired_period_us: u32,
    pub static_priority: StaticPriority,
}

impl TaskConfig {
    pub const fn clamp_period(period_us: u32) -> u32 {
        if period_us < SCHEDULER_DELAY_LIMIT {
            SCHEDULER_DELAY_LIMIT
        } else {
            period_us
        }
    }
}

/// A task's full runtime record: immutable-ish config plus the mutable
/// scheduling state the tick algorithm reads and writes every cycle.
#[derive(Debug, Clone, Copy)]
pub struct TaskDescriptor {
    pub id: usize,
    pub task_func: Option<TaskFn>,
    pub check_func: Option<CheckFn>,
    pub desired_period_us: u32,
    pub static_priority: StaticPriority,

    pub last_executed_at: u32,
    pub last_desired_at: u32,
    pub last_signaled_at: u32,
    pub dynamic_priority: u32,
    pub task_age_cycles: u32,
    pub task_latest_delta_time: u32,

    pub stats: TaskStats,
}

impl TaskDescriptor {
    pub const fn new(id: usize, config: TaskConfig) -> Self {
        Self {
            id,
            task_func: config.task_func,
            check_func: config.check_func,
            desired_period_us: TaskConfig::clamp_period(config.desired_period_us),
            static_priority: config.static_priority,
            last_executed_at: 0,
            last_desired_at: 0,
            last_signaled_at: 0,
            dynamic_priority: 0,
            task_age_cycles: 0,
            task_latest_delta_time: 0,
            stats: TaskStats::new(),
        }
    }

    #[inline]
    pub fn is_event_driven(&self) -> bool {
        self.check_func.is_some()
    }

    #[inline]
    pub fn is_realtime(&self) -> bool {
        self.static_priority == StaticPriority::Realtime
    }

    pub fn reschedule(&mut self, new_period_us: u32) {
        self.desired_period_us = TaskConfig::clamp_period(new_period_us);
    }
}

/// A snapshot of one task's static configuration and accumulated
/// statistics, returned by `get_task_info`.
#[derive(Debug, Clone, Copy)]
pub struct TaskInfo {
    pub is_enabled: bool,
    pub desired_period_us: u32,
    pub static_priority: StaticPriority,
    pub max_execution_time: u32,
    pub total_execution_time: u32,
    pub average_execution_time: u32,
    pub average_delta_time: u32,
    pub latest_delta_time: u32,
    pub moving_average_cycle_time: f32,
}
