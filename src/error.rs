//! # Scheduler errors
//!
//! The scheduler's hot path (the per-tick control surface in
//! [`crate::scheduler`]) never errors — invalid ids and full queues are
//! silently ignored (see [`crate::scheduler::Scheduler`] docs). The one
//! place a typed error earns its keep is task-table construction, which
//! happens once at startup under firmware control, not from an
//! interrupt context.
use core::fmt;

/// Failure modes for building a [`crate::scheduler::Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// A role index (system/gyro/filter/pid task) pointed outside the
    /// task table.
    InvalidRoleIndex,
    /// The realtime pipeline tasks (gyro, filter, pid) did not carry
    /// [`crate::task::StaticPriority::Realtime`].
    RealtimeRoleNotRealtime,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::InvalidRoleIndex => {
                write!(f, "realtime role index out of bounds for task table")
            }
            SchedulerError::RealtimeRoleNotRealtime => {
                write!(f, "gyro/filter/pid role task must have Realtime static priority")
            }
        }
    }
}
