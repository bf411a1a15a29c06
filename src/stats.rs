//! # Moving-sum statistics
//!
//! Every accumulator in this crate — per-task execution/delta time, and
//! the system-wide check-function accumulators — uses the identical
//! recurrence `s <- s + (x - s/N)`. This yields an N-sample moving sum
//! whose average is `s / N`, computed entirely in integer arithmetic on
//! wrapping `u32`s (see `TASK_STATS_MOVING_SUM_COUNT`).

use crate::config::{MOVING_AVERAGE_CYCLE_TIME_ALPHA, TASK_STATS_MOVING_SUM_COUNT};

/// Feed one sample into a moving-sum accumulator.
///
/// Uses wrapping arithmetic throughout: `x - s/N` can itself wrap for a
/// single step, but the wraps cancel out over the recurrence exactly as
/// they do in the two's-complement C original, so a plain
/// `wrapping_add`/`wrapping_sub` pair reproduces it faithfully.
#[inline]
pub fn moving_sum_update(accumulator: u32, sample: u32, n: u32) -> u32 {
    accumulator.wrapping_add(sample.wrapping_sub(accumulator / n))
}

/// Per-task execution statistics, updated by `execute_task` when
/// statistics are enabled (see [`crate::scheduler::Scheduler::tick`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStats {
    pub moving_sum_execution_time: u32,
    pub moving_sum_delta_time: u32,
    pub total_execution_time: u32,
    pub max_execution_time: u32,
    pub moving_average_cycle_time: f32,
}

impl TaskStats {
    pub const fn new() -> Self {
        Self {
            moving_sum_execution_time: 0,
            moving_sum_delta_time: 0,
            total_execution_time: 0,
            max_execution_time: 0,
            moving_average_cycle_time: 0.0,
        }
    }

    /// Record one task execution: `execution_time` is the measured
    /// wall time of the task body; `delta_time` is the interval since
    /// its previous execution; `period` is the same interval used to
    /// drive the exponential cycle-time average.
    pub fn record_execution(&mut self, execution_time: u32, delta_time: u32, period: u32) {
        self.moving_sum_execution_time =
            moving_sum_update(self.moving_sum_execution_time, execution_time, TASK_STATS_MOVING_SUM_COUNT);
        self.moving_sum_delta_time =
            moving_sum_update(self.moving_sum_delta_time, delta_time, TASK_STATS_MOVING_SUM_COUNT);
        self.total_execution_time = self.total_execution_time.wrapping_add(execution_time);
        self.max_execution_time = self.max_execution_time.max(execution_time);
        self.moving_average_cycle_time += MOVING_AVERAGE_CYCLE_TIME_ALPHA
            * (period as f32 - self.moving_average_cycle_time);
    }

    pub fn reset(&mut self) {
        self.moving_sum_execution_time = 0;
        self.moving_sum_delta_time = 0;
        self.total_execution_time = 0;
        self.max_execution_time = 0;
    }

    pub fn reset_max_execution_time(&mut self) {
        self.max_execution_time = 0;
    }

    pub fn average_execution_time(&self) -> u32 {
        self.moving_sum_execution_time / TASK_STATS_MOVING_SUM_COUNT
    }

    pub fn average_delta_time(&self) -> u32 {
        self.moving_sum_delta_time / TASK_STATS_MOVING_SUM_COUNT
    }
}

/// A single set of accumulators shared across *all* event-driven tasks'
/// check functions. This is intentionally an aggregate, not per-task:
/// it is a metric of event-dispatch overhead as a whole, not of any one
/// task (an intentional aggregate metric of event-dispatch overhead, not per-task).
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckFuncStats {
    pub max_execution_time: u32,
    pub total_execution_time: u32,
    pub moving_sum_execution_time: u32,
    pub moving_sum_delta_time: u32,
}

impl CheckFuncStats {
    pub const fn new() -> Self {
        Self {
            max_execution_time: 0,
            total_execution_time: 0,
            moving_sum_execution_time: 0,
            moving_sum_delta_time: 0,
        }
    }

    pub fn record(&mut self, execution_time: u32, delta_time: u32) {
        self.moving_sum_execution_time =
            moving_sum_update(self.moving_sum_execution_time, execution_time, TASK_STATS_MOVING_SUM_COUNT);
        self.moving_sum_delta_time =
            moving_sum_update(self.moving_sum_delta_time, delta_time, TASK_STATS_MOVING_SUM_COUNT);
        self.total_execution_time = self.total_execution_time.wrapping_add(execution_time);
        self.max_execution_time = self.max_execution_time.max(execution_time);
    }

    pub fn reset_max_execution_time(&mut self) {
        self.max_execution_time = 0;
    }

    pub fn average_execution_time(&self) -> u32 {
        self.moving_sum_execution_time / TASK_STATS_MOVING_SUM_COUNT
    }

    pub fn average_delta_time(&self) -> u32 {
        self.moving_sum_delta_time / TASK_STATS_MOVING_SUM_COUNT
    }

    pub fn info(&self) -> CheckFuncInfo {
        CheckFuncInfo {
            max_execution_time: self.max_execution_time,
            total_execution_time: self.total_execution_time,
            average_execution_time: self.average_execution_time(),
            average_delta_time: self.average_delta_time(),
        }
    }
}

/// A snapshot of the aggregate check-function accumulators, returned by
/// `get_check_func_info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckFuncInfo {
    pub max_execution_time: u32,
    pub total_execution_time: u32,
    pub average_execution_time: u32,
    pub average_delta_time: u32,
}

/// Saturation signal: fraction of ticks in which *any* non-realtime task
/// was waiting in the ready queue. Computed from two counters that the
/// scheduler's Phase B increments every tick, then reset by
/// [`SystemLoad::sample`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoad {
    total_waiting_tasks: u32,
    total_waiting_tasks_samples: u32,
    average_system_load_percent: u16,
}

impl SystemLoad {
    pub const fn new() -> Self {
        Self { total_waiting_tasks: 0, total_waiting_tasks_samples: 0, average_system_load_percent: 0 }
    }

    pub fn record_tick(&mut self, waiting_tasks: u32) {
        self.total_waiting_tasks_samples = self.total_waiting_tasks_samples.wrapping_add(1);
        self.total_waiting_tasks = self.total_waiting_tasks.wrapping_add(waiting_tasks);
    }

    /// Compute `100 * total_waiting_tasks / total_waiting_tasks_samples`,
    /// reset both accumulators, and retain the result. Returns the
    /// retained value unchanged if no samples were taken since the last
    /// call.
    pub fn sample(&mut self) -> u16 {
        if self.total_waiting_tasks_samples > 0 {
            self.average_system_load_percent =
                (100u32 * self.total_waiting_tasks / self.total_waiting_tasks_samples) as u16;
            self.total_waiting_tasks = 0;
            self.total_waiting_tasks_samples = 0;
        }
        self.average_system_load_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_sum_contracts_to_constant_input() {
        let mut s: u32 = 0;
        for _ in 0..(10 * TASK_STATS_MOVING_SUM_COUNT) {
            s = moving_sum_update(s, 200, TASK_STATS_MOVING_SUM_COUNT);
        }
        let avg = s / TASK_STATS_MOVING_SUM_COUNT;
        assert!((avg as i64 - 200).abs() <= 1, "average should converge to 200, got {avg}");
    }

    #[test]
    fn task_stats_tracks_max_and_total() {
        let mut stats = TaskStats::new();
        stats.record_execution(10, 1000, 1000);
        stats.record_execution(50, 1000, 1000);
        stats.record_execution(5, 1000, 1000);
        assert_eq!(stats.max_execution_time, 50);
        assert_eq!(stats.total_execution_time, 65);
    }

    #[test]
    fn task_stats_reset_clears_accumulators_but_not_cycle_time() {
        let mut stats = TaskStats::new();
        stats.record_execution(10, 1000, 1000);
        stats.reset();
        assert_eq!(stats.moving_sum_execution_time, 0);
        assert_eq!(stats.total_execution_time, 0);
        assert_eq!(stats.max_execution_time, 0);
    }

    #[test]
    fn system_load_percent_of_waiting_tasks() {
        let mut load = SystemLoad::new();
        for _ in 0..100 {
            load.record_tick(2);
        }
        assert_eq!(load.sample(), 200);
        // Accumulators reset, but the retained percent carries over until
        // the next window produces new samples.
        assert_eq!(load.sample(), 200);
    }

    #[test]
    fn check_func_stats_accumulate_across_calls() {
        let mut stats = CheckFuncStats::new();
        stats.record(7, 100);
        stats.record(9, 200);
        assert_eq!(stats.max_execution_time, 9);
        assert_eq!(stats.total_execution_time, 16);
    }
}
