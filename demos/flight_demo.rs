//! # Flight-control scheduler demo firmware
//!
//! Exercises the scheduler with a representative task mix: the realtime
//! gyro/filter/PID pipeline at 8kHz, plus a handful of lower-priority
//! tasks competing for the slack between realtime deadlines —
//! telemetry (time-driven), an event-driven task woken by a simulated
//! "packet arrived" flag, and the system task that samples the load
//! estimator. This binary is not part of the library surface — it is a
//! standalone firmware image built against the library crate.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use cortex_m_rt::entry;
use panic_halt as _;

use flight_scheduler::arch::cortex_m4::{enable_cycle_counter, DwtClock};
use flight_scheduler::debug::NoopDebugSink;
use flight_scheduler::kernel;
use flight_scheduler::scheduler::RealtimePipeline;
use flight_scheduler::task::{StaticPriority, TaskConfig, TaskId};

// ---------------------------------------------------------------------------
// Task role indices into the fixed TASK_COUNT-sized table
// ---------------------------------------------------------------------------

const SYSTEM: usize = 0;
const GYRO: usize = 1;
const FILTER: usize = 2;
const PID: usize = 3;
const TELEMETRY: usize = 4;
const PACKET_RX: usize = 5;

// ---------------------------------------------------------------------------
// Task bodies
// ---------------------------------------------------------------------------

/// Samples the system load estimator every invocation; a real firmware
/// would forward this to a telemetry frame.
fn system_task(_now_us: u32) {
    let _load_percent = kernel::task_system_load();
}

/// Reads the gyro sensor. Stubbed: the actual sensor driver is an
/// external collaborator, out of scope for this crate.
fn gyro_task(_now_us: u32) {}

/// Runs the complementary/Kalman filter stage over the latest gyro
/// sample. Stubbed for the same reason as `gyro_task`.
fn filter_task(_now_us: u32) {}

/// Runs the PID loop and updates motor outputs. Stubbed for the same
/// reason as `gyro_task`.
fn pid_task(_now_us: u32) {}

/// Low-priority, time-driven: serializes and transmits a telemetry
/// frame every 100ms.
fn telemetry_task(_now_us: u32) {}

static PACKET_PENDING: AtomicBool = AtomicBool::new(false);

/// Event-driven: the scheduler polls `packet_ready` each tick once the
/// task's previous signal has been serviced, and only runs the body
/// once that predicate returns true.
fn packet_rx_task(_now_us: u32) {
    PACKET_PENDING.store(false, Ordering::Relaxed);
}

fn packet_ready(_now_us: u32, _age_us: u32) -> bool {
    PACKET_PENDING.swap(false, Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Realtime pipeline gating
// ---------------------------------------------------------------------------

/// The filter runs every gyro sample; the PID loop runs every other
/// sample (a 4kHz control loop riding an 8kHz gyro rate), matching a
/// common flight-controller gyro/PID ratio.
struct FlightPipeline;

impl RealtimePipeline for FlightPipeline {
    fn gyro_filter_ready(&self) -> bool {
        true
    }

    fn pid_loop_ready(&self) -> bool {
        static COUNTER: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed) % 2 == 0
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();
    enable_cycle_counter(&mut cp.DCB, &mut cp.DWT);

    let configs = [
        TaskConfig { task_func: Some(system_task), check_func: None, desired_period_us: 500_000, static_priority: StaticPriority::Low },
        TaskConfig { task_func: Some(gyro_task), check_func: None, desired_period_us: 125, static_priority: StaticPriority::Realtime },
        TaskConfig { task_func: Some(filter_task), check_func: None, desired_period_us: 125, static_priority: StaticPriority::Realtime },
        TaskConfig { task_func: Some(pid_task), check_func: None, desired_period_us: 125, static_priority: StaticPriority::Realtime },
        TaskConfig { task_func: Some(telemetry_task), check_func: None, desired_period_us: 100_000, static_priority: StaticPriority::Medium },
        TaskConfig { task_func: Some(packet_rx_task), check_func: Some(packet_ready), desired_period_us: 1_000, static_priority: StaticPriority::High },
        TaskConfig { task_func: None, check_func: None, desired_period_us: 100, static_priority: StaticPriority::Idle },
        TaskConfig { task_func: None, check_func: None, desired_period_us: 100, static_priority: StaticPriority::Idle },
    ];

    kernel::scheduler_init(configs, SYSTEM, GYRO, FILTER, PID).expect("task table roles must be valid");
    kernel::set_enabled(TaskId::Task(TELEMETRY), true);
    kernel::set_enabled(TaskId::Task(PACKET_RX), true);
    kernel::scheduler_enable_gyro();

    let clock = DwtClock;
    let debug = NoopDebugSink;
    let pipeline = FlightPipeline;

    loop {
        kernel::scheduler(&clock, &debug, &pipeline);
    }
}
