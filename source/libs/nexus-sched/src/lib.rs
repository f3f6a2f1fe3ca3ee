// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Bounded blocking queues under a priority-preemptive task scheduler
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module, proptest models for queue storage, integration tests
//!                under tests/
//! PUBLIC API: Kernel, TaskContext, QueueHandle, Wait/Ticks, KernelConfig, Console, errors
//!
//! A single logical core is emulated on the host: every task gets an OS thread but only the task
//! the scheduler marks Running executes. Tasks talk through fixed-capacity queues; a task that
//! cannot make progress blocks in the queue's wait list (priority first, then arrival) until the
//! queue changes or its timeout expires on a tick.
//!
//! ```no_run
//! use nexus_sched::{Kernel, KernelConfig, Priority, TaskParams, Ticks, Wait};
//!
//! let kernel = Kernel::new(KernelConfig::default().periodic());
//! let queue = kernel.create_queue::<i32>(5).expect("queue");
//! kernel
//!     .spawn(TaskParams::new("tx", Priority::new(1)), |ctx, q| loop {
//!         let _ = ctx.send(&q, 7, Wait::NonBlocking);
//!         ctx.yield_now();
//!     }, queue)
//!     .expect("tx");
//! kernel
//!     .spawn(TaskParams::new("rx", Priority::new(2)), |ctx, q| loop {
//!         if let Ok(v) = ctx.receive(&q, Ticks(100)) {
//!             ctx.print_number("Received = ", i64::from(v));
//!         }
//!     }, queue)
//!     .expect("rx");
//! let _ = kernel.start();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod console;
pub mod error;
pub mod heap;
pub mod kernel;
pub mod queue;
pub mod sched;
pub mod task;
pub mod types;
pub mod wait;

pub use config::{KernelConfig, TickSource};
pub use console::{CaptureConsole, Console, StdoutConsole};
pub use error::{CreationFailure, RecvError, SendError, StartError};
pub use kernel::{Kernel, TaskContext, TickOutcome};
pub use queue::QueueHandle;
pub use task::{BlockReason, QueueSide, TaskHandle, TaskParams, TaskState};
pub use types::{Priority, QueueId, TaskId, Tick};
pub use wait::{Deadline, Ticks, Wait};
