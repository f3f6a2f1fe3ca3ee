// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Queue demo: two equal-priority senders and one higher-priority receiver
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests (cli.rs) + integration tests (tests/cli.rs)
//! PUBLIC API: build(), sender_task(), receiver_task(), Options, help/execute/run
//!
//! The senders write their value with a zero (or configured) wait and then yield so the other
//! sender gets the CPU. The receiver outranks both: every send wakes it, so the queue never holds
//! more than one item when it looks.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub use cli::{execute, help, run, Options};

use nexus_sched::{CreationFailure, Kernel, Priority, QueueHandle, TaskContext, TaskParams, Wait};

/// Stack budget of each demo task, in bytes.
pub const TASK_STACK_BYTES: usize = 1000;

/// Value sent by the first sender.
pub const FIRST_VALUE: i32 = 100;
/// Value sent by the second sender.
pub const SECOND_VALUE: i32 = 500;

/// Argument of a sender task.
#[derive(Debug, Clone, Copy)]
pub struct SenderArgs {
    /// Queue to write to.
    pub queue: QueueHandle<i32>,
    /// Value written on every iteration.
    pub value: i32,
    /// Wait used when the queue is full.
    pub wait: Wait,
    /// Number of iterations; `None` loops forever.
    pub rounds: Option<usize>,
}

/// Argument of the receiver task.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverArgs {
    /// Queue to read from.
    pub queue: QueueHandle<i32>,
    /// Wait used when the queue is empty.
    pub wait: Wait,
}

/// Sends `args.value`, reports a full queue, then lets the other sender run.
pub fn sender_task(ctx: &TaskContext, args: SenderArgs) {
    let mut sent = 0;
    while args.rounds.map_or(true, |rounds| sent < rounds) {
        if ctx.send(&args.queue, args.value, args.wait).is_err() {
            ctx.print("Could not send to the queue.");
        }
        sent += 1;
        ctx.yield_now();
    }
}

/// Receives forever, printing every value or the timeout.
pub fn receiver_task(ctx: &TaskContext, args: ReceiverArgs) {
    loop {
        if ctx.messages_waiting(&args.queue) != 0 {
            ctx.print("Queue should have been empty!");
        }
        match ctx.receive(&args.queue, args.wait) {
            Ok(value) => ctx.print_number("Received = ", i64::from(value)),
            Err(err) => {
                log::debug!(target: "queue-demo", "receive failed: {err}");
                ctx.print("Could not receive from the queue.");
            }
        }
    }
}

/// Creates the queue and the three demo tasks. Prints the failure on the kernel console when the
/// queue cannot be created; no task is spawned in that case.
pub fn build(kernel: &Kernel, opts: &Options, rounds: Option<usize>) -> Result<(), CreationFailure> {
    let queue = kernel.create_queue::<i32>(opts.capacity).inspect_err(|_| {
        kernel.console().print("The queue could not be created.");
    })?;

    let send_wait = opts.send_wait();
    for (name, value) in [("Sender1", FIRST_VALUE), ("Sender2", SECOND_VALUE)] {
        let args = SenderArgs { queue, value, wait: send_wait, rounds };
        kernel.spawn(
            TaskParams::new(name, Priority::new(1)).stack_size(TASK_STACK_BYTES),
            sender_task,
            args,
        )?;
    }
    kernel.spawn(
        TaskParams::new("Receiver", Priority::new(2)).stack_size(TASK_STACK_BYTES),
        receiver_task,
        ReceiverArgs { queue, wait: opts.recv_wait() },
    )?;
    log::info!(
        target: "queue-demo",
        "queue of {} items, send wait {:?}, receive wait {:?}",
        opts.capacity,
        send_wait,
        opts.recv_wait()
    );
    Ok(())
}
