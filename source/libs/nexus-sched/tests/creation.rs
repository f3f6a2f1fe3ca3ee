// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Integration tests for queue/task creation and task lifecycle edges
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 5 integration tests
//!
//! TEST_SCOPE:
//!   - Creation failures propagate and leave the heap budget untouched
//!   - Handles are bound to the kernel that created them
//!   - Tasks that return or panic are retired without stopping the others
//!
//! TEST_SCENARIOS:
//!   - zero_capacity_queue_is_rejected()
//!   - exhausted_heap_blocks_dependent_tasks()
//!   - oversized_stack_is_rejected()
//!   - foreign_handles_are_refused()
//!   - returning_and_panicking_tasks_are_retired()

use std::sync::Arc;
use std::time::Duration;

use nexus_sched::{
    BlockReason, CaptureConsole, CreationFailure, Kernel, KernelConfig, Priority, RecvError,
    SendError, TaskParams, TaskState,
};
use parking_lot::Mutex;

const IDLE: Duration = Duration::from_secs(10);

fn kernel_with_heap(bytes: usize) -> Kernel {
    Kernel::with_console(KernelConfig::default().with_heap_bytes(bytes), CaptureConsole::new())
}

#[test]
fn zero_capacity_queue_is_rejected() {
    let kernel = kernel_with_heap(1024);
    assert_eq!(kernel.create_queue::<i32>(0).unwrap_err(), CreationFailure::ZeroCapacity);
    assert_eq!(kernel.heap_available(), 1024);
}

#[test]
fn exhausted_heap_blocks_dependent_tasks() {
    let kernel = kernel_with_heap(64);
    let spawned = Arc::new(Mutex::new(0usize));

    match kernel.create_queue::<u64>(16) {
        Ok(queue) => {
            let count = Arc::clone(&spawned);
            kernel
                .spawn(
                    TaskParams::new("consumer", Priority::new(1)).stack_size(0),
                    move |_ctx, _q| *count.lock() += 1,
                    queue,
                )
                .expect("spawn");
        }
        Err(err) => {
            assert_eq!(err, CreationFailure::OutOfMemory { requested: 128, available: 64 });
        }
    }
    assert_eq!(kernel.heap_available(), 64);

    kernel.launch().expect("launch");
    assert!(kernel.wait_until_idle(IDLE));
    assert_eq!(*spawned.lock(), 0);
    assert_eq!(kernel.current_task(), None);
}

#[test]
fn oversized_stack_is_rejected() {
    let kernel = kernel_with_heap(4096);
    let err = kernel
        .spawn(TaskParams::new("big", Priority::new(1)).stack_size(8192), |_ctx, ()| {}, ())
        .unwrap_err();
    assert_eq!(err, CreationFailure::OutOfMemory { requested: 8192, available: 4096 });

    let small = kernel
        .spawn(TaskParams::new("small", Priority::new(1)).stack_size(1000), |_ctx, ()| {}, ())
        .expect("fits");
    assert_eq!(kernel.heap_available(), 4096 - 1000);
    assert_eq!(kernel.task_state(small), Some(TaskState::Ready));
}

#[test]
fn foreign_handles_are_refused() {
    let home = kernel_with_heap(1024);
    let away = kernel_with_heap(1024);
    let queue = home.create_queue::<u8>(2).expect("queue");
    let local = away.create_queue::<u8>(2).expect("queue");
    assert_eq!(queue.id(), local.id());

    assert_eq!(away.try_send(&queue, 9), Err(SendError::ForeignHandle(9)));
    assert_eq!(away.try_receive(&queue), Err(RecvError::ForeignHandle));
    assert_eq!(away.messages_waiting(&queue), 0);
    assert_eq!(away.capacity(&queue), 0);

    home.try_send(&queue, 1).expect("space");
    assert_eq!(home.messages_waiting(&queue), 1);
    assert_eq!(home.capacity(&queue), 2);
    assert_eq!(away.messages_waiting(&local), 0);
}

#[test]
fn returning_and_panicking_tasks_are_retired() {
    let kernel = kernel_with_heap(64 * 1024);
    let ran = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&ran);
    let faulty = kernel
        .spawn(
            TaskParams::new("faulty", Priority::new(3)),
            move |_ctx, ()| {
                log.lock().push("faulty");
                panic!("task fault");
            },
            (),
        )
        .expect("faulty");
    let log = Arc::clone(&ran);
    let worker = kernel
        .spawn(
            TaskParams::new("worker", Priority::new(1)),
            move |_ctx, ()| log.lock().push("worker"),
            (),
        )
        .expect("worker");

    kernel.launch().expect("launch");
    assert!(kernel.wait_until_idle(IDLE));
    assert_eq!(*ran.lock(), vec!["faulty", "worker"]);
    for task in [faulty, worker] {
        assert_eq!(kernel.task_state(task), Some(TaskState::Blocked));
        assert_eq!(kernel.block_reason(task), Some(BlockReason::Returned));
    }
}
