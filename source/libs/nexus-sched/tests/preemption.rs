// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Integration tests for priority preemption and dispatch order
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 6 integration tests
//!
//! TEST_SCOPE:
//!   - Wake of a higher-priority waiter by the running task
//!   - Spawn of a higher-priority task from task context
//!   - Wakes from outside task context (try_send)
//!   - Wait-list order among several blocked consumers
//!   - Priority clamping
//!
//! TEST_SCENARIOS:
//!   - woken_consumer_runs_before_producer_continues()
//!   - higher_priority_child_runs_before_spawn_returns()
//!   - try_send_dispatches_waiting_task_when_idle()
//!   - waiters_wake_by_priority_then_arrival()
//!   - out_of_range_priority_is_clamped()
//!   - second_launch_is_rejected()

use std::sync::Arc;
use std::time::Duration;

use nexus_sched::{
    CaptureConsole, Kernel, KernelConfig, Priority, StartError, TaskParams, TaskState, Wait,
};
use parking_lot::Mutex;

const IDLE: Duration = Duration::from_secs(10);

fn kernel() -> Kernel {
    Kernel::with_console(KernelConfig::default(), CaptureConsole::new())
}

type Events = Arc<Mutex<Vec<String>>>;

fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn woken_consumer_runs_before_producer_continues() {
    let kernel = kernel();
    let queue = kernel.create_queue::<u8>(2).expect("queue");
    let ev = events();

    let log = Arc::clone(&ev);
    kernel
        .spawn(
            TaskParams::new("consumer", Priority::new(3)),
            move |ctx, q| {
                let v = ctx.receive(&q, Wait::Forever).expect("item");
                log.lock().push(format!("consumer got {v}"));
            },
            queue,
        )
        .expect("consumer");
    let log = Arc::clone(&ev);
    kernel
        .spawn(
            TaskParams::new("producer", Priority::new(1)),
            move |ctx, q| {
                log.lock().push("producer sends".into());
                ctx.send(&q, 7, Wait::NonBlocking).expect("space");
                log.lock().push("producer continues".into());
            },
            queue,
        )
        .expect("producer");

    kernel.launch().expect("launch");
    assert!(kernel.wait_until_idle(IDLE));
    assert_eq!(*ev.lock(), vec!["producer sends", "consumer got 7", "producer continues"]);
}

#[test]
fn higher_priority_child_runs_before_spawn_returns() {
    let kernel = kernel();
    let ev = events();
    let log = Arc::clone(&ev);
    kernel
        .spawn(
            TaskParams::new("parent", Priority::new(1)),
            move |ctx, log: Events| {
                let child_log = Arc::clone(&log);
                ctx.spawn(
                    TaskParams::new("child", Priority::new(2)),
                    |_ctx, log: Events| log.lock().push("child".into()),
                    child_log,
                )
                .expect("child");
                log.lock().push("parent".into());

                let peer_log = Arc::clone(&log);
                ctx.spawn(
                    TaskParams::new("peer", Priority::new(1)),
                    |_ctx, log: Events| log.lock().push("peer".into()),
                    peer_log,
                )
                .expect("peer");
                log.lock().push("parent again".into());
            },
            log,
        )
        .expect("parent");

    kernel.launch().expect("launch");
    assert!(kernel.wait_until_idle(IDLE));
    assert_eq!(*ev.lock(), vec!["child", "parent", "parent again", "peer"]);
}

#[test]
fn try_send_dispatches_waiting_task_when_idle() {
    let kernel = kernel();
    let queue = kernel.create_queue::<u16>(1).expect("queue");
    let ev = events();
    let log = Arc::clone(&ev);
    let task = kernel
        .spawn(
            TaskParams::new("listener", Priority::new(2)),
            move |ctx, q| {
                while let Ok(v) = ctx.receive(&q, Wait::Forever) {
                    log.lock().push(format!("irq {v}"));
                }
            },
            queue,
        )
        .expect("listener");

    kernel.launch().expect("launch");
    assert!(kernel.wait_until_idle(IDLE));
    assert_eq!(kernel.task_state(task), Some(TaskState::Blocked));
    assert_eq!(kernel.waiting_tasks(&queue).1, vec![task.id()]);

    kernel.try_send(&queue, 42).expect("space");
    assert!(kernel.wait_until_idle(IDLE));
    kernel.try_send(&queue, 43).expect("space");
    assert!(kernel.wait_until_idle(IDLE));

    assert_eq!(*ev.lock(), vec!["irq 42", "irq 43"]);
    assert_eq!(kernel.messages_waiting(&queue), 0);
    assert!(kernel.try_receive(&queue).is_err());
}

#[test]
fn waiters_wake_by_priority_then_arrival() {
    let kernel = kernel();
    let queue = kernel.create_queue::<u32>(4).expect("queue");
    let ev = events();

    let mut handles = Vec::new();
    for (name, prio) in [("low", 1u8), ("mid-a", 2), ("mid-b", 2), ("high", 3)] {
        let log = Arc::clone(&ev);
        let handle = kernel
            .spawn(
                TaskParams::new(name, Priority::new(prio)),
                move |ctx, q| {
                    let v = ctx.receive(&q, Wait::Forever).expect("item");
                    log.lock().push(format!("{name} {v}"));
                },
                queue,
            )
            .expect("consumer");
        handles.push(handle);
    }

    kernel.launch().expect("launch");
    assert!(kernel.wait_until_idle(IDLE));
    let ids: Vec<_> = [3, 1, 2, 0].iter().map(|i| handles[*i].id()).collect();
    assert_eq!(kernel.waiting_tasks(&queue).1, ids);

    for v in 0..4 {
        kernel.try_send(&queue, v).expect("space");
        assert!(kernel.wait_until_idle(IDLE));
    }
    assert_eq!(*ev.lock(), vec!["high 0", "mid-a 1", "mid-b 2", "low 3"]);
}

#[test]
fn out_of_range_priority_is_clamped() {
    let kernel = Kernel::with_console(
        KernelConfig::default().with_max_priorities(3),
        CaptureConsole::new(),
    );
    let task = kernel
        .spawn(TaskParams::new("greedy", Priority::new(200)), |_ctx, ()| {}, ())
        .expect("spawn");
    assert_eq!(kernel.task_priority(task), Some(Priority::new(2)));
    assert_eq!(kernel.task_name(task).as_deref(), Some("greedy"));
    assert_eq!(kernel.task_state(task), Some(TaskState::Ready));
}

#[test]
fn second_launch_is_rejected() {
    let kernel = kernel();
    kernel.launch().expect("launch");
    assert_eq!(kernel.launch(), Err(StartError::AlreadyStarted));
    assert!(kernel.wait_until_idle(IDLE));
    assert_eq!(kernel.current_task(), None);
}
