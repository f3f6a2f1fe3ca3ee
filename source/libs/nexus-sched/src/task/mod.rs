// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Task table and lifecycle helpers
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests (block/wake/timeout bookkeeping) + kernel integration tests
//! PUBLIC API: TaskTable, TaskParams, TaskHandle, TaskState, BlockReason, WakeReason
//! DEPENDS_ON: sched::Scheduler, types::{TaskId, Priority, QueueId, Tick}
//! INVARIANTS: `wake_deadline` present only while Blocked on a timed wait; a task is in at most
//!             one wait list; the table never shrinks (ids stay valid)

use crate::sched::Scheduler;
use crate::types::{Priority, QueueId, TaskId, Tick};
use crate::wait::Deadline;

/// Default stack budget charged for a task, in bytes.
pub const DEFAULT_STACK_SIZE: usize = 4096;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Eligible to run, waiting in a ready list.
    Ready,
    /// Holding the CPU.
    Running,
    /// Waiting for a queue condition or a timeout.
    Blocked,
}

/// Side of a queue a task waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSide {
    /// Waiting for space (producer).
    Send,
    /// Waiting for data (consumer).
    Receive,
}

/// Scheduler-visible blocking reason for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Waiting in one of the queue's wait lists.
    Queue {
        /// Queue the task waits on.
        queue: QueueId,
        /// Which condition it waits for.
        side: QueueSide,
    },
    /// The entry function returned; the task never becomes ready again.
    Returned,
}

/// Why a blocked task was made ready again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// The awaited queue condition (space or data) became true.
    Available,
    /// The wait deadline passed.
    TimedOut,
}

/// Creation parameters of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParams {
    /// Human readable name (also used for the host thread).
    pub name: String,
    /// Stack bytes charged to the heap budget.
    pub stack_size: usize,
    /// Fixed priority.
    pub priority: Priority,
}

impl TaskParams {
    /// Parameters with the default stack size.
    pub fn new(name: impl Into<String>, priority: impl Into<Priority>) -> Self {
        Self { name: name.into(), stack_size: DEFAULT_STACK_SIZE, priority: priority.into() }
    }

    /// Overrides the stack size.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }
}

/// Handle returned by `spawn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub(crate) id: TaskId,
}

impl TaskHandle {
    /// Id of the task.
    pub fn id(&self) -> TaskId {
        self.id
    }
}

/// Per-task bookkeeping.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    name: String,
    priority: Priority,
    state: TaskState,
    block_reason: Option<BlockReason>,
    wake_deadline: Option<Deadline>,
    wake_reason: Option<WakeReason>,
}

impl Task {
    /// Task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Why the task is blocked, if it is.
    pub fn block_reason(&self) -> Option<BlockReason> {
        self.block_reason
    }

    /// Deadline of the current timed wait.
    pub fn wake_deadline(&self) -> Option<Deadline> {
        self.wake_deadline
    }

    fn set_blocked(&mut self, reason: BlockReason, deadline: Option<Deadline>) {
        self.state = TaskState::Blocked;
        self.block_reason = Some(reason);
        self.wake_deadline = deadline;
        self.wake_reason = None;
    }

    fn clear_blocked(&mut self, why: WakeReason) {
        self.state = TaskState::Ready;
        self.block_reason = None;
        self.wake_deadline = None;
        self.wake_reason = Some(why);
    }
}

/// Table of every task created on a kernel.
#[derive(Debug, Default)]
pub struct TaskTable {
    tasks: Vec<Task>,
}

impl TaskTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted task will get.
    pub fn next_id(&self) -> TaskId {
        TaskId::from_raw(self.tasks.len() as u32)
    }

    /// Registers a new Ready task and enqueues it.
    pub fn insert(
        &mut self,
        params: &TaskParams,
        priority: Priority,
        scheduler: &mut Scheduler,
    ) -> TaskId {
        let id = self.next_id();
        self.tasks.push(Task {
            id,
            name: params.name.clone(),
            priority,
            state: TaskState::Ready,
            block_reason: None,
            wake_deadline: None,
            wake_reason: None,
        });
        scheduler.enqueue(id, priority);
        id
    }

    /// Looks up a task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.as_index())
    }

    fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id.as_index())
    }

    /// Priority of `id` (idle priority for unknown ids).
    pub fn priority_of(&self, id: TaskId) -> Priority {
        self.task(id).map_or(Priority::IDLE, Task::priority)
    }

    /// Marks `id` as running (dispatch).
    pub fn set_running(&mut self, id: TaskId) {
        if let Some(task) = self.task_mut(id) {
            task.state = TaskState::Running;
        }
    }

    /// Marks `id` as ready without touching the ready lists.
    pub fn set_ready(&mut self, id: TaskId) {
        if let Some(task) = self.task_mut(id) {
            task.state = TaskState::Ready;
        }
    }

    /// Blocks the running task and removes it from the scheduler (not runnable).
    pub fn block_current(
        &mut self,
        reason: BlockReason,
        deadline: Option<Deadline>,
        scheduler: &mut Scheduler,
    ) {
        let Some(running) = scheduler.current() else {
            return;
        };
        if let Some(task) = self.task_mut(running.id) {
            task.set_blocked(reason, deadline);
        }
        scheduler.finish_current();
    }

    /// Wakes a blocked task and enqueues it for execution. Returns true if a task was woken.
    pub fn wake(&mut self, id: TaskId, why: WakeReason, scheduler: &mut Scheduler) -> bool {
        let Some(task) = self.task_mut(id) else {
            return false;
        };
        if task.state != TaskState::Blocked || task.block_reason == Some(BlockReason::Returned) {
            return false;
        }
        task.clear_blocked(why);
        let priority = task.priority;
        // Avoid duplicates; then enqueue with the stored priority.
        scheduler.purge(id);
        scheduler.enqueue(id, priority);
        true
    }

    /// Takes the outcome recorded by the last wake of `id`.
    pub fn take_wake_reason(&mut self, id: TaskId) -> Option<WakeReason> {
        self.task_mut(id).and_then(|task| task.wake_reason.take())
    }

    /// Tasks whose timed wait has expired at `now`, earliest deadline first.
    pub fn expired(&self, now: Tick) -> Vec<TaskId> {
        let mut due: Vec<(Deadline, TaskId)> = self
            .tasks
            .iter()
            .filter(|t| t.state == TaskState::Blocked)
            .filter_map(|t| t.wake_deadline.map(|d| (d, t.id)))
            .filter(|(d, _)| d.expired(now))
            .collect();
        due.sort();
        due.into_iter().map(|(_, id)| id).collect()
    }
}
