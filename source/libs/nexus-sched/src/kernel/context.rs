// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Task-facing API handed to every task entry function
//! OWNERS: @runtime
//! PUBLIC API: TaskContext (send/send_to_front/receive/yield_now/spawn/console)
//! INVARIANTS: Calls are made by the task's own thread while it is Running

use super::Kernel;
use crate::console::Console;
use crate::error::{CreationFailure, RecvError, SendError};
use crate::queue::QueueHandle;
use crate::task::{TaskHandle, TaskParams};
use crate::types::{Priority, TaskId, Tick};
use crate::wait::Wait;

/// Execution context of one task.
pub struct TaskContext {
    kernel: Kernel,
    id: TaskId,
}

static_assertions::assert_not_impl_any!(TaskContext: Clone);

impl TaskContext {
    pub(super) fn new(kernel: Kernel, id: TaskId) -> Self {
        Self { kernel, id }
    }

    /// Kernel this task belongs to.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Id of the calling task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Handle of the calling task.
    pub fn handle(&self) -> TaskHandle {
        TaskHandle { id: self.id }
    }

    /// Effective priority of the calling task.
    pub fn priority(&self) -> Priority {
        self.kernel.task_priority(self.handle()).unwrap_or(Priority::IDLE)
    }

    /// Current clock value.
    pub fn now(&self) -> Tick {
        self.kernel.now()
    }

    /// Moves the calling task behind its equal-priority peers and re-dispatches.
    pub fn yield_now(&self) {
        self.kernel.yield_as(self.id);
    }

    /// Sends `item` to the back of `queue`, blocking per `wait` while the queue is full.
    pub fn send<T: Send + 'static>(
        &self,
        queue: &QueueHandle<T>,
        item: T,
        wait: impl Into<Wait>,
    ) -> Result<(), SendError<T>> {
        self.kernel.send_as(self.id, queue, item, wait.into(), false)
    }

    /// Sends `item` to the head of `queue`; it is the next item received.
    pub fn send_to_front<T: Send + 'static>(
        &self,
        queue: &QueueHandle<T>,
        item: T,
        wait: impl Into<Wait>,
    ) -> Result<(), SendError<T>> {
        self.kernel.send_as(self.id, queue, item, wait.into(), true)
    }

    /// Takes the head item of `queue`, blocking per `wait` while the queue is empty.
    pub fn receive<T: Send + 'static>(
        &self,
        queue: &QueueHandle<T>,
        wait: impl Into<Wait>,
    ) -> Result<T, RecvError> {
        self.kernel.receive_as(self.id, queue, wait.into())
    }

    /// Items stored in `queue`. Advisory only.
    pub fn messages_waiting<T>(&self, queue: &QueueHandle<T>) -> usize {
        self.kernel.messages_waiting(queue)
    }

    /// Free slots in `queue`.
    pub fn spaces_available<T>(&self, queue: &QueueHandle<T>) -> usize {
        self.kernel.spaces_available(queue)
    }

    /// Creates a task; a higher-priority child runs before this call returns.
    pub fn spawn<A, F>(
        &self,
        params: TaskParams,
        entry: F,
        arg: A,
    ) -> Result<TaskHandle, CreationFailure>
    where
        A: Send + 'static,
        F: FnOnce(&TaskContext, A) + Send + 'static,
    {
        self.kernel.spawn_as(self.id, params, entry, arg)
    }

    /// Console sink.
    pub fn console(&self) -> &dyn Console {
        self.kernel.console()
    }

    /// Prints one line on the console.
    pub fn print(&self, text: &str) {
        self.console().print(text);
    }

    /// Prints `text` followed by `value`.
    pub fn print_number(&self, text: &str, value: i64) {
        self.console().print_number(text, value);
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext").field("id", &self.id).finish()
    }
}
