// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Priority-ordered wait list of blocked tasks
//! OWNERS: @runtime
//! INVARIANTS: Ordered by (priority desc, arrival asc); a task appears at most once

use crate::types::{Priority, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Waiter {
    task: TaskId,
    priority: Priority,
    seq: u64,
}

/// Tasks blocked on one side of a queue.
#[derive(Debug, Default)]
pub struct WaitList {
    waiters: Vec<Waiter>,
}

impl WaitList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `task` behind every waiter of equal or higher priority. `seq` is the kernel-wide
    /// arrival counter; re-inserting a task that is already present moves it.
    pub fn insert(&mut self, task: TaskId, priority: Priority, seq: u64) {
        self.remove(task);
        let pos = self
            .waiters
            .iter()
            .position(|w| (w.priority, std::cmp::Reverse(w.seq)) < (priority, std::cmp::Reverse(seq)))
            .unwrap_or(self.waiters.len());
        self.waiters.insert(pos, Waiter { task, priority, seq });
    }

    /// Removes and returns the head waiter.
    pub fn pop(&mut self) -> Option<TaskId> {
        if self.waiters.is_empty() {
            None
        } else {
            Some(self.waiters.remove(0).task)
        }
    }

    /// Removes `task` if present. Returns `true` when it was.
    pub fn remove(&mut self, task: TaskId) -> bool {
        let before = self.waiters.len();
        self.waiters.retain(|w| w.task != task);
        before != self.waiters.len()
    }

    /// Waiters in wake order.
    pub fn tasks(&self) -> Vec<TaskId> {
        self.waiters.iter().map(|w| w.task).collect()
    }
}
