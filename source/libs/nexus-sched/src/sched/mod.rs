// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-priority ready lists with preemptive dispatch
//! OWNERS: @runtime
//! PUBLIC API: Scheduler (enqueue/enqueue_front/schedule_next/yield_current/finish_current),
//!             Running
//! DEPENDS_ON: types::{TaskId, Priority}
//! INVARIANTS: Highest non-empty priority wins; FIFO within a priority; the running task is never
//!             also queued; a preempted task resumes ahead of its equal-priority peers

use std::collections::VecDeque;

use crate::types::{Priority, TaskId};

/// Task currently holding the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Running {
    /// Task id.
    pub id: TaskId,
    /// Fixed priority of the task.
    pub priority: Priority,
}

/// Ready lists indexed by priority plus the running slot.
///
/// `Scheduler` does not know about task states or queues; the kernel keeps the task table in
/// sync with the moves made here.
#[derive(Debug)]
pub struct Scheduler {
    ready: Vec<VecDeque<TaskId>>,
    current: Option<Running>,
}

impl Scheduler {
    /// Creates a scheduler with `levels` priority levels (at least one).
    pub fn new(levels: u8) -> Self {
        let levels = usize::from(levels.max(1));
        Self { ready: (0..levels).map(|_| VecDeque::new()).collect(), current: None }
    }

    /// Highest valid priority.
    pub fn max_priority(&self) -> Priority {
        Priority::new((self.ready.len() - 1) as u8)
    }

    /// Clamps `priority` into the configured range.
    pub fn clamp(&self, priority: Priority) -> Priority {
        priority.min(self.max_priority())
    }

    /// Appends a ready task at the back of its priority's list.
    pub fn enqueue(&mut self, id: TaskId, priority: Priority) {
        let idx = self.clamp(priority).as_index();
        self.ready[idx].push_back(id);
    }

    /// Puts a preempted task at the front of its priority's list.
    pub fn enqueue_front(&mut self, id: TaskId, priority: Priority) {
        let idx = self.clamp(priority).as_index();
        self.ready[idx].push_front(id);
    }

    /// Pops the next task to run and records it as current.
    pub fn schedule_next(&mut self, priority_of: impl Fn(TaskId) -> Priority) -> Option<TaskId> {
        for queue in self.ready.iter_mut().rev() {
            if let Some(id) = queue.pop_front() {
                self.current = Some(Running { id, priority: priority_of(id) });
                return Some(id);
            }
        }
        self.current = None;
        None
    }

    /// Re-enqueues the current task at the back of its list (`yield`).
    pub fn yield_current(&mut self) {
        if let Some(task) = self.current.take() {
            self.enqueue(task.id, task.priority);
        }
    }

    /// Re-enqueues the current task at the front of its list (preemption).
    pub fn preempt_current(&mut self) {
        if let Some(task) = self.current.take() {
            self.enqueue_front(task.id, task.priority);
        }
    }

    /// Clears the current slot without re-enqueuing (the task blocked).
    pub fn finish_current(&mut self) {
        self.current = None;
    }

    /// Removes all queued references to `id`.
    pub fn purge(&mut self, id: TaskId) {
        for q in &mut self.ready {
            q.retain(|t| *t != id);
        }
        if self.current.is_some_and(|t| t.id == id) {
            self.current = None;
        }
    }

    /// Currently running task.
    pub fn current(&self) -> Option<Running> {
        self.current
    }

    /// Highest priority that has a ready task.
    pub fn highest_ready(&self) -> Option<Priority> {
        self.ready
            .iter()
            .enumerate()
            .rev()
            .find(|(_, q)| !q.is_empty())
            .map(|(level, _)| Priority::new(level as u8))
    }

    /// Returns `true` when a ready task strictly outranks the current one.
    pub fn preemption_pending(&self) -> bool {
        match (self.current, self.highest_ready()) {
            (Some(running), Some(ready)) => ready > running.priority,
            _ => false,
        }
    }

    /// Number of ready tasks across all priorities.
    pub fn ready_len(&self) -> usize {
        self.ready.iter().map(VecDeque::len).sum()
    }

    #[cfg(test)]
    fn ready_at(&self, priority: Priority) -> Vec<TaskId> {
        self.ready
            .get(priority.as_index())
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> TaskId {
        TaskId::from_raw(raw)
    }

    fn prio_by_id(raw: TaskId) -> Priority {
        // test ids encode their priority in the tens digit
        Priority::new((raw.as_raw() / 10) as u8)
    }

    #[test]
    fn priority_ordering() {
        let mut sched = Scheduler::new(4);
        sched.enqueue(id(11), Priority::new(1));
        sched.enqueue(id(21), Priority::new(2));
        sched.enqueue(id(31), Priority::new(3));
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(31)));
        sched.finish_current();
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(21)));
        sched.finish_current();
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(11)));
    }

    #[test]
    fn yield_requeues_current_task_behind_peers() {
        let mut sched = Scheduler::new(4);
        sched.enqueue(id(11), Priority::new(1));
        sched.enqueue(id(12), Priority::new(1));
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(11)));
        sched.yield_current();
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(12)));
        sched.yield_current();
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(11)));
    }

    #[test]
    fn preempted_task_resumes_ahead_of_peers() {
        let mut sched = Scheduler::new(4);
        sched.enqueue(id(11), Priority::new(1));
        sched.enqueue(id(12), Priority::new(1));
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(11)));
        sched.enqueue(id(31), Priority::new(3));
        assert!(sched.preemption_pending());
        sched.preempt_current();
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(31)));
        sched.finish_current();
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(11)));
    }

    #[test]
    fn equal_priority_never_preempts() {
        let mut sched = Scheduler::new(4);
        sched.enqueue(id(21), Priority::new(2));
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(21)));
        sched.enqueue(id(22), Priority::new(2));
        assert!(!sched.preemption_pending());
    }

    #[test]
    fn out_of_range_priority_is_clamped() {
        let mut sched = Scheduler::new(2);
        sched.enqueue(id(91), Priority::new(9));
        assert_eq!(sched.ready_at(Priority::new(1)), vec![id(91)]);
    }

    #[test]
    fn purge_drops_queued_and_current() {
        let mut sched = Scheduler::new(2);
        sched.enqueue(id(1), Priority::new(0));
        sched.enqueue(id(2), Priority::new(0));
        sched.purge(id(1));
        assert_eq!(sched.ready_len(), 1);
        assert_eq!(sched.schedule_next(prio_by_id), Some(id(2)));
        sched.purge(id(2));
        assert_eq!(sched.current(), None);
    }

    #[test]
    fn empty_scheduler_idles() {
        let mut sched = Scheduler::new(3);
        assert_eq!(sched.schedule_next(prio_by_id), None);
        assert_eq!(sched.highest_ready(), None);
    }
}
