// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Kernel object: task threads, baton hand-off, queue operations and the tick handler
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Integration tests under tests/ (scenario, preemption, timeouts, creation)
//! PUBLIC API: Kernel (new/with_console/spawn/create_queue/launch/start/tick/end_scheduler/
//!             wait_until_idle/try_send/try_receive/introspection), TaskContext, TickOutcome
//! DEPENDS_ON: sched, task, queue, heap, console, config
//! INVARIANTS: Only the thread of the Running task executes task code; every state change happens
//!             under `Shared::core`; the lock is never held while task code runs; the condvar is
//!             notified whenever the Running slot changes
//!
//! Each task owns a host thread. A thread may leave the kernel only while the scheduler names its
//! task as current; everybody else sleeps on `Shared::switch`. Switching is therefore a matter of
//! updating `Scheduler::current` and notifying the condvar.

use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

mod context;
mod tick;

pub use context::TaskContext;

use crate::config::{KernelConfig, TickSource};
use crate::console::{Console, StdoutConsole};
use crate::error::{CreationFailure, RecvError, SendError, StartError};
use crate::heap::HeapBudget;
use crate::queue::{QueueArena, QueueHandle};
use crate::sched::Scheduler;
use crate::task::{BlockReason, QueueSide, TaskHandle, TaskParams, TaskState, TaskTable, WakeReason};
use crate::types::{Priority, QueueId, TaskId, Tick};
use crate::wait::{Deadline, Wait};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Unwind payload that takes a task thread out of its entry once the scheduler has ended.
struct Halted;

/// Result of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Clock value after the increment.
    pub now: Tick,
    /// Number of timed waits that expired on this tick.
    pub expired: usize,
    /// A ready task outranks the running one (or the core was idle with work pending).
    pub switch_required: bool,
}

/// Handle to a kernel instance. Clones share the same kernel.
#[derive(Clone)]
pub struct Kernel {
    shared: Arc<Shared>,
}

struct Shared {
    core: Mutex<Core>,
    switch: Condvar,
    config: KernelConfig,
    console: Arc<dyn Console>,
    stamp: u64,
}

struct Core {
    tasks: TaskTable,
    sched: Scheduler,
    queues: QueueArena,
    heap: HeapBudget,
    clock: Tick,
    seq: u64,
    started: bool,
    halted: bool,
}

static_assertions::assert_impl_all!(Kernel: Send, Sync, Clone);

impl Core {
    fn current_id(&self) -> Option<TaskId> {
        self.sched.current().map(|running| running.id)
    }

    fn is_idle(&self) -> bool {
        self.sched.current().is_none() && (self.halted || self.sched.ready_len() == 0)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Fills an empty Running slot with the highest-priority ready task.
    fn dispatch(&mut self) -> Option<TaskId> {
        if let Some(id) = self.current_id() {
            return Some(id);
        }
        if !self.started || self.halted {
            return None;
        }
        let tasks = &self.tasks;
        let next = self.sched.schedule_next(|id| tasks.priority_of(id));
        match next {
            Some(id) => {
                self.tasks.set_running(id);
                log::trace!(target: "sched", "dispatch task {id}");
            }
            None => log::trace!(target: "sched", "idle"),
        }
        next
    }

    /// Moves the running task into the wait list of `queue`/`side` and blocks it.
    fn block_running(&mut self, me: TaskId, queue: QueueId, side: QueueSide, until: Option<Deadline>) {
        let seq = self.next_seq();
        let priority = self.tasks.priority_of(me);
        if let Some(waiters) = self.queues.waiters_mut(queue, side) {
            waiters.insert(me, priority, seq);
        }
        self.tasks.block_current(BlockReason::Queue { queue, side }, until, &mut self.sched);
        log::trace!(target: "queue", "task {me} blocked on queue {queue} ({side:?}) until {until:?}");
    }

    /// Wakes the head waiter of `queue`/`side`, if any.
    fn wake_one(&mut self, queue: QueueId, side: QueueSide) -> Option<TaskId> {
        let task = self.queues.waiters_mut(queue, side).and_then(|waiters| waiters.pop())?;
        self.tasks.wake(task, WakeReason::Available, &mut self.sched);
        log::trace!(target: "queue", "task {task} woken by queue {queue} ({side:?})");
        Some(task)
    }

    /// Removes a timed-out task from its wait list and makes it ready.
    fn expire(&mut self, id: TaskId) {
        let reason = self.tasks.task(id).and_then(|task| task.block_reason());
        if let Some(BlockReason::Queue { queue, side }) = reason {
            if let Some(waiters) = self.queues.waiters_mut(queue, side) {
                waiters.remove(id);
            }
        }
        self.tasks.wake(id, WakeReason::TimedOut, &mut self.sched);
        log::debug!(target: "tick", "task {id} timed out at {}", self.clock);
    }
}

impl Kernel {
    /// Creates a kernel that prints to stdout.
    pub fn new(config: KernelConfig) -> Self {
        Self::with_console(config, StdoutConsole)
    }

    /// Creates a kernel with a custom console sink.
    pub fn with_console(config: KernelConfig, console: impl Console + 'static) -> Self {
        let core = Core {
            tasks: TaskTable::new(),
            sched: Scheduler::new(config.max_priorities),
            queues: QueueArena::new(),
            heap: HeapBudget::new(config.heap_bytes),
            clock: Tick::ZERO,
            seq: 0,
            started: false,
            halted: false,
        };
        let shared = Shared {
            core: Mutex::new(core),
            switch: Condvar::new(),
            config,
            console: Arc::new(console),
            stamp: NEXT_STAMP.fetch_add(1, Ordering::Relaxed),
        };
        Self { shared: Arc::new(shared) }
    }

    /// Configuration the kernel was created with.
    pub fn config(&self) -> &KernelConfig {
        &self.shared.config
    }

    /// Console sink shared by all tasks.
    pub fn console(&self) -> &dyn Console {
        self.shared.console.as_ref()
    }

    // ============================================================
    // Creation
    // ============================================================

    /// Allocates a queue able to hold `capacity` items of `T`.
    pub fn create_queue<T: Send + 'static>(
        &self,
        capacity: usize,
    ) -> Result<QueueHandle<T>, CreationFailure> {
        let mut core = self.shared.core.lock();
        let core = &mut *core;
        match core.queues.create::<T>(capacity, &mut core.heap) {
            Ok(id) => {
                log::debug!(target: "queue", "created queue {id}: {capacity} x {} bytes", std::mem::size_of::<T>());
                Ok(QueueHandle::new(id, self.shared.stamp))
            }
            Err(err) => {
                log::warn!(target: "queue", "queue creation failed: {err}");
                Err(err)
            }
        }
    }

    /// Creates a Ready task running `entry(ctx, arg)` on its own thread.
    ///
    /// Before the scheduler starts the task only joins its ready list. Afterwards an idle kernel
    /// dispatches it at once; a busy one lets it preempt at the running task's next scheduling
    /// point (use [`TaskContext::spawn`] from task code for immediate preemption).
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
        let mut core = self.shared.core.lock();
        let handle = self.spawn_locked(&mut core, params, entry, arg)?;
        if core.sched.current().is_none() && core.dispatch().is_some() {
            self.shared.switch.notify_all();
        }
        Ok(handle)
    }

    fn spawn_locked<A, F>(
        &self,
        core: &mut Core,
        params: TaskParams,
        entry: F,
        arg: A,
    ) -> Result<TaskHandle, CreationFailure>
    where
        A: Send + 'static,
        F: FnOnce(&TaskContext, A) + Send + 'static,
    {
        let priority = core.sched.clamp(params.priority);
        if priority != params.priority {
            log::warn!(
                target: "task",
                "task '{}': priority {} clamped to {}",
                params.name,
                params.priority,
                priority
            );
        }
        let charged = core.heap.reserve(params.stack_size).inspect_err(|err| {
            log::warn!(target: "task", "task '{}' not created: {err}", params.name);
        })?;

        let id = core.tasks.next_id();
        let kernel = self.clone();
        let name = params.name.clone();
        let spawned = thread::Builder::new()
            .name(params.name.clone())
            .stack_size(params.stack_size.max(self.shared.config.min_host_stack))
            .spawn(move || kernel.task_main(id, name, entry, arg));
        if let Err(err) = spawned {
            core.heap.release(charged);
            log::warn!(target: "task", "task '{}' not created: {err}", params.name);
            return Err(CreationFailure::ThreadSpawn(err.to_string()));
        }

        let inserted = core.tasks.insert(&params, priority, &mut core.sched);
        debug_assert_eq!(inserted, id);
        log::debug!(target: "task", "spawned task {id} '{}' at priority {priority}", params.name);
        Ok(TaskHandle { id })
    }

    fn task_main<A, F>(self, id: TaskId, name: String, entry: F, arg: A)
    where
        F: FnOnce(&TaskContext, A),
    {
        let ctx = TaskContext::new(self, id);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            {
                let mut core = ctx.kernel().shared.core.lock();
                ctx.kernel().wait_turn(&mut core, id);
            }
            entry(&ctx, arg)
        }));
        match outcome {
            Ok(()) => log::error!(target: "task", "task {id} '{name}' returned from its entry"),
            Err(payload) if payload.is::<Halted>() => {
                log::debug!(target: "task", "task {id} '{name}' stopped with the scheduler");
                ctx.kernel().vacate(id);
                return;
            }
            Err(_) => log::error!(target: "task", "task {id} '{name}' panicked"),
        }
        ctx.kernel().retire(id);
    }

    /// Frees the Running slot held by a task stopped with the scheduler.
    fn vacate(&self, me: TaskId) {
        let mut core = self.shared.core.lock();
        if core.current_id() == Some(me) {
            core.sched.preempt_current();
            core.tasks.set_ready(me);
            drop(core);
            self.shared.switch.notify_all();
        }
    }

    /// Parks a finished task for good and hands the CPU on.
    fn retire(&self, me: TaskId) {
        let mut core = self.shared.core.lock();
        let core = &mut *core;
        if core.current_id() == Some(me) {
            core.tasks.block_current(BlockReason::Returned, None, &mut core.sched);
            core.dispatch();
            self.shared.switch.notify_all();
        }
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Dispatches the highest-priority ready task, starts a periodic tick source if configured
    /// and returns to the caller.
    pub fn launch(&self) -> Result<(), StartError> {
        {
            let mut core = self.shared.core.lock();
            if core.started {
                return Err(StartError::AlreadyStarted);
            }
            core.started = true;
            let first = core.dispatch();
            log::debug!(target: "sched", "scheduler started; first task {first:?}");
        }
        self.shared.switch.notify_all();
        if let TickSource::Periodic(period) = self.shared.config.tick_source {
            tick::spawn_ticker(self.clone(), period)?;
        }
        Ok(())
    }

    /// Starts the scheduler and blocks the calling thread forever.
    ///
    /// Returns only when the scheduler could not be started.
    pub fn start(self) -> Result<Infallible, StartError> {
        self.launch()?;
        loop {
            thread::park();
        }
    }

    /// Stops dispatching and tick expiry.
    ///
    /// Task threads leave their entry at the next kernel call (waiting ones at once) and exit,
    /// dropping their handles to the kernel. The running task goes back to Ready; every other
    /// task keeps its state.
    pub fn end_scheduler(&self) {
        let mut core = self.shared.core.lock();
        core.halted = true;
        log::debug!(target: "sched", "scheduler ended at {}", core.clock);
        drop(core);
        self.shared.switch.notify_all();
    }

    /// Returns `true` once `end_scheduler` was called.
    pub fn is_halted(&self) -> bool {
        self.shared.core.lock().halted
    }

    /// Waits until no task runs and none is ready. Returns `false` on timeout.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut core = self.shared.core.lock();
        while !(core.started && core.is_idle()) {
            if self.shared.switch.wait_until(&mut core, deadline).timed_out() {
                return core.started && core.is_idle();
            }
        }
        true
    }

    /// Advances the clock by one tick and expires due timed waits.
    pub fn tick(&self) -> TickOutcome {
        let mut core = self.shared.core.lock();
        if core.halted {
            return TickOutcome { now: core.clock, ..TickOutcome::default() };
        }
        core.clock.advance();
        let now = core.clock;
        let expired = core.tasks.expired(now);
        for id in &expired {
            core.expire(*id);
        }
        let switch_required = core.sched.preemption_pending()
            || (core.sched.current().is_none() && core.sched.ready_len() > 0);
        if core.sched.current().is_none() && core.dispatch().is_some() {
            self.shared.switch.notify_all();
        }
        TickOutcome { now, expired: expired.len(), switch_required }
    }

    /// Current clock value.
    pub fn now(&self) -> Tick {
        self.shared.core.lock().clock
    }

    // ============================================================
    // Introspection
    // ============================================================

    /// Task holding the CPU, if any.
    pub fn current_task(&self) -> Option<TaskId> {
        self.shared.core.lock().current_id()
    }

    /// State of `task`.
    pub fn task_state(&self, task: TaskHandle) -> Option<TaskState> {
        self.shared.core.lock().tasks.task(task.id).map(|t| t.state())
    }

    /// Effective (clamped) priority of `task`.
    pub fn task_priority(&self, task: TaskHandle) -> Option<Priority> {
        self.shared.core.lock().tasks.task(task.id).map(|t| t.priority())
    }

    /// Name of `task`.
    pub fn task_name(&self, task: TaskHandle) -> Option<String> {
        self.shared.core.lock().tasks.task(task.id).map(|t| t.name().to_string())
    }

    /// Why `task` is blocked, if it is.
    pub fn block_reason(&self, task: TaskHandle) -> Option<BlockReason> {
        self.shared.core.lock().tasks.task(task.id).and_then(|t| t.block_reason())
    }

    /// Bytes left in the heap budget.
    pub fn heap_available(&self) -> usize {
        self.shared.core.lock().heap.available()
    }

    /// Items stored in `queue` (0 for a foreign handle). Advisory only.
    pub fn messages_waiting<T>(&self, queue: &QueueHandle<T>) -> usize {
        self.queue_len(queue).map_or(0, |(len, _)| len)
    }

    /// Free slots in `queue` (0 for a foreign handle).
    pub fn spaces_available<T>(&self, queue: &QueueHandle<T>) -> usize {
        self.queue_len(queue).map_or(0, |(len, cap)| cap - len)
    }

    /// Capacity of `queue` (0 for a foreign handle).
    pub fn capacity<T>(&self, queue: &QueueHandle<T>) -> usize {
        self.queue_len(queue).map_or(0, |(_, cap)| cap)
    }

    /// Tasks blocked on `queue`, in wake order: (producers, consumers).
    pub fn waiting_tasks<T>(&self, queue: &QueueHandle<T>) -> (Vec<TaskId>, Vec<TaskId>) {
        if queue.owner != self.shared.stamp {
            return (Vec::new(), Vec::new());
        }
        let core = self.shared.core.lock();
        let list = |side| core.queues.waiters(queue.id, side).map(|w| w.tasks()).unwrap_or_default();
        (list(QueueSide::Send), list(QueueSide::Receive))
    }

    fn queue_len<T>(&self, queue: &QueueHandle<T>) -> Option<(usize, usize)> {
        if queue.owner != self.shared.stamp {
            return None;
        }
        let core = self.shared.core.lock();
        Some((core.queues.len_of(queue.id)?, core.queues.capacity_of(queue.id)?))
    }

    // ============================================================
    // Non-blocking queue access from outside task context
    // ============================================================

    /// Sends without blocking from a thread that is not a task (interrupt-style). A consumer it
    /// wakes is dispatched at once when the kernel is idle, otherwise at the running task's next
    /// scheduling point.
    pub fn try_send<T: Send + 'static>(
        &self,
        queue: &QueueHandle<T>,
        item: T,
    ) -> Result<(), SendError<T>> {
        if queue.owner != self.shared.stamp {
            return Err(SendError::ForeignHandle(item));
        }
        let mut core = self.shared.core.lock();
        let Some(ring) = core.queues.ring_mut::<T>(queue.id) else {
            return Err(SendError::ForeignHandle(item));
        };
        ring.push_back(item).map_err(SendError::Full)?;
        if core.wake_one(queue.id, QueueSide::Receive).is_some()
            && core.sched.current().is_none()
            && core.dispatch().is_some()
        {
            self.shared.switch.notify_all();
        }
        Ok(())
    }

    /// Receives without blocking from a thread that is not a task (interrupt-style).
    pub fn try_receive<T: Send + 'static>(&self, queue: &QueueHandle<T>) -> Result<T, RecvError> {
        if queue.owner != self.shared.stamp {
            return Err(RecvError::ForeignHandle);
        }
        let mut core = self.shared.core.lock();
        let Some(ring) = core.queues.ring_mut::<T>(queue.id) else {
            return Err(RecvError::ForeignHandle);
        };
        let item = ring.pop_front().ok_or(RecvError::Empty)?;
        if core.wake_one(queue.id, QueueSide::Send).is_some()
            && core.sched.current().is_none()
            && core.dispatch().is_some()
        {
            self.shared.switch.notify_all();
        }
        Ok(item)
    }

    // ============================================================
    // Task-context primitives (used through TaskContext)
    // ============================================================

    /// Sleeps until `me` holds the CPU. Unwinds the task thread once the scheduler has ended.
    fn wait_turn(&self, core: &mut MutexGuard<'_, Core>, me: TaskId) {
        loop {
            if core.halted {
                panic::resume_unwind(Box::new(Halted));
            }
            if core.current_id() == Some(me) {
                return;
            }
            self.shared.switch.wait(core);
        }
    }

    /// Gives the CPU to whoever the scheduler picks next and waits to get it back.
    fn switch_away(&self, core: &mut MutexGuard<'_, Core>, me: TaskId) {
        core.dispatch();
        self.shared.switch.notify_all();
        self.wait_turn(core, me);
    }

    /// Scheduling point: yields to a higher-priority ready task.
    fn checkpoint(&self, core: &mut MutexGuard<'_, Core>, me: TaskId) {
        if core.sched.preemption_pending() {
            log::trace!(target: "sched", "task {me} preempted");
            core.sched.preempt_current();
            core.tasks.set_ready(me);
            self.switch_away(core, me);
        }
    }

    fn yield_as(&self, me: TaskId) {
        let mut core = self.shared.core.lock();
        self.wait_turn(&mut core, me);
        core.sched.yield_current();
        core.tasks.set_ready(me);
        self.switch_away(&mut core, me);
    }

    fn spawn_as<A, F>(
        &self,
        me: TaskId,
        params: TaskParams,
        entry: F,
        arg: A,
    ) -> Result<TaskHandle, CreationFailure>
    where
        A: Send + 'static,
        F: FnOnce(&TaskContext, A) + Send + 'static,
    {
        let mut core = self.shared.core.lock();
        self.wait_turn(&mut core, me);
        let handle = self.spawn_locked(&mut core, params, entry, arg)?;
        self.checkpoint(&mut core, me);
        Ok(handle)
    }

    fn send_as<T: Send + 'static>(
        &self,
        me: TaskId,
        queue: &QueueHandle<T>,
        mut item: T,
        wait: Wait,
        to_front: bool,
    ) -> Result<(), SendError<T>> {
        if queue.owner != self.shared.stamp {
            return Err(SendError::ForeignHandle(item));
        }
        let mut core = self.shared.core.lock();
        self.wait_turn(&mut core, me);
        self.checkpoint(&mut core, me);
        let mut deadline = None;
        loop {
            let Some(ring) = core.queues.ring_mut::<T>(queue.id) else {
                return Err(SendError::ForeignHandle(item));
            };
            let pushed = if to_front { ring.push_front(item) } else { ring.push_back(item) };
            match pushed {
                Ok(()) => {
                    core.wake_one(queue.id, QueueSide::Receive);
                    self.checkpoint(&mut core, me);
                    return Ok(());
                }
                Err(rejected) => item = rejected,
            }

            if wait.is_non_blocking() {
                return Err(SendError::Full(item));
            }
            let now = core.clock;
            let until = *deadline.get_or_insert_with(|| wait.deadline_from(now));
            if until.is_some_and(|d| d.expired(now)) {
                return Err(SendError::Timeout(item));
            }
            core.block_running(me, queue.id, QueueSide::Send, until);
            self.switch_away(&mut core, me);
            if core.tasks.take_wake_reason(me) == Some(WakeReason::TimedOut) {
                return Err(SendError::Timeout(item));
            }
        }
    }

    fn receive_as<T: Send + 'static>(
        &self,
        me: TaskId,
        queue: &QueueHandle<T>,
        wait: Wait,
    ) -> Result<T, RecvError> {
        if queue.owner != self.shared.stamp {
            return Err(RecvError::ForeignHandle);
        }
        let mut core = self.shared.core.lock();
        self.wait_turn(&mut core, me);
        self.checkpoint(&mut core, me);
        let mut deadline = None;
        loop {
            let Some(ring) = core.queues.ring_mut::<T>(queue.id) else {
                return Err(RecvError::ForeignHandle);
            };
            if let Some(item) = ring.pop_front() {
                core.wake_one(queue.id, QueueSide::Send);
                self.checkpoint(&mut core, me);
                return Ok(item);
            }

            if wait.is_non_blocking() {
                return Err(RecvError::Empty);
            }
            let now = core.clock;
            let until = *deadline.get_or_insert_with(|| wait.deadline_from(now));
            if until.is_some_and(|d| d.expired(now)) {
                return Err(RecvError::Timeout);
            }
            core.block_running(me, queue.id, QueueSide::Receive, until);
            self.switch_away(&mut core, me);
            if core.tasks.take_wake_reason(me) == Some(WakeReason::TimedOut) {
                return Err(RecvError::Timeout);
            }
        }
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel").field("stamp", &self.shared.stamp).finish_non_exhaustive()
    }
}
