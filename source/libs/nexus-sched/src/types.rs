// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Newtypes shared by the scheduler, task table and queue arena
//! OWNERS: @runtime
//! PUBLIC API: TaskId, QueueId, Priority, Tick
//! DEPENDS_ON: core::fmt
//! INVARIANTS: Ids are dense arena indices; priorities are totally ordered (higher = more urgent);
//!             ticks are monotonic and never wrap in practice (u64)
//!
//! The newtypes keep task indices, queue indices, priorities and tick counts from being mixed up
//! at call sites that all happen to carry plain integers.

use core::fmt;

/// Task identifier handed out by the task table.
///
/// **Ownership**: Only `TaskTable` creates ids; they are dense indices into the table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a task id from a raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the id as an index into task-owned vectors.
    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// Queue identifier: index into the kernel's queue arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct QueueId(u32);

impl QueueId {
    /// Creates a queue id from a raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the id as an index into the arena.
    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// Fixed task priority. Higher values are more urgent; `Priority::IDLE` is the lowest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Priority(u8);

impl Priority {
    /// Lowest priority level.
    pub const IDLE: Self = Self(0);

    /// Creates a priority from a raw level.
    #[inline]
    pub const fn new(level: u8) -> Self {
        Self(level)
    }

    /// Returns the raw level.
    #[inline]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Returns the level as an index into per-priority ready lists.
    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for Priority {
    #[inline]
    fn from(level: u8) -> Self {
        Self(level)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduler clock value, counted in ticks since the kernel was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tick(u64);

impl Tick {
    /// Clock value at kernel creation.
    pub const ZERO: Self = Self(0);

    /// Creates a tick value from a raw count.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw tick count.
    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Returns the tick `ticks` after `self`, saturating at the far end of time.
    #[inline]
    pub const fn saturating_add(self, ticks: u32) -> Self {
        Self(self.0.saturating_add(ticks as u64))
    }

    /// Advances by one tick.
    #[inline]
    pub(crate) fn advance(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Ticks elapsed since `earlier` (zero if `earlier` is in the future).
    #[inline]
    pub const fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
