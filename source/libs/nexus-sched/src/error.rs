// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Error taxonomy of the kernel
//! OWNERS: @runtime
//! PUBLIC API: CreationFailure, SendError<T>, RecvError, StartError
//! INVARIANTS: Errors are returned by value; a rejected item is always handed back to the sender

use core::fmt;

use thiserror::Error;

/// Queue or task storage could not be provided.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreationFailure {
    /// Queues must hold at least one item.
    #[error("queue capacity must be non-zero")]
    ZeroCapacity,
    /// The heap budget cannot cover the request.
    #[error("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes the creation needed.
        requested: usize,
        /// Bytes left in the budget.
        available: usize,
    },
    /// The host allocator refused the storage.
    #[error("host allocation failed")]
    Allocation,
    /// The OS refused to create the task thread.
    #[error("task thread could not be spawned: {0}")]
    ThreadSpawn(String),
}

/// Errors returned when starting the scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartError {
    /// `start`/`launch` was already called on this kernel.
    #[error("scheduler already started")]
    AlreadyStarted,
    /// The periodic tick thread could not be spawned.
    #[error("tick thread could not be spawned: {0}")]
    TickThread(String),
}

/// Errors returned by receive operations.
#[must_use = "receive errors must be handled"]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// Queue was empty and the caller asked not to block.
    #[error("queue is empty")]
    Empty,
    /// The wait interval elapsed before an item arrived.
    #[error("timed out waiting for an item")]
    Timeout,
    /// The handle was created by another kernel instance.
    #[error("queue handle does not belong to this kernel")]
    ForeignHandle,
}

impl RecvError {
    /// `Empty` is the zero-wait flavour of `Timeout`.
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::Empty | Self::Timeout)
    }
}

/// Errors returned by send operations; the rejected item travels back to the caller.
#[must_use = "send errors carry the rejected item"]
#[derive(Clone, PartialEq, Eq)]
pub enum SendError<T> {
    /// Queue was full and the caller asked not to block.
    Full(T),
    /// The wait interval elapsed before space became available.
    Timeout(T),
    /// The handle was created by another kernel instance.
    ForeignHandle(T),
}

impl<T> SendError<T> {
    /// Recovers the item that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Timeout(item) | Self::ForeignHandle(item) => item,
        }
    }

    /// `Full` is the zero-wait flavour of `Timeout`.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Full(_) | Self::Timeout(_))
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Timeout(_) => f.write_str("Timeout(..)"),
            Self::ForeignHandle(_) => f.write_str("ForeignHandle(..)"),
        }
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => write!(f, "queue is full"),
            Self::Timeout(_) => write!(f, "timed out waiting for queue space"),
            Self::ForeignHandle(_) => write!(f, "queue handle does not belong to this kernel"),
        }
    }
}

impl<T> std::error::Error for SendError<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_is_a_timeout_flavour() {
        assert!(SendError::Full(1).is_timeout());
        assert!(!SendError::ForeignHandle(1).is_timeout());
        assert!(RecvError::Empty.is_timeout());
        assert_eq!(SendError::Timeout(7).into_inner(), 7);
    }

    #[test]
    fn messages_are_stable() {
        let err = CreationFailure::OutOfMemory { requested: 40, available: 8 };
        assert_eq!(err.to_string(), "out of memory: requested 40 bytes, 8 available");
        assert_eq!(SendError::Full(()).to_string(), "queue is full");
    }
}
