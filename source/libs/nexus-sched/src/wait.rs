// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Blocking behaviour of queue operations and tick conversions
//! OWNERS: @runtime
//! PUBLIC API: Wait, Ticks, Deadline
//! INVARIANTS: Zero ticks never blocks; `Forever` never expires; deadlines are absolute ticks

use crate::types::Tick;

/// Behaviour of a blocking queue call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wait {
    /// Return immediately if no progress can be made.
    NonBlocking,
    /// Block for at most the given number of ticks.
    Ticks(u32),
    /// Block until the operation completes.
    Forever,
}

impl Wait {
    /// Maps a raw tick count: `0` never blocks, `u32::MAX` blocks forever.
    pub const fn from_ticks(ticks: u32) -> Self {
        match ticks {
            0 => Self::NonBlocking,
            u32::MAX => Self::Forever,
            n => Self::Ticks(n),
        }
    }

    /// Returns `true` when the caller requested a non-blocking attempt.
    pub const fn is_non_blocking(self) -> bool {
        matches!(self, Self::NonBlocking | Self::Ticks(0))
    }

    /// Absolute deadline for a wait that starts at `now`, `None` for `Forever`.
    pub(crate) fn deadline_from(self, now: Tick) -> Option<Deadline> {
        match self {
            Self::NonBlocking => Some(Deadline { tick: now }),
            Self::Ticks(n) => Some(Deadline { tick: now.saturating_add(n) }),
            Self::Forever => None,
        }
    }
}

impl From<Ticks> for Wait {
    fn from(ticks: Ticks) -> Self {
        Self::from_ticks(ticks.0)
    }
}

/// Relative tick count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticks(pub u32);

impl Ticks {
    /// Converts milliseconds to ticks at `tick_rate_hz`, rounding down.
    pub const fn from_ms(ms: u32, tick_rate_hz: u32) -> Self {
        let ticks = (ms as u64 * tick_rate_hz as u64) / 1000;
        if ticks > u32::MAX as u64 {
            Self(u32::MAX)
        } else {
            Self(ticks as u32)
        }
    }

    /// Raw tick count.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Absolute expiry point of a timed wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    /// Clock value at which the wait expires.
    pub tick: Tick,
}

impl Deadline {
    /// Deadline `ticks` after `now`.
    pub const fn after(now: Tick, ticks: u32) -> Self {
        Self { tick: now.saturating_add(ticks) }
    }

    /// Returns `true` once the clock has reached the deadline.
    pub fn expired(self, now: Tick) -> bool {
        now >= self.tick
    }

    /// Ticks left before expiry at `now`.
    pub fn remaining(self, now: Tick) -> u64 {
        self.tick.since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_ticks_map_to_wait_modes() {
        assert_eq!(Wait::from_ticks(0), Wait::NonBlocking);
        assert_eq!(Wait::from_ticks(100), Wait::Ticks(100));
        assert_eq!(Wait::from_ticks(u32::MAX), Wait::Forever);
        assert!(Wait::Ticks(0).is_non_blocking());
    }

    #[test]
    fn forever_has_no_deadline() {
        assert_eq!(Wait::Forever.deadline_from(Tick::from_raw(7)), None);
        assert_eq!(
            Wait::Ticks(5).deadline_from(Tick::from_raw(7)),
            Some(Deadline { tick: Tick::from_raw(12) })
        );
    }
}
