// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Kernel configuration knobs
//! OWNERS: @runtime
//! PUBLIC API: KernelConfig, TickSource
//! INVARIANTS: Defaults are deterministic and stable across runs; at least one priority level
//!
//! The kernel runs on the host for tests and demos. For reproducibility the defaults drive time
//! manually (the caller ticks); the demo switches to a periodic tick thread.

use std::time::Duration;

const DEFAULT_TICK_RATE_HZ: u32 = 1000; // 1 ms tick
const DEFAULT_HEAP_BYTES: usize = 64 * 1024;
const DEFAULT_MAX_PRIORITIES: u8 = 5;
const DEFAULT_MIN_HOST_STACK: usize = 256 * 1024;

/// Where scheduler ticks come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickSource {
    /// The embedding code calls `Kernel::tick` itself.
    Manual,
    /// A dedicated thread calls `Kernel::tick` once per period after `Kernel::start`.
    Periodic(Duration),
}

/// Static configuration of a kernel instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelConfig {
    /// Source of scheduler ticks.
    pub tick_source: TickSource,
    /// Nominal tick rate, used to convert milliseconds into ticks.
    pub tick_rate_hz: u32,
    /// Total bytes available for queue storage and task stacks.
    pub heap_bytes: usize,
    /// Number of priority levels; valid priorities are `0..max_priorities`.
    pub max_priorities: u8,
    /// Lower bound for the OS stack of a task thread. The requested `stack_size` is what is
    /// charged to the heap budget; host threads need more than an MCU task would.
    pub min_host_stack: usize,
}

impl KernelConfig {
    /// Returns a config with a periodic tick matching `tick_rate_hz`.
    pub fn periodic(mut self) -> Self {
        let hz = self.tick_rate_hz.max(1);
        self.tick_source = TickSource::Periodic(Duration::from_nanos(1_000_000_000 / hz as u64));
        self
    }

    /// Overrides the heap budget.
    pub fn with_heap_bytes(mut self, bytes: usize) -> Self {
        self.heap_bytes = bytes;
        self
    }

    /// Overrides the number of priority levels (at least one).
    pub fn with_max_priorities(mut self, levels: u8) -> Self {
        self.max_priorities = levels.max(1);
        self
    }

    /// Overrides the tick source.
    pub fn with_tick_source(mut self, source: TickSource) -> Self {
        self.tick_source = source;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tick_source: TickSource::Manual,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            heap_bytes: DEFAULT_HEAP_BYTES,
            max_priorities: DEFAULT_MAX_PRIORITIES,
            min_host_stack: DEFAULT_MIN_HOST_STACK,
        }
    }
}
