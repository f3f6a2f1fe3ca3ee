// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Fixed-size heap budget for queue storage and task stacks
//! OWNERS: @runtime
//! PUBLIC API: HeapBudget (reserve/release/available)
//! INVARIANTS: used <= total; every reservation is rounded up to HEAP_ALIGN; no growth

use crate::error::CreationFailure;

/// Granularity of heap reservations in bytes.
pub const HEAP_ALIGN: usize = 8;

/// Byte budget for kernel objects. Exhaustion surfaces as
/// [`CreationFailure::OutOfMemory`].
#[derive(Debug, Clone)]
pub struct HeapBudget {
    total: usize,
    used: usize,
}

impl HeapBudget {
    /// Creates a budget of `total` bytes.
    pub const fn new(total: usize) -> Self {
        Self { total, used: 0 }
    }

    /// Reserves `bytes` (rounded up to [`HEAP_ALIGN`]) and returns the charged size.
    pub fn reserve(&mut self, bytes: usize) -> Result<usize, CreationFailure> {
        let available = self.available();
        let charged = align_up(bytes).ok_or(CreationFailure::OutOfMemory {
            requested: bytes,
            available,
        })?;
        if charged > available {
            return Err(CreationFailure::OutOfMemory { requested: charged, available });
        }
        self.used += charged;
        Ok(charged)
    }

    /// Returns a reservation made by [`HeapBudget::reserve`].
    pub fn release(&mut self, charged: usize) {
        self.used = self.used.saturating_sub(charged);
    }

    /// Bytes still available.
    pub fn available(&self) -> usize {
        self.total - self.used
    }

    /// Bytes currently reserved.
    pub fn used(&self) -> usize {
        self.used
    }
}

fn align_up(bytes: usize) -> Option<usize> {
    let mask = HEAP_ALIGN - 1;
    bytes.checked_add(mask).map(|b| b & !mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_are_aligned() {
        let mut heap = HeapBudget::new(64);
        assert_eq!(heap.reserve(5), Ok(8));
        assert_eq!(heap.reserve(16), Ok(16));
        assert_eq!(heap.available(), 40);
    }

    #[test]
    fn exhaustion_reports_shortfall() {
        let mut heap = HeapBudget::new(16);
        heap.reserve(8).expect("fits");
        assert_eq!(
            heap.reserve(20),
            Err(CreationFailure::OutOfMemory { requested: 24, available: 8 })
        );
        assert_eq!(heap.used(), 8);
    }

    #[test]
    fn overflowing_request_is_rejected() {
        let mut heap = HeapBudget::new(16);
        assert!(matches!(heap.reserve(usize::MAX), Err(CreationFailure::OutOfMemory { .. })));
    }

    #[test]
    fn release_returns_bytes() {
        let mut heap = HeapBudget::new(16);
        let charged = heap.reserve(16).expect("fits");
        heap.release(charged);
        assert_eq!(heap.available(), 16);
    }
}
