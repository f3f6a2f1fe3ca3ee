// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Bounded queues: ring storage, wait lists and the kernel-owned queue arena
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests + property tests (tests_prop.rs) + kernel integration tests
//! PUBLIC API: Ring<T>, QueueHandle<T>, QueueArena, WaitList
//! DEPENDS_ON: heap::HeapBudget, types::QueueId
//! INVARIANTS: 0 <= len <= capacity; capacity fixed for the queue lifetime; items leave in the
//!             order they were placed (send-to-front places at the head)
//!
//! The arena is type-erased so a single kernel can own queues of different item types. Typed
//! access goes through `QueueHandle<T>`, which carries the item type and the owning kernel's
//! stamp.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

pub mod wait_list;
#[cfg(test)]
mod tests_prop;

pub use wait_list::WaitList;

use crate::error::CreationFailure;
use crate::heap::HeapBudget;
use crate::task::QueueSide;
use crate::types::QueueId;

/// Fixed-capacity ring buffer.
pub struct Ring<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> Ring<T> {
    /// Allocates a ring of `capacity` slots, reporting host allocation failure.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, CreationFailure> {
        if capacity == 0 {
            return Err(CreationFailure::ZeroCapacity);
        }
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|_| CreationFailure::Allocation)?;
        slots.resize_with(capacity, || None);
        Ok(Self { slots: slots.into_boxed_slice(), head: 0, len: 0 })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no item is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` when every slot is used.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Writes `item` into the slot after the last item; hands it back when full.
    pub fn push_back(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Writes `item` into the slot before the head; hands it back when full.
    pub fn push_front(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.head = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots[self.head] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Removes the head item.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        item
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("head", &self.head)
            .finish()
    }
}

/// Type-independent view of a ring stored in the arena.
trait ErasedRing: Send {
    fn len(&self) -> usize;
    fn capacity(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + 'static> ErasedRing for Ring<T> {
    fn len(&self) -> usize {
        Ring::len(self)
    }

    fn capacity(&self) -> usize {
        Ring::capacity(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Opaque, typed handle to a queue owned by a kernel.
pub struct QueueHandle<T> {
    pub(crate) id: QueueId,
    pub(crate) owner: u64,
    _item: PhantomData<fn(T) -> T>,
}

impl<T> QueueHandle<T> {
    pub(crate) fn new(id: QueueId, owner: u64) -> Self {
        Self { id, owner, _item: PhantomData }
    }

    /// Arena id of the queue.
    pub fn id(&self) -> QueueId {
        self.id
    }
}

impl<T> Clone for QueueHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for QueueHandle<T> {}

impl<T> PartialEq for QueueHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.owner == other.owner
    }
}

impl<T> Eq for QueueHandle<T> {}

impl<T> fmt::Debug for QueueHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueHandle").field("id", &self.id).field("owner", &self.owner).finish()
    }
}

/// Arena entry: storage plus both wait lists.
struct QueueSlot {
    ring: Box<dyn ErasedRing>,
    producers: WaitList,
    consumers: WaitList,
}

/// All queues created on a kernel. Queues live as long as the kernel.
#[derive(Default)]
pub struct QueueArena {
    slots: Vec<QueueSlot>,
}

impl QueueArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a queue of `capacity` items of `T`, charging the slot storage to `heap`.
    pub fn create<T: Send + 'static>(
        &mut self,
        capacity: usize,
        heap: &mut HeapBudget,
    ) -> Result<QueueId, CreationFailure> {
        if capacity == 0 {
            return Err(CreationFailure::ZeroCapacity);
        }
        let bytes = capacity.checked_mul(std::mem::size_of::<T>()).ok_or(
            CreationFailure::OutOfMemory { requested: usize::MAX, available: heap.available() },
        )?;
        let charged = heap.reserve(bytes)?;
        let ring = match Ring::<T>::try_with_capacity(capacity) {
            Ok(ring) => ring,
            Err(err) => {
                heap.release(charged);
                return Err(err);
            }
        };
        let id = QueueId::from_raw(self.slots.len() as u32);
        self.slots.push(QueueSlot {
            ring: Box::new(ring),
            producers: WaitList::new(),
            consumers: WaitList::new(),
        });
        Ok(id)
    }

    /// Typed access to the ring of `id`; `None` for unknown ids or a mismatched item type.
    pub fn ring_mut<T: Send + 'static>(&mut self, id: QueueId) -> Option<&mut Ring<T>> {
        self.slots.get_mut(id.as_index())?.ring.as_any_mut().downcast_mut::<Ring<T>>()
    }

    /// Items currently stored in `id`.
    pub fn len_of(&self, id: QueueId) -> Option<usize> {
        self.slots.get(id.as_index()).map(|slot| slot.ring.len())
    }

    /// Capacity of `id`.
    pub fn capacity_of(&self, id: QueueId) -> Option<usize> {
        self.slots.get(id.as_index()).map(|slot| slot.ring.capacity())
    }

    /// Wait list of one side of `id`.
    pub fn waiters_mut(&mut self, id: QueueId, side: QueueSide) -> Option<&mut WaitList> {
        let slot = self.slots.get_mut(id.as_index())?;
        Some(match side {
            QueueSide::Send => &mut slot.producers,
            QueueSide::Receive => &mut slot.consumers,
        })
    }

    /// Read-only wait list of one side of `id`.
    pub fn waiters(&self, id: QueueId, side: QueueSide) -> Option<&WaitList> {
        let slot = self.slots.get(id.as_index())?;
        Some(match side {
            QueueSide::Send => &slot.producers,
            QueueSide::Receive => &slot.consumers,
        })
    }
}
