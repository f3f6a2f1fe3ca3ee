// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for queue storage and wait lists
//! OWNERS: @runtime
//! NOTE: Tests only; no kernel logic.
//!
//! TEST_SCOPE:
//!   - Ring capacity bound under arbitrary operation sequences
//!   - Ring ordering matches a VecDeque model (back/front writes, front reads)
//!   - Wait list wake order (priority desc, arrival asc)
//!
//! TEST_SCENARIOS:
//!   - ring_matches_model(): every op agrees with the model and len never exceeds capacity
//!   - wait_list_pops_in_priority_then_arrival_order(): pop order equals a stable sort

use std::collections::VecDeque;

use proptest::prelude::*;

use super::{Ring, WaitList};
use crate::types::{Priority, TaskId};

#[derive(Debug, Clone, Copy)]
enum Op {
    PushBack(i32),
    PushFront(i32),
    Pop,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::PushBack),
        any::<i32>().prop_map(Op::PushFront),
        Just(Op::Pop),
    ]
}

proptest! {
    #[test]
    fn ring_matches_model(capacity in 1usize..8, ops in proptest::collection::vec(arb_op(), 0..64)) {
        let mut ring = Ring::try_with_capacity(capacity).unwrap();
        let mut model = VecDeque::new();
        for op in ops {
            match op {
                Op::PushBack(v) => {
                    let expect_ok = model.len() < capacity;
                    prop_assert_eq!(ring.push_back(v).is_ok(), expect_ok);
                    if expect_ok {
                        model.push_back(v);
                    }
                }
                Op::PushFront(v) => {
                    let expect_ok = model.len() < capacity;
                    prop_assert_eq!(ring.push_front(v).is_ok(), expect_ok);
                    if expect_ok {
                        model.push_front(v);
                    }
                }
                Op::Pop => prop_assert_eq!(ring.pop_front(), model.pop_front()),
            }
            prop_assert!(ring.len() <= ring.capacity());
            prop_assert_eq!(ring.len(), model.len());
        }
    }

    #[test]
    fn wait_list_pops_in_priority_then_arrival_order(prios in proptest::collection::vec(0u8..4, 0..16)) {
        let mut list = WaitList::new();
        for (n, p) in prios.iter().enumerate() {
            list.insert(TaskId::from_raw(n as u32), Priority::new(*p), n as u64);
        }
        let mut expected: Vec<(u8, u32)> =
            prios.iter().enumerate().map(|(n, p)| (*p, n as u32)).collect();
        // stable: equal priorities keep arrival order
        expected.sort_by(|a, b| b.0.cmp(&a.0));
        let mut popped = Vec::new();
        while let Some(task) = list.pop() {
            popped.push(task.as_raw());
        }
        prop_assert_eq!(popped, expected.into_iter().map(|(_, id)| id).collect::<Vec<_>>());
    }
}
