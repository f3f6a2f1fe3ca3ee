// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Periodic tick source thread
//! OWNERS: @runtime
//! INVARIANTS: One tick per period; the thread exits once the scheduler has ended

use std::thread;
use std::time::Duration;

use super::Kernel;
use crate::error::StartError;

pub(super) fn spawn_ticker(kernel: Kernel, period: Duration) -> Result<(), StartError> {
    thread::Builder::new()
        .name("tick".into())
        .spawn(move || {
            log::debug!(target: "tick", "tick source running every {period:?}");
            while !kernel.is_halted() {
                thread::sleep(period);
                let outcome = kernel.tick();
                if outcome.expired > 0 {
                    log::trace!(target: "tick", "{} wait(s) expired at {}", outcome.expired, outcome.now);
                }
            }
            log::debug!(target: "tick", "tick source stopped");
        })
        .map(drop)
        .map_err(|err| StartError::TickThread(err.to_string()))
}
