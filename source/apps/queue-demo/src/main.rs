// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Binary entrypoint: run the queue demo (forever unless `--rounds` is given).

fn main() {
    env_logger::init();
    queue_demo::run();
}
