// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Command line front-end of the queue demo
//! OWNERS: @runtime
//! PUBLIC API: Options, help(), execute(args), run()
//!
//! `execute` runs a bounded simulation with manual ticks and returns the console transcript;
//! `run` starts the kernel with a periodic tick and never returns unless startup fails.

use std::time::Duration;

use clap::{CommandFactory, Parser};
use nexus_sched::{CaptureConsole, Kernel, KernelConfig, StdoutConsole, TickSource, Ticks, Wait};

use crate::build;

const DEFAULT_ROUNDS: usize = 3;
const SETTLE: Duration = Duration::from_secs(5);

/// Demo options.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "queue-demo", about = "Two senders and one receiver sharing a bounded queue")]
pub struct Options {
    /// Queue capacity in items.
    #[arg(long, default_value_t = 5)]
    pub capacity: usize,
    /// Send wait in milliseconds when the queue is full (0 = do not block).
    #[arg(long, default_value_t = 0)]
    pub send_timeout: u32,
    /// Receive wait in milliseconds when the queue is empty.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    pub recv_timeout: u32,
    /// Tick period in milliseconds.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub tick_ms: u64,
    /// Heap budget in bytes for queue storage and task stacks.
    #[arg(long, default_value_t = 64 * 1024)]
    pub heap_bytes: usize,
    /// Stop after this many sends per sender and print the transcript.
    #[arg(long)]
    pub rounds: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            capacity: 5,
            send_timeout: 0,
            recv_timeout: 100,
            tick_ms: 1,
            heap_bytes: 64 * 1024,
            rounds: None,
        }
    }
}

impl Options {
    /// Tick rate implied by `tick_ms`.
    pub fn tick_rate_hz(&self) -> u32 {
        (1000 / self.tick_ms.clamp(1, 1000)) as u32
    }

    /// Wait applied by the senders.
    pub fn send_wait(&self) -> Wait {
        Ticks::from_ms(self.send_timeout, self.tick_rate_hz()).into()
    }

    /// Wait applied by the receiver; never shorter than one tick.
    pub fn recv_wait(&self) -> Wait {
        let ticks = Ticks::from_ms(self.recv_timeout, self.tick_rate_hz());
        Ticks(ticks.get().max(1)).into()
    }

    /// Kernel configuration for the given tick source.
    pub fn kernel_config(&self, tick_source: TickSource) -> KernelConfig {
        KernelConfig {
            tick_rate_hz: self.tick_rate_hz(),
            heap_bytes: self.heap_bytes,
            ..KernelConfig::default()
        }
        .with_tick_source(tick_source)
    }
}

/// Returns the CLI usage string.
pub fn help() -> String {
    Options::command().render_help().to_string()
}

/// Executes the CLI with `args` (program name excluded) and returns the output.
///
/// Always runs a bounded simulation; `--rounds` defaults to a few sends per sender.
pub fn execute(args: &[&str]) -> String {
    let argv = std::iter::once("queue-demo").chain(args.iter().copied());
    match Options::try_parse_from(argv) {
        Ok(opts) => simulate(&opts, opts.rounds.unwrap_or(DEFAULT_ROUNDS)),
        Err(err) => err.to_string(),
    }
}

/// Parses `std::env::args` and runs the demo.
pub fn run() {
    let opts = match Options::try_parse() {
        Ok(opts) => opts,
        Err(err) => {
            let _ = err.print();
            return;
        }
    };
    if let Some(rounds) = opts.rounds {
        println!("{}", simulate(&opts, rounds));
        return;
    }

    let period = Duration::from_millis(opts.tick_ms);
    let kernel = Kernel::with_console(opts.kernel_config(TickSource::Periodic(period)), StdoutConsole);
    if build(&kernel, &opts, None).is_err() {
        return;
    }
    if let Err(err) = kernel.start() {
        log::error!(target: "queue-demo", "scheduler did not start: {err}");
    }
}

/// Runs `rounds` sends per sender with manual ticks, then lets the receiver time out once.
fn simulate(opts: &Options, rounds: usize) -> String {
    let console = CaptureConsole::new();
    let kernel = Kernel::with_console(opts.kernel_config(TickSource::Manual), console.clone());
    if build(&kernel, opts, Some(rounds)).is_err() {
        return console.transcript();
    }
    if let Err(err) = kernel.launch() {
        return err.to_string();
    }

    if kernel.wait_until_idle(SETTLE) {
        if let Wait::Ticks(ticks) = opts.recv_wait() {
            for _ in 0..ticks {
                let _ = kernel.tick();
            }
            kernel.wait_until_idle(SETTLE);
        }
    } else {
        log::warn!(target: "queue-demo", "tasks did not settle within {SETTLE:?}");
    }
    kernel.end_scheduler();
    console.transcript()
}

#[cfg(test)]
mod tests {
    use super::{execute, help, Options};
    use nexus_sched::{Ticks, Wait};

    #[test]
    fn help_contains_name() {
        assert!(help().contains("queue-demo"));
        assert!(execute(&["--help"]).contains("--recv-timeout"));
    }

    #[test]
    fn defaults_match_the_classic_demo() {
        let opts = Options::default();
        assert_eq!(opts.send_wait(), Wait::NonBlocking);
        assert_eq!(opts.recv_wait(), Wait::Ticks(100));
    }

    #[test]
    fn timeouts_follow_the_tick_period() {
        let opts = Options { tick_ms: 10, recv_timeout: 100, send_timeout: 25, ..Options::default() };
        assert_eq!(opts.tick_rate_hz(), 100);
        assert_eq!(opts.recv_wait(), Wait::from(Ticks(10)));
        assert_eq!(opts.send_wait(), Wait::Ticks(2));
    }

    #[test]
    fn sub_tick_receive_wait_still_blocks() {
        let opts = Options { tick_ms: 50, recv_timeout: 10, ..Options::default() };
        assert_eq!(opts.recv_wait(), Wait::Ticks(1));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(execute(&["--bogus"]).contains("--bogus"));
    }
}
