// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Console output sink used by task code
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! PUBLIC API: Console (print/print_number), StdoutConsole, CaptureConsole
//! INVARIANTS: Single-line emission; output never influences scheduling
//!
//! Kernel diagnostics go through the `log` facade. The console is the program's own output
//! channel and stays separate from it.

use std::io::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

/// Line-oriented output sink shared by all tasks.
pub trait Console: Send + Sync {
    /// Emits one line of text.
    fn write_line(&self, line: &str);

    /// Prints `text` as a single line.
    fn print(&self, text: &str) {
        self.write_line(text.trim_end_matches(['\r', '\n']));
    }

    /// Prints `text` immediately followed by `value`.
    fn print_number(&self, text: &str, value: i64) {
        self.write_line(&format!("{}{}", text.trim_end_matches(['\r', '\n']), value));
    }
}

/// Console writing to the process stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = writeln!(out, "{line}");
    }
}

/// Console that records lines in memory; clones share the same transcript.
#[derive(Debug, Default, Clone)]
pub struct CaptureConsole {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureConsole {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns the transcript joined with newlines.
    pub fn transcript(&self) -> String {
        self.lines.lock().join("\n")
    }
}

impl Console for CaptureConsole {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
