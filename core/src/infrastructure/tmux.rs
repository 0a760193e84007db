//! tmux-backed executor.
//!
//! Batch messages are pre-joined shell text (commands separated by
//! escaped semicolons), so a batch runs as one shell invocation of the
//! executor binary. Queries run the binary directly with an argument
//! vector. Following the executor's own convention, any output (stderr
//! first, stdout otherwise) is the diagnostic; silence is success.

use std::io;
use std::process::Command as Process;

use tracing::debug;

use crate::emit::Executor;

pub struct TmuxExecutor {
    program: String,
}

impl TmuxExecutor {
    pub fn new() -> TmuxExecutor {
        TmuxExecutor::with_program("tmux")
    }

    pub fn with_program(program: impl Into<String>) -> TmuxExecutor {
        TmuxExecutor {
            program: program.into(),
        }
    }

    /// The shell line a batch message expands into.
    fn shell_line(&self, batch: &str) -> String {
        format!("{} {}", self.program, batch)
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        TmuxExecutor::new()
    }
}

impl Executor for TmuxExecutor {
    fn run(&mut self, batch: &str) -> io::Result<String> {
        let line = self.shell_line(batch);
        debug!(bytes = line.len(), "running executor batch");
        let output = Process::new("sh").args(["-c", &line]).output()?;
        if !output.stderr.is_empty() {
            return Ok(String::from_utf8_lossy(&output.stderr).into_owned());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn query(&mut self, args: &[&str]) -> io::Result<String> {
        debug!(?args, "running executor query");
        let output = Process::new(&self.program).args(args).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// An executor that prints every batch instead of running it. Used for
/// static configuration output and dry runs.
#[derive(Debug, Default)]
pub struct PrintExecutor {
    pub batches: Vec<String>,
}

impl PrintExecutor {
    pub fn new() -> PrintExecutor {
        PrintExecutor::default()
    }
}

impl Executor for PrintExecutor {
    fn run(&mut self, batch: &str) -> io::Result<String> {
        println!("{}", batch);
        self.batches.push(batch.to_string());
        Ok(String::new())
    }

    fn query(&mut self, _args: &[&str]) -> io::Result<String> {
        Ok(String::new())
    }
}

/// Parse the output of `show-window-option -g pane-base-index`.
pub fn parse_base_index(output: &str) -> Option<u32> {
    let first = output.lines().next()?;
    let (label, value) = first.split_once(' ')?;
    if label != "pane-base-index" {
        return None;
    }
    value.trim().parse().ok()
}
