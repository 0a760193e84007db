//! Batch emitter — pack the command stream into size-bounded batches and
//! drive the executor.
//!
//! The executor accepts one joined message per call, with a hard byte
//! limit. Packing is greedy and single-pass, and every batch after the
//! first is seeded with two replayed anchors (the selection form of the
//! most recent window-creating command, then the most recent pane
//! selection), so a batch boundary never loses the current context. The
//! whole batch list is computed before anything executes; a command that
//! cannot fit even alone therefore fails before any external side effect.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::compile::commands::{Command, CommandKind};
use crate::error::{Error, Result};

/// Separator between commands inside one executor message.
pub const DELIMITER: &str = " \\; ";

/// The external command executor. A call returns its diagnostic output;
/// an empty string means success.
pub trait Executor {
    /// Execute one joined batch message.
    fn run(&mut self, batch: &str) -> io::Result<String>;
    /// Run a single unbatched query (preflight configuration reads).
    fn query(&mut self, args: &[&str]) -> io::Result<String>;
}

/// Cooperative cancellation, honored only between batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One packed batch: the leading `anchors` entries are replayed context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub commands: Vec<String>,
    pub anchors: usize,
}

impl Batch {
    /// The commands that carry new work (everything after the anchors).
    pub fn payload(&self) -> &[String] {
        &self.commands[self.anchors..]
    }

    /// The message handed to the executor.
    pub fn joined(&self, suffix: &str) -> String {
        let mut out = self.commands.join(DELIMITER);
        out.push_str(suffix);
        out
    }
}

/// The restoration suffix appended to every batch: the delimiter plus the
/// command returning focus to the invoking context, if any.
pub fn restoration_suffix(restore: Option<&str>) -> String {
    format!("{}{}", DELIMITER, restore.unwrap_or(""))
}

/// Pack the full command stream into batches within `budget` bytes each,
/// suffix included. Pure; nothing executes here.
pub fn pack(commands: &[Command], budget: usize, suffix: &str) -> Result<Vec<Batch>> {
    let mut batches = Vec::new();
    let mut window_anchor: Option<String> = None;
    let mut pane_anchor: Option<String> = None;
    let mut current: Vec<String> = Vec::new();
    let mut current_anchors = 0usize;
    let mut current_len = 0usize;

    for command in commands {
        // A command must fit a batch holding only the anchors and the
        // suffix; anything longer can never execute.
        let required = window_anchor.as_deref().map_or(0, str::len)
            + DELIMITER.len()
            + pane_anchor.as_deref().map_or(0, str::len)
            + DELIMITER.len()
            + suffix.len();
        let available = budget.saturating_sub(required);
        if command.len() > available {
            return Err(Error::CommandTooLong {
                command: command.text.clone(),
                length: command.len(),
                available,
                budget,
            });
        }

        if current.is_empty() {
            current_anchors = seed(&mut current, &mut current_len, &window_anchor, &pane_anchor);
            push(&mut current, &mut current_len, &command.text);
        } else if current_len + DELIMITER.len() + command.len() + suffix.len() < budget {
            push(&mut current, &mut current_len, &command.text);
        } else {
            batches.push(Batch {
                commands: std::mem::take(&mut current),
                anchors: current_anchors,
            });
            current_len = 0;
            current_anchors = seed(&mut current, &mut current_len, &window_anchor, &pane_anchor);
            push(&mut current, &mut current_len, &command.text);
        }

        // Context bookkeeping: creating a window resets the pane context;
        // selecting a pane narrows it.
        if let Some(name) = command.created_window() {
            window_anchor = Some(Command::select_window(name).text);
            pane_anchor = None;
        } else if command.kind == CommandKind::SelectPane {
            pane_anchor = Some(command.text.clone());
        }
    }
    if !current.is_empty() {
        batches.push(Batch {
            commands: current,
            anchors: current_anchors,
        });
    }
    debug!(batches = batches.len(), budget, "packed command stream");
    Ok(batches)
}

fn push(list: &mut Vec<String>, len: &mut usize, text: &str) {
    if !list.is_empty() {
        *len += DELIMITER.len();
    }
    *len += text.len();
    list.push(text.to_string());
}

/// Replay the current context at the head of a fresh batch. Returns how
/// many anchor commands were seeded.
fn seed(
    current: &mut Vec<String>,
    current_len: &mut usize,
    window_anchor: &Option<String>,
    pane_anchor: &Option<String>,
) -> usize {
    let mut anchors = 0;
    if let Some(window) = window_anchor {
        push(current, current_len, window);
        anchors += 1;
        if let Some(pane) = pane_anchor {
            push(current, current_len, pane);
            anchors += 1;
        }
    }
    anchors
}

/// Execute the batches strictly in order. A non-empty diagnostic aborts
/// the remainder; already-executed batches are never rolled back.
pub fn execute_batches(
    batches: &[Batch],
    suffix: &str,
    executor: &mut dyn Executor,
    cancel: &CancelToken,
) -> Result<()> {
    for (ix, batch) in batches.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(executed = ix, total = batches.len(), "cancelled between batches");
            return Ok(());
        }
        let message = batch.joined(suffix);
        debug!(batch = ix, bytes = message.len(), "executing batch");
        let diagnostic = executor
            .run(&message)
            .map_err(|e| Error::Executor(e.to_string()))?;
        if !diagnostic.is_empty() {
            if diagnostic.contains("pane too small") {
                return Err(Error::PaneTooSmall);
            }
            return Err(Error::Executor(diagnostic.trim().to_string()));
        }
    }
    Ok(())
}
