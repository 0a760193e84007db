//! Command generation — turn one resolved window into its ordered list of
//! atomic executor commands.
//!
//! Commands are typed so downstream consumers (the batch emitter in
//! particular) can recognize context-establishing commands without
//! inspecting command text.

use crate::compile::directives::ResolvedWindow;
use crate::error::{Attribution, Error, Result};
use crate::layout::engine::{Orientation, WindowLayout};
use crate::types::config::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Creates the session together with its first window.
    NewSession { name: String },
    /// Adds a window to the current session.
    NewWindow { name: String },
    SelectWindow,
    SelectPane,
    SplitPane,
    ResizePane,
    SendKeys,
    SetOption,
}

/// One atomic executor instruction with a known byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub text: String,
}

impl Command {
    fn new(kind: CommandKind, text: String) -> Command {
        Command { kind, text }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The window name this command creates, when it creates one. Both
    /// creation kinds establish window context for batching purposes.
    pub fn created_window(&self) -> Option<&str> {
        match &self.kind {
            CommandKind::NewSession { name } | CommandKind::NewWindow { name } => Some(name),
            _ => None,
        }
    }

    /// The final window-selection command for a focus-on-attach request.
    pub fn select_window(name: &str) -> Command {
        Command::new(
            CommandKind::SelectWindow,
            format!("select-window -t \"{}\"", escape_quotes(name)),
        )
    }

    fn select_pane(target: u32) -> Command {
        Command::new(CommandKind::SelectPane, format!("select-pane -t {}", target))
    }
}

/// Escape embedded double quotes for inclusion in a quoted argument.
pub fn escape_quotes(text: &str) -> String {
    text.replace('"', "\\\"")
}

fn directory_flag(directory: &str) -> String {
    if directory.is_empty() {
        String::new()
    } else {
        format!(" -c \"{}\"", escape_quotes(directory))
    }
}

/// Compile one window into its command list.
///
/// `layout_at` attributes cross-linking failures back to the windowgram.
pub fn compile_window(
    serial: usize,
    name: &str,
    resolved: &ResolvedWindow,
    layout: &WindowLayout,
    settings: &Settings,
    session_name: &str,
    base_index: u32,
    layout_at: Attribution,
) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    let escaped_name = escape_quotes(name);

    // 1) Window creation, carrying the first pane's directory.
    let first_directory = resolved
        .panes
        .first()
        .map(|p| p.directory.as_str())
        .unwrap_or("");
    if serial == 1 && !settings.addition {
        commands.push(Command::new(
            CommandKind::NewSession { name: name.to_string() },
            format!(
                "new-session -d -s {} -n \"{}\"{}",
                session_name,
                escaped_name,
                directory_flag(first_directory)
            ),
        ));
        // Pin window renaming so names stay what the file declared.
        let renaming = if settings.renaming { "on" } else { "off" };
        for option in ["allow-rename", "automatic-rename"] {
            commands.push(Command::new(
                CommandKind::SetOption,
                format!("set-option -t {} {} {}", session_name, option, renaming),
            ));
        }
    } else {
        commands.push(Command::new(
            CommandKind::NewWindow { name: name.to_string() },
            format!(
                "new-window -n \"{}\"{}",
                escaped_name,
                directory_flag(first_directory)
            ),
        ));
    }

    // 2) Splits, in the engine's reported order.
    for split in &layout.splits {
        let pane = layout
            .pane_by_link(split.link)
            .ok_or(Error::UnlinkablePane { at: layout_at })?;
        let directory = resolved
            .pane(pane.id)
            .map(|p| p.directory.as_str())
            .unwrap_or("");
        let target = base_index + split.at_index;
        commands.push(Command::select_pane(target));
        if settings.relative_sizing {
            commands.push(Command::new(
                CommandKind::SplitPane,
                format!(
                    "split-window -{} -p {}{}",
                    split.orientation.flag(),
                    split.percent as u32,
                    directory_flag(directory)
                ),
            ));
        } else {
            commands.push(Command::new(
                CommandKind::SplitPane,
                format!(
                    "split-window -{}{}",
                    split.orientation.flag(),
                    directory_flag(directory)
                ),
            ));
            let axis = match split.orientation {
                Orientation::Vertical => format!("-y {}", split.height),
                Orientation::Horizontal => format!("-x {}", split.width),
            };
            commands.push(Command::new(
                CommandKind::ResizePane,
                format!("resize-pane -t {} {}", target + 1, axis),
            ));
        }
    }

    // 3) Run commands, panes in engine order, each entry in declared order.
    for pane in &resolved.panes {
        for run in &pane.run {
            if run.is_empty() {
                continue;
            }
            commands.push(Command::select_pane(base_index + pane.index));
            commands.push(Command::new(
                CommandKind::SendKeys,
                format!("send-keys \"{}\" C-m", escape_quotes(run)),
            ));
        }
    }

    // 4) Leave the focused pane selected, defaulting to the first pane.
    let focus_index = resolved
        .focused()
        .map(|p| p.index)
        .or_else(|| resolved.panes.first().map(|p| p.index))
        .unwrap_or(0);
    commands.push(Command::select_pane(base_index + focus_index));

    Ok(commands)
}
