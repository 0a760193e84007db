//! Pipeline — one compile-and-emit pass over a parsed session file.
//!
//! Everything that can fail at compile time does so before the first
//! executor call, so a failing session leaves no external effects behind.
//! The layout engine and the executor are injected; the pipeline owns the
//! ordering: validate, decompose, resolve, compile, pack, execute.

use tracing::{debug, info};

use crate::compile::commands::{compile_window, Command};
use crate::compile::directives;
use crate::data::source::SourceFormat;
use crate::data::window::{is_window_declaration, Section};
use crate::data::SessionFile;
use crate::emit::{self, CancelToken, Executor};
use crate::error::{Attribution, Error, Result};
use crate::infrastructure::tmux::parse_base_index;
use crate::layout::engine::LayoutEngine;
use crate::types::config::Settings;
use crate::PROGRAM;

/// The executor session name: the configured name unless the file
/// declares a rename, which is carried with the program prefix.
pub fn effective_session_name(file: &SessionFile, settings: &Settings) -> String {
    match file.rename_if_specified() {
        Some(name) => format!("{}_{}", PROGRAM, name),
        None => settings.session_name.clone(),
    }
}

fn fallback_attribution(format: SourceFormat) -> Attribution {
    match format {
        SourceFormat::Shorthand => Attribution::exact(0),
        SourceFormat::Yaml => Attribution::approximate(0),
    }
}

/// Structural validation without geometry: every window declared and
/// named, names unique, the window cap respected, and every directives
/// line lexically well-formed. Everything here is also enforced during
/// compilation; the CLI exposes it as a standalone check.
pub fn lint(file: &SessionFile, settings: &Settings) -> Result<()> {
    let fallback = fallback_attribution(file.format);
    if file.windows.is_empty() {
        return Err(Error::syntax(
            fallback,
            "expecting a window section, found nothing",
        ));
    }

    let mut names_seen: Vec<String> = Vec::new();
    for (ix, window) in file.windows.iter().enumerate() {
        let serial = ix + 1;
        let title_at = window.first_line(Section::Title).unwrap_or(fallback);

        if !is_window_declaration(&window.declaration()) {
            return Err(Error::syntax(
                title_at,
                "expecting a window section, found nothing",
            ));
        }
        if serial > settings.max_windows {
            return Err(Error::syntax(
                title_at,
                format!(
                    "there's a maximum of {} windows per session",
                    settings.max_windows
                ),
            ));
        }
        let name = window.name();
        if name.is_empty() {
            return Err(Error::syntax(
                title_at,
                format!("window #{} does not have a name", serial),
            ));
        }
        if let Some(prev) = names_seen.iter().position(|seen| *seen == name) {
            return Err(Error::syntax(
                title_at,
                format!(
                    "session window names must be unique; the duplicate name \"{}\" for \
                     window #{} is already used by window #{}",
                    name,
                    serial,
                    prev + 1
                ),
            ));
        }
        names_seen.push(name);

        let directives_at = window.first_line(Section::Directives).unwrap_or(title_at);
        for (offset, line) in window.clean_lines(Section::Directives).iter().enumerate() {
            directives::parse_line(line, directives_at.offset(offset))?;
        }
    }
    Ok(())
}

/// Compile the whole session into its command stream. Pure with respect to
/// the executor; `base_index` comes from the preflight query.
pub fn compile_session(
    file: &SessionFile,
    settings: &Settings,
    engine: &dyn LayoutEngine,
    base_index: u32,
) -> Result<Vec<Command>> {
    lint(file, settings)?;

    let fallback = fallback_attribution(file.format);
    let session_name = effective_session_name(file, settings);
    let mut focus_window: Option<String> = None;
    let mut commands = Vec::new();

    for (ix, window) in file.windows.iter().enumerate() {
        let serial = ix + 1;
        let title_at = window.first_line(Section::Title).unwrap_or(fallback);
        let name = window.name();
        let layout_at = window.first_line(Section::Layout).unwrap_or(title_at);
        let blob = window.clean_lines(Section::Layout).join("\n");
        let layout = engine
            .decompose(&blob, settings.width, settings.height)
            .map_err(|e| {
                Error::syntax(
                    layout_at.offset(e.line.saturating_sub(1)),
                    format!("windowgram parsing error for window #{}: {}", serial, e.message),
                )
            })?;
        if layout.panes.is_empty() {
            return Err(Error::syntax(
                layout_at,
                format!("windowgram for window #{} has no panes", serial),
            ));
        }

        let resolved = directives::resolve(window, &layout)?;
        if resolved.focus_window {
            focus_window = Some(name.clone());
        }
        debug!(serial, name = %name, panes = layout.panes.len(), "compiling window");
        commands.extend(compile_window(
            serial,
            &name,
            &resolved,
            &layout,
            settings,
            &session_name,
            base_index,
            layout_at,
        )?);
    }

    // Focus-on-attach: the last window that asked for it wins.
    if let Some(name) = focus_window {
        commands.push(Command::select_window(&name));
    }
    Ok(commands)
}

/// Compile and execute one session end to end.
pub fn run_session(
    file: &SessionFile,
    settings: &Settings,
    engine: &dyn LayoutEngine,
    executor: &mut dyn Executor,
    cancel: &CancelToken,
) -> Result<()> {
    let output = executor
        .query(&["show-window-option", "-g", "pane-base-index"])
        .map_err(|e| Error::Executor(e.to_string()))?;
    let base_index = parse_base_index(&output)
        .ok_or_else(|| Error::Executor("unable to get pane-base-index".into()))?;

    let commands = compile_session(file, settings, engine, base_index)?;
    let suffix = emit::restoration_suffix(settings.restore_context.as_deref());
    let batches = emit::pack(&commands, settings.batch_budget, &suffix)?;
    info!(
        windows = file.count(),
        commands = commands.len(),
        batches = batches.len(),
        "session compiled"
    );
    emit::execute_batches(&batches, &suffix, executor, cancel)
}
