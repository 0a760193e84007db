//! Directive grammar and resolution.
//!
//! A directives line either sets window-level behavior (`foc` alone,
//! `dir <path>` without pane ids) or targets panes:
//! `<pane-ids> <directive> [arguments]`. Directive names form a closed set
//! with aliases; anything else is a hard error, never silently ignored.
//!
//! Default-directory policy: each pane-targeting line stamps the default
//! directory current at that line onto its targets if they have none yet;
//! panes never targeted receive the default as finally resolved at end of
//! window.

use crate::data::window::{Section, Window};
use crate::error::{Attribution, Error, Result};
use crate::layout::engine::{is_pane_id, WindowLayout};

/// The closed set of pane directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Run,
    Dir,
    Foc,
}

impl DirectiveKind {
    /// Match a directive token, including its aliases.
    pub fn from_token(token: &str) -> Option<DirectiveKind> {
        match token {
            "run" | "exe" | "exec" | "execute" => Some(DirectiveKind::Run),
            "dir" | "directory" | "path" | "cd" | "pwd" | "cwd" | "home" => {
                Some(DirectiveKind::Dir)
            }
            "foc" | "focus" | "key" | "keys" | "cur" | "cursor" => Some(DirectiveKind::Foc),
            _ => None,
        }
    }
}

/// One parsed directives line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Bare `foc`: focus this window when the session attaches.
    FocusWindow,
    /// Bare `dir <path>`: window default directory from here on.
    DefaultDirectory(String),
    /// `<pane-ids> <directive> [args]`.
    Pane {
        targets: Vec<char>,
        kind: DirectiveKind,
        args: String,
    },
}

/// Split off the first whitespace-delimited token.
fn split_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(end) => Some((&text[..end], text[end..].trim_start())),
        None => Some((text, "")),
    }
}

/// Lexical analysis of one cleaned directives line. Returns `None` for a
/// blank line and for a bare `dir` with no path (which is a no-op).
pub fn parse_line(clean: &str, at: Attribution) -> Result<Option<ParsedLine>> {
    let (first, rest) = match split_token(clean) {
        Some(parts) => parts,
        None => return Ok(None),
    };

    // Window-level forms take precedence over pane addressing.
    if rest.is_empty() && DirectiveKind::from_token(first) == Some(DirectiveKind::Foc) {
        return Ok(Some(ParsedLine::FocusWindow));
    }
    if DirectiveKind::from_token(first) == Some(DirectiveKind::Dir) {
        if rest.is_empty() {
            return Ok(None);
        }
        return Ok(Some(ParsedLine::DefaultDirectory(rest.to_string())));
    }

    let (token, args) = match split_token(rest) {
        Some(parts) => parts,
        None => {
            return Err(Error::syntax(
                at,
                "directions line syntax error, expected '<pane-ids> <directive> [arguments]'",
            ))
        }
    };

    let targets: Vec<char> = first.chars().collect();
    for id in &targets {
        if !is_pane_id(*id) {
            return Err(Error::syntax(
                at,
                "directions pane id is outside of the supported range: [0-9a-zA-Z]",
            ));
        }
    }

    let kind = DirectiveKind::from_token(token)
        .ok_or_else(|| Error::syntax(at, format!("unknown directive '{}'", token)))?;
    match kind {
        DirectiveKind::Run | DirectiveKind::Dir if args.is_empty() => {
            return Err(Error::syntax(
                at,
                format!("directive '{}' must have arguments", token),
            ));
        }
        DirectiveKind::Foc if !args.is_empty() => {
            return Err(Error::syntax(
                at,
                format!("directive '{}' must have no arguments", token),
            ));
        }
        _ => {}
    }

    Ok(Some(ParsedLine::Pane {
        targets,
        kind,
        args: args.to_string(),
    }))
}

/// One pane with its directives fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneSpec {
    pub id: char,
    /// Final pane index in executor order.
    pub index: u32,
    pub directory: String,
    pub run: Vec<String>,
    pub focus: bool,
}

/// A window's resolved directive state, panes in engine order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub panes: Vec<PaneSpec>,
    pub focus_window: bool,
}

impl ResolvedWindow {
    pub fn pane(&self, id: char) -> Option<&PaneSpec> {
        self.panes.iter().find(|p| p.id == id)
    }

    /// The focused pane, if one was marked.
    pub fn focused(&self) -> Option<&PaneSpec> {
        self.panes.iter().find(|p| p.focus)
    }
}

struct PaneState {
    id: char,
    index: u32,
    directory: Option<String>,
    run: Vec<String>,
    focus: bool,
}

/// Resolve a window's directives section against the engine's pane map.
pub fn resolve(window: &Window, layout: &WindowLayout) -> Result<ResolvedWindow> {
    let mut panes: Vec<PaneState> = layout
        .panes
        .iter()
        .map(|p| PaneState {
            id: p.id,
            index: p.index,
            directory: None,
            run: Vec::new(),
            focus: false,
        })
        .collect();
    let mut default_directory = String::new();
    let mut focus_window = false;

    let base = window
        .first_line(Section::Directives)
        .unwrap_or(Attribution::exact(0));
    for (ix, clean) in window.clean_lines(Section::Directives).iter().enumerate() {
        let at = base.offset(ix);
        let parsed = match parse_line(clean, at)? {
            Some(parsed) => parsed,
            None => continue,
        };
        match parsed {
            ParsedLine::FocusWindow => focus_window = true,
            ParsedLine::DefaultDirectory(path) => default_directory = path,
            ParsedLine::Pane { targets, kind, args } => {
                let missing = missing_ids(&targets, &panes);
                if !missing.is_empty() {
                    return Err(Error::UnknownPaneReference { at, panes: missing });
                }
                // The default directory is stamped lazily: whatever it is
                // right now applies to these panes unless already set.
                if !default_directory.is_empty() {
                    for state in panes.iter_mut().filter(|p| targets.contains(&p.id)) {
                        if state.directory.is_none() {
                            state.directory = Some(default_directory.clone());
                        }
                    }
                }
                apply(&mut panes, &targets, kind, &args, at)?;
            }
        }
    }

    let panes = panes
        .into_iter()
        .map(|state| PaneSpec {
            id: state.id,
            index: state.index,
            directory: state.directory.unwrap_or_else(|| default_directory.clone()),
            run: state.run,
            focus: state.focus,
        })
        .collect();
    Ok(ResolvedWindow { panes, focus_window })
}

fn missing_ids(targets: &[char], panes: &[PaneState]) -> String {
    let mut missing = String::new();
    for id in targets {
        if !panes.iter().any(|p| p.id == *id) && !missing.contains(*id) {
            missing.push(*id);
        }
    }
    missing
}

fn apply(
    panes: &mut [PaneState],
    targets: &[char],
    kind: DirectiveKind,
    args: &str,
    at: Attribution,
) -> Result<()> {
    match kind {
        DirectiveKind::Run => {
            for state in panes.iter_mut().filter(|p| targets.contains(&p.id)) {
                state.run.push(args.to_string());
            }
        }
        DirectiveKind::Dir => {
            for state in panes.iter_mut().filter(|p| targets.contains(&p.id)) {
                state.directory = Some(args.to_string());
            }
        }
        DirectiveKind::Foc => {
            // Strictly one focused pane per window; marking a second one —
            // on any pane, in any directive — is an error.
            for id in targets {
                let focused: String = panes.iter().filter(|p| p.focus).map(|p| p.id).collect();
                if !focused.is_empty() {
                    return Err(Error::DuplicateFocus { at, panes: focused });
                }
                if let Some(state) = panes.iter_mut().find(|p| p.id == *id) {
                    state.focus = true;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::SourceFormat;
    use crate::data::SessionFile;
    use crate::layout::engine::LayoutPane;

    fn at() -> Attribution {
        Attribution::exact(1)
    }

    fn layout(ids: &str) -> WindowLayout {
        WindowLayout {
            panes: ids
                .chars()
                .enumerate()
                .map(|(ix, id)| LayoutPane {
                    id,
                    link: (ix + 1) as u64,
                    index: ix as u32,
                })
                .collect(),
            splits: vec![],
        }
    }

    fn window_with_directives(directives: &str) -> Window {
        let raw = format!("window w\n\n1\n\n{}\n", directives);
        let file = SessionFile::parse(&raw);
        assert_eq!(file.format, SourceFormat::Shorthand);
        file.windows[0].clone()
    }

    #[test]
    fn aliases_map_to_kinds() {
        for token in ["run", "exe", "exec", "execute"] {
            assert_eq!(DirectiveKind::from_token(token), Some(DirectiveKind::Run));
        }
        for token in ["dir", "directory", "path", "cd", "pwd", "cwd", "home"] {
            assert_eq!(DirectiveKind::from_token(token), Some(DirectiveKind::Dir));
        }
        for token in ["foc", "focus", "key", "keys", "cur", "cursor"] {
            assert_eq!(DirectiveKind::from_token(token), Some(DirectiveKind::Foc));
        }
        assert_eq!(DirectiveKind::from_token("open"), None);
    }

    #[test]
    fn parse_bare_focus() {
        assert_eq!(
            parse_line("foc", at()).unwrap(),
            Some(ParsedLine::FocusWindow)
        );
        assert_eq!(
            parse_line("focus", at()).unwrap(),
            Some(ParsedLine::FocusWindow)
        );
    }

    #[test]
    fn parse_bare_dir_sets_default() {
        assert_eq!(
            parse_line("dir /tmp/work", at()).unwrap(),
            Some(ParsedLine::DefaultDirectory("/tmp/work".into()))
        );
        // A bare `dir` with no path is a quiet no-op.
        assert_eq!(parse_line("dir", at()).unwrap(), None);
    }

    #[test]
    fn parse_pane_directive_preserves_argument_spacing() {
        let parsed = parse_line("ab run echo  hi", at()).unwrap().unwrap();
        assert_eq!(
            parsed,
            ParsedLine::Pane {
                targets: vec!['a', 'b'],
                kind: DirectiveKind::Run,
                args: "echo  hi".into(),
            }
        );
    }

    #[test]
    fn parse_rejects_line_without_directive() {
        assert!(parse_line("abc", at()).is_err());
    }

    #[test]
    fn parse_rejects_bad_pane_id() {
        let err = parse_line("a% run ls", at()).unwrap_err();
        assert!(err.to_string().contains("supported range"));
    }

    #[test]
    fn parse_rejects_unknown_directive() {
        let err = parse_line("a open ls", at()).unwrap_err();
        assert!(err.to_string().contains("unknown directive 'open'"));
    }

    #[test]
    fn parse_rejects_run_without_arguments() {
        assert!(parse_line("a run", at()).is_err());
        assert!(parse_line("a dir", at()).is_err());
    }

    #[test]
    fn parse_rejects_focus_with_arguments() {
        assert!(parse_line("a foc now", at()).is_err());
    }

    #[test]
    fn resolve_appends_runs_in_order() {
        let window = window_with_directives("a run first\na run second");
        let resolved = resolve(&window, &layout("ab")).unwrap();
        assert_eq!(resolved.pane('a').unwrap().run, vec!["first", "second"]);
        assert!(resolved.pane('b').unwrap().run.is_empty());
    }

    #[test]
    fn resolve_dir_overwrites() {
        let window = window_with_directives("a dir /one\na dir /two");
        let resolved = resolve(&window, &layout("a")).unwrap();
        assert_eq!(resolved.pane('a').unwrap().directory, "/two");
    }

    #[test]
    fn resolve_unknown_pane_lists_missing_ids() {
        let window = window_with_directives("axy run ls");
        let err = resolve(&window, &layout("ab")).unwrap_err();
        match err {
            Error::UnknownPaneReference { panes, .. } => assert_eq!(panes, "xy"),
            other => panic!("expected UnknownPaneReference, got {:?}", other),
        }
    }

    #[test]
    fn resolve_duplicate_focus_same_pane() {
        let window = window_with_directives("a foc\na foc");
        let err = resolve(&window, &layout("ab")).unwrap_err();
        match err {
            Error::DuplicateFocus { panes, .. } => assert_eq!(panes, "a"),
            other => panic!("expected DuplicateFocus, got {:?}", other),
        }
    }

    #[test]
    fn resolve_duplicate_focus_different_panes() {
        let window = window_with_directives("a foc\nb foc");
        assert!(matches!(
            resolve(&window, &layout("ab")),
            Err(Error::DuplicateFocus { .. })
        ));
    }

    #[test]
    fn resolve_multi_target_focus_is_duplicate() {
        let window = window_with_directives("ab foc");
        assert!(matches!(
            resolve(&window, &layout("ab")),
            Err(Error::DuplicateFocus { .. })
        ));
    }

    #[test]
    fn resolve_single_focus_ok() {
        let window = window_with_directives("b foc");
        let resolved = resolve(&window, &layout("ab")).unwrap();
        assert!(resolved.pane('b').unwrap().focus);
        assert_eq!(resolved.focused().unwrap().id, 'b');
        assert!(!resolved.focus_window);
    }

    #[test]
    fn resolve_bare_focus_sets_window_flag() {
        let window = window_with_directives("foc");
        let resolved = resolve(&window, &layout("a")).unwrap();
        assert!(resolved.focus_window);
        assert!(resolved.focused().is_none());
    }

    #[test]
    fn default_directory_stamps_per_line() {
        // Pane a is named while the default is /early; the default then
        // changes, and pane b is only ever covered by the final default.
        let window = window_with_directives("dir /early\na run ls\ndir /late");
        let resolved = resolve(&window, &layout("ab")).unwrap();
        assert_eq!(resolved.pane('a').unwrap().directory, "/early");
        assert_eq!(resolved.pane('b').unwrap().directory, "/late");
    }

    #[test]
    fn explicit_dir_beats_default() {
        let window = window_with_directives("dir /default\na dir /own\na run ls");
        let resolved = resolve(&window, &layout("ab")).unwrap();
        assert_eq!(resolved.pane('a').unwrap().directory, "/own");
        assert_eq!(resolved.pane('b').unwrap().directory, "/default");
    }

    #[test]
    fn no_directives_resolves_to_empty_specs() {
        let raw = "window w\n\n1\n";
        let file = SessionFile::parse(raw);
        let resolved = resolve(&file.windows[0], &layout("a")).unwrap();
        assert_eq!(resolved.panes.len(), 1);
        assert_eq!(resolved.pane('a').unwrap().directory, "");
        assert!(resolved.pane('a').unwrap().run.is_empty());
        assert!(!resolved.focus_window);
    }

    #[test]
    fn attribution_points_at_offending_line() {
        // Directives start at line 5 of the synthesized file; the bad line
        // is the second directives line.
        let window = window_with_directives("a run ls\nzz run ls");
        let err = resolve(&window, &layout("a")).unwrap_err();
        assert_eq!(err.attribution().unwrap().line, 6);
    }
}
