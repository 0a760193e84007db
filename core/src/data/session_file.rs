//! Session file — parse the normalized line stream into windows, and write
//! it back out.
//!
//! Parsing is a small state machine over line classes. Comment and blank
//! lines accumulate in a held buffer tagged with the first line number seen
//! since the last flush; the buffer is flushed into the appropriate comments
//! section when a block starts, or into the next window's title comments
//! when a declaration arrives. Whatever is still held at end of stream
//! becomes the session footer. Serializing the windows in section order,
//! footer last, reproduces the normalized input exactly; that is what lets
//! a save after edits leave untouched windows byte-identical.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::source::{self, effective, SourceFormat, SourceLine};
use crate::data::window::{
    declaration_name, is_session_declaration, is_window_declaration, Section, Window,
};
use crate::error::Precision;

/// Parser states. `Title` is absent: a declaration line lands in the title
/// section and moves straight on to `LayoutComments`, so the machine never
/// rests there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Prologue,
    LayoutComments,
    Layout,
    DirectiveComments,
    Directives,
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Declaration,
    Text,
    Blank,
}

fn classify(line: &SourceLine) -> LineClass {
    let clean = effective(&line.text);
    if is_window_declaration(clean) {
        LineClass::Declaration
    } else if clean.is_empty() {
        LineClass::Blank
    } else {
        LineClass::Text
    }
}

/// Comment/blank lines awaiting a destination section.
#[derive(Debug, Clone)]
struct Held {
    text: String,
    number: usize,
    precision: Precision,
}

#[derive(Debug, Clone)]
pub struct SessionFile {
    pub path: Option<PathBuf>,
    pub format: SourceFormat,
    pub windows: Vec<Window>,
    pub footer: String,
    modified: bool,
}

impl SessionFile {
    /// Parse raw file contents, auto-detecting the surface syntax.
    pub fn parse(raw: &str) -> SessionFile {
        let (format, lines) = source::normalize(raw);
        SessionFile::from_lines(format, &lines)
    }

    /// Parse an already-normalized line stream.
    pub fn from_lines(format: SourceFormat, lines: &[SourceLine]) -> SessionFile {
        let mut parser = Parser::default();
        for line in lines {
            parser.feed(line);
        }
        let (windows, footer) = parser.finish();
        SessionFile {
            path: None,
            format,
            windows,
            footer,
            modified: false,
        }
    }

    pub fn load(path: &Path) -> io::Result<SessionFile> {
        let raw = fs::read_to_string(path)?;
        let mut file = SessionFile::parse(&raw);
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    /// The round-trip image: every window's sections in order, footer last.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for window in &self.windows {
            out.push_str(&window.serialize());
        }
        out.push_str(&self.footer);
        out
    }

    pub fn save(&mut self) -> io::Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no file path set"))?;
        self.save_to(&path)
    }

    pub fn save_to(&mut self, path: &Path) -> io::Result<()> {
        let contents = match self.format {
            SourceFormat::Shorthand => self.serialize(),
            SourceFormat::Yaml => self.to_yaml(),
        };
        fs::write(path, contents)?;
        self.modified = false;
        Ok(())
    }

    fn to_yaml(&self) -> String {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum YamlRecord {
            Session { session: String },
            Window {
                name: String,
                windowgram: String,
                directions: String,
            },
        }

        let mut records = Vec::new();
        if let Some(rename) = self.rename_if_specified() {
            records.push(YamlRecord::Session { session: rename });
        }
        for window in &self.windows {
            records.push(YamlRecord::Window {
                name: window.name(),
                windowgram: window.text(Section::Layout).to_string(),
                directions: window.text(Section::Directives).to_string(),
            });
        }
        let body = serde_yaml::to_string(&records).unwrap_or_default();
        format!(
            "##\n## Session file generated by {}\n##\n\n{}",
            crate::PROGRAM,
            body
        )
    }

    pub fn count(&self) -> usize {
        self.windows.len()
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    /// The name of window `serial` (1-based).
    pub fn name(&self, serial: usize) -> Option<String> {
        self.windows.get(serial.checked_sub(1)?).map(Window::name)
    }

    /// The session rename declared in the leading comments, if any; the
    /// last declaration wins. Only window #1's title comments are scanned,
    /// so a rename is effective only ahead of every window.
    pub fn rename_if_specified(&self) -> Option<String> {
        let first = self.windows.first()?;
        let mut name = None;
        for line in first.clean_lines(Section::TitleComments) {
            if is_session_declaration(&line) {
                name = Some(declaration_name(&line));
            }
        }
        name
    }

    // -------------------------------------------------------------------
    // Editing API — regenerate only the named section, preserving each
    // section's trailing blank-line padding so untouched text survives a
    // save byte for byte.
    // -------------------------------------------------------------------

    pub fn replace_title_comments(&mut self, serial: usize, comments: &str) {
        if let Some(window) = self.window_mut(serial) {
            let padding = duplicate_trailing_padding(window.text(Section::TitleComments), 1);
            window.set_text(Section::TitleComments, format!("{}{}", comments, padding));
            self.modified = true;
        }
    }

    pub fn replace_title(&mut self, serial: usize, name: &str) {
        if let Some(window) = self.window_mut(serial) {
            let padding = duplicate_trailing_padding(window.text(Section::Title), 1);
            window.set_text(Section::Title, format!("window {}{}", name, padding));
            self.modified = true;
        }
    }

    pub fn replace_windowgram(&mut self, serial: usize, windowgram: &str) {
        if let Some(window) = self.window_mut(serial) {
            window.set_text(Section::Layout, terminated(windowgram));
            self.modified = true;
        }
    }

    /// Append a new window, absorbing the footer into its title comments.
    /// Returns the new window's serial.
    pub fn add_window(&mut self, comments: &str, name: &str, windowgram: &str) -> usize {
        let mut footer = std::mem::take(&mut self.footer);
        while footer.len() > 1 && !footer.ends_with("\n\n") {
            footer.push('\n');
        }
        if footer.is_empty() {
            footer.push('\n');
        }

        let mut window = Window::new();
        window.set_text(
            Section::TitleComments,
            format!("{}{}", footer, terminated(comments)),
        );
        window.set_text(Section::Title, format!("window {}\n", name));
        window.set_text(Section::LayoutComments, "\n".to_string());
        window.set_text(Section::Layout, terminated(windowgram));
        self.windows.push(window);
        self.modified = true;
        self.windows.len()
    }

    fn window_mut(&mut self, serial: usize) -> Option<&mut Window> {
        self.windows.get_mut(serial.checked_sub(1)?)
    }
}

/// Ensure text ends with exactly the newline it needs to stand as a block.
fn terminated(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

fn trailing_padding(text: &str) -> usize {
    text.chars().rev().take_while(|c| *c == '\n').count()
}

fn duplicate_trailing_padding(text: &str, minimum: usize) -> String {
    "\n".repeat(trailing_padding(text).max(minimum))
}

// -----------------------------------------------------------------------
// The state machine
// -----------------------------------------------------------------------

#[derive(Default)]
struct Parser {
    windows: Vec<Window>,
    window: Option<Window>,
    held: Option<Held>,
    state: Option<State>,
}

impl Parser {
    fn state(&self) -> State {
        self.state.unwrap_or(State::Prologue)
    }

    fn feed(&mut self, line: &SourceLine) {
        match (self.state(), classify(line)) {
            // A declaration always closes the open window and starts the
            // next one, pulling any held comments in as its preamble.
            (_, LineClass::Declaration) => {
                if let Some(done) = self.window.take() {
                    self.windows.push(done);
                }
                let mut window = Window::new();
                if let Some(held) = self.held.take() {
                    window.append_block(
                        Section::TitleComments,
                        &held.text,
                        held.number,
                        held.precision,
                    );
                }
                window.append(Section::Title, line);
                self.window = Some(window);
                self.state = Some(State::LayoutComments);
            }
            // First non-blank line of a block: flush comments, open block.
            (State::LayoutComments, LineClass::Text) => {
                self.flush_held(Section::LayoutComments);
                self.append(Section::Layout, line);
                self.state = Some(State::Layout);
            }
            (State::DirectiveComments, LineClass::Text) => {
                self.flush_held(Section::DirectiveComments);
                self.append(Section::Directives, line);
                self.state = Some(State::Directives);
            }
            // A blank line terminates a block; it travels through the held
            // buffer so the byte-exact round trip is preserved.
            (State::Layout, LineClass::Blank) => {
                self.state = Some(State::DirectiveComments);
                self.hold(line);
            }
            (State::Directives, LineClass::Blank) => {
                self.state = Some(State::Trailing);
                self.hold(line);
            }
            // Directives resume after a gap: the gap and the line both
            // belong to the directives block.
            (State::Trailing, LineClass::Text) => {
                self.hold(line);
                self.flush_held(Section::Directives);
                self.state = Some(State::Directives);
            }
            // Inside a block, lines accumulate verbatim.
            (State::Layout, LineClass::Text) => self.append(Section::Layout, line),
            (State::Directives, LineClass::Text) => self.append(Section::Directives, line),
            // Everything else is comment territory.
            (State::Prologue, _)
            | (State::LayoutComments, LineClass::Blank)
            | (State::DirectiveComments, LineClass::Blank)
            | (State::Trailing, LineClass::Blank) => self.hold(line),
        }
    }

    fn finish(mut self) -> (Vec<Window>, String) {
        if let Some(done) = self.window.take() {
            self.windows.push(done);
        }
        // Comments still held at end of stream form one synthetic window…
        if let Some(held) = self.held.take() {
            let mut window = Window::new();
            window.append_block(
                Section::TitleComments,
                &held.text,
                held.number,
                held.precision,
            );
            self.windows.push(window);
        }
        // …which is reclassified as the session footer if it carries
        // nothing else.
        let footer = if self.windows.last().map(Window::is_footer).unwrap_or(false) {
            self.windows.pop().map(|w| w.serialize()).unwrap_or_default()
        } else {
            String::new()
        };
        (self.windows, footer)
    }

    fn append(&mut self, section: Section, line: &SourceLine) {
        if let Some(window) = self.window.as_mut() {
            window.append(section, line);
        }
    }

    fn hold(&mut self, line: &SourceLine) {
        let held = self.held.get_or_insert_with(|| Held {
            text: String::new(),
            number: line.number,
            precision: line.precision,
        });
        held.text.push_str(&line.text);
        held.text.push('\n');
    }

    fn flush_held(&mut self, section: Section) {
        if let (Some(held), Some(window)) = (self.held.take(), self.window.as_mut()) {
            window.append_block(section, &held.text, held.number, held.precision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::window::Section;

    const SAMPLE: &str = "\
## Session demo

session work

window one

12
34

a run echo hi
b foc

window two # second

1
";

    #[test]
    fn sections_are_split_correctly() {
        let file = SessionFile::parse(SAMPLE);
        assert_eq!(file.count(), 2);
        let one = &file.windows[0];
        assert_eq!(
            one.text(Section::TitleComments),
            "## Session demo\n\nsession work\n\n"
        );
        assert_eq!(one.text(Section::Title), "window one\n");
        assert_eq!(one.text(Section::LayoutComments), "\n");
        assert_eq!(one.text(Section::Layout), "12\n34\n");
        assert_eq!(one.text(Section::DirectiveComments), "\n");
        assert_eq!(one.text(Section::Directives), "a run echo hi\nb foc\n");
        let two = &file.windows[1];
        assert_eq!(two.text(Section::TitleComments), "\n");
        assert_eq!(two.name(), "two");
        assert_eq!(two.text(Section::Layout), "1\n");
    }

    #[test]
    fn round_trip_is_byte_exact() {
        let file = SessionFile::parse(SAMPLE);
        assert_eq!(file.serialize(), SAMPLE);
    }

    #[test]
    fn round_trip_with_trailing_footer() {
        let raw = "window w\n\n1\n\n\n# trailing notes\n# more\n";
        let file = SessionFile::parse(raw);
        assert_eq!(file.count(), 1);
        assert_eq!(file.footer, "\n\n# trailing notes\n# more\n");
        assert_eq!(file.serialize(), raw);
    }

    #[test]
    fn directives_resume_after_gap() {
        let raw = "window w\n\n1\n\na run ls\n\n# note\nb run pwd\n";
        let file = SessionFile::parse(raw);
        assert_eq!(
            file.windows[0].text(Section::Directives),
            "a run ls\n\n# note\nb run pwd\n"
        );
        assert_eq!(file.serialize(), raw);
    }

    #[test]
    fn attribution_tracks_section_starts() {
        let file = SessionFile::parse(SAMPLE);
        let one = &file.windows[0];
        assert_eq!(one.first_line(Section::TitleComments).unwrap().line, 1);
        assert_eq!(one.first_line(Section::Title).unwrap().line, 5);
        assert_eq!(one.first_line(Section::Layout).unwrap().line, 7);
        assert_eq!(one.first_line(Section::Directives).unwrap().line, 10);
    }

    #[test]
    fn file_without_declarations_becomes_footer() {
        let raw = "# just\n# comments\n";
        let file = SessionFile::parse(raw);
        assert_eq!(file.count(), 0);
        assert_eq!(file.footer, raw);
        assert_eq!(file.serialize(), raw);
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        let file = SessionFile::parse("");
        assert_eq!(file.count(), 0);
        assert_eq!(file.footer, "");
    }

    #[test]
    fn rename_last_declaration_wins() {
        let raw = "session first\nsession second\n\nwindow w\n\n1\n";
        let file = SessionFile::parse(raw);
        assert_eq!(file.rename_if_specified().as_deref(), Some("second"));
    }

    #[test]
    fn rename_absent_when_no_declaration() {
        let file = SessionFile::parse("window w\n\n1\n");
        assert!(file.rename_if_specified().is_none());
    }

    #[test]
    fn yaml_input_parses_through_translation() {
        let raw = "- name: foo\n  windowgram: |\n    12\n  directions: |\n    a run ls\n";
        let file = SessionFile::parse(raw);
        assert_eq!(file.format, SourceFormat::Yaml);
        assert_eq!(file.count(), 1);
        assert_eq!(file.windows[0].name(), "foo");
        assert_eq!(file.windows[0].text(Section::Layout), "12\n");
        assert_eq!(file.windows[0].text(Section::Directives), "a run ls\n");
    }

    #[test]
    fn replace_title_preserves_padding() {
        let raw = "window old\n\n1\n";
        let mut file = SessionFile::parse(raw);
        file.replace_title(1, "new");
        assert!(file.modified());
        assert_eq!(file.serialize(), "window new\n\n1\n");
    }

    #[test]
    fn replace_windowgram_only_touches_layout() {
        let raw = "# keep\nwindow w\n\n1\n\na run ls\n";
        let mut file = SessionFile::parse(raw);
        file.replace_windowgram(1, "12");
        assert_eq!(file.serialize(), "# keep\nwindow w\n\n12\n\na run ls\n");
    }

    #[test]
    fn add_window_absorbs_footer() {
        let raw = "window w\n\n1\n\n\n# tail\n";
        let mut file = SessionFile::parse(raw);
        let serial = file.add_window("# fresh\n", "next", "12\n");
        assert_eq!(serial, 2);
        assert_eq!(file.footer, "");
        let added = &file.windows[1];
        assert!(added.text(Section::TitleComments).contains("# tail"));
        assert!(added.text(Section::TitleComments).contains("# fresh"));
        assert_eq!(added.text(Section::Title), "window next\n");
        assert_eq!(added.text(Section::Layout), "12\n");
        // The reparsed image agrees with the in-memory model.
        let reparsed = SessionFile::parse(&file.serialize());
        assert_eq!(reparsed.count(), 2);
        assert_eq!(reparsed.name(2).as_deref(), Some("next"));
    }

    #[test]
    fn save_and_load_shorthand_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_demo");
        let mut file = SessionFile::parse(SAMPLE);
        file.save_to(&path).unwrap();
        let loaded = SessionFile::load(&path).unwrap();
        assert_eq!(loaded.serialize(), SAMPLE);
        assert_eq!(loaded.format, SourceFormat::Shorthand);
    }

    #[test]
    fn yaml_save_load_preserves_structure() {
        let mut file = SessionFile::parse(SAMPLE);
        file.format = SourceFormat::Yaml;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_demo.yaml");
        file.save_to(&path).unwrap();
        let loaded = SessionFile::load(&path).unwrap();
        assert_eq!(loaded.format, SourceFormat::Yaml);
        assert_eq!(loaded.count(), 2);
        assert_eq!(loaded.name(1).as_deref(), Some("one"));
        assert_eq!(loaded.name(2).as_deref(), Some("two"));
        assert_eq!(loaded.windows[0].clean_lines(Section::Layout)[0], "12");
        assert!(loaded.windows[0]
            .text(Section::Directives)
            .contains("a run echo hi"));
        assert_eq!(loaded.rename_if_specified().as_deref(), Some("work"));
    }
}
