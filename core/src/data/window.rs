//! Window model — one named layout unit, divided into ordered sections.
//!
//! A window accumulates raw text per section together with the source line
//! each section began at. Sections are only ever populated in ascending
//! order, and serializing them in that order reproduces the parsed input
//! byte for byte.

use crate::data::source::{effective, SourceLine};
use crate::error::{Attribution, Precision};

/// The ordered sections of one window. The session footer is an implicit
/// trailing pseudo-section held on the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    TitleComments,
    Title,
    LayoutComments,
    Layout,
    DirectiveComments,
    Directives,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::TitleComments,
        Section::Title,
        Section::LayoutComments,
        Section::Layout,
        Section::DirectiveComments,
        Section::Directives,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Accumulated text and first-line attribution for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SectionText {
    text: String,
    first: Option<Attribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Window {
    sections: [SectionText; 6],
}

impl Window {
    pub fn new() -> Window {
        Window::default()
    }

    /// Append one line (newline restored) to a section, recording the
    /// section's first source line if this is it.
    pub fn append(&mut self, section: Section, line: &SourceLine) {
        self.append_text(section, &line.text, line.number, line.precision);
    }

    /// Append pre-joined text tagged with one attribution. Used when a held
    /// comment run is flushed into a section as a unit.
    pub fn append_block(
        &mut self,
        section: Section,
        text: &str,
        number: usize,
        precision: Precision,
    ) {
        let slot = &mut self.sections[section.index()];
        slot.text.push_str(text);
        if slot.first.is_none() {
            slot.first = Some(Attribution { line: number, precision });
        }
    }

    fn append_text(&mut self, section: Section, text: &str, number: usize, precision: Precision) {
        let slot = &mut self.sections[section.index()];
        slot.text.push_str(text);
        slot.text.push('\n');
        if slot.first.is_none() {
            slot.first = Some(Attribution { line: number, precision });
        }
    }

    pub fn text(&self, section: Section) -> &str {
        &self.sections[section.index()].text
    }

    /// Replace a section's text wholesale (editing API).
    pub fn set_text(&mut self, section: Section, text: String) {
        self.sections[section.index()].text = text;
    }

    /// The source position a section began at, when it has content.
    pub fn first_line(&self, section: Section) -> Option<Attribution> {
        self.sections[section.index()].first
    }

    /// Sections that hold any text, in declared order.
    pub fn working_sections(&self) -> Vec<Section> {
        Section::ALL
            .iter()
            .copied()
            .filter(|s| !self.text(*s).is_empty())
            .collect()
    }

    /// A window holding nothing besides leading comments is not a real
    /// window; at end of stream it is reclassified as the session footer.
    pub fn is_footer(&self) -> bool {
        let working = self.working_sections();
        working.is_empty() || working == [Section::TitleComments]
    }

    /// Concatenate every section in declared order.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in Section::ALL {
            out.push_str(self.text(section));
        }
        out
    }

    /// The declaration line, comment-stripped and trimmed.
    pub fn declaration(&self) -> String {
        let title = self.text(Section::Title);
        let first = title.split('\n').next().unwrap_or("");
        effective(first).to_string()
    }

    /// The window's name: everything after the `window` keyword, with
    /// whitespace runs collapsed to single spaces.
    pub fn name(&self) -> String {
        declaration_name(&self.declaration())
    }

    /// A section's lines with comments and surrounding whitespace removed.
    pub fn clean_lines(&self, section: Section) -> Vec<String> {
        self.text(section)
            .split('\n')
            .map(|line| effective(line).to_string())
            .collect()
    }
}

/// Whether a cleaned line declares a new window.
pub fn is_window_declaration(clean: &str) -> bool {
    clean.split_whitespace().next() == Some("window")
}

/// Whether a cleaned line declares a session rename.
pub fn is_session_declaration(clean: &str) -> bool {
    clean.split_whitespace().next() == Some("session")
}

/// The name carried by a `window`/`session` declaration line.
pub fn declaration_name(clean: &str) -> String {
    let mut tokens = clean.split_whitespace();
    tokens.next();
    tokens.collect::<Vec<_>>().join(" ")
}
