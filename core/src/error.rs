//! Error types and the Result alias for gramux operations.
//!
//! Every compile-time failure carries an [`Attribution`] pointing back at
//! the session file: exact line numbers for shorthand input, the nearest
//! preceding declaration line for structured input. Executor failures are
//! discovered after parsing has finished and carry no attribution.

use std::fmt;

/// Result type alias for gramux operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How precisely a line number locates its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// The line number is the physical line in the input file.
    Exact,
    /// The line number is that of the nearest preceding declaration.
    Approximate,
}

/// A source position attached to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub line: usize,
    pub precision: Precision,
}

impl Attribution {
    pub fn exact(line: usize) -> Attribution {
        Attribution {
            line,
            precision: Precision::Exact,
        }
    }

    pub fn approximate(line: usize) -> Attribution {
        Attribution {
            line,
            precision: Precision::Approximate,
        }
    }

    /// Attribution for `base + offset`, where only exact positions may be
    /// advanced by the offset.
    pub fn offset(&self, lines: usize) -> Attribution {
        match self.precision {
            Precision::Exact => Attribution::exact(self.line + lines),
            Precision::Approximate => *self,
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            Precision::Exact => write!(f, "line {}", self.line),
            Precision::Approximate => write!(f, "on or after line {}", self.line),
        }
    }
}

/// Errors raised while parsing, compiling, or emitting a session.
///
/// All variants except `PaneTooSmall` and `Executor` are detected before
/// any batch executes, so they guarantee all-or-nothing external effects.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{at}: {message}")]
    Syntax { at: Attribution, message: String },

    #[error("{at}: pane(s) '{panes}' were not specified in the windowgram")]
    UnknownPaneReference { at: Attribution, panes: String },

    #[error("{at}: focus already specified for pane(s) '{panes}'")]
    DuplicateFocus { at: Attribution, panes: String },

    #[error(
        "{at}: unable to fully cross-link panes; this window layout cannot be \
         expressed as recursive binary splits"
    )]
    UnlinkablePane { at: Attribution },

    #[error(
        "command length ({length}) exceeds maximum length available ({available}) \
         in a batch ({budget}): {command}"
    )]
    CommandTooLong {
        command: String,
        length: usize,
        available: usize,
        budget: usize,
    },

    #[error("window splitting error (pane too small), make your terminal larger and try again")]
    PaneTooSmall,

    #[error("an error occurred in the executor: {0}")]
    Executor(String),
}

impl Error {
    pub fn syntax(at: Attribution, message: impl Into<String>) -> Error {
        Error::Syntax {
            at,
            message: message.into(),
        }
    }

    /// The source position this error points at, if it has one.
    pub fn attribution(&self) -> Option<Attribution> {
        match self {
            Error::Syntax { at, .. }
            | Error::UnknownPaneReference { at, .. }
            | Error::DuplicateFocus { at, .. }
            | Error::UnlinkablePane { at } => Some(*at),
            Error::CommandTooLong { .. } | Error::PaneTooSmall | Error::Executor(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_attribution_displays_line() {
        let at = Attribution::exact(12);
        assert_eq!(at.to_string(), "line 12");
    }

    #[test]
    fn approximate_attribution_displays_range() {
        let at = Attribution::approximate(7);
        assert_eq!(at.to_string(), "on or after line 7");
    }

    #[test]
    fn offset_advances_exact_only() {
        assert_eq!(Attribution::exact(10).offset(3).line, 13);
        assert_eq!(Attribution::approximate(10).offset(3).line, 10);
    }

    #[test]
    fn syntax_error_message_carries_attribution() {
        let err = Error::syntax(Attribution::exact(4), "bad things");
        assert_eq!(err.to_string(), "line 4: bad things");
        assert_eq!(err.attribution().unwrap().line, 4);
    }

    #[test]
    fn executor_error_has_no_attribution() {
        assert!(Error::Executor("boom".into()).attribution().is_none());
        assert!(Error::PaneTooSmall.attribution().is_none());
    }

    #[test]
    fn command_too_long_names_command_and_lengths() {
        let err = Error::CommandTooLong {
            command: "send-keys \"x\" C-m".into(),
            length: 3000,
            available: 2000,
            budget: 2048,
        };
        let msg = err.to_string();
        assert!(msg.contains("3000"));
        assert!(msg.contains("2000"));
        assert!(msg.contains("send-keys"));
    }
}
