//! Pipeline settings, threaded explicitly through the call chain.

use serde::{Deserialize, Serialize};

use crate::PROGRAM;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Executor session name; a `session` declaration in the file overrides it.
    pub session_name: String,
    /// Terminal width in characters, handed to the layout engine.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Terminal height in characters, handed to the layout engine.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Size panes by percentage instead of absolute characters.
    #[serde(default)]
    pub relative_sizing: bool,
    /// Allow the executor to rename windows after creation. Default: off.
    #[serde(default)]
    pub renaming: bool,
    /// Append windows to an existing session instead of creating one.
    #[serde(default)]
    pub addition: bool,
    /// Byte budget for one executor message. Default: 2048.
    #[serde(default = "default_batch_budget")]
    pub batch_budget: usize,
    /// Maximum windows per session. Default: 16.
    #[serde(default = "default_max_windows")]
    pub max_windows: usize,
    /// Command restoring the invoking context, replayed at every batch end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_context: Option<String>,
}

fn default_width() -> u32 {
    80
}

fn default_height() -> u32 {
    24
}

fn default_batch_budget() -> usize {
    2048
}

fn default_max_windows() -> usize {
    16
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            session_name: String::new(),
            width: default_width(),
            height: default_height(),
            relative_sizing: false,
            renaming: false,
            addition: false,
            batch_budget: default_batch_budget(),
            max_windows: default_max_windows(),
            restore_context: None,
        }
    }
}

/// Derive the executor session name from a session file path.
///
/// The path is dropped to avoid confusion between identically named files;
/// slashes become underscores and runs of underscores collapse to one.
pub fn session_name_for(path: &str) -> String {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let name = format!("{}_{}", PROGRAM, filename).replace('/', "_");
    let mut collapsed = String::with_capacity(name.len());
    let mut last_underscore = false;
    for ch in name.chars() {
        if ch == '_' {
            if !last_underscore {
                collapsed.push(ch);
            }
            last_underscore = true;
        } else {
            collapsed.push(ch);
            last_underscore = false;
        }
    }
    collapsed
}
