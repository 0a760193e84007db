//! Session file data — normalization, the section model, and persistence.

pub mod session_file;
pub mod source;
pub mod window;

pub use session_file::SessionFile;
pub use source::{SourceFormat, SourceLine};
pub use window::{Section, Window};
