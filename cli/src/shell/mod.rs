//! Interactive chat shell

pub mod command;
pub mod history;
pub mod repl;

pub use command::{ParsedInput, ShellCommand};
pub use history::{ConversationHistory, HISTORY_WINDOW};
pub use repl::{ChatShell, LineReader, TerminalReader};
