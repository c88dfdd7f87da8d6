//! CLI-specific output implementations
//!
//! Terminal rendering of agent events, the thinking spinner and framed panels.

pub mod cli_handler;
pub mod panel;
pub mod spinner;

pub use cli_handler::{CliOutputConfig, CliOutputHandler};
pub use panel::{panel_width, render_panel};
pub use spinner::ThinkingIndicator;
