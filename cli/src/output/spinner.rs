//! "Thinking…" spinner shared between the shell and the event handler

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Spinner shown while the agent works; clones share the same bar
#[derive(Clone, Default)]
pub struct ThinkingIndicator {
    bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl ThinkingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start spinning with the given message, replacing any running spinner
    pub fn start(&self, message: &str) {
        let style = ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK_INTERVAL);

        if let Some(previous) = self.lock().replace(bar) {
            previous.finish_and_clear();
        }
    }

    /// Stop and erase the spinner
    pub fn stop(&self) {
        if let Some(bar) = self.lock().take() {
            bar.finish_and_clear();
        }
    }

    /// Print a line without tearing the spinner
    pub fn println(&self, line: &str) {
        match self.lock().as_ref() {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        // A poisoned spinner is still just a spinner
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
