//! The interactive chat loop

use super::command::{ParsedInput, ShellCommand};
use super::history::ConversationHistory;
use crate::output::{panel_width, render_panel, ThinkingIndicator};
use anyhow::Result;
use cadence_core::agent::Agent;
use cadence_core::llm::MessageRole;
use colored::{Color, Colorize};
use dialoguer::{BasicHistory, Input};
use std::io::{BufRead, Write};

const PROMPT: &str = "🚴 You";
const ASSISTANT_TITLE: &str = "🤖 Cycling Assistant";

/// Source of user input lines
pub trait LineReader {
    /// Next line, or `None` once input ends or is interrupted
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads from the terminal with in-memory history, or plain stdin when piped
pub struct TerminalReader {
    history: BasicHistory,
    interactive: bool,
}

impl TerminalReader {
    pub fn new() -> Self {
        Self {
            history: BasicHistory::new().max_entries(100).no_duplicates(true),
            interactive: console::Term::stdout().is_term(),
        }
    }
}

impl Default for TerminalReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader for TerminalReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if !self.interactive {
            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line)?;
            return Ok((read > 0).then_some(line));
        }

        let input = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .history_with(&mut self.history)
            .interact_text();

        match input {
            Ok(line) => Ok(Some(line)),
            Err(e) => {
                // Ctrl-C and Ctrl-D both end the session
                tracing::debug!("Input ended: {}", e);
                let _ = console::Term::stdout().show_cursor();
                Ok(None)
            }
        }
    }
}

/// Chat shell: reads input, keeps history, forwards messages to the agent
pub struct ChatShell<A, R, W> {
    agent: A,
    reader: R,
    out: W,
    history: ConversationHistory,
    indicator: ThinkingIndicator,
    width: usize,
}

impl<A, R, W> ChatShell<A, R, W>
where
    A: Agent,
    R: LineReader,
    W: Write,
{
    pub fn new(agent: A, reader: R, out: W, indicator: ThinkingIndicator) -> Self {
        Self {
            agent,
            reader,
            out,
            history: ConversationHistory::new(),
            indicator,
            width: panel_width(),
        }
    }

    /// Fixed panel width instead of the terminal's
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run until the user quits or input ends
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome()?;

        loop {
            let line = match self.reader.read_line(PROMPT)? {
                Some(line) => line,
                None => {
                    writeln!(self.out, "\n{}", "👋 Goodbye!".cyan())?;
                    break;
                }
            };

            let parsed = ParsedInput::parse(&line);
            if parsed.is_quit() {
                writeln!(
                    self.out,
                    "{}",
                    "👋 Thanks for using Cycling Assistant! Happy cycling!".cyan()
                )?;
                break;
            }

            match parsed {
                ParsedInput::Empty => continue,
                ParsedInput::Command(command) => self.handle_command(&command)?,
                ParsedInput::Message(text) => self.handle_message(&text).await?,
            }
        }

        self.out.flush()?;
        Ok(())
    }

    fn handle_command(&mut self, command: &ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Help => self.print_welcome()?,
            ShellCommand::Clear => {
                self.history.clear();
                writeln!(self.out, "{}", "💭 Conversation history cleared!".yellow())?;
            }
            ShellCommand::History => self.print_history()?,
            ShellCommand::Unknown(input) => {
                writeln!(self.out, "{}", format!("❌ Unknown command: {}", input).red())?;
                writeln!(self.out, "{}", "Type /help for available commands".dimmed())?;
            }
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    async fn handle_message(&mut self, text: &str) -> Result<()> {
        let messages = self.history.messages_with(text);

        self.indicator.start("🤔 Thinking...");
        let result = self.agent.respond(messages).await;
        self.indicator.stop();

        match result {
            Ok(execution) => {
                self.history.record_exchange(text, &execution.final_result);
                writeln!(
                    self.out,
                    "{}",
                    render_panel(
                        ASSISTANT_TITLE,
                        &execution.final_result,
                        Color::Green,
                        self.width
                    )
                )?;
            }
            Err(e) => {
                tracing::error!("Agent failed: {}", e);
                writeln!(
                    self.out,
                    "{}",
                    format!("❌ Sorry, I encountered an error: {}", e).red()
                )?;
                writeln!(
                    self.out,
                    "{}",
                    "Please try rephrasing your question or check your configuration.".dimmed()
                )?;
            }
        }
        Ok(())
    }

    fn print_welcome(&mut self) -> Result<()> {
        let body = "\
🚴 Welcome to your Cycling Assistant! 🚴
I can help you find bike rentals, cycling routes and climbs, weather, and local cycling advice.

Commands:
  /help    - Show this help message
  /clear   - Clear conversation history
  /history - Show conversation history
  /quit    - Exit the application
  /exit    - Exit the application

Just type your cycling questions and I'll help you out!";
        writeln!(
            self.out,
            "{}",
            render_panel("Cycling Assistant", body, Color::Blue, self.width)
        )?;
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        if self.history.is_empty() {
            writeln!(self.out, "{}", "📝 No conversation history yet.".yellow())?;
            return Ok(());
        }

        writeln!(self.out, "\n{}", "Conversation History:".bold())?;
        for (i, turn) in self.history.turns().iter().enumerate() {
            let label = match turn.role {
                MessageRole::Assistant => format!("{}. Assistant:", i + 1).green(),
                _ => format!("{}. You:", i + 1).cyan(),
            };
            writeln!(self.out, "{} {}", label, turn.content)?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}
