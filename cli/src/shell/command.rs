//! Slash-command parsing for the chat shell

/// A recognized (or rejected) slash-command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Clear,
    History,
    Quit,
    /// Slash-prefixed input that matched no command; never sent to the agent
    Unknown(String),
}

impl ShellCommand {
    pub fn is_quit(&self) -> bool {
        matches!(self, ShellCommand::Quit)
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "help" => Some(ShellCommand::Help),
            "clear" => Some(ShellCommand::Clear),
            "history" => Some(ShellCommand::History),
            "quit" | "exit" | "q" => Some(ShellCommand::Quit),
            _ => None,
        }
    }
}

/// One line of user input, parsed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// Blank line
    Empty,
    Command(ShellCommand),
    /// Text to forward to the agent
    Message(String),
}

impl ParsedInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ParsedInput::Empty;
        }

        match line.strip_prefix('/') {
            Some(rest) => {
                let token = rest.trim().to_lowercase();
                ParsedInput::Command(
                    ShellCommand::from_token(&token)
                        .unwrap_or_else(|| ShellCommand::Unknown(line.to_string())),
                )
            }
            None => ParsedInput::Message(line.to_string()),
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, ParsedInput::Command(command) if command.is_quit())
    }
}
