//! CLI output handler implementation

use super::spinner::ThinkingIndicator;
use async_trait::async_trait;
use cadence_core::output::{
    AgentEvent, AgentOutput, MessageLevel, OutputResult, ToolExecutionInfo, ToolExecutionStatus,
};
use colored::Colorize;
use tracing::{debug, error, info, warn};

/// Longest parameter summary shown on a tool status line
const MAX_SUMMARY_CHARS: usize = 60;

/// CLI output configuration
#[derive(Debug, Clone, Default)]
pub struct CliOutputConfig {
    /// Print step and token statistics after each answer
    pub show_stats: bool,
}

/// Prints agent events to the terminal, above the thinking spinner
pub struct CliOutputHandler {
    config: CliOutputConfig,
    indicator: ThinkingIndicator,
}

impl CliOutputHandler {
    pub fn new(config: CliOutputConfig, indicator: ThinkingIndicator) -> Self {
        Self { config, indicator }
    }
}

/// One status line for a tool call
pub fn format_tool_status(tool_info: &ToolExecutionInfo) -> String {
    let mut summary = tool_info.parameter_summary();
    if summary.chars().count() > MAX_SUMMARY_CHARS {
        summary = summary.chars().take(MAX_SUMMARY_CHARS).collect::<String>() + "…";
    }
    let call = format!("{}({})", tool_info.tool_name, summary);

    match tool_info.status {
        ToolExecutionStatus::Executing => format!("{} {}", "●".white(), call.dimmed()),
        ToolExecutionStatus::Success => {
            let elapsed = tool_info
                .result
                .as_ref()
                .and_then(|r| r.duration_ms)
                .map(|ms| format!(" {}ms", ms))
                .unwrap_or_default();
            format!("{} {}{}", "●".green(), call, elapsed.dimmed())
        }
        ToolExecutionStatus::Error => {
            let reason = tool_info
                .result
                .as_ref()
                .map(|r| r.content.lines().next().unwrap_or_default().to_string())
                .unwrap_or_default();
            format!("{} {} {}", "●".red(), call, reason.red())
        }
    }
}

#[async_trait]
impl AgentOutput for CliOutputHandler {
    async fn emit_event(&self, event: AgentEvent) -> OutputResult {
        match event {
            AgentEvent::ExecutionStarted { context } => {
                debug!("Answering: {}", context.input);
            }

            AgentEvent::ExecutionCompleted {
                context,
                success,
                summary,
            } => {
                if !success {
                    debug!("Turn failed: {}", summary);
                }
                if self.config.show_stats {
                    let usage = &context.token_usage;
                    let mut stats = format!(
                        "{} steps, {:.2}s",
                        context.current_step,
                        context.execution_time.as_secs_f64()
                    );
                    if usage.total_tokens > 0 {
                        stats.push_str(&format!(
                            ", {} input + {} output = {} tokens",
                            usage.input_tokens, usage.output_tokens, usage.total_tokens
                        ));
                    }
                    self.indicator.println(&stats.dimmed().to_string());
                }
            }

            AgentEvent::StepStarted { step_number } => {
                debug!("Step {}", step_number);
            }

            // The completed line carries the outcome; the started line would duplicate it
            AgentEvent::ToolExecutionStarted { tool_info } => {
                debug!("Calling {}", tool_info.tool_name);
            }

            AgentEvent::ToolExecutionCompleted { tool_info } => {
                self.indicator.println(&format_tool_status(&tool_info));
            }

            AgentEvent::TokenUsageUpdated { token_usage } => {
                debug!("Tokens so far: {}", token_usage.total_tokens);
            }

            AgentEvent::Message { level, content } => match level {
                MessageLevel::Debug => debug!("{}", content),
                MessageLevel::Info => info!("{}", content),
                MessageLevel::Normal => self.indicator.println(&content),
                MessageLevel::Warning => warn!("{}", content),
                MessageLevel::Error => error!("{}", content),
            },
        }

        Ok(())
    }
}
