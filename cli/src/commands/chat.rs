//! Interactive chat command

use crate::config::CliConfigLoader;
use crate::output::{CliOutputConfig, CliOutputHandler, ThinkingIndicator};
use crate::shell::{ChatShell, TerminalReader};
use anyhow::{Context, Result};
use cadence_core::agent::AgentBuilder;
use cadence_core::tools::ToolContext;
use tracing::debug;

/// Start the chat shell
pub async fn chat_command(config_loader: CliConfigLoader, show_stats: bool) -> Result<()> {
    let config = config_loader
        .load()
        .await
        .context("Failed to initialize agent, please check your configuration")?;
    debug!("Using provider: {}", config.llm.provider);
    debug!("Using model: {}", config.llm.model);
    debug!("Extraction model: {}", config.extraction.model);

    let tool_context = ToolContext::new(config.credentials, config.extraction)
        .context("Failed to set up lookup tools")?;

    let indicator = ThinkingIndicator::new();
    let output = CliOutputHandler::new(CliOutputConfig { show_stats }, indicator.clone());
    let agent = AgentBuilder::new(config.llm, tool_context)
        .with_agent_config(config.agent)
        .build_with_output(Box::new(output))
        .context("Failed to initialize agent")?;

    let mut shell = ChatShell::new(agent, TerminalReader::new(), std::io::stdout(), indicator);
    shell.run().await
}
