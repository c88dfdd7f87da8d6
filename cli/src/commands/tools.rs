//! Tools listing command

use anyhow::Result;
use cadence_core::tools::ToolRegistry;
use colored::Colorize;
use tracing::info;

/// Show available tools
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    println!("{}\n", "🛠️  Available Tools".bold());

    let registry = ToolRegistry::default();
    for name in registry.list_tools() {
        if let Some((tool_name, description)) = registry.get_tool_info(name) {
            println!("📦 {}", tool_name.cyan());
            // First line of the description only
            let first_line = description.lines().next().unwrap_or(description);
            println!("   {}\n", first_line);
        }
    }

    println!("💡 Ask about rentals, climbs, weather or your Strava routes and the assistant picks the right tool.");

    Ok(())
}
