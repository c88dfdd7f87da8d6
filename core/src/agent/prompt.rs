//! System prompts for the cycling assistant

use serde::{Deserialize, Serialize};

/// Short prompt: answer concisely, look things up only when needed
pub const CYCLING_ASSISTANT_PROMPT: &str = "\
You are an expert travel assistant specializing in local cycling options for keen cyclists.
Cyclists will refer to you for advice on where to find bikes locally, cycling routes and climbs, interesting landmarks to visit by bike, and general cycling tips for various locations around the world.
Use tools ONLY when the user is asking for real world factual lookup. You should always reason on the response before calling a tool and further reason on the response from a tool.
For general reasoning or advice, do not call tools.
Respond concisely.";

/// Conversation-aware prompt with an explicit tool protocol
pub const ADVANCED_CYCLING_PROMPT: &str = "\
CORE EXPERTISE:
You help cyclists with: bike rentals/shops, cycling routes and climbs, landmarks to visit by bike, and general cycling tips worldwide.

CONVERSATION GUIDELINES:
- Reference previous conversation context when relevant
- Build on earlier exchanges to provide personalized recommendations
- Remember user preferences (location, cycling style, etc.) mentioned earlier
- Ask clarifying questions if location or requirements are unclear

TOOL USAGE PROTOCOL:
1. REASONING BEFORE TOOLS: Always analyze if real-world factual lookup is needed
2. USE TOOLS ONLY FOR: Current business information (bike shops, rentals, specific locations, route suggestions), weather, climb statistics from articles and the user's own Strava routes
3. DO NOT USE TOOLS FOR: General advice, cycling tips, historical information
4. REASONING AFTER TOOLS: Interpret and contextualize tool results for the user

RESPONSE FORMATTING:
- Lead with direct answers to user questions
- When using tools, briefly explain what you're looking up: \"Let me find current bike rental options in [location]...\"
- After tool results, provide practical next steps or additional relevant advice
- Keep responses concise but informative
- Use conversational tone appropriate for cycling enthusiasts

EXAMPLES:
- User asks about \"bike shops in Barcelona\" → Use tool, then suggest what to look for
- User asks about \"best climbing routes in Alps\" → Provide advice without tools
- User follows up on previous location → Reference earlier conversation context

Remember: You're having an ongoing conversation, not just answering isolated questions.";

/// Which built-in prompt to use when no custom prompt is configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    Basic,
    #[default]
    Advanced,
}

impl PromptStyle {
    pub fn text(&self) -> &'static str {
        match self {
            PromptStyle::Basic => CYCLING_ASSISTANT_PROMPT,
            PromptStyle::Advanced => ADVANCED_CYCLING_PROMPT,
        }
    }
}

/// Build the full system prompt, listing the tools the agent can call
pub fn build_system_prompt(
    custom_prompt: Option<&str>,
    style: PromptStyle,
    tool_names: &[&str],
) -> String {
    let base = custom_prompt.unwrap_or_else(|| style.text());
    if tool_names.is_empty() {
        return base.to_string();
    }
    format!("{}\n\nAvailable tools: {}", base, tool_names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_prompt_replaces_builtin() {
        let prompt = build_system_prompt(
            Some("You only talk about gravel bikes."),
            PromptStyle::Advanced,
            &["get_weather_now"],
        );
        assert!(prompt.starts_with("You only talk about gravel bikes."));
        assert!(prompt.ends_with("Available tools: get_weather_now"));
        assert!(!prompt.contains("CORE EXPERTISE"));
    }

    #[test]
    fn test_style_selection() {
        assert!(build_system_prompt(None, PromptStyle::default(), &[]).starts_with("CORE EXPERTISE"));
        assert!(build_system_prompt(None, PromptStyle::Basic, &[]).ends_with("Respond concisely."));
    }
}
