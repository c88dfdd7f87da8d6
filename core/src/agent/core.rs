//! AgentCore implementation

use super::config::AgentConfig;
use super::prompt::build_system_prompt;
use crate::agent::{Agent, AgentExecution, AgentResult};
use crate::error::AgentError;
use crate::llm::{ContentBlock, LlmClient, LlmMessage, MessageRole};
use crate::output::{
    AgentEvent, AgentExecutionContext, AgentOutput, TokenUsage, ToolExecutionInfo,
    ToolExecutionStatus,
};
use crate::tools::{ToolCall, ToolExecutor, ToolResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

const AGENT_ID: &str = "cadence_agent";

/// Tool-calling agent: one model call per step, tool results fed back until
/// the model answers in text
pub struct AgentCore {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
    output: Box<dyn AgentOutput>,
}

/// What a single step produced
enum StepOutcome {
    Answer(String),
    ToolsCalled,
}

impl AgentCore {
    pub fn new(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        tool_executor: ToolExecutor,
        output: Box<dyn AgentOutput>,
    ) -> Self {
        Self {
            config,
            llm_client,
            tool_executor,
            output,
        }
    }

    fn system_prompt(&self) -> String {
        build_system_prompt(
            self.config.system_prompt.as_deref(),
            self.config.prompt_style,
            &self.tool_executor.list_tools(),
        )
    }

    /// Output failures never abort a turn
    async fn emit(&self, event: AgentEvent) {
        if let Err(e) = self.output.emit_event(event).await {
            tracing::debug!("Failed to emit agent event: {}", e);
        }
    }

    async fn execute_step(
        &self,
        step: usize,
        conversation: &mut Vec<LlmMessage>,
        context: &mut AgentExecutionContext,
        tools_used: &mut Vec<String>,
    ) -> AgentResult<StepOutcome> {
        self.emit(AgentEvent::StepStarted { step_number: step }).await;

        let tool_definitions = self.tool_executor.get_tool_definitions();
        let tool_definitions = (!tool_definitions.is_empty()).then_some(tool_definitions);

        let response = match self
            .llm_client
            .chat_completion(conversation.clone(), tool_definitions, None)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("LLM request failed for step {}: {}", step, e);
                let _ = self.output.error(&format!("LLM request failed: {}", e)).await;
                return Err(e);
            }
        };

        if let Some(usage) = &response.usage {
            context.token_usage.input_tokens += usage.prompt_tokens;
            context.token_usage.output_tokens += usage.completion_tokens;
            context.token_usage.total_tokens += usage.total_tokens;
            if let Err(e) = self
                .output
                .emit_token_update(context.token_usage.clone())
                .await
            {
                tracing::debug!("Failed to emit token update: {}", e);
            }
        }

        conversation.push(response.message.clone());

        if !response.message.has_tool_use() {
            let text = response.message.get_text().unwrap_or_default();
            if text.trim().is_empty() {
                return Err(AgentError::EmptyResponse.into());
            }
            return Ok(StepOutcome::Answer(text));
        }

        for tool_use in response.message.get_tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = tool_use else {
                continue;
            };
            let tool_call = ToolCall::with_id(id.as_str(), name.as_str(), input.clone());
            tools_used.push(name.clone());

            self.emit(AgentEvent::ToolExecutionStarted {
                tool_info: ToolExecutionInfo::from_call(
                    &tool_call,
                    ToolExecutionStatus::Executing,
                    None,
                ),
            })
            .await;

            let tool_result = match self.tool_executor.execute(tool_call.clone()).await {
                Ok(result) => result,
                // Unknown tool names go back to the model instead of ending the turn
                Err(e) => ToolResult::error(id.clone(), e.to_string()),
            };

            let status = if tool_result.success {
                ToolExecutionStatus::Success
            } else {
                ToolExecutionStatus::Error
            };
            self.emit(AgentEvent::ToolExecutionCompleted {
                tool_info: ToolExecutionInfo::from_call(&tool_call, status, Some(&tool_result)),
            })
            .await;

            conversation.push(LlmMessage::tool_result(
                id.clone(),
                tool_result.content,
                !tool_result.success,
            ));
        }

        Ok(StepOutcome::ToolsCalled)
    }
}

#[async_trait]
impl Agent for AgentCore {
    async fn respond(&mut self, messages: Vec<LlmMessage>) -> AgentResult<AgentExecution> {
        let start_time = Instant::now();

        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| m.get_text())
            .unwrap_or_default();

        let mut context = AgentExecutionContext {
            agent_id: AGENT_ID.to_string(),
            input,
            max_steps: self.config.max_steps,
            current_step: 0,
            execution_time: std::time::Duration::ZERO,
            token_usage: TokenUsage::default(),
        };
        self.emit(AgentEvent::ExecutionStarted {
            context: context.clone(),
        })
        .await;

        let starts_with_system = messages
            .first()
            .is_some_and(|m| m.role == MessageRole::System);
        let mut conversation = Vec::with_capacity(messages.len() + 1);
        if !starts_with_system {
            conversation.push(LlmMessage::system(self.system_prompt()));
        }
        conversation.extend(messages);

        let mut tools_used = Vec::new();
        let mut outcome: AgentResult<AgentExecution> = Err(AgentError::MaxStepsExceeded {
            max_steps: self.config.max_steps,
        }
        .into());

        for step in 1..=self.config.max_steps {
            context.current_step = step;
            match self
                .execute_step(step, &mut conversation, &mut context, &mut tools_used)
                .await
            {
                Ok(StepOutcome::Answer(text)) => {
                    let duration_ms = start_time.elapsed().as_millis() as u64;
                    outcome = Ok(AgentExecution::success(text, step, duration_ms)
                        .with_tools_used(tools_used.clone())
                        .with_token_usage(context.token_usage.clone()));
                    break;
                }
                Ok(StepOutcome::ToolsCalled) => continue,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        context.execution_time = start_time.elapsed();
        let (success, summary) = match &outcome {
            Ok(execution) => (true, execution.final_result.clone()),
            Err(e) => (false, e.to_string()),
        };
        if !success {
            tracing::warn!("Agent turn failed after {} steps: {}", context.current_step, summary);
        }
        self.emit(AgentEvent::ExecutionCompleted {
            context,
            success,
            summary,
        })
        .await;

        outcome
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn agent_type(&self) -> &str {
        AGENT_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentBuilder;
    use crate::config::{ExtractionConfig, ModelProvider, ResolvedLlmConfig, ToolCredentials};
    use crate::error::Error;
    use crate::output::OutputResult;
    use crate::test_support::{tool_use_message, FailingLlm, ScriptedLlm, StubServer};
    use crate::tools::ToolContext;
    use serde_json::json;
    use std::sync::Mutex;

    fn llm_config() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            ModelProvider::OpenAI,
            "https://api.openai.com/v1".to_string(),
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
        )
    }

    fn offline_context() -> ToolContext {
        ToolContext::new(ToolCredentials::default(), ExtractionConfig::default()).unwrap()
    }

    #[derive(Default, Clone)]
    struct RecordingOutput {
        events: Arc<Mutex<Vec<AgentEvent>>>,
    }

    #[async_trait]
    impl AgentOutput for RecordingOutput {
        async fn emit_event(&self, event: AgentEvent) -> OutputResult {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_plain_answer_prepends_system_prompt() {
        let llm = ScriptedLlm::text("Try the Col de Braus.");
        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(llm.clone())
            .build()
            .unwrap();

        let execution = agent
            .respond(vec![LlmMessage::user("A good climb near Nice?")])
            .await
            .unwrap();

        assert_eq!(execution.final_result, "Try the Col de Braus.");
        assert_eq!(execution.steps_executed, 1);
        assert!(execution.tools_used.is_empty());

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].role, MessageRole::System);
        let system = calls[0][0].get_text().unwrap();
        assert!(system.contains("Available tools: extract_climbs, find_bike_rentals"));
        assert_eq!(llm.tool_counts(), vec![6]);
    }

    #[tokio::test]
    async fn test_existing_system_message_is_kept() {
        let llm = ScriptedLlm::text("ok");
        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(llm.clone())
            .build()
            .unwrap();

        agent
            .respond(vec![
                LlmMessage::system("Be brief."),
                LlmMessage::user("Hello"),
            ])
            .await
            .unwrap();

        let calls = llm.calls();
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].get_text().as_deref(), Some("Be brief."));
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let body = json!({
            "location": {"name": "Girona", "country": "Spain"},
            "current": {
                "condition": {"text": "Sunny"},
                "temp_c": 21.0,
                "humidity": 40.0,
                "wind_kph": 9.4
            }
        });
        let server = StubServer::serve(200, body.to_string()).await;
        let credentials = ToolCredentials {
            weatherapi_key: Some("weather-key".to_string()),
            ..Default::default()
        };
        let llm = ScriptedLlm::new(vec![
            tool_use_message("call_1", "get_weather_now", json!({"city": "Girona"})),
            LlmMessage::assistant("Sunny and 21°C, perfect for Rocacorba."),
        ]);
        let output = RecordingOutput::default();
        let mut agent = AgentBuilder::new(
            llm_config(),
            ToolContext::for_stub(&server.base_url(), credentials),
        )
        .with_llm_client(llm.clone())
        .build_with_output(Box::new(output.clone()))
        .unwrap();

        let execution = agent
            .respond(vec![LlmMessage::user("Weather in Girona?")])
            .await
            .unwrap();

        assert_eq!(execution.steps_executed, 2);
        assert_eq!(execution.tools_used, vec!["get_weather_now".to_string()]);

        let second_call = &llm.calls()[1];
        let tool_message = second_call.last().unwrap();
        assert_eq!(tool_message.role, MessageRole::Tool);
        match &tool_message.blocks()[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                is_error,
                content,
            } => {
                assert_eq!(tool_use_id, "call_1");
                assert_eq!(*is_error, Some(false));
                assert!(content.contains("Current weather in Girona, Spain: Sunny"));
            }
            other => panic!("unexpected block: {:?}", other),
        }

        let events = output.events.lock().unwrap();
        let completed = events.iter().find_map(|e| match e {
            AgentEvent::ToolExecutionCompleted { tool_info } => Some(tool_info.clone()),
            _ => None,
        });
        assert_eq!(completed.unwrap().status, ToolExecutionStatus::Success);
        assert!(matches!(
            events.last(),
            Some(AgentEvent::ExecutionCompleted { success: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_tool_failure_and_unknown_tool_become_error_results() {
        let llm = ScriptedLlm::new(vec![
            tool_use_message("call_1", "get_weather_now", json!({"city": "Girona"})),
            tool_use_message("call_2", "book_hotel", json!({})),
            LlmMessage::assistant("I could not look that up."),
        ]);
        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(llm.clone())
            .build()
            .unwrap();

        let execution = agent
            .respond(vec![LlmMessage::user("Weather in Girona?")])
            .await
            .unwrap();
        assert_eq!(execution.final_result, "I could not look that up.");

        let calls = llm.calls();
        let missing_key = calls[1].last().unwrap().blocks();
        let unknown_tool = calls[2].last().unwrap().blocks();
        match (&missing_key[0], &unknown_tool[0]) {
            (
                ContentBlock::ToolResult {
                    is_error: Some(true),
                    content: first,
                    ..
                },
                ContentBlock::ToolResult {
                    is_error: Some(true),
                    content: second,
                    ..
                },
            ) => {
                assert!(first.contains("WEATHERAPI_KEY"));
                assert!(second.contains("book_hotel"));
            }
            other => panic!("unexpected blocks: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_max_steps_exceeded() {
        let llm = ScriptedLlm::new(vec![tool_use_message(
            "call_1",
            "get_weather_now",
            json!({"city": "Girona"}),
        )]);
        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(llm.clone())
            .with_max_steps(3)
            .build()
            .unwrap();

        let err = agent
            .respond(vec![LlmMessage::user("Weather?")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Agent(AgentError::MaxStepsExceeded { max_steps: 3 })
        ));
        assert_eq!(llm.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_answer_and_llm_failure_are_errors() {
        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(ScriptedLlm::text("   "))
            .build()
            .unwrap();
        let err = agent
            .respond(vec![LlmMessage::user("Hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Agent(AgentError::EmptyResponse)));

        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(Arc::new(FailingLlm))
            .build()
            .unwrap();
        let err = agent
            .respond(vec![LlmMessage::user("Hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_no_tools_sends_no_definitions() {
        let llm = ScriptedLlm::text("Just ride.");
        let mut agent = AgentBuilder::new(llm_config(), offline_context())
            .with_llm_client(llm.clone())
            .with_tools(Vec::new())
            .build()
            .unwrap();
        agent.respond(vec![LlmMessage::user("Tips?")]).await.unwrap();
        assert_eq!(llm.tool_counts(), vec![0]);
        assert!(!llm.calls()[0][0].get_text().unwrap().contains("Available tools"));
    }
}
