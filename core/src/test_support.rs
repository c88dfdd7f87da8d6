//! Shared fixtures for unit tests: a canned HTTP server and a scripted LLM

use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One request captured by [`StubServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Local HTTP server answering every request with the same status and body
pub struct StubServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn serve(status: u16, body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let body = body.into();

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = recorded.clone();
                let body = body.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, status, &body, recorded).await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    status: u16,
    body: &str,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    let request_body = String::from_utf8_lossy(&buffer[header_end..]).to_string();

    recorded.lock().unwrap().push(RecordedRequest {
        request_line,
        headers,
        body: request_body,
    });

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// LLM client replaying scripted assistant messages in order
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<LlmMessage>>,
    seen: Mutex<Vec<Vec<LlmMessage>>>,
    seen_tools: Mutex<Vec<usize>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<LlmMessage>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            seen_tools: Mutex::new(Vec::new()),
        })
    }

    /// A client that always answers with the given text
    pub fn text(reply: &str) -> Arc<Self> {
        Self::new(vec![LlmMessage::assistant(reply)])
    }

    /// Messages received on each call
    pub fn calls(&self) -> Vec<Vec<LlmMessage>> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of tool definitions offered on each call
    pub fn tool_counts(&self) -> Vec<usize> {
        self.seen_tools.lock().unwrap().clone()
    }
}

/// An assistant message requesting a single tool call
pub fn tool_use_message(id: &str, name: &str, input: serde_json::Value) -> LlmMessage {
    LlmMessage {
        role: MessageRole::Assistant,
        content: MessageContent::MultiModal(vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }]),
        metadata: None,
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        self.seen.lock().unwrap().push(messages);
        self.seen_tools
            .lock()
            .unwrap()
            .push(tools.map(|t| t.len()).unwrap_or(0));

        let mut replies = self.replies.lock().unwrap();
        // The last reply repeats once the script runs out
        let message = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
        .ok_or_else(|| LlmError::InvalidResponse {
            message: "script exhausted".to_string(),
        })?;

        let finish_reason = if message.has_tool_use() {
            FinishReason::ToolCalls
        } else {
            FinishReason::Stop
        };

        Ok(LlmResponse {
            message,
            usage: None,
            model: "scripted".to_string(),
            finish_reason: Some(finish_reason),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// LLM client that always fails
pub struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn chat_completion(
        &self,
        _messages: Vec<LlmMessage>,
        _tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        Err(LlmError::Network {
            message: "connection refused".to_string(),
        }
        .into())
    }

    fn model_name(&self) -> &str {
        "failing"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}
