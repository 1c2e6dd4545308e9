// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! OpenRouter (OpenAI 兼容) 聊天补全客户端
//!
//! 阻塞式请求, 由界面为每条消息单独开线程调用

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::ChatError;
use super::message::ChatMessage;
use super::ChatBackend;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_args(args: &crate::Args, api_key: String) -> Self {
        Self {
            api_url: args.api_url.clone(),
            api_key,
            model: args.chat_model.clone(),
            referer: args.referer.clone(),
            title: args.title.clone(),
            timeout: Duration::from_secs(args.timeout),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

pub struct OpenRouterClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl OpenRouterClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        info!("💬 聊天模型: {} @ {}", config.model, config.api_url);
        Self { agent, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ChatBackend for OpenRouterClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
        };
        debug!("📤 发送 {} 条消息", messages.len());

        let response = self
            .agent
            .post(&self.config.api_url)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .set("HTTP-Referer", &self.config.referer)
            .set("X-Title", &self.config.title)
            .send_json(&request)?;

        let body: CompletionResponse = response
            .into_json()
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatError::MalformedResponse("no choices[0].message.content".to_string()))
    }
}
