// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 聊天系统 (Chat System)
///
/// 对话历史 → HTTP POST → 解析回复
/// - Conversation:     对话历史
/// - OpenRouterClient: 聊天补全接口
/// - ChatSession:      历史 + 后端, 供界面线程调用
pub mod client;
pub mod error;
pub mod message;
pub mod session;

pub use client::{ClientConfig, OpenRouterClient};
pub use error::ChatError;
pub use message::{ChatMessage, Conversation, Role};
pub use session::ChatSession;

/// 聊天补全后端
pub trait ChatBackend: Send + Sync {
    /// 发送完整历史, 返回助手回复
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}
