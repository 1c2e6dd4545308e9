// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 对话会话: 历史 + 后端

use std::sync::{Arc, Mutex};

use tracing::warn;

use super::message::{ChatMessage, Conversation};
use super::ChatBackend;

/// 可在线程间共享的会话
pub struct ChatSession<B: ChatBackend> {
    backend: B,
    conversation: Mutex<Conversation>,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Arc<Self> {
        Arc::new(Self {
            backend,
            conversation: Mutex::new(Conversation::new()),
        })
    }

    /// 追加用户消息并请求回复
    ///
    /// 成功时回复写入历史并返回; 失败时返回 `Error: ...`, 历史里只留下用户消息
    pub fn respond(&self, user_input: &str) -> String {
        let messages = {
            let mut conversation = self.lock();
            conversation.push_user(user_input);
            conversation.messages().to_vec()
        };

        match self.backend.complete(&messages) {
            Ok(reply) => {
                self.lock().push_assistant(reply.clone());
                reply
            }
            Err(e) => {
                warn!("❌ 聊天请求失败: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.lock().messages().to_vec()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Conversation> {
        // 持锁期间不会 panic, 中毒时沿用内部数据
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatError, Role};

    /// 记录每次收到的历史长度, 按输入内容决定成功或失败
    #[derive(Default)]
    struct EchoBackend {
        seen_lengths: Mutex<Vec<usize>>,
    }

    impl ChatBackend for EchoBackend {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
            self.seen_lengths.lock().unwrap().push(messages.len());
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            if last == "fail" {
                Err(ChatError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(format!("echo: {}", last))
            }
        }
    }

    #[test]
    fn test_success_appends_both_turns() {
        let session = ChatSession::new(EchoBackend::default());
        assert_eq!(session.respond("hello"), "echo: hello");
        assert_eq!(session.respond("again"), "echo: again");

        let history = session.history();
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        // 每次请求都带上完整历史
        assert_eq!(*session.backend().seen_lengths.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_failure_keeps_user_message_only() {
        let session = ChatSession::new(EchoBackend::default());
        assert_eq!(session.respond("fail"), "Error: HTTP 500: boom");

        let history = session.history();
        assert_eq!(history, vec![ChatMessage::user("fail")]);

        session.respond("next");
        assert_eq!(*session.backend().seen_lengths.lock().unwrap(), vec![1, 2]);
    }
}
