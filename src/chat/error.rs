// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use thiserror::Error;

/// 聊天补全请求错误
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<ureq::Error> for ChatError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
                ChatError::Status { status, body }
            }
            ureq::Error::Transport(transport) => ChatError::Transport(transport.to_string()),
        }
    }
}
