// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 聊天面板显示内容

pub const WELCOME_MESSAGE: &str = "Welcome to Vision Assistant Pro! I can detect various objects and animals. Click 'Start Camera' to begin.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    You,
    Assistant,
}

impl Speaker {
    pub fn name(&self) -> &'static str {
        match self {
            Speaker::You => "You",
            Speaker::Assistant => "Assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub message: String,
}

impl TranscriptEntry {
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker.name(), self.message)
    }
}

/// 聊天面板中的全部消息 (包含检测提示, 与发给模型的历史不同)
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn with_welcome() -> Self {
        let mut transcript = Self::default();
        transcript.push(Speaker::Assistant, WELCOME_MESSAGE);
        transcript
    }

    pub fn push(&mut self, speaker: Speaker, message: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 输入框内容是否值得发送, 返回去掉首尾空白后的文本
pub fn prepare_input(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome() {
        let transcript = Transcript::with_welcome();
        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript.entries()[0].render(),
            format!("Assistant: {}", WELCOME_MESSAGE)
        );
    }

    #[test]
    fn test_render_speakers() {
        let mut transcript = Transcript::default();
        transcript.push(Speaker::You, "hi");
        transcript.push(Speaker::Assistant, "hello");
        let lines: Vec<String> = transcript.entries().iter().map(|e| e.render()).collect();
        assert_eq!(lines, vec!["You: hi", "Assistant: hello"]);
    }

    #[test]
    fn test_prepare_input() {
        assert_eq!(prepare_input("  what is this?  "), Some("what is this?".to_string()));
        assert_eq!(prepare_input("   "), None);
        assert_eq!(prepare_input(""), None);
    }
}
