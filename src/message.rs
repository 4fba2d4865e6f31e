#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// One transcript entry. Never edited once created; arrival order is its
/// position in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// Assistant entries that carry a failed request rather than an answer.
    pub is_error: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text.into(), false)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text.into(), false)
    }

    pub fn error(detail: impl std::fmt::Display) -> Self {
        Self::new(Sender::Assistant, format!("Error: {}", detail), true)
    }

    fn new(sender: Sender, text: String, is_error: bool) -> Self {
        ChatMessage {
            sender,
            text,
            is_error,
        }
    }
}
