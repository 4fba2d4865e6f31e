//! The chat state machine: Idle accepts input, Awaiting holds exactly one
//! in-flight request with the input disabled.
//!
//! Nothing here touches the network or the display. The host runs each
//! [`Dispatch`] off the UI thread and hands the [`CompletionResult`] back to
//! [`Conversation::complete`].

use crate::bubbles::{BubbleContainer, ScrollToEnd};
use crate::message::ChatMessage;
use crate::ollama::CompletionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Awaiting,
}

/// Work item for the single request slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Dispatch {
    pub prompt: String,
}

/// What the host should do after a completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub scroll: ScrollToEnd,
    /// Give keyboard focus back to the input field.
    pub focus_input: bool,
}

#[derive(Debug)]
pub struct Conversation {
    transcript: BubbleContainer,
    input: String,
    phase: Phase,
    dispatched: u64,
}

impl Conversation {
    pub fn new(transcript: BubbleContainer) -> Self {
        Conversation {
            transcript,
            input: String::new(),
            phase: Phase::Idle,
            dispatched: 0,
        }
    }

    pub fn transcript(&self) -> &BubbleContainer {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input_enabled(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Requests handed out so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Edits are dropped while the field is disabled.
    pub fn set_input(&mut self, value: String) {
        if self.input_enabled() {
            self.input = value;
        }
    }

    /// Submits the input buffer. Returns the request to run, or `None` when
    /// the input is blank or a request is already in flight.
    pub fn submit(&mut self) -> Option<(Dispatch, ScrollToEnd)> {
        if self.phase == Phase::Awaiting || self.input.trim().is_empty() {
            return None;
        }

        let prompt = std::mem::take(&mut self.input);
        let scroll = self.transcript.push_message(ChatMessage::user(prompt.clone()));
        self.phase = Phase::Awaiting;
        self.dispatched += 1;

        tracing::debug!(request = self.dispatched, "prompt submitted");
        Some((Dispatch { prompt }, scroll))
    }

    /// Applies the outcome of the in-flight request. A result that arrives
    /// while idle has no request to answer and is dropped.
    pub fn complete(&mut self, result: CompletionResult) -> Option<Completion> {
        if self.phase != Phase::Awaiting {
            tracing::warn!("completion arrived with no request in flight, dropping it");
            return None;
        }

        let (message, focus_input) = match result {
            Ok(text) => (ChatMessage::assistant(text), true),
            Err(err) => {
                tracing::warn!(error = %err, "request failed");
                (ChatMessage::error(err), false)
            }
        };

        let scroll = self.transcript.push_message(message);
        self.phase = Phase::Idle;
        Some(Completion {
            scroll,
            focus_input,
        })
    }
}
