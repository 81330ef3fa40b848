//! Append-only conversation transcript

use crate::llm::LlmErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

/// One displayed message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// Position in the transcript, starting at 0
    pub sequence: u64,
    pub author: Author,
    pub text: String,
    /// For assistant turns, the user turn being answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<u64>,
    /// Set when the text is the fallback for a failed completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<LlmErrorKind>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(&self) -> u64 {
        self.turns.len() as u64
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &Turn {
        let turn = Turn {
            sequence: self.next_sequence(),
            author: Author::User,
            text: text.into(),
            reply_to: None,
            failure: None,
            created_at: Utc::now(),
        };
        self.push(turn)
    }

    pub fn push_assistant(
        &mut self,
        reply_to: u64,
        text: impl Into<String>,
        failure: Option<LlmErrorKind>,
    ) -> &Turn {
        let turn = Turn {
            sequence: self.next_sequence(),
            author: Author::Assistant,
            text: text.into(),
            reply_to: Some(reply_to),
            failure,
            created_at: Utc::now(),
        };
        self.push(turn)
    }

    fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        let last = self.turns.len() - 1;
        &self.turns[last]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
