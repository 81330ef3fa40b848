//! Chat assistant
//!
//! Each conversation is a router task: input is classified, answered with a
//! canned reply or a completion, and recorded in an append-only transcript.

mod classifier;
mod dispatch;
mod manager;
mod runtime;
mod transcript;

pub use classifier::{Classifier, Intent, KeywordClassifier, KeywordError, KeywordSets};
pub use dispatch::{dispatch, Dispatch, Replies, Reply};
pub use manager::ChatManager;
pub use runtime::{spawn_conversation, ChatError, ChatEvent, ChatHandle, ChatSnapshot};
pub use transcript::{Author, Transcript, Turn};
