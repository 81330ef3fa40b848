//! Conversation router runtime
//!
//! One task per conversation owns the transcript and topic memory. Commands
//! arrive over an mpsc channel; completions run concurrently as futures
//! polled by the same task, so all state changes happen in one place.
//! Assistant turns are committed in submission order: a reply that is ready
//! early waits until every earlier message has been answered.

use super::classifier::Classifier;
use super::dispatch::{dispatch, Dispatch, Replies, Reply};
use super::transcript::{Transcript, Turn};
use crate::llm::{CompletionRequest, CompletionResponse, CompletionService, LlmError, LlmErrorKind};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Conversation is closed")]
    Closed,
}

/// Requests handled by the router task
#[derive(Debug)]
pub enum ChatCommand {
    Submit {
        text: String,
        ack: oneshot::Sender<u64>,
    },
    Snapshot {
        reply: oneshot::Sender<ChatSnapshot>,
    },
}

/// Events broadcast to subscribers (SSE clients, tests)
#[derive(Debug, Clone)]
pub enum ChatEvent {
    TurnAppended(Turn),
}

/// Point-in-time view of a conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub turns: Vec<Turn>,
    pub topic: Option<String>,
    /// User messages still waiting for their assistant turn
    pub awaiting_replies: usize,
}

/// Cloneable handle to a running conversation
#[derive(Debug, Clone)]
pub struct ChatHandle {
    commands: mpsc::Sender<ChatCommand>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatHandle {
    /// Submit a user message. Returns the sequence number of its user turn,
    /// which is appended before this returns. Every message is answered,
    /// blank ones included.
    pub async fn submit(&self, text: impl Into<String>) -> Result<u64, ChatError> {
        let (ack, rx) = oneshot::channel();
        self.commands
            .send(ChatCommand::Submit {
                text: text.into(),
                ack,
            })
            .await
            .map_err(|_| ChatError::Closed)?;
        rx.await.map_err(|_| ChatError::Closed)
    }

    pub async fn snapshot(&self) -> Result<ChatSnapshot, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ChatCommand::Snapshot { reply })
            .await
            .map_err(|_| ChatError::Closed)?;
        rx.await.map_err(|_| ChatError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }
}

/// Start a router task for one conversation
pub fn spawn_conversation(
    conv_id: impl Into<String>,
    completions: Arc<dyn CompletionService>,
    classifier: Arc<dyn Classifier>,
    replies: Arc<Replies>,
) -> ChatHandle {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (events, _) = broadcast::channel(EVENT_BUFFER);

    let router = ConversationRouter {
        conv_id: conv_id.into(),
        completions,
        classifier,
        replies,
        transcript: Transcript::new(),
        topic: None,
        awaiting: VecDeque::new(),
        ready: HashMap::new(),
        inflight: FuturesUnordered::new(),
        commands: commands_rx,
        events: events.clone(),
    };
    tokio::spawn(router.run());

    ChatHandle {
        commands: commands_tx,
        events,
    }
}

struct CompletionDone {
    reply_to: u64,
    remember: Option<String>,
    result: Result<CompletionResponse, LlmError>,
}

struct ReadyReply {
    text: String,
    failure: Option<LlmErrorKind>,
    remember: Option<String>,
}

struct ConversationRouter {
    conv_id: String,
    completions: Arc<dyn CompletionService>,
    classifier: Arc<dyn Classifier>,
    replies: Arc<Replies>,
    transcript: Transcript,
    topic: Option<String>,
    /// User turns without an assistant turn, oldest first
    awaiting: VecDeque<u64>,
    /// Replies that are known but not yet committed
    ready: HashMap<u64, ReadyReply>,
    inflight: FuturesUnordered<BoxFuture<'static, CompletionDone>>,
    commands: mpsc::Receiver<ChatCommand>,
    events: broadcast::Sender<ChatEvent>,
}

impl ConversationRouter {
    async fn run(mut self) {
        tracing::info!(conv_id = %self.conv_id, "Starting conversation router");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(done) = self.inflight.next(), if !self.inflight.is_empty() => {
                    self.on_completion(done);
                }
            }
        }

        if !self.inflight.is_empty() {
            tracing::info!(
                conv_id = %self.conv_id,
                dropped = self.inflight.len(),
                "Dropping in-flight completions"
            );
        }
        tracing::info!(conv_id = %self.conv_id, "Conversation router stopped");
    }

    fn handle_command(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Submit { text, ack } => self.submit(text, ack),
            ChatCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn submit(&mut self, text: String, ack: oneshot::Sender<u64>) {
        let turn = self.transcript.push_user(text.as_str()).clone();
        let sequence = turn.sequence;
        self.publish(turn);
        let _ = ack.send(sequence);
        self.awaiting.push_back(sequence);

        let Dispatch { intent, reply } = dispatch(
            &text,
            self.topic.as_deref(),
            self.classifier.as_ref(),
            &self.replies,
        );
        tracing::info!(conv_id = %self.conv_id, sequence, ?intent, "Classified message");

        match reply {
            Reply::Canned(text) => {
                self.ready.insert(
                    sequence,
                    ReadyReply {
                        text,
                        failure: None,
                        remember: None,
                    },
                );
                self.commit_ready();
            }
            Reply::Complete { prompt, remember } => {
                let mut request = CompletionRequest::single_turn(prompt);
                if let Some(system) = &self.replies.system_prompt {
                    request = request.with_system(system.clone());
                }
                let completions = Arc::clone(&self.completions);
                self.inflight.push(Box::pin(async move {
                    let result = completions.complete(&request).await;
                    CompletionDone {
                        reply_to: sequence,
                        remember,
                        result,
                    }
                }));
            }
        }
    }

    fn on_completion(&mut self, done: CompletionDone) {
        let CompletionDone {
            reply_to,
            remember,
            result,
        } = done;

        let reply = match result {
            Ok(response) => ReadyReply {
                text: response.text,
                failure: None,
                remember,
            },
            Err(e) => {
                tracing::warn!(
                    conv_id = %self.conv_id,
                    reply_to,
                    kind = ?e.kind,
                    error = %e,
                    "Completion failed, replying with fallback"
                );
                ReadyReply {
                    text: self.replies.failure.clone(),
                    failure: Some(e.kind),
                    remember: None,
                }
            }
        };

        self.ready.insert(reply_to, reply);
        self.commit_ready();
    }

    /// Append every reply whose turn has come
    fn commit_ready(&mut self) {
        while let Some(&next) = self.awaiting.front() {
            let Some(reply) = self.ready.remove(&next) else {
                break;
            };
            self.awaiting.pop_front();

            if let Some(topic) = reply.remember {
                tracing::debug!(conv_id = %self.conv_id, %topic, "Topic memory updated");
                self.topic = Some(topic);
            }

            let turn = self
                .transcript
                .push_assistant(next, reply.text, reply.failure)
                .clone();
            self.publish(turn);
        }
    }

    fn publish(&self, turn: Turn) {
        // No subscribers is fine
        let _ = self.events.send(ChatEvent::TurnAppended(turn));
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            turns: self.transcript.turns().to_vec(),
            topic: self.topic.clone(),
            awaiting_replies: self.awaiting.len(),
        }
    }
}
