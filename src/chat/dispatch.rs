//! Pure reply selection
//!
//! Given an input, the remembered topic and a classifier, decide how to
//! answer. No I/O happens here; the runtime carries out the decision.

use super::classifier::{Classifier, Intent};

/// Fixed texts used by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replies {
    pub courtesy: String,
    pub out_of_scope: String,
    /// Shown when a completion fails
    pub failure: String,
    /// Prompt sent for follow-ups; `{topic}` is replaced by the remembered topic
    pub follow_up_template: String,
    /// Optional system prompt sent ahead of every completion prompt
    pub system_prompt: Option<String>,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            courtesy: "¡De nada! Si tienes más preguntas sobre hidroponía o tus estanques, aquí estoy."
                .to_string(),
            out_of_scope: "Lo siento, solo puedo ayudarte con preguntas sobre hidroponía y el cuidado de tus estanques."
                .to_string(),
            failure: "Lo siento, no pude obtener una respuesta en este momento. Inténtalo de nuevo más tarde."
                .to_string(),
            follow_up_template: "Proporciona más información sobre {topic}".to_string(),
            system_prompt: None,
        }
    }
}

impl Replies {
    pub fn follow_up_prompt(&self, topic: &str) -> String {
        self.follow_up_template.replace("{topic}", topic)
    }
}

/// How to answer one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Answer immediately with a fixed text
    Canned(String),
    /// Ask the completion backend
    Complete {
        prompt: String,
        /// Topic to remember once the completion succeeds
        remember: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub intent: Intent,
    pub reply: Reply,
}

pub fn dispatch(
    input: &str,
    topic: Option<&str>,
    classifier: &dyn Classifier,
    replies: &Replies,
) -> Dispatch {
    let intent = classifier.classify(input, topic);

    let reply = match (intent, topic) {
        (Intent::Courtesy, _) => Reply::Canned(replies.courtesy.clone()),
        (Intent::FollowUp, Some(topic)) => Reply::Complete {
            prompt: replies.follow_up_prompt(topic),
            remember: None,
        },
        (Intent::OnTopic, _) => Reply::Complete {
            prompt: input.to_string(),
            remember: Some(input.to_string()),
        },
        // A classifier that reports a follow-up with nothing to follow is
        // treated as out of scope
        (Intent::FollowUp, None) | (Intent::OutOfScope, _) => {
            Reply::Canned(replies.out_of_scope.clone())
        }
    };

    Dispatch { intent, reply }
}
