//! Intent classification for chat input
//!
//! The keyword lists are data ([`KeywordSets`]) so they can be replaced from a
//! JSON file without touching the dispatch logic.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Thanks and similar: answered with a canned acknowledgement
    Courtesy,
    /// "Tell me more" about the remembered topic
    FollowUp,
    /// Hydroponics / pond question: sent to the completion backend
    OnTopic,
    /// Anything else: answered with a canned refusal
    OutOfScope,
}

/// Pluggable classifier.
///
/// Implementations must only return [`Intent::FollowUp`] when `topic` is
/// `Some`.
pub trait Classifier: Send + Sync {
    fn classify(&self, input: &str, topic: Option<&str>) -> Intent;
}

#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("Failed to read keyword file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid keyword file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Keyword set '{0}' is empty")]
    EmptySet(&'static str),
}

/// Phrase lists used by [`KeywordClassifier`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSets {
    pub courtesy: Vec<String>,
    pub follow_up: Vec<String>,
    pub domain: Vec<String>,
}

impl Default for KeywordSets {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| (*w).to_string()).collect()
        }

        Self {
            courtesy: owned(&["gracias", "muchas gracias", "thanks", "thank you"]),
            follow_up: owned(&[
                "más información",
                "mas informacion",
                "explícame",
                "explicame",
                "explica",
                "detalles",
                "profundiza",
                "more information",
                "explain",
                "details",
            ]),
            domain: owned(&[
                "hidropon",
                "hydropon",
                "estanque",
                "nutriente",
                "nutrient",
                "sustrato",
                "lechuga",
                "tilapia",
                "acuapon",
                "aquapon",
                "oxígeno disuelto",
                "oxigeno disuelto",
                "dissolved oxygen",
                "nivel de ph",
                "ph del agua",
                "conductividad",
                "germinación",
                "germinacion",
                "cultivo",
                "plántula",
                "plantula",
                "raíces",
                "raices",
                "solución nutritiva",
                "solucion nutritiva",
            ]),
        }
    }
}

impl KeywordSets {
    /// Load from a JSON file with `courtesy`, `follow_up` and `domain` arrays
    pub fn from_json_file(path: &Path) -> Result<Self, KeywordError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| KeywordError::Io {
            path: display.clone(),
            source,
        })?;
        let sets: Self = serde_json::from_str(&raw).map_err(|source| KeywordError::Parse {
            path: display,
            source,
        })?;
        sets.validate()?;
        Ok(sets)
    }

    fn validate(&self) -> Result<(), KeywordError> {
        let non_blank = |set: &[String]| set.iter().any(|w| !w.trim().is_empty());
        if !non_blank(&self.courtesy) {
            return Err(KeywordError::EmptySet("courtesy"));
        }
        if !non_blank(&self.follow_up) {
            return Err(KeywordError::EmptySet("follow_up"));
        }
        if !non_blank(&self.domain) {
            return Err(KeywordError::EmptySet("domain"));
        }
        Ok(())
    }
}

/// Case-insensitive substring classifier.
///
/// Priority: courtesy, then follow-up (only with a topic), then domain.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    courtesy: Vec<String>,
    follow_up: Vec<String>,
    domain: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(&KeywordSets::default())
    }
}

impl KeywordClassifier {
    pub fn new(sets: &KeywordSets) -> Self {
        Self {
            courtesy: normalize_all(&sets.courtesy),
            follow_up: normalize_all(&sets.follow_up),
            domain: normalize_all(&sets.domain),
        }
    }
}

fn normalize_all(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

impl Classifier for KeywordClassifier {
    fn classify(&self, input: &str, topic: Option<&str>) -> Intent {
        let text = input.to_lowercase();

        if contains_any(&text, &self.courtesy) {
            Intent::Courtesy
        } else if topic.is_some() && contains_any(&text, &self.follow_up) {
            Intent::FollowUp
        } else if contains_any(&text, &self.domain) {
            Intent::OnTopic
        } else {
            Intent::OutOfScope
        }
    }
}
