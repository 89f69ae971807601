//! Context lexicon definitions
//!
//! The lexicon drives the context analyzer. Defaults are built in; an
//! operator may override any list from YAML:
//! ```yaml
//! insult_terms: [idiot, moron, clown]
//! task_nouns: [project, sprint, ticket]
//! ```
//! Lists that are left out keep their defaults.

use safespace_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Word lists used to judge a toxic message's target and framing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLexicon {
    /// Second-person forms that address the reader directly
    #[serde(default = "default_second_person")]
    pub second_person: Vec<String>,

    /// Third-person pronouns that point an attack at someone
    #[serde(default = "default_third_person")]
    pub third_person: Vec<String>,

    /// Capitalised words that look like names but are not people
    #[serde(default = "default_non_names")]
    pub non_names: Vec<String>,

    /// High-severity insult and slur terms
    #[serde(default = "default_insult_terms")]
    pub insult_terms: Vec<String>,

    /// Hedge words that signal constructive framing
    #[serde(default = "default_hedge_words")]
    pub hedge_words: Vec<String>,

    /// Work artifacts; criticism aimed at these is about content
    #[serde(default = "default_task_nouns")]
    pub task_nouns: Vec<String>,
}

impl ContextLexicon {
    /// Load a lexicon from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("Invalid lexicon: {}", e)))
    }

    /// Load a lexicon from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }
}

impl Default for ContextLexicon {
    fn default() -> Self {
        Self {
            second_person: default_second_person(),
            third_person: default_third_person(),
            non_names: default_non_names(),
            insult_terms: default_insult_terms(),
            hedge_words: default_hedge_words(),
            task_nouns: default_task_nouns(),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn default_second_person() -> Vec<String> {
    words(&["you", "you're", "you’re", "youre", "u", "ur", "yourself", "ya"])
}

fn default_third_person() -> Vec<String> {
    words(&["he", "she", "they", "he's", "she's", "they're"])
}

fn default_non_names() -> Vec<String> {
    words(&[
        "this", "that", "it", "there", "here", "what", "which", "who", "everything",
        "nothing", "something", "everyone", "anyone", "today", "life", "work", "time",
    ])
}

fn default_insult_terms() -> Vec<String> {
    words(&[
        "idiot", "idiots", "idiotic", "moron", "morons", "moronic", "stupid", "dumb",
        "fool", "loser", "losers", "retard", "retarded", "imbecile", "jerk", "bitch",
        "bastard", "asshole", "dick", "prick", "worthless", "pathetic", "disgusting",
        "ugly", "fat", "donkey", "pig", "rat", "snake", "scum", "fuck", "fucking",
        "fucker", "shit", "shitty",
    ])
}

fn default_hedge_words() -> Vec<String> {
    words(&["but", "however", "although", "though", "that said", "to be fair"])
}

fn default_task_nouns() -> Vec<String> {
    words(&[
        "project", "approach", "report", "presentation", "plan", "proposal", "idea",
        "design", "process", "meeting", "deadline", "code", "document", "feature",
        "task", "strategy", "decision", "schedule", "budget", "draft",
    ])
}
