//! Lexical triggers compiled from a context lexicon

use crate::rule::ContextLexicon;
use regex::{Regex, RegexBuilder};
use safespace_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Who or what a toxic message is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A directed attack on the reader or a named person
    Person,

    /// Work, process, or ideas
    Content,
}

/// Compiled matchers for one lexicon
#[derive(Debug, Clone)]
pub struct LexicalTriggers {
    direct_address: Regex,
    third_person: Regex,
    named_subject: Regex,
    non_names: HashSet<String>,
    insult: Regex,
    constructive: Regex,
}

impl LexicalTriggers {
    /// Compile the lexicon
    pub fn compile(lexicon: &ContextLexicon) -> Result<Self> {
        let (contractions, pronouns): (Vec<String>, Vec<String>) = lexicon
            .third_person
            .iter()
            .cloned()
            .partition(|w| w.contains('\'') || w.contains('’'));

        let third_person = match (pronouns.is_empty(), contractions.is_empty()) {
            (true, true) => never_match()?,
            (false, true) => build(&format!(r"\b(?:{})\s+(?:is|are|was|were)\b", alternation(&pronouns)), true)?,
            (true, false) => build(&format!(r"\b(?:{})\b", alternation(&contractions)), true)?,
            (false, false) => build(
                &format!(
                    r"\b(?:{})\s+(?:is|are|was|were)\b|\b(?:{})\b",
                    alternation(&pronouns),
                    alternation(&contractions)
                ),
                true,
            )?,
        };

        // Task nouns may appear in the plural ("meetings are pointless")
        let hedges = has_words(&lexicon.hedge_words);
        let nouns = has_words(&lexicon.task_nouns);
        let constructive = match (hedges, nouns) {
            (false, false) => never_match()?,
            (true, false) => word_regex(&lexicon.hedge_words)?,
            (false, true) => build(
                &format!(r"\b(?:{})s?\b", alternation(&lexicon.task_nouns)),
                true,
            )?,
            (true, true) => build(
                &format!(
                    r"\b(?:{})\b|\b(?:{})s?\b",
                    alternation(&lexicon.hedge_words),
                    alternation(&lexicon.task_nouns)
                ),
                true,
            )?,
        };

        // A task noun at the start of a sentence is never a name
        let non_names = lexicon
            .non_names
            .iter()
            .map(|w| w.trim().to_lowercase())
            .chain(lexicon.task_nouns.iter().flat_map(|noun| {
                let noun = noun.trim().to_lowercase();
                [format!("{}s", noun), noun]
            }))
            .collect();

        Ok(Self {
            direct_address: word_regex(&lexicon.second_person)?,
            third_person,
            // Singular verbs only; a name is one person
            named_subject: build(r"\b([A-Z][a-z]+)\s+(?:is|was)\b", false)?,
            non_names,
            insult: word_regex(&lexicon.insult_terms)?,
            constructive,
        })
    }

    /// Message addresses the reader, a third person, or a named person
    pub fn references_person(&self, text: &str) -> bool {
        self.direct_address.is_match(text)
            || self.third_person.is_match(text)
            || self.named_subject(text).is_some()
    }

    /// First capitalised subject that looks like a person's name
    pub fn named_subject<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.named_subject
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|name| !self.non_names.contains(&name.to_lowercase()))
    }

    /// Contains a high-severity insult or slur
    pub fn has_insult(&self, text: &str) -> bool {
        self.insult.is_match(text)
    }

    /// Contains a hedge word or a task noun
    pub fn has_constructive_marker(&self, text: &str) -> bool {
        self.constructive.is_match(text)
    }

    /// Person only when a person reference co-occurs with an insult
    pub fn target(&self, text: &str) -> TargetKind {
        if self.references_person(text) && self.has_insult(text) {
            TargetKind::Person
        } else {
            TargetKind::Content
        }
    }
}

fn alternation(words: &[String]) -> String {
    let mut words: Vec<&String> = words.iter().filter(|w| !w.trim().is_empty()).collect();
    // Longest first so "you're" wins over "you"
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    words
        .iter()
        .map(|w| regex::escape(w.trim()))
        .collect::<Vec<_>>()
        .join("|")
}

fn has_words(words: &[String]) -> bool {
    words.iter().any(|w| !w.trim().is_empty())
}

fn word_regex(words: &[String]) -> Result<Regex> {
    if !has_words(words) {
        return never_match();
    }
    build(&format!(r"\b(?:{})\b", alternation(words)), true)
}

fn never_match() -> Result<Regex> {
    build(r"[^\s\S]", false)
}

fn build(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::config(format!("Failed to compile lexicon pattern: {}", e)))
}
