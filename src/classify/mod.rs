//! Maps one decoded stream record to a [`ContentAction`].
//!
//! The service sends results as untyped JSON whose shape varies by agent and
//! tool. Classification walks [`RULES`] in order and applies the first rule
//! whose predicate matches, so every shape maps to exactly one action; shapes
//! nothing else recognizes are dumped as a fenced JSON block.

mod render;
mod rules;

use agent_api::StreamRecord;
use log::debug;
use serde_json::Value;

use crate::attachment::ContentAction;

pub use rules::{Rule, RULES};

const RESEARCH_PERSONA_MARKER: &str = "research";

/// Per-turn inputs that influence classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyContext<'a> {
    /// Agent persona the request was sent to.
    pub persona: &'a str,
}

impl<'a> ClassifyContext<'a> {
    pub fn new(persona: &'a str) -> Self {
        Self { persona }
    }

    /// Substring match on the persona name; research agents receive
    /// long-form bodies as documents.
    pub fn is_research_persona(&self) -> bool {
        self.persona
            .to_ascii_lowercase()
            .contains(RESEARCH_PERSONA_MARKER)
    }
}

/// Classify one record. Only `result` records with data produce content.
pub fn classify(record: &StreamRecord, context: &ClassifyContext<'_>) -> ContentAction {
    if !record.is_result() {
        debug!("ignoring stream record of type {:?}", record.kind);
        return ContentAction::Ignore;
    }
    match record.data.as_ref() {
        Some(data) if !data.is_null() => classify_data(data, context),
        _ => ContentAction::Ignore,
    }
}

/// Classify a record's `data` value.
pub fn classify_data(data: &Value, context: &ClassifyContext<'_>) -> ContentAction {
    let Some(rule) = matching_rule(data) else {
        return ContentAction::Ignore;
    };
    debug!("classifier rule `{}` applied", rule.name);
    rule.apply(data, context)
}

/// First rule whose predicate accepts `data`.
pub fn matching_rule(data: &Value) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(data))
}
