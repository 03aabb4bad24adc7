//! Slot-validated prompt templates
//!
//! A template is parsed once. Placeholders are written `{name}` where `name`
//! is ASCII alphanumeric or `_`; any other brace is literal text. Required
//! slots are checked at construction so rendering never fails.

use crate::core::error::DomainError;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// A parsed prompt template with named slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    slots: BTreeSet<String>,
}

impl PromptTemplate {
    /// Parse `source`, failing if any of `required` is not a slot in it.
    pub fn new(source: &str, required: &[&str]) -> Result<Self, DomainError> {
        let template = Self::parse(source);
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|slot| !template.slots.contains(*slot))
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::InvalidTemplate(format!(
                "missing required slot(s): {}",
                missing
                    .iter()
                    .map(|s| format!("{{{}}}", s))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        Ok(template)
    }

    pub(crate) fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut slots = BTreeSet::new();
        let mut text = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if is_slot_name(&after[..close]) => {
                    text.push_str(&rest[..open]);
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    let name = after[..close].to_string();
                    slots.insert(name.clone());
                    segments.push(Segment::Slot(name));
                    rest = &after[close + 1..];
                }
                _ => {
                    text.push_str(&rest[..=open]);
                    rest = after;
                }
            }
        }
        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self { segments, slots }
    }

    /// Names of all slots in the template
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(String::as_str)
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains(name)
    }

    /// Fill the slots; a slot without a value renders as empty text.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => {
                    if let Some((_, value)) = values.iter().find(|(key, _)| key == name) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

fn is_slot_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
