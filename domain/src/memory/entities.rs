//! Conversation memory entities

use crate::session::entities::Message;
use serde::{Deserialize, Serialize};

/// Identifier of a conversation session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Session used when the caller does not name one
    pub const DEFAULT: &'static str = "default";

    /// Create a session id; blank input maps to the default session
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::default()
        } else {
            Self(id.trim().to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One completed exchange (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_input: String,
    pub final_output: String,
}

impl ConversationTurn {
    pub fn new(user_input: impl Into<String>, final_output: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            final_output: final_output.into(),
        }
    }
}

/// Ordered log of the turns of one session (Entity)
///
/// Turns are only appended, never edited. With a window of `K` turns the
/// oldest turns are dropped first, so chronological order always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
    max_turns: Option<usize>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the last `max_turns` turns (`0` keeps nothing)
    pub fn with_window(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns: Some(max_turns),
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if let Some(max) = self.max_turns {
            let excess = self.turns.len().saturating_sub(max);
            if excess > 0 {
                self.turns.drain(..excess);
            }
        }
    }

    /// Rebuild the chat history: a user message then an assistant message per turn.
    pub fn to_messages(&self) -> Vec<Message> {
        turns_to_messages(&self.turns)
    }
}

/// Convert turns into alternating user / assistant messages.
pub fn turns_to_messages(turns: &[ConversationTurn]) -> Vec<Message> {
    turns
        .iter()
        .flat_map(|turn| {
            [
                Message::user(turn.user_input.clone()),
                Message::assistant(turn.final_output.clone()),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::entities::Role;

    #[test]
    fn test_session_id_default() {
        assert_eq!(SessionId::default().as_str(), "default");
        assert_eq!(SessionId::new("  ").as_str(), "default");
        assert_eq!(SessionId::new(" abc ").as_str(), "abc");
    }

    #[test]
    fn test_append_keeps_order() {
        let mut memory = ConversationMemory::new();
        memory.append(ConversationTurn::new("q1", "a1"));
        memory.append(ConversationTurn::new("q2", "a2"));
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.turns()[0].user_input, "q1");
        assert_eq!(memory.turns()[1].final_output, "a2");
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut memory = ConversationMemory::with_window(2);
        for i in 0..5 {
            memory.append(ConversationTurn::new(format!("q{}", i), format!("a{}", i)));
        }
        let inputs: Vec<_> = memory.turns().iter().map(|t| t.user_input.as_str()).collect();
        assert_eq!(inputs, vec!["q3", "q4"]);
    }

    #[test]
    fn test_zero_window_keeps_nothing() {
        let mut memory = ConversationMemory::with_window(0);
        memory.append(ConversationTurn::new("q", "a"));
        assert!(memory.is_empty());
    }

    #[test]
    fn test_to_messages_alternates_roles() {
        let mut memory = ConversationMemory::new();
        memory.append(ConversationTurn::new("hi", "hello"));
        memory.append(ConversationTurn::new("and?", "more"));
        let messages = memory.to_messages();
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(messages[3].content, "more");
    }
}
