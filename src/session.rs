//! In-memory conversation state.
//!
//! One conversation per console run: an ordered, append-only list of
//! role-tagged turns, cleared on explicit user action, never persisted.
//! Turn order always equals arrival order. An optional FIFO cap bounds the
//! retained history (oldest turns dropped first).

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One request or response in the conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// An append-only conversation transcript.
#[derive(Debug)]
pub struct Conversation {
    id: Uuid,
    turns: Vec<Turn>,
    cap: Option<usize>,
}

impl Conversation {
    /// Start a fresh conversation. `cap = None` keeps every turn.
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
            cap,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append a turn, dropping the oldest turns when over the cap.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        if let Some(cap) = self.cap {
            while self.turns.len() > cap {
                self.turns.remove(0);
            }
        }
    }

    /// Drop all turns and start over under a new conversation id.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.id = Uuid::new_v4();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `n` turns, in arrival order.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}
