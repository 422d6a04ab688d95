//! Observation Types
//!
//! What the agent sees each step, the answers it is graded against, and the
//! per-step info record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Quadruple, Question};

/// Behavioral kind of an entity.
///
/// Variant order is the priority order used when listing entities in the
/// hidden state: agent first, then static, independent, dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Driven only by the external action
    Agent,
    /// Never moves after placement
    Static,
    /// Moves on its own according to a transition table
    Independent,
    /// Rides along with a co-located independent entity
    Dependent,
}

impl EntityKind {
    /// All kinds in hidden-state priority order.
    pub const PRIORITY: [EntityKind; 4] = [
        EntityKind::Agent,
        EntityKind::Static,
        EntityKind::Independent,
        EntityKind::Dependent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Agent => "agent",
            EntityKind::Static => "static",
            EntityKind::Independent => "independent",
            EntityKind::Dependent => "dependent",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The agent's partial view of the world plus the questions posed this step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Facts visible from the agent's room
    pub room: Vec<Quadruple>,
    /// Questions to answer on the next step, possibly none
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Observation {
    /// The first posed question, if any.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// The room the agent is in, read from its own location fact.
    pub fn agent_room(&self, agent: &str) -> Option<&str> {
        self.room
            .iter()
            .find(|q| q.head == agent && !q.relation.is_adjacency())
            .map(|q| q.tail.as_str())
    }
}

/// How an answer compares with the answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerGrade {
    /// Matches the current location
    Correct,
    /// Matches the most recent different location
    Partial,
    Wrong,
}

/// Correct answers for a location question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    /// Where the subject is now
    pub current: String,
    /// Where the subject was before it last changed rooms
    pub previous: Option<String>,
}

impl AnswerSet {
    pub fn new(current: impl Into<String>, previous: Option<String>) -> Self {
        Self {
            current: current.into(),
            previous,
        }
    }

    pub fn grade(&self, answer: &str) -> AnswerGrade {
        if answer == self.current {
            AnswerGrade::Correct
        } else if self.previous.as_deref() == Some(answer) {
            AnswerGrade::Partial
        } else {
            AnswerGrade::Wrong
        }
    }
}

/// Per-step info: the answer sets that were just graded and the step's time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub answers: Vec<AnswerSet>,
    pub timestamp: u64,
}

impl StepInfo {
    pub fn new(answers: Vec<AnswerSet>, timestamp: u64) -> Self {
        Self { answers, timestamp }
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Names of the entities in one room, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomContents {
    pub room: String,
    pub entities: BTreeMap<EntityKind, Vec<String>>,
}

impl RoomContents {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            entities: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, kind: EntityKind, name: impl Into<String>) {
        self.entities.entry(kind).or_default().push(name.into());
    }

    /// Entities of one kind in this room.
    pub fn of_kind(&self, kind: EntityKind) -> &[String] {
        self.entities
            .get(&kind)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.values().flatten().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.values().all(|v| v.is_empty())
    }
}
