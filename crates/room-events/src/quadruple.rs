//! Quadruple Types
//!
//! Timestamped relational facts `[head, relation, tail, time]` and the
//! one-hop questions built from them.
//!
//! Both serialize as flat JSON arrays so observations read like
//! `["agent", "atlocation", "kitchen", 3]`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Direction;

/// Tail value used when a room side has no neighbor.
pub const WALL: &str = "wall";

/// Placeholder for the slot a question asks about.
pub const WILDCARD: &str = "?";

/// Relation of a quadruple: a room side, or an entity's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    North,
    East,
    South,
    West,
    #[serde(rename = "atlocation")]
    AtLocation,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::North => "north",
            Relation::East => "east",
            Relation::South => "south",
            Relation::West => "west",
            Relation::AtLocation => "atlocation",
        }
    }

    /// True for the four room-adjacency relations.
    pub fn is_adjacency(self) -> bool {
        !matches!(self, Relation::AtLocation)
    }
}

impl From<Direction> for Relation {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::North => Relation::North,
            Direction::East => Relation::East,
            Direction::South => Relation::South,
            Direction::West => Relation::West,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "north" => Ok(Relation::North),
            "east" => Ok(Relation::East),
            "south" => Ok(Relation::South),
            "west" => Ok(Relation::West),
            "atlocation" => Ok(Relation::AtLocation),
            _ => Err(format!("unknown relation: '{}'", s)),
        }
    }
}

/// A single timestamped fact of the hidden world state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quadruple {
    pub head: String,
    pub relation: Relation,
    pub tail: String,
    pub time: u64,
}

impl Quadruple {
    pub fn new(
        head: impl Into<String>,
        relation: Relation,
        tail: impl Into<String>,
        time: u64,
    ) -> Self {
        Self {
            head: head.into(),
            relation,
            tail: tail.into(),
            time,
        }
    }

    /// `[entity, atlocation, room, time]`
    pub fn at_location(entity: impl Into<String>, room: impl Into<String>, time: u64) -> Self {
        Self::new(entity, Relation::AtLocation, room, time)
    }

    /// True when the tail is the wall sentinel.
    pub fn is_wall(&self) -> bool {
        self.tail == WALL
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.head, self.relation, self.tail, self.time
        )
    }
}

impl Serialize for Quadruple {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.head, self.relation, &self.tail, self.time).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Quadruple {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (head, relation, tail, time) =
            <(String, Relation, String, u64)>::deserialize(deserializer)?;
        Ok(Self {
            head,
            relation,
            tail,
            time,
        })
    }
}

/// "Where is `subject` right now?", posed as `[subject, atlocation, ?, time]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub subject: String,
    pub time: u64,
}

impl Question {
    pub fn new(subject: impl Into<String>, time: u64) -> Self {
        Self {
            subject: subject.into(),
            time,
        }
    }

    /// The question as a quadruple with the wildcard in the tail slot.
    pub fn to_quadruple(&self) -> Quadruple {
        Quadruple::at_location(self.subject.clone(), WILDCARD, self.time)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_quadruple(), f)
    }
}

impl Serialize for Question {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_quadruple().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Question {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let quadruple = Quadruple::deserialize(deserializer)?;
        if quadruple.relation != Relation::AtLocation || quadruple.tail != WILDCARD {
            return Err(serde::de::Error::custom(format!(
                "not a location question: {}",
                quadruple
            )));
        }
        Ok(Self {
            subject: quadruple.head,
            time: quadruple.time,
        })
    }
}
