//! Movement Types
//!
//! Compass directions and the five movement actions an entity can take.
//!
//! # Example
//!
//! ```
//! use room_events::{Action, Direction};
//!
//! let action: Action = "north".parse().unwrap();
//! assert_eq!(action.direction(), Some(Direction::North));
//! assert_eq!(Action::Stay.to_string(), "stay");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the four neighbor slots of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in slot order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Position of this direction in a room's neighbor slots.
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movement choice: step through one of the four sides, or stay put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    North,
    East,
    South,
    West,
    Stay,
}

impl Action {
    /// All actions in canonical order.
    pub const ALL: [Action; 5] = [
        Action::North,
        Action::East,
        Action::South,
        Action::West,
        Action::Stay,
    ];

    /// The side this action walks through, or `None` for [`Action::Stay`].
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::North => Some(Direction::North),
            Action::East => Some(Direction::East),
            Action::South => Some(Direction::South),
            Action::West => Some(Direction::West),
            Action::Stay => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::North => "north",
            Action::East => "east",
            Action::South => "south",
            Action::West => "west",
            Action::Stay => "stay",
        }
    }
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::North => Action::North,
            Direction::East => Action::East,
            Direction::South => Action::South,
            Direction::West => Action::West,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not one of the five movement actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid action: '{0}', expected one of north, east, south, west, stay")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "north" => Ok(Action::North),
            "east" => Ok(Action::East),
            "south" => Ok(Action::South),
            "west" => Ok(Action::West),
            "stay" => Ok(Action::Stay),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Action>()?
            .direction()
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

// Both serialize as their lowercase token so they can key JSON/TOML tables
impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Direction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
