//! Shared data types for the room environment.
//!
//! This crate contains pure data structures with no simulation logic:
//! relational facts, questions, movement actions, and the observation/info
//! records handed to a training loop.

pub mod action;
pub mod observation;
pub mod quadruple;

pub use action::{Action, Direction, ParseActionError};
pub use observation::{AnswerGrade, AnswerSet, EntityKind, Observation, RoomContents, StepInfo};
pub use quadruple::{Quadruple, Question, Relation, WALL, WILDCARD};
