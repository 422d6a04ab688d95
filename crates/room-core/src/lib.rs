//! Room Environment Simulation Engine
//!
//! A seeded, partially observable world of rooms and typed entities. The
//! agent sees only its own room, is asked where things are, and is graded
//! on its answers.

pub mod attachment;
pub mod config;
pub mod entity;
pub mod env;
pub mod error;
pub mod hidden_state;
pub mod presets;
pub mod questions;
pub mod rng;
pub mod rooms;
pub mod world;

pub use config::{
    EntityConfig, EnvConfig, QuestionSchedule, Rewards, RoomLayout, TransitionProbs, WorldConfig,
    EPSILON,
};
pub use entity::{Behavior, Entity, EntityId};
pub use env::{EpisodeState, RoomEnv, StepOutcome};
pub use error::{ConfigError, RoomEnvError};
pub use hidden_state::HiddenState;
pub use rng::SimRng;
pub use rooms::{Room, RoomGraph, RoomId};
pub use world::World;

pub use room_events::{
    Action, AnswerGrade, AnswerSet, Direction, EntityKind, Observation, Quadruple, Question,
    Relation, RoomContents, StepInfo, WALL, WILDCARD,
};
