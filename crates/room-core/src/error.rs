//! Error Types
//!
//! Configuration problems are reported at construction; contract
//! violations by the caller are reported when `reset`/`step` is called.

use room_events::{Direction, EntityKind, ParseActionError};
use thiserror::Error;

/// A world or environment configuration that violates an invariant.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("room layout is empty")]
    EmptyLayout,

    #[error("room '{0}' is declared more than once")]
    DuplicateRoom(String),

    #[error("room '{room}' has unknown {direction} neighbor '{neighbor}'")]
    UnknownNeighbor {
        room: String,
        direction: Direction,
        neighbor: String,
    },

    #[error("room layout wrong: '{room}' lists neighbor '{neighbor}' on more than one side")]
    RepeatedNeighbor { room: String, neighbor: String },

    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("exactly one agent is required, found {0}")]
    AgentCount(usize),

    #[error("initial probabilities of '{entity}' must sum to 1, but sum to {sum}")]
    InitProbsSum { entity: String, sum: f64 },

    #[error("entity '{entity}' refers to unknown room '{room}'")]
    UnknownRoom { entity: String, room: String },

    #[error("entity '{entity}' has negative probability {value}")]
    NegativeProbability { entity: String, value: f64 },

    #[error("{kind} entity '{entity}' must not have transition probabilities")]
    UnexpectedTransitions { entity: String, kind: EntityKind },

    #[error("{kind} entity '{entity}' has transition probabilities of the wrong shape")]
    TransitionShape { entity: String, kind: EntityKind },

    #[error("transition probabilities of '{entity}' in room '{room}' must sum to 1, but sum to {sum}")]
    TransitionProbsSum {
        entity: String,
        room: String,
        sum: f64,
    },

    #[error("independent entity '{entity}' can reach room '{room}' but has no transitions for it")]
    MissingTransitions { entity: String, room: String },

    #[error("dependent entity '{entity}' attaches to '{independent}' with probability {prob} > 1")]
    AttachProbTooHigh {
        entity: String,
        independent: String,
        prob: f64,
    },

    #[error("dependent entity '{entity}' refers to unknown independent entity '{independent}'")]
    UnknownIndependent { entity: String, independent: String },

    #[error("agent '{entity}' must have question probability 0, got {weight}")]
    AgentQuestionProb { entity: String, weight: f64 },

    #[error("question probabilities must sum to 1, but sum to {0}")]
    QuestionProbsSum(f64),

    #[error("question_prob must be within [0, 1], got {0}")]
    QuestionProbRange(f64),

    #[error("questions are enabled but no entity can be asked about")]
    NoQuestionSubjects,

    #[error("question_interval {interval} must be positive and divide the episode length {steps}")]
    QuestionInterval { interval: u64, steps: u64 },

    #[error("num_total_questions {total} must divide evenly over {question_steps} question steps")]
    QuestionTotal { total: u64, question_steps: u64 },
}

/// Errors returned by the environment at call time.
#[derive(Debug, Error)]
pub enum RoomEnvError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidAction(#[from] ParseActionError),

    #[error("expected {expected} answers, got {got}")]
    InvalidAnswer { expected: usize, got: usize },

    #[error("unknown room '{0}'")]
    UnknownRoom(String),

    #[error("step called before reset")]
    NotReset,

    #[error("episode already terminated, call reset")]
    EpisodeTerminated,
}
