//! Environment Configuration
//!
//! Room layout, entity population, and episode knobs. Configurations are
//! built in code or parsed from a TOML string; every probability invariant
//! is checked by [`EnvConfig::validate`] before an environment is created.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use room_events::{Action, AnswerGrade, Direction, EntityKind, WALL};

use crate::error::ConfigError;
use crate::presets;
use crate::rooms::RoomGraph;

/// Tolerance used when checking that probabilities sum to one.
pub const EPSILON: f64 = 1e-3;

fn sums_to_one(sum: f64) -> bool {
    (sum - 1.0).abs() < EPSILON
}

fn wall() -> String {
    WALL.to_string()
}

/// One room and what lies beyond each of its sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomLayout {
    pub name: String,
    #[serde(default = "wall")]
    pub north: String,
    #[serde(default = "wall")]
    pub east: String,
    #[serde(default = "wall")]
    pub south: String,
    #[serde(default = "wall")]
    pub west: String,
}

impl RoomLayout {
    /// A room walled in on all four sides.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            north: wall(),
            east: wall(),
            south: wall(),
            west: wall(),
        }
    }

    pub fn with_neighbor(mut self, direction: Direction, room: impl Into<String>) -> Self {
        let room = room.into();
        match direction {
            Direction::North => self.north = room,
            Direction::East => self.east = room,
            Direction::South => self.south = room,
            Direction::West => self.west = room,
        }
        self
    }

    pub fn neighbor(&self, direction: Direction) -> &str {
        match direction {
            Direction::North => &self.north,
            Direction::East => &self.east,
            Direction::South => &self.south,
            Direction::West => &self.west,
        }
    }
}

/// Kind-dependent transition table.
///
/// Independent entities use `Moves` (room -> action -> probability);
/// dependent entities use `Attachment` (independent name -> probability).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionProbs {
    Moves(BTreeMap<String, BTreeMap<Action, f64>>),
    Attachment(BTreeMap<String, f64>),
}

/// One entity of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub kind: EntityKind,
    /// Room -> probability of starting there
    pub init_probs: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_probs: Option<TransitionProbs>,
    /// Weight of this entity when sampling a question subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_prob: Option<f64>,
}

impl EntityConfig {
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        init_probs: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            init_probs,
            transition_probs: None,
            question_prob: None,
        }
    }

    pub fn agent(name: impl Into<String>, init_probs: BTreeMap<String, f64>) -> Self {
        Self::new(name, EntityKind::Agent, init_probs)
    }

    pub fn static_object(name: impl Into<String>, init_probs: BTreeMap<String, f64>) -> Self {
        Self::new(name, EntityKind::Static, init_probs)
    }

    pub fn independent(
        name: impl Into<String>,
        init_probs: BTreeMap<String, f64>,
        moves: BTreeMap<String, BTreeMap<Action, f64>>,
    ) -> Self {
        Self::new(name, EntityKind::Independent, init_probs)
            .with_transitions(TransitionProbs::Moves(moves))
    }

    pub fn dependent(
        name: impl Into<String>,
        init_probs: BTreeMap<String, f64>,
        attachment: BTreeMap<String, f64>,
    ) -> Self {
        Self::new(name, EntityKind::Dependent, init_probs)
            .with_transitions(TransitionProbs::Attachment(attachment))
    }

    pub fn with_transitions(mut self, transitions: TransitionProbs) -> Self {
        self.transition_probs = Some(transitions);
        self
    }

    pub fn with_question_prob(mut self, weight: f64) -> Self {
        self.question_prob = Some(weight);
        self
    }

    /// The movement table of an independent entity.
    pub fn moves(&self) -> Option<&BTreeMap<String, BTreeMap<Action, f64>>> {
        match &self.transition_probs {
            Some(TransitionProbs::Moves(moves)) => Some(moves),
            _ => None,
        }
    }

    /// The attachment table of a dependent entity as `(independent, prob)`.
    ///
    /// A missing or empty table means the entity never attaches.
    pub fn attachment(&self) -> Option<Vec<(&str, f64)>> {
        match &self.transition_probs {
            None => Some(Vec::new()),
            Some(TransitionProbs::Attachment(table)) => {
                Some(table.iter().map(|(k, v)| (k.as_str(), *v)).collect())
            }
            // An empty table deserializes as the first untagged variant
            Some(TransitionProbs::Moves(moves)) if moves.is_empty() => Some(Vec::new()),
            Some(TransitionProbs::Moves(_)) => None,
        }
    }

    fn validate_init_probs(&self, rooms: &RoomGraph) -> Result<(), ConfigError> {
        for (room, &prob) in &self.init_probs {
            if rooms.id(room).is_none() {
                return Err(ConfigError::UnknownRoom {
                    entity: self.name.clone(),
                    room: room.clone(),
                });
            }
            if prob < 0.0 {
                return Err(ConfigError::NegativeProbability {
                    entity: self.name.clone(),
                    value: prob,
                });
            }
        }

        let sum: f64 = self.init_probs.values().sum();
        if !sums_to_one(sum) {
            return Err(ConfigError::InitProbsSum {
                entity: self.name.clone(),
                sum,
            });
        }
        Ok(())
    }

    fn validate_moves(&self, rooms: &RoomGraph) -> Result<(), ConfigError> {
        let moves = self.moves().ok_or_else(|| ConfigError::TransitionShape {
            entity: self.name.clone(),
            kind: self.kind,
        })?;

        for (room, row) in moves {
            if rooms.id(room).is_none() {
                return Err(ConfigError::UnknownRoom {
                    entity: self.name.clone(),
                    room: room.clone(),
                });
            }
            if let Some(&value) = row.values().find(|p| **p < 0.0) {
                return Err(ConfigError::NegativeProbability {
                    entity: self.name.clone(),
                    value,
                });
            }
            let sum: f64 = row.values().sum();
            if !sums_to_one(sum) {
                return Err(ConfigError::TransitionProbsSum {
                    entity: self.name.clone(),
                    room: room.clone(),
                    sum,
                });
            }
        }

        // Every room the entity can wander into needs a row
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<_> = self
            .init_probs
            .iter()
            .filter(|(_, p)| **p > 0.0)
            .filter_map(|(room, _)| rooms.id(room))
            .collect();
        while let Some(room) = queue.pop_front() {
            if !visited.insert(room) {
                continue;
            }
            let row = moves
                .get(rooms.name(room))
                .ok_or_else(|| ConfigError::MissingTransitions {
                    entity: self.name.clone(),
                    room: rooms.name(room).to_string(),
                })?;
            for (&action, &prob) in row {
                if prob > 0.0 {
                    queue.push_back(rooms.resolve(room, action));
                }
            }
        }
        Ok(())
    }

    fn validate_attachment(&self, independents: &HashSet<&str>) -> Result<(), ConfigError> {
        let table = self.attachment().ok_or_else(|| ConfigError::TransitionShape {
            entity: self.name.clone(),
            kind: self.kind,
        })?;

        for (independent, prob) in table {
            if !independents.contains(independent) {
                return Err(ConfigError::UnknownIndependent {
                    entity: self.name.clone(),
                    independent: independent.to_string(),
                });
            }
            if prob < 0.0 {
                return Err(ConfigError::NegativeProbability {
                    entity: self.name.clone(),
                    value: prob,
                });
            }
            if prob >= 1.0 + EPSILON {
                return Err(ConfigError::AttachProbTooHigh {
                    entity: self.name.clone(),
                    independent: independent.to_string(),
                    prob,
                });
            }
        }
        Ok(())
    }
}

/// Rooms and entities of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub rooms: Vec<RoomLayout>,
    pub entities: Vec<EntityConfig>,
}

impl WorldConfig {
    pub fn new(rooms: Vec<RoomLayout>, entities: Vec<EntityConfig>) -> Self {
        Self { rooms, entities }
    }

    /// Build the room graph described by this world.
    pub fn room_graph(&self) -> Result<RoomGraph, ConfigError> {
        RoomGraph::from_layouts(&self.rooms)
    }

    /// True when any entity carries an explicit question weight.
    pub fn has_question_weights(&self) -> bool {
        self.entities.iter().any(|e| e.question_prob.is_some())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rooms = self.room_graph()?;

        let mut names = HashSet::new();
        for entity in &self.entities {
            if !names.insert(entity.name.as_str()) {
                return Err(ConfigError::DuplicateEntity(entity.name.clone()));
            }
        }

        let agents = self
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Agent)
            .count();
        if agents != 1 {
            return Err(ConfigError::AgentCount(agents));
        }

        let independents: HashSet<&str> = self
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Independent)
            .map(|e| e.name.as_str())
            .collect();

        for entity in &self.entities {
            entity.validate_init_probs(&rooms)?;

            match entity.kind {
                EntityKind::Static | EntityKind::Agent => {
                    if entity.transition_probs.is_some() {
                        return Err(ConfigError::UnexpectedTransitions {
                            entity: entity.name.clone(),
                            kind: entity.kind,
                        });
                    }
                }
                EntityKind::Independent => entity.validate_moves(&rooms)?,
                EntityKind::Dependent => entity.validate_attachment(&independents)?,
            }

            if let Some(weight) = entity.question_prob {
                if weight < 0.0 {
                    return Err(ConfigError::NegativeProbability {
                        entity: entity.name.clone(),
                        value: weight,
                    });
                }
                if entity.kind == EntityKind::Agent && weight != 0.0 {
                    return Err(ConfigError::AgentQuestionProb {
                        entity: entity.name.clone(),
                        weight,
                    });
                }
            }
        }

        if self.has_question_weights() {
            let sum: f64 = self.entities.iter().filter_map(|e| e.question_prob).sum();
            if !sums_to_one(sum) {
                return Err(ConfigError::QuestionProbsSum(sum));
            }
        }

        Ok(())
    }
}

/// Reward for each answer grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    pub correct: f64,
    pub wrong: f64,
    pub partial: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            correct: 1.0,
            wrong: -1.0,
            partial: 0.0,
        }
    }
}

impl Rewards {
    pub fn for_grade(&self, grade: AnswerGrade) -> f64 {
        match grade {
            AnswerGrade::Correct => self.correct,
            AnswerGrade::Partial => self.partial,
            AnswerGrade::Wrong => self.wrong,
        }
    }
}

/// When questions are posed and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QuestionSchedule {
    /// One candidate question with every observation
    #[default]
    EveryStep,
    /// `num_total_questions` spread evenly over every
    /// `question_interval`-th observation of the episode
    Batched {
        num_total_questions: u64,
        question_interval: u64,
    },
}

impl QuestionSchedule {
    fn validate(&self, terminates_at: u64) -> Result<(), ConfigError> {
        if let QuestionSchedule::Batched {
            num_total_questions,
            question_interval,
        } = *self
        {
            let steps = terminates_at + 1;
            if question_interval == 0 || steps % question_interval != 0 {
                return Err(ConfigError::QuestionInterval {
                    interval: question_interval,
                    steps,
                });
            }
            let question_steps = steps / question_interval;
            if num_total_questions % question_steps != 0 {
                return Err(ConfigError::QuestionTotal {
                    total: num_total_questions,
                    question_steps,
                });
            }
        }
        Ok(())
    }

    /// Number of questions posed with the observation at `time`.
    pub fn questions_at(&self, time: u64, terminates_at: u64) -> usize {
        match *self {
            QuestionSchedule::EveryStep => 1,
            QuestionSchedule::Batched {
                num_total_questions,
                question_interval,
            } => {
                if question_interval == 0
                    || time > terminates_at
                    || (time + 1) % question_interval != 0
                {
                    return 0;
                }
                let question_steps = (terminates_at + 1) / question_interval;
                (num_total_questions / question_steps) as usize
            }
        }
    }
}

/// Complete environment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Seed for the first episode
    pub seed: u64,
    /// Probability that a question is posed at a question step
    pub question_prob: f64,
    /// The episode ends on the step taken at this time
    pub terminates_at: u64,
    /// Shuffle the facts of each observation
    pub randomize_observations: bool,
    /// Skip independent movement and dependent attachment
    pub make_everything_static: bool,
    /// Place entities in their most likely room instead of sampling
    pub deterministic_init: bool,
    pub rewards: Rewards,
    pub questions: QuestionSchedule,
    pub world: WorldConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            question_prob: 1.0,
            terminates_at: 99,
            randomize_observations: false,
            make_everything_static: false,
            deterministic_init: false,
            rewards: Rewards::default(),
            questions: QuestionSchedule::default(),
            world: presets::dev_world(),
        }
    }
}

impl EnvConfig {
    pub fn new(world: WorldConfig) -> Self {
        Self {
            world,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_terminates_at(mut self, terminates_at: u64) -> Self {
        self.terminates_at = terminates_at;
        self
    }

    pub fn with_question_prob(mut self, question_prob: f64) -> Self {
        self.question_prob = question_prob;
        self
    }

    pub fn with_questions(mut self, questions: QuestionSchedule) -> Self {
        self.questions = questions;
        self
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.question_prob) {
            return Err(ConfigError::QuestionProbRange(self.question_prob));
        }
        self.world.validate()?;
        self.questions.validate(self.terminates_at)?;

        let has_subject = if self.world.has_question_weights() {
            self.world
                .entities
                .iter()
                .any(|e| e.question_prob.unwrap_or(0.0) > 0.0)
        } else {
            self.world
                .entities
                .iter()
                .any(|e| e.kind != EntityKind::Agent)
        };
        if self.question_prob > 0.0 && !has_subject {
            return Err(ConfigError::NoQuestionSubjects);
        }
        Ok(())
    }
}
