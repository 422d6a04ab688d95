//! Episode Controller
//!
//! [`RoomEnv`] owns the configuration, the random stream and the world of
//! the current episode. `reset` starts an episode; `step` grades the
//! pending answers, advances the world and returns the next observation.

use serde::{Deserialize, Serialize};

use room_events::{Action, AnswerSet, Observation, RoomContents, StepInfo};

use crate::config::EnvConfig;
use crate::error::RoomEnvError;
use crate::hidden_state::HiddenState;
use crate::questions::{self, ObserveOptions};
use crate::rng::SimRng;
use crate::rooms::RoomGraph;
use crate::world::World;

/// Lifecycle of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeState {
    /// No episode has been started
    Uninitialized,
    /// Reset, no step taken yet
    Ready,
    Running,
    /// The terminal step has been taken
    Terminated,
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: Observation,
    /// Sum of the rewards of every graded answer
    pub reward: f64,
    pub done: bool,
    /// Always false, no time limit is modeled
    pub truncated: bool,
    pub info: StepInfo,
}

/// The room simulation environment.
#[derive(Debug, Clone)]
pub struct RoomEnv {
    config: EnvConfig,
    rooms: RoomGraph,
    rng: SimRng,
    world: Option<World>,
    state: EpisodeState,
    time: u64,
    /// Answer sets of the questions in the latest observation
    pending: Vec<AnswerSet>,
    hidden_states: Vec<HiddenState>,
    observations: Vec<Observation>,
    answers: Vec<Vec<AnswerSet>>,
    infos: Vec<StepInfo>,
}

impl RoomEnv {
    /// Validate `config` and prepare an environment. Call [`reset`](Self::reset)
    /// before stepping.
    pub fn new(config: EnvConfig) -> Result<Self, RoomEnvError> {
        config.validate()?;
        let rooms = config.world.room_graph()?;

        tracing::info!(
            "Room environment created: {} rooms, {} entities, terminates at {}",
            rooms.len(),
            config.world.entities.len(),
            config.terminates_at
        );

        Ok(Self {
            rng: SimRng::seed_from_u64(config.seed),
            config,
            rooms,
            world: None,
            state: EpisodeState::Uninitialized,
            time: 0,
            pending: Vec::new(),
            hidden_states: Vec::new(),
            observations: Vec::new(),
            answers: Vec::new(),
            infos: Vec::new(),
        })
    }

    /// Start a new episode.
    ///
    /// `Some(seed)` reseeds the random stream; `None` continues it, which for
    /// the first episode means starting from the configured seed.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, StepInfo), RoomEnvError> {
        if let Some(seed) = seed {
            self.rng = SimRng::seed_from_u64(seed);
        }

        let world = World::build(
            self.rooms.clone(),
            &self.config.world,
            self.config.deterministic_init,
            &mut self.rng,
        )?;
        self.world = Some(world);
        self.time = 0;
        self.hidden_states.clear();
        self.observations.clear();
        self.answers.clear();
        self.infos.clear();

        let observation = self.advance_observation()?;
        self.state = EpisodeState::Ready;

        tracing::info!("Episode reset (seed: {:?})", seed);

        let info = StepInfo::default();
        self.infos.push(info.clone());

        Ok((observation, info))
    }

    /// Grade `answers` against the pending questions, advance the world and
    /// move the agent.
    ///
    /// Exactly one answer per question of the latest observation is expected.
    pub fn step<S: AsRef<str>>(
        &mut self,
        answers: &[S],
        action: Action,
    ) -> Result<StepOutcome, RoomEnvError> {
        match self.state {
            EpisodeState::Uninitialized => return Err(RoomEnvError::NotReset),
            EpisodeState::Terminated => return Err(RoomEnvError::EpisodeTerminated),
            EpisodeState::Ready | EpisodeState::Running => {}
        }
        if answers.len() != self.pending.len() {
            return Err(RoomEnvError::InvalidAnswer {
                expected: self.pending.len(),
                got: answers.len(),
            });
        }

        let rewards = self.config.rewards;
        let reward: f64 = self
            .pending
            .iter()
            .zip(answers)
            .map(|(set, answer)| rewards.for_grade(set.grade(answer.as_ref())))
            .sum();

        let world = self.world.as_mut().ok_or(RoomEnvError::NotReset)?;
        if !self.config.make_everything_static {
            world.move_independents(&mut self.rng);
            world.attach_dependents(&mut self.rng);
        }
        world.move_agent(action);

        let done = self.time == self.config.terminates_at;
        let info = StepInfo::new(std::mem::take(&mut self.pending), self.time);
        self.infos.push(info.clone());

        self.time += 1;
        let observation = self.advance_observation()?;
        self.state = if done {
            EpisodeState::Terminated
        } else {
            EpisodeState::Running
        };

        tracing::debug!(
            "Step {}: action={}, reward={}, done={}, questions={}",
            info.timestamp,
            action,
            reward,
            done,
            observation.questions.len()
        );

        Ok(StepOutcome {
            observation,
            reward,
            done,
            truncated: false,
            info,
        })
    }

    /// Like [`step`](Self::step), with the action given as a token such as
    /// `"north"` or `"stay"`.
    pub fn step_str<S: AsRef<str>>(
        &mut self,
        answers: &[S],
        action: &str,
    ) -> Result<StepOutcome, RoomEnvError> {
        let action: Action = action.parse()?;
        self.step(answers, action)
    }

    /// Record history, snapshot the hidden state and pose the next questions.
    fn advance_observation(&mut self) -> Result<Observation, RoomEnvError> {
        let world = self.world.as_mut().ok_or(RoomEnvError::NotReset)?;
        world.record_history();

        let hidden = HiddenState::assemble(world, self.time);
        let options = ObserveOptions {
            num_questions: self
                .config
                .questions
                .questions_at(self.time, self.config.terminates_at),
            question_prob: self.config.question_prob,
            randomize: self.config.randomize_observations,
        };
        let posed = questions::observe(world, &hidden, options, &mut self.rng);

        self.hidden_states.push(hidden);
        self.observations.push(posed.observation.clone());
        self.answers.push(posed.answers.clone());
        self.pending = posed.answers;

        Ok(posed.observation)
    }

    /// Room adjacency as `[room, direction, neighbor]` triples.
    pub fn room_layout(&self, exclude_walls: bool) -> Vec<[String; 3]> {
        self.rooms.layout(!exclude_walls)
    }

    /// Entities currently in `room`, grouped by kind.
    pub fn entities_in_room(&self, room: &str) -> Result<RoomContents, RoomEnvError> {
        let world = self.world.as_ref().ok_or(RoomEnvError::NotReset)?;
        world
            .entities_in_room(room)
            .ok_or_else(|| RoomEnvError::UnknownRoom(room.to_string()))
    }

    /// Number of scored steps in an episode.
    pub fn total_episode_rewards(&self) -> u64 {
        self.config.terminates_at + 1
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn rooms(&self) -> &RoomGraph {
        &self.rooms
    }

    /// The world of the current episode, if one has been started.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn current_time(&self) -> u64 {
        self.time
    }

    /// Answer sets the next `step` will grade against.
    pub fn pending_answers(&self) -> &[AnswerSet] {
        &self.pending
    }

    /// Latest hidden state snapshot.
    pub fn hidden_state(&self) -> Option<&HiddenState> {
        self.hidden_states.last()
    }

    pub fn hidden_states(&self) -> &[HiddenState] {
        &self.hidden_states
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Answer sets of every observation, in order.
    pub fn answers(&self) -> &[Vec<AnswerSet>] {
        &self.answers
    }

    /// Info records of the episode: the empty reset record, then one per step.
    pub fn infos(&self) -> &[StepInfo] {
        &self.infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, RoomLayout, WorldConfig};
    use room_events::{Direction, Quadruple};
    use std::collections::BTreeMap;

    fn at(room: &str) -> BTreeMap<String, f64> {
        [(room.to_string(), 1.0)].into_iter().collect()
    }

    fn two_room_config() -> EnvConfig {
        EnvConfig::new(WorldConfig::new(
            vec![
                RoomLayout::new("a").with_neighbor(Direction::North, "b"),
                RoomLayout::new("b").with_neighbor(Direction::South, "a"),
            ],
            vec![
                EntityConfig::static_object("desk", at("a")),
                EntityConfig::agent("agent", at("a")),
            ],
        ))
    }

    #[test]
    fn test_step_before_reset() {
        let mut env = RoomEnv::new(two_room_config()).unwrap();
        let err = env.step::<&str>(&[], Action::Stay).unwrap_err();
        assert!(matches!(err, RoomEnvError::NotReset));
        assert!(matches!(
            env.entities_in_room("a"),
            Err(RoomEnvError::NotReset)
        ));
    }

    #[test]
    fn test_reset_returns_first_observation() {
        let mut env = RoomEnv::new(two_room_config()).unwrap();
        let (observation, info) = env.reset(None).unwrap();

        assert!(observation
            .room
            .contains(&Quadruple::at_location("agent", "a", 0)));
        assert_eq!(observation.questions.len(), 1);
        assert_eq!(observation.questions[0].subject, "desk");
        assert!(info.is_empty());
        assert_eq!(env.state(), EpisodeState::Ready);
        assert_eq!(env.current_time(), 0);
        assert_eq!(env.hidden_states().len(), 1);
    }

    #[test]
    fn test_step_moves_agent_and_grades() {
        let mut env = RoomEnv::new(two_room_config()).unwrap();
        env.reset(None).unwrap();

        let outcome = env.step(&["a"], Action::North).unwrap();
        assert_eq!(outcome.reward, 1.0);
        assert!(!outcome.done);
        assert!(!outcome.truncated);
        assert_eq!(outcome.info.timestamp, 0);
        assert_eq!(outcome.info.answers, vec![AnswerSet::new("a", None)]);
        assert!(outcome
            .observation
            .room
            .contains(&Quadruple::at_location("agent", "b", 1)));
        assert_eq!(env.state(), EpisodeState::Running);

        let outcome = env.step(&["b"], Action::West).unwrap();
        assert_eq!(outcome.reward, -1.0);
        assert_eq!(env.world().unwrap().location_of("agent"), Some("b"));
    }

    #[test]
    fn test_wrong_answer_count() {
        let mut env = RoomEnv::new(two_room_config()).unwrap();
        env.reset(None).unwrap();

        let err = env.step::<&str>(&[], Action::Stay).unwrap_err();
        assert!(matches!(
            err,
            RoomEnvError::InvalidAnswer {
                expected: 1,
                got: 0
            }
        ));
    }

    #[test]
    fn test_invalid_action_token() {
        let mut env = RoomEnv::new(two_room_config()).unwrap();
        env.reset(None).unwrap();

        let err = env.step_str(&["a"], "jump").unwrap_err();
        assert!(matches!(err, RoomEnvError::InvalidAction(_)));

        // The failed call did not consume the pending question
        assert!(env.step_str(&["a"], "stay").is_ok());
    }

    #[test]
    fn test_terminates_and_refuses_more_steps() {
        let config = two_room_config().with_terminates_at(2);
        let mut env = RoomEnv::new(config).unwrap();
        env.reset(None).unwrap();

        assert!(!env.step(&["a"], Action::Stay).unwrap().done);
        assert!(!env.step(&["a"], Action::Stay).unwrap().done);
        assert!(env.step(&["a"], Action::Stay).unwrap().done);
        assert_eq!(env.state(), EpisodeState::Terminated);
        assert_eq!(env.total_episode_rewards(), 3);

        let err = env.step(&["a"], Action::Stay).unwrap_err();
        assert!(matches!(err, RoomEnvError::EpisodeTerminated));

        // A new episode can be started
        env.reset(None).unwrap();
        assert_eq!(env.state(), EpisodeState::Ready);
        assert_eq!(env.infos(), &[StepInfo::default()]);
    }

    #[test]
    fn test_room_layout_and_contents() {
        let mut env = RoomEnv::new(two_room_config()).unwrap();
        assert_eq!(env.room_layout(false).len(), 8);
        assert_eq!(env.room_layout(true).len(), 2);

        env.reset(None).unwrap();
        let contents = env.entities_in_room("a").unwrap();
        assert!(contents.contains("agent"));
        assert!(contents.contains("desk"));
        assert!(matches!(
            env.entities_in_room("attic"),
            Err(RoomEnvError::UnknownRoom(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = two_room_config();
        config.world.entities.pop();
        assert!(matches!(
            RoomEnv::new(config),
            Err(RoomEnvError::Config(_))
        ));
    }
}
