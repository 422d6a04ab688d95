//! Observation & Question Generation
//!
//! Derives what the agent sees from the hidden state and samples the
//! questions it has to answer on its next step.

use room_events::{AnswerSet, Observation, Question};

use crate::entity::EntityId;
use crate::hidden_state::HiddenState;
use crate::rng::SimRng;
use crate::world::World;

/// Knobs consulted while generating an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    /// Number of questions to pose, before suppression
    pub num_questions: usize,
    /// Probability that the questions are posed at all
    pub question_prob: f64,
    pub randomize: bool,
}

/// An observation and the answer set of each question in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Posed {
    pub observation: Observation,
    pub answers: Vec<AnswerSet>,
}

/// Build the agent's observation of `hidden`.
///
/// Random draws happen in a fixed order: subject sampling, a single
/// suppression draw covering every sampled question, then the shuffle.
pub fn observe(
    world: &World,
    hidden: &HiddenState,
    options: ObserveOptions,
    rng: &mut SimRng,
) -> Posed {
    let agent_room = world.rooms().name(world.agent().location());
    let mut room = hidden.visible_from(agent_room);

    let mut subjects = Vec::with_capacity(options.num_questions);
    for _ in 0..options.num_questions {
        match sample_subject(world, rng) {
            Some(id) => subjects.push(id),
            None => break,
        }
    }

    if !subjects.is_empty() && rng.uniform() >= options.question_prob {
        subjects.clear();
    }

    if options.randomize {
        rng.shuffle(&mut room);
    }

    let questions = subjects
        .iter()
        .map(|id| Question::new(world.entity(*id).name(), hidden.time))
        .collect();
    let answers = subjects.iter().map(|id| answer_set(world, *id)).collect();

    Posed {
        observation: Observation { room, questions },
        answers,
    }
}

fn sample_subject(world: &World, rng: &mut SimRng) -> Option<EntityId> {
    let weights: Vec<f64> = world.entities().iter().map(|e| e.question_prob()).collect();
    rng.weighted_index(&weights).map(EntityId)
}

/// Current location, plus the last different one if the entity ever moved.
pub fn answer_set(world: &World, id: EntityId) -> AnswerSet {
    let rooms = world.rooms();
    let entity = world.entity(id);
    AnswerSet::new(
        rooms.name(entity.location()),
        entity
            .previous_location()
            .map(|room| rooms.name(room).to_string()),
    )
}
