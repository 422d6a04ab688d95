//! World State
//!
//! The room graph plus the entity arena of one episode. Entities are
//! created in a fixed order (static, independent, dependent, agent) so that
//! the random stream is consumed identically for a given seed.

use std::collections::HashMap;

use room_events::{Action, EntityKind, RoomContents};

use crate::attachment;
use crate::config::{EntityConfig, WorldConfig};
use crate::entity::{sample_initial_room, Behavior, Entity, EntityId};
use crate::error::ConfigError;
use crate::rng::SimRng;
use crate::rooms::{RoomGraph, RoomId};

/// Creation order of entity kinds.
const CREATION_ORDER: [EntityKind; 4] = [
    EntityKind::Static,
    EntityKind::Independent,
    EntityKind::Dependent,
    EntityKind::Agent,
];

#[derive(Debug, Clone)]
pub struct World {
    rooms: RoomGraph,
    entities: Vec<Entity>,
    index: HashMap<String, EntityId>,
    agent: EntityId,
}

impl World {
    /// Place every entity of `config` into `rooms`.
    ///
    /// Dependents try to attach right after their own placement.
    pub fn build(
        rooms: RoomGraph,
        config: &WorldConfig,
        deterministic_init: bool,
        rng: &mut SimRng,
    ) -> Result<Self, ConfigError> {
        let weights = question_weights(config);
        let mut entities: Vec<Entity> = Vec::with_capacity(config.entities.len());
        let mut index = HashMap::new();
        let mut agent = None;

        for kind in CREATION_ORDER {
            for (i, entity_config) in config.entities.iter().enumerate() {
                if entity_config.kind != kind {
                    continue;
                }

                let location = sample_initial_room(
                    &rooms,
                    &entity_config.init_probs,
                    deterministic_init,
                    rng,
                )
                .ok_or_else(|| ConfigError::InitProbsSum {
                    entity: entity_config.name.clone(),
                    sum: entity_config.init_probs.values().sum(),
                })?;

                let behavior = behavior_for(entity_config, &rooms, &index)?;
                let id = EntityId(entities.len());
                entities.push(Entity::new(
                    entity_config.name.as_str(),
                    behavior,
                    location,
                    weights[i],
                ));
                index.insert(entity_config.name.clone(), id);

                match kind {
                    EntityKind::Dependent => attachment::attach(&mut entities, id, rng),
                    EntityKind::Agent => agent = Some(id),
                    _ => {}
                }
            }
        }

        let agent = agent.ok_or(ConfigError::AgentCount(0))?;

        Ok(Self {
            rooms,
            entities,
            index,
            agent,
        })
    }

    pub fn rooms(&self) -> &RoomGraph {
        &self.rooms
    }

    /// All entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn agent(&self) -> &Entity {
        &self.entities[self.agent.0]
    }

    pub fn agent_id(&self) -> EntityId {
        self.agent
    }

    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.index.get(name).copied()
    }

    /// Room name of the named entity.
    pub fn location_of(&self, name: &str) -> Option<&str> {
        self.find(name)
            .map(|id| self.rooms.name(self.entities[id.0].location()))
    }

    /// Entities of one kind, in creation order.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.kind() == kind)
            .map(|(i, e)| (EntityId(i), e))
    }

    /// Every entity standing in `room`, grouped by kind.
    pub fn entities_in_room(&self, room: &str) -> Option<RoomContents> {
        let id = self.rooms.id(room)?;
        let mut contents = RoomContents::new(room);
        for kind in EntityKind::PRIORITY {
            for (_, entity) in self.of_kind(kind) {
                if entity.location() == id {
                    contents.add(kind, entity.name());
                }
            }
        }
        Some(contents)
    }

    /// Independent entities move and carry their riders along.
    pub(crate) fn move_independents(&mut self, rng: &mut SimRng) {
        for i in 0..self.entities.len() {
            if self.entities[i].kind() != EntityKind::Independent {
                continue;
            }
            let action = self.entities[i].sample_action(rng);
            let from = self.entities[i].location();
            let to = self.rooms.resolve(from, action);
            self.entities[i].set_location(to);
            attachment::carry_and_detach(&mut self.entities, EntityId(i));

            if from != to {
                tracing::trace!(
                    "{} moved {} from {} to {}",
                    self.entities[i].name(),
                    action,
                    self.rooms.name(from),
                    self.rooms.name(to)
                );
            }
        }
    }

    /// Every dependent draws a fresh attachment.
    pub(crate) fn attach_dependents(&mut self, rng: &mut SimRng) {
        for i in 0..self.entities.len() {
            if self.entities[i].kind() == EntityKind::Dependent {
                attachment::attach(&mut self.entities, EntityId(i), rng);
            }
        }
    }

    pub(crate) fn move_agent(&mut self, action: Action) -> RoomId {
        let agent = &mut self.entities[self.agent.0];
        let to = self.rooms.resolve(agent.location(), action);
        agent.set_location(to);
        to
    }

    pub(crate) fn record_history(&mut self) {
        for entity in &mut self.entities {
            entity.record_history();
        }
    }

    pub fn is_attachment_consistent(&self) -> bool {
        attachment::is_consistent(&self.entities)
    }
}

/// Per-entity question weight, indexed like `config.entities`.
///
/// Explicit weights are used when any entity has one; otherwise every
/// non-agent entity is equally likely.
fn question_weights(config: &WorldConfig) -> Vec<f64> {
    if config.has_question_weights() {
        return config
            .entities
            .iter()
            .map(|e| e.question_prob.unwrap_or(0.0))
            .collect();
    }

    let subjects = config
        .entities
        .iter()
        .filter(|e| e.kind != EntityKind::Agent)
        .count();
    config
        .entities
        .iter()
        .map(|e| {
            if e.kind == EntityKind::Agent || subjects == 0 {
                0.0
            } else {
                1.0 / subjects as f64
            }
        })
        .collect()
}

fn behavior_for(
    config: &EntityConfig,
    rooms: &RoomGraph,
    index: &HashMap<String, EntityId>,
) -> Result<Behavior, ConfigError> {
    let shape_error = || ConfigError::TransitionShape {
        entity: config.name.clone(),
        kind: config.kind,
    };

    let behavior = match config.kind {
        EntityKind::Static => Behavior::Static,
        EntityKind::Agent => Behavior::Agent,
        EntityKind::Independent => {
            let moves = config.moves().ok_or_else(shape_error)?;
            Behavior::independent(rooms, moves)
        }
        EntityKind::Dependent => {
            let table = config.attachment().ok_or_else(shape_error)?;
            let mut attach_probs = Vec::with_capacity(table.len());
            for (name, prob) in table {
                let id = index
                    .get(name)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownIndependent {
                        entity: config.name.clone(),
                        independent: name.to_string(),
                    })?;
                attach_probs.push((id, prob));
            }
            attach_probs.sort_by_key(|(id, _)| *id);
            Behavior::Dependent {
                attach_probs,
                attached: None,
            }
        }
    };
    Ok(behavior)
}
