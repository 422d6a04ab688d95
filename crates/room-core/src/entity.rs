//! Entity Model
//!
//! Every simulated thing shares one shape (name, location, history) and
//! differs only in its [`Behavior`]. Entities live in an arena owned by the
//! [`World`](crate::world::World) and refer to each other by [`EntityId`].

use std::collections::BTreeMap;

use room_events::{Action, EntityKind};

use crate::rng::SimRng;
use crate::rooms::{RoomGraph, RoomId};

/// Stable index of an entity within its world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub usize);

/// Kind-specific state and movement rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Static,
    Independent {
        /// Action distribution per room, indexed by room id
        moves: Vec<Vec<(Action, f64)>>,
        /// Dependents riding along this step
        attached: Vec<EntityId>,
    },
    Dependent {
        /// Attachment probability per independent entity, in arena order
        attach_probs: Vec<(EntityId, f64)>,
        attached: Option<EntityId>,
    },
    Agent,
}

impl Behavior {
    pub fn kind(&self) -> EntityKind {
        match self {
            Behavior::Static => EntityKind::Static,
            Behavior::Independent { .. } => EntityKind::Independent,
            Behavior::Dependent { .. } => EntityKind::Dependent,
            Behavior::Agent => EntityKind::Agent,
        }
    }

    /// Build the movement table of an independent entity.
    pub fn independent(
        rooms: &RoomGraph,
        table: &BTreeMap<String, BTreeMap<Action, f64>>,
    ) -> Self {
        let mut moves = vec![Vec::new(); rooms.len()];
        for (room, row) in table {
            if let Some(id) = rooms.id(room) {
                moves[id.0] = row.iter().map(|(a, p)| (*a, *p)).collect();
            }
        }
        Behavior::Independent {
            moves,
            attached: Vec::new(),
        }
    }
}

/// A simulated entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: String,
    behavior: Behavior,
    location: RoomId,
    history: Vec<RoomId>,
    question_prob: f64,
}

impl Entity {
    pub(crate) fn new(
        name: impl Into<String>,
        behavior: Behavior,
        location: RoomId,
        question_prob: f64,
    ) -> Self {
        Self {
            name: name.into(),
            behavior,
            location,
            history: Vec::new(),
            question_prob,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.behavior.kind()
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut Behavior {
        &mut self.behavior
    }

    pub fn location(&self) -> RoomId {
        self.location
    }

    pub(crate) fn set_location(&mut self, room: RoomId) {
        self.location = room;
    }

    /// Every recorded location, oldest first.
    pub fn history(&self) -> &[RoomId] {
        &self.history
    }

    pub(crate) fn record_history(&mut self) {
        self.history.push(self.location);
    }

    /// Weight of this entity when sampling a question subject.
    pub fn question_prob(&self) -> f64 {
        self.question_prob
    }

    /// The most recent recorded location that differs from where the
    /// entity is now.
    pub fn previous_location(&self) -> Option<RoomId> {
        previous_location(&self.history, self.location)
    }

    /// Dependents currently riding with this entity.
    pub fn attached_dependents(&self) -> &[EntityId] {
        match &self.behavior {
            Behavior::Independent { attached, .. } => attached,
            _ => &[],
        }
    }

    /// The independent entity this entity currently rides with.
    pub fn attached_to(&self) -> Option<EntityId> {
        match &self.behavior {
            Behavior::Dependent { attached, .. } => *attached,
            _ => None,
        }
    }

    /// Sample this step's action from the current room's distribution.
    ///
    /// Only independent entities move on their own; everything else stays.
    pub(crate) fn sample_action(&self, rng: &mut SimRng) -> Action {
        let Behavior::Independent { moves, .. } = &self.behavior else {
            return Action::Stay;
        };
        let row = match moves.get(self.location.0) {
            Some(row) if !row.is_empty() => row,
            _ => return Action::Stay,
        };
        let weights: Vec<f64> = row.iter().map(|(_, p)| *p).collect();
        rng.weighted_index(&weights)
            .map(|i| row[i].0)
            .unwrap_or(Action::Stay)
    }
}

/// Scan `history` backwards for the latest entry different from `current`.
pub fn previous_location(history: &[RoomId], current: RoomId) -> Option<RoomId> {
    history.iter().rev().find(|room| **room != current).copied()
}

/// Pick a starting room from `init_probs`.
///
/// With `deterministic` set the most likely room wins, ties going to the
/// first room in key order, and no randomness is consumed.
pub fn sample_initial_room(
    rooms: &RoomGraph,
    init_probs: &BTreeMap<String, f64>,
    deterministic: bool,
    rng: &mut SimRng,
) -> Option<RoomId> {
    let candidates: Vec<(RoomId, f64)> = init_probs
        .iter()
        .filter_map(|(room, p)| rooms.id(room).map(|id| (id, *p)))
        .collect();

    if deterministic {
        let mut best: Option<(RoomId, f64)> = None;
        for &(id, p) in &candidates {
            if best.map_or(true, |(_, best_p)| p > best_p) {
                best = Some((id, p));
            }
        }
        return best.map(|(id, _)| id);
    }

    let weights: Vec<f64> = candidates.iter().map(|(_, p)| *p).collect();
    rng.weighted_index(&weights).map(|i| candidates[i].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoomLayout;
    use room_events::Direction;

    fn graph() -> RoomGraph {
        RoomGraph::from_layouts(&[
            RoomLayout::new("a").with_neighbor(Direction::North, "b"),
            RoomLayout::new("b").with_neighbor(Direction::South, "a"),
        ])
        .unwrap()
    }

    fn probs(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_previous_location() {
        let a = RoomId(0);
        let b = RoomId(1);

        assert_eq!(previous_location(&[a], a), None);
        assert_eq!(previous_location(&[a, b, b], b), Some(a));
        assert_eq!(previous_location(&[a, b, a], a), Some(b));
        assert_eq!(previous_location(&[b, a, a, a], a), Some(b));
    }

    #[test]
    fn test_entity_history() {
        let mut entity = Entity::new("desk", Behavior::Static, RoomId(0), 0.5);
        entity.record_history();
        entity.set_location(RoomId(1));
        entity.record_history();

        assert_eq!(entity.history(), &[RoomId(0), RoomId(1)]);
        assert_eq!(entity.previous_location(), Some(RoomId(0)));
        assert_eq!(entity.kind(), EntityKind::Static);
        assert!(entity.attached_dependents().is_empty());
        assert_eq!(entity.attached_to(), None);
    }

    #[test]
    fn test_sample_initial_room_certain() {
        let rooms = graph();
        let mut rng = SimRng::seed_from_u64(1);
        for _ in 0..50 {
            let room = sample_initial_room(&rooms, &probs(&[("b", 1.0)]), false, &mut rng);
            assert_eq!(room, rooms.id("b"));
        }
    }

    #[test]
    fn test_sample_initial_room_is_a_key() {
        let rooms = graph();
        let mut rng = SimRng::seed_from_u64(2);
        let init = probs(&[("a", 0.3), ("b", 0.7)]);
        for _ in 0..100 {
            let room = sample_initial_room(&rooms, &init, false, &mut rng).unwrap();
            assert!(init.contains_key(rooms.name(room)));
        }
    }

    #[test]
    fn test_deterministic_initial_room() {
        let rooms = graph();
        let mut rng = SimRng::seed_from_u64(3);

        let room = sample_initial_room(&rooms, &probs(&[("a", 0.3), ("b", 0.7)]), true, &mut rng);
        assert_eq!(room, rooms.id("b"));

        // Ties go to the first key
        let room = sample_initial_room(&rooms, &probs(&[("a", 0.5), ("b", 0.5)]), true, &mut rng);
        assert_eq!(room, rooms.id("a"));
    }

    #[test]
    fn test_independent_sample_action() {
        let rooms = graph();
        let mut table = BTreeMap::new();
        table.insert(
            "a".to_string(),
            [(Action::North, 1.0)].into_iter().collect::<BTreeMap<_, _>>(),
        );
        let entity = Entity::new("alice", Behavior::independent(&rooms, &table), RoomId(0), 0.0);
        let mut rng = SimRng::seed_from_u64(4);

        assert_eq!(entity.sample_action(&mut rng), Action::North);

        // No row for the room: stay
        let mut entity = entity;
        entity.set_location(RoomId(1));
        assert_eq!(entity.sample_action(&mut rng), Action::Stay);
    }
}
