//! Hidden Global State
//!
//! The full ground truth of one timestep as a flat list of quadruples.

use serde::{Deserialize, Serialize};

use room_events::{EntityKind, Quadruple, Relation};

use crate::world::World;

/// Snapshot of every fact at one timestep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenState {
    pub time: u64,
    pub quadruples: Vec<Quadruple>,
}

impl HiddenState {
    /// One `atlocation` fact per entity in kind priority order, then four
    /// adjacency facts per room.
    pub fn assemble(world: &World, time: u64) -> Self {
        let rooms = world.rooms();
        let mut quadruples = Vec::with_capacity(world.entities().len() + rooms.len() * 4);

        for kind in EntityKind::PRIORITY {
            for (_, entity) in world.of_kind(kind) {
                quadruples.push(Quadruple::at_location(
                    entity.name(),
                    rooms.name(entity.location()),
                    time,
                ));
            }
        }
        quadruples.extend(rooms.adjacency_quadruples(time));

        Self { time, quadruples }
    }

    /// Facts visible from `room`: who is there and where its doors lead.
    pub fn visible_from(&self, room: &str) -> Vec<Quadruple> {
        self.quadruples
            .iter()
            .filter(|q| match q.relation {
                Relation::AtLocation => q.tail == room,
                _ => q.head == room,
            })
            .cloned()
            .collect()
    }

    pub fn location_of(&self, entity: &str) -> Option<&str> {
        self.quadruples
            .iter()
            .find(|q| q.relation == Relation::AtLocation && q.head == entity)
            .map(|q| q.tail.as_str())
    }

    /// Adjacency facts only.
    pub fn adjacency(&self) -> impl Iterator<Item = &Quadruple> {
        self.quadruples.iter().filter(|q| q.relation.is_adjacency())
    }

    pub fn len(&self) -> usize {
        self.quadruples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quadruples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, RoomLayout, WorldConfig};
    use crate::rng::SimRng;
    use room_events::{Direction, WALL};
    use std::collections::BTreeMap;

    fn at(room: &str) -> BTreeMap<String, f64> {
        [(room.to_string(), 1.0)].into_iter().collect()
    }

    fn world() -> World {
        let config = WorldConfig::new(
            vec![
                RoomLayout::new("a").with_neighbor(Direction::North, "b"),
                RoomLayout::new("b").with_neighbor(Direction::South, "a"),
            ],
            vec![
                EntityConfig::static_object("desk", at("a")),
                EntityConfig::static_object("bed", at("b")),
                EntityConfig::agent("agent", at("a")),
            ],
        );
        let rooms = config.room_graph().unwrap();
        World::build(rooms, &config, false, &mut SimRng::seed_from_u64(0)).unwrap()
    }

    #[test]
    fn test_assemble_order() {
        let state = HiddenState::assemble(&world(), 3);

        assert_eq!(state.len(), 3 + 8);
        assert_eq!(state.quadruples[0], Quadruple::at_location("agent", "a", 3));
        assert_eq!(state.quadruples[1], Quadruple::at_location("desk", "a", 3));
        assert_eq!(state.quadruples[2], Quadruple::at_location("bed", "b", 3));
        assert_eq!(state.quadruples[3], Quadruple::new("a", Relation::North, "b", 3));
        assert!(state.quadruples.iter().all(|q| q.time == 3));
    }

    #[test]
    fn test_visible_from() {
        let state = HiddenState::assemble(&world(), 0);
        let visible = state.visible_from("a");

        assert_eq!(
            visible,
            vec![
                Quadruple::at_location("agent", "a", 0),
                Quadruple::at_location("desk", "a", 0),
                Quadruple::new("a", Relation::North, "b", 0),
                Quadruple::new("a", Relation::East, WALL, 0),
                Quadruple::new("a", Relation::South, WALL, 0),
                Quadruple::new("a", Relation::West, WALL, 0),
            ]
        );
    }

    #[test]
    fn test_location_lookup() {
        let state = HiddenState::assemble(&world(), 0);
        assert_eq!(state.location_of("bed"), Some("b"));
        assert_eq!(state.location_of("a"), None);
        assert_eq!(state.adjacency().count(), 8);
    }
}
