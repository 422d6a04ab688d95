//! Preset Worlds
//!
//! A small built-in house used as the default configuration.

use std::collections::BTreeMap;

use room_events::{Action, Direction};

use crate::config::{EntityConfig, RoomLayout, WorldConfig};

const ROOMS: [&str; 4] = ["officeroom", "livingroom", "bedroom", "kitchen"];

fn uniform_rooms() -> BTreeMap<String, f64> {
    ROOMS
        .iter()
        .map(|room| (room.to_string(), 1.0 / ROOMS.len() as f64))
        .collect()
}

fn only(room: &str) -> BTreeMap<String, f64> {
    [(room.to_string(), 1.0)].into_iter().collect()
}

/// Mostly stay, otherwise wander in any direction.
fn wandering() -> BTreeMap<String, BTreeMap<Action, f64>> {
    let row: BTreeMap<Action, f64> = Action::ALL
        .iter()
        .map(|&action| (action, if action == Action::Stay { 0.6 } else { 0.1 }))
        .collect();
    ROOMS
        .iter()
        .map(|room| (room.to_string(), row.clone()))
        .collect()
}

fn attach(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Create the development house: four rooms in a 2x2 grid.
///
/// ```text
/// officeroom | livingroom
/// -----------+-----------
///  bedroom   |  kitchen
/// ```
pub fn dev_world() -> WorldConfig {
    let rooms = vec![
        RoomLayout::new("officeroom")
            .with_neighbor(Direction::East, "livingroom")
            .with_neighbor(Direction::South, "bedroom"),
        RoomLayout::new("livingroom")
            .with_neighbor(Direction::West, "officeroom")
            .with_neighbor(Direction::South, "kitchen"),
        RoomLayout::new("bedroom")
            .with_neighbor(Direction::North, "officeroom")
            .with_neighbor(Direction::East, "kitchen"),
        RoomLayout::new("kitchen")
            .with_neighbor(Direction::North, "livingroom")
            .with_neighbor(Direction::West, "bedroom"),
    ];

    let entities = vec![
        // Furniture
        EntityConfig::static_object("desk", only("officeroom")),
        EntityConfig::static_object("bed", only("bedroom")),
        // People
        EntityConfig::independent("alice", uniform_rooms(), wandering()),
        EntityConfig::independent("tae", uniform_rooms(), wandering()),
        // Things people carry around
        EntityConfig::dependent(
            "laptop",
            only("officeroom"),
            attach(&[("alice", 0.7), ("tae", 0.3)]),
        ),
        EntityConfig::dependent(
            "phone",
            uniform_rooms(),
            attach(&[("alice", 0.5), ("tae", 0.5)]),
        ),
        EntityConfig::agent("agent", only("officeroom")),
    ];

    WorldConfig::new(rooms, entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_events::EntityKind;

    #[test]
    fn test_dev_world_is_valid() {
        let world = dev_world();
        assert!(world.validate().is_ok());
        assert_eq!(world.rooms.len(), 4);
    }

    #[test]
    fn test_dev_world_population() {
        let world = dev_world();
        let count = |kind| world.entities.iter().filter(|e| e.kind == kind).count();

        assert_eq!(count(EntityKind::Static), 2);
        assert_eq!(count(EntityKind::Independent), 2);
        assert_eq!(count(EntityKind::Dependent), 2);
        assert_eq!(count(EntityKind::Agent), 1);
    }

    #[test]
    fn test_dev_world_is_symmetric() {
        let graph = dev_world().room_graph().unwrap();
        for (id, room) in graph.iter() {
            for direction in Direction::ALL {
                if let Some(neighbor) = room.neighbor(direction) {
                    let back = graph.get(neighbor);
                    assert!(
                        Direction::ALL.iter().any(|d| back.neighbor(*d) == Some(id)),
                        "{} -> {} has no way back",
                        room.name,
                        back.name
                    );
                }
            }
        }
    }
}
