//! Room Graph
//!
//! Fixed directed adjacency between rooms. Each room has a neighbor or a
//! wall on each of its four sides.

use std::collections::HashMap;

use room_events::{Action, Direction, Quadruple, Relation, WALL};

use crate::config::RoomLayout;
use crate::error::ConfigError;

/// Stable index of a room within its [`RoomGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(pub usize);

/// A room and its four neighbor slots. `None` is a wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    neighbors: [Option<RoomId>; 4],
}

impl Room {
    pub fn neighbor(&self, direction: Direction) -> Option<RoomId> {
        self.neighbors[direction.index()]
    }
}

/// Registry of all rooms in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomGraph {
    rooms: Vec<Room>,
    index: HashMap<String, RoomId>,
}

impl RoomGraph {
    /// Build the graph from room layouts, rejecting malformed layouts.
    pub fn from_layouts(layouts: &[RoomLayout]) -> Result<Self, ConfigError> {
        if layouts.is_empty() {
            return Err(ConfigError::EmptyLayout);
        }

        let mut index = HashMap::new();
        for (i, layout) in layouts.iter().enumerate() {
            if index.insert(layout.name.clone(), RoomId(i)).is_some() {
                return Err(ConfigError::DuplicateRoom(layout.name.clone()));
            }
        }

        let mut rooms = Vec::with_capacity(layouts.len());
        for layout in layouts {
            let mut neighbors = [None; 4];
            for direction in Direction::ALL {
                let neighbor = layout.neighbor(direction);
                if neighbor == WALL {
                    continue;
                }
                let id = index
                    .get(neighbor)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownNeighbor {
                        room: layout.name.clone(),
                        direction,
                        neighbor: neighbor.to_string(),
                    })?;
                if neighbors.contains(&Some(id)) {
                    return Err(ConfigError::RepeatedNeighbor {
                        room: layout.name.clone(),
                        neighbor: neighbor.to_string(),
                    });
                }
                neighbors[direction.index()] = Some(id);
            }
            rooms.push(Room {
                name: layout.name.clone(),
                neighbors,
            });
        }

        Ok(Self { rooms, index })
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, id: RoomId) -> &Room {
        &self.rooms[id.0]
    }

    /// Look up a room by name.
    pub fn id(&self, name: &str) -> Option<RoomId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: RoomId) -> &str {
        &self.rooms[id.0].name
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().enumerate().map(|(i, room)| (RoomId(i), room))
    }

    pub fn neighbor(&self, room: RoomId, direction: Direction) -> Option<RoomId> {
        self.get(room).neighbor(direction)
    }

    /// Where `action` takes something standing in `room`.
    ///
    /// Walking into a wall, or staying, leaves it where it is.
    pub fn resolve(&self, room: RoomId, action: Action) -> RoomId {
        action
            .direction()
            .and_then(|direction| self.neighbor(room, direction))
            .unwrap_or(room)
    }

    /// Adjacency table as `[room, direction, neighbor]` triples in
    /// declaration order, optionally leaving out walls.
    pub fn layout(&self, include_walls: bool) -> Vec<[String; 3]> {
        let mut triples = Vec::with_capacity(self.rooms.len() * 4);
        for room in &self.rooms {
            for direction in Direction::ALL {
                let tail = match room.neighbor(direction) {
                    Some(id) => self.name(id),
                    None if include_walls => WALL,
                    None => continue,
                };
                triples.push([
                    room.name.clone(),
                    direction.to_string(),
                    tail.to_string(),
                ]);
            }
        }
        triples
    }

    /// Four adjacency quadruples per room, walls included.
    pub fn adjacency_quadruples(&self, time: u64) -> Vec<Quadruple> {
        let mut quadruples = Vec::with_capacity(self.rooms.len() * 4);
        for room in &self.rooms {
            for direction in Direction::ALL {
                let tail = room.neighbor(direction).map_or(WALL, |id| self.name(id));
                quadruples.push(Quadruple::new(
                    room.name.as_str(),
                    Relation::from(direction),
                    tail,
                    time,
                ));
            }
        }
        quadruples
    }
}
