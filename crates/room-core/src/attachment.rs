//! Attachment Subsystem
//!
//! Dependent entities ride along with a co-located independent entity. The
//! link is stored on both sides as entity ids and rebuilt every step:
//! independents carry their riders when they move and then drop them, and
//! each dependent draws a fresh attachment afterwards.

use crate::entity::{Behavior, Entity, EntityId};
use crate::rng::SimRng;

/// Attach `dependent` to at most one co-located independent entity.
///
/// One Bernoulli trial per co-located independent named in the dependent's
/// table, in arena order; a uniform choice among the successes wins.
pub(crate) fn attach(entities: &mut [Entity], dependent: EntityId, rng: &mut SimRng) {
    let location = entities[dependent.0].location();
    let attach_probs = match entities[dependent.0].behavior() {
        Behavior::Dependent { attach_probs, .. } => attach_probs.clone(),
        _ => return,
    };

    unlink(entities, dependent);

    let mut successes = Vec::new();
    for (independent, prob) in attach_probs {
        if entities[independent.0].location() != location {
            continue;
        }
        if rng.uniform() < prob {
            successes.push(independent);
        }
    }

    let Some(choice) = rng.choose_index(successes.len()) else {
        return;
    };
    let independent = successes[choice];

    if let Behavior::Dependent { attached, .. } = entities[dependent.0].behavior_mut() {
        *attached = Some(independent);
    }
    if let Behavior::Independent { attached, .. } = entities[independent.0].behavior_mut() {
        if !attached.contains(&dependent) {
            attached.push(dependent);
        }
    }

    tracing::trace!(
        "{} attached to {} ({} candidates)",
        entities[dependent.0].name(),
        entities[independent.0].name(),
        successes.len()
    );
}

/// Move every rider of `independent` to its location, then detach them all.
pub(crate) fn carry_and_detach(entities: &mut [Entity], independent: EntityId) {
    let location = entities[independent.0].location();
    let riders = match entities[independent.0].behavior_mut() {
        Behavior::Independent { attached, .. } => std::mem::take(attached),
        _ => return,
    };

    for rider in riders {
        let entity = &mut entities[rider.0];
        entity.set_location(location);
        if let Behavior::Dependent { attached, .. } = entity.behavior_mut() {
            *attached = None;
        }
    }
}

/// Remove any existing link of `dependent`, on both sides.
fn unlink(entities: &mut [Entity], dependent: EntityId) {
    let previous = match entities[dependent.0].behavior_mut() {
        Behavior::Dependent { attached, .. } => attached.take(),
        _ => None,
    };
    if let Some(independent) = previous {
        if let Behavior::Independent { attached, .. } = entities[independent.0].behavior_mut() {
            attached.retain(|id| *id != dependent);
        }
    }
}

/// True when every attachment link is mirrored on the other side and
/// joins co-located entities.
pub fn is_consistent(entities: &[Entity]) -> bool {
    entities.iter().enumerate().all(|(i, entity)| {
        let id = EntityId(i);
        match entity.behavior() {
            Behavior::Dependent {
                attached: Some(independent),
                ..
            } => {
                let host = &entities[independent.0];
                host.attached_dependents().contains(&id) && host.location() == entity.location()
            }
            Behavior::Independent { attached, .. } => attached
                .iter()
                .all(|rider| entities[rider.0].attached_to() == Some(id)),
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::RoomId;

    fn independent(name: &str, room: usize) -> Entity {
        Entity::new(
            name,
            Behavior::Independent {
                moves: Vec::new(),
                attached: Vec::new(),
            },
            RoomId(room),
            0.0,
        )
    }

    fn dependent(name: &str, room: usize, attach_probs: Vec<(EntityId, f64)>) -> Entity {
        Entity::new(
            name,
            Behavior::Dependent {
                attach_probs,
                attached: None,
            },
            RoomId(room),
            0.0,
        )
    }

    #[test]
    fn test_certain_attachment() {
        let mut entities = vec![
            independent("alice", 0),
            dependent("laptop", 0, vec![(EntityId(0), 1.0)]),
        ];
        let mut rng = SimRng::seed_from_u64(1);

        attach(&mut entities, EntityId(1), &mut rng);

        assert_eq!(entities[1].attached_to(), Some(EntityId(0)));
        assert_eq!(entities[0].attached_dependents(), &[EntityId(1)]);
        assert!(is_consistent(&entities));
    }

    #[test]
    fn test_no_attachment_when_apart() {
        let mut entities = vec![
            independent("alice", 0),
            dependent("laptop", 1, vec![(EntityId(0), 1.0)]),
        ];
        let mut rng = SimRng::seed_from_u64(1);

        attach(&mut entities, EntityId(1), &mut rng);

        assert_eq!(entities[1].attached_to(), None);
        assert!(entities[0].attached_dependents().is_empty());
    }

    #[test]
    fn test_zero_probability_never_attaches() {
        let mut entities = vec![
            independent("alice", 0),
            dependent("laptop", 0, vec![(EntityId(0), 0.0)]),
        ];
        let mut rng = SimRng::seed_from_u64(5);

        for _ in 0..100 {
            attach(&mut entities, EntityId(1), &mut rng);
            assert_eq!(entities[1].attached_to(), None);
        }
    }

    #[test]
    fn test_tie_break_is_uniform_among_successes() {
        let mut entities = vec![
            independent("alice", 0),
            independent("bob", 0),
            dependent("laptop", 0, vec![(EntityId(0), 1.0), (EntityId(1), 1.0)]),
        ];
        let mut rng = SimRng::seed_from_u64(11);

        let mut counts = [0usize; 2];
        for _ in 0..400 {
            attach(&mut entities, EntityId(2), &mut rng);
            let host = entities[2].attached_to().unwrap();
            counts[host.0] += 1;
            assert!(is_consistent(&entities));
        }

        // Both hosts win a fair share, and re-attaching never leaves stale links
        assert!(counts[0] > 100, "alice chosen {} times", counts[0]);
        assert!(counts[1] > 100, "bob chosen {} times", counts[1]);
        let riders: usize = entities[..2]
            .iter()
            .map(|e| e.attached_dependents().len())
            .sum();
        assert_eq!(riders, 1);
    }

    #[test]
    fn test_carry_and_detach() {
        let mut entities = vec![
            independent("alice", 0),
            dependent("laptop", 0, vec![(EntityId(0), 1.0)]),
            dependent("phone", 0, vec![(EntityId(0), 1.0)]),
        ];
        let mut rng = SimRng::seed_from_u64(3);
        attach(&mut entities, EntityId(1), &mut rng);
        attach(&mut entities, EntityId(2), &mut rng);
        assert_eq!(entities[0].attached_dependents().len(), 2);

        entities[0].set_location(RoomId(1));
        carry_and_detach(&mut entities, EntityId(0));

        assert_eq!(entities[1].location(), RoomId(1));
        assert_eq!(entities[2].location(), RoomId(1));
        assert!(entities[0].attached_dependents().is_empty());
        assert_eq!(entities[1].attached_to(), None);
        assert_eq!(entities[2].attached_to(), None);
        assert!(is_consistent(&entities));
    }
}
