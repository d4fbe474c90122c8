use bevy::ecs::entity::EntityHashMap;
use bevy::prelude::*;

/// Marker for entities the camera can lock onto.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct LockOnTarget {
    /// Offset from the entity origin to the point the camera aims at
    pub lock_offset: Vec3,
}

impl Default for LockOnTarget {
    fn default() -> Self {
        Self {
            lock_offset: Vec3::Y * 1.2,
        }
    }
}

/// A live target in a [`TargetSet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetEntry {
    pub position: Vec3,
    /// Head-height point used for angles, sight lines and screen placement
    pub lock_point: Vec3,
}

/// Snapshot of the lock-on targets alive this tick.
///
/// Rebuilt for every lock-on query. An entity missing from the set has been
/// despawned (or lost its [`LockOnTarget`]), which is how a stale lock handle
/// is detected.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    entries: EntityHashMap<TargetEntry>,
}

impl TargetSet {
    pub fn insert(&mut self, entity: Entity, position: Vec3, target: &LockOnTarget) {
        self.entries.insert(
            entity,
            TargetEntry {
                position,
                lock_point: position + target.lock_offset,
            },
        );
    }

    pub fn get(&self, entity: Entity) -> Option<&TargetEntry> {
        self.entries.get(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(Entity, &'a GlobalTransform, &'a LockOnTarget)> for TargetSet {
    fn from_iter<I: IntoIterator<Item = (Entity, &'a GlobalTransform, &'a LockOnTarget)>>(
        iter: I,
    ) -> Self {
        let mut set = Self::default();
        for (entity, transform, target) in iter {
            set.insert(entity, transform.translation(), target);
        }
        set
    }
}
