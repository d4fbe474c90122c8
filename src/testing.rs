//! Analytic collision world for exercising the controller without avian.
//!
//! Geometry is an optional inclined ground plane, spherical blockers, and
//! lock-on targets with a spherical body.

use bevy::prelude::*;

use crate::camera::{LockOnTarget, TargetSet};
use crate::physics::{CapsuleShape, PhysicsQuery, QueryHit};

/// Body sphere radius of a mock target
pub const TARGET_BODY_RADIUS: f32 = 0.5;

/// Height of a mock target's body sphere above its origin
pub const TARGET_BODY_HEIGHT: f32 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct MockPlane {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub struct MockSphere {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct MockTarget {
    pub entity: Entity,
    pub position: Vec3,
}

impl MockTarget {
    fn body(&self) -> MockSphere {
        MockSphere {
            entity: self.entity,
            center: self.position + Vec3::Y * TARGET_BODY_HEIGHT,
            radius: TARGET_BODY_RADIUS,
        }
    }
}

pub struct MockWorld {
    pub ground: Option<MockPlane>,
    pub blockers: Vec<MockSphere>,
    pub targets: Vec<MockTarget>,
    entities: World,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorld {
    /// An empty void.
    pub fn new() -> Self {
        Self {
            ground: None,
            blockers: Vec::new(),
            targets: Vec::new(),
            entities: World::new(),
        }
    }

    /// Horizontal ground at `height`.
    pub fn flat(height: f32) -> Self {
        Self::slope(height, 0.0)
    }

    /// Ground through `(0, height, 0)` inclined by `angle_deg`, rising
    /// toward `-Z` (forward) and falling toward `+Z`.
    pub fn slope(height: f32, angle_deg: f32) -> Self {
        let mut world = Self::new();
        let angle = angle_deg.to_radians();
        let entity = world.entity();
        world.ground = Some(MockPlane {
            entity,
            point: Vec3::Y * height,
            normal: Vec3::new(0.0, angle.cos(), angle.sin()),
        });
        world
    }

    /// Allocates a fresh entity handle.
    pub fn entity(&mut self) -> Entity {
        self.entities.spawn_empty().id()
    }

    pub fn spawn_blocker(&mut self, center: Vec3, radius: f32) -> Entity {
        let entity = self.entity();
        self.blockers.push(MockSphere {
            entity,
            center,
            radius,
        });
        entity
    }

    pub fn spawn_target(&mut self, position: Vec3) -> Entity {
        let entity = self.entity();
        self.targets.push(MockTarget { entity, position });
        entity
    }

    pub fn move_target(&mut self, entity: Entity, position: Vec3) {
        if let Some(target) = self.targets.iter_mut().find(|t| t.entity == entity) {
            target.position = position;
        }
    }

    /// Removes a target or blocker, as if despawned.
    pub fn despawn(&mut self, entity: Entity) {
        self.targets.retain(|t| t.entity != entity);
        self.blockers.retain(|b| b.entity != entity);
    }

    /// Snapshot of the live targets with the default lock offset.
    pub fn target_set(&self) -> TargetSet {
        let mut set = TargetSet::default();
        for target in &self.targets {
            set.insert(target.entity, target.position, &LockOnTarget::default());
        }
        set
    }

    fn spheres(&self) -> impl Iterator<Item = MockSphere> + '_ {
        self.blockers
            .iter()
            .copied()
            .chain(self.targets.iter().map(MockTarget::body))
    }

    fn sweep_plane(
        plane: &MockPlane,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        let gap = (origin - plane.point).dot(plane.normal) - radius;
        let distance = if gap <= 0.0 {
            0.0
        } else {
            let approach = -direction.dot(plane.normal);
            if approach <= 1.0e-6 {
                return None;
            }
            gap / approach
        };

        (distance <= max_distance).then(|| QueryHit {
            entity: plane.entity,
            point: origin + direction * distance - plane.normal * radius,
            normal: plane.normal,
            distance,
        })
    }

    fn sweep_sphere(
        sphere: &MockSphere,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        let combined = sphere.radius + radius;
        let offset = origin - sphere.center;
        let b = offset.dot(direction);
        let c = offset.length_squared() - combined * combined;

        let distance = if c <= 0.0 {
            0.0
        } else {
            let discriminant = b * b - c;
            if b > 0.0 || discriminant < 0.0 {
                return None;
            }
            -b - discriminant.sqrt()
        };

        if distance > max_distance {
            return None;
        }

        let center = origin + direction * distance;
        let normal = (center - sphere.center).normalize_or(Vec3::Y);
        Some(QueryHit {
            entity: sphere.entity,
            point: sphere.center + normal * sphere.radius,
            normal,
            distance,
        })
    }

    fn sweep(&self, origin: Vec3, radius: f32, direction: Dir3, max_distance: f32) -> Option<QueryHit> {
        let direction = direction.as_vec3();
        let ground = self
            .ground
            .as_ref()
            .and_then(|plane| Self::sweep_plane(plane, origin, radius, direction, max_distance));

        self.spheres()
            .filter_map(|sphere| Self::sweep_sphere(&sphere, origin, radius, direction, max_distance))
            .chain(ground)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl PhysicsQuery for MockWorld {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<QueryHit> {
        self.sweep(origin, 0.0, direction, max_distance)
    }

    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        self.sweep(origin, radius, direction, max_distance)
    }

    fn cast_capsule(
        &self,
        shape: CapsuleShape,
        center: Vec3,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        // Sweep the two hemisphere centers and the middle as spheres
        let half_segment = shape.segment_length() / 2.0;
        [
            center - Vec3::Y * half_segment,
            center,
            center + Vec3::Y * half_segment,
        ]
        .into_iter()
        .filter_map(|origin| self.sweep(origin, shape.radius, direction, max_distance))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        self.spheres()
            .filter(|sphere| sphere.center.distance(center) <= radius + sphere.radius)
            .map(|sphere| sphere.entity)
            .collect()
    }
}
