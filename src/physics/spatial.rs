use avian3d::prelude::*;
use bevy::prelude::*;

use super::query::{CapsuleShape, PhysicsQuery, QueryHit};

/// [`PhysicsQuery`] backed by avian's [`SpatialQuery`].
///
/// Every query shares the same filter, so callers build one per concern
/// (ground probing against world geometry, lock-on sight lines against world
/// and targets).
pub struct AvianQuery<'a, 'w, 's> {
    spatial: &'a SpatialQuery<'w, 's>,
    filter: SpatialQueryFilter,
}

impl<'a, 'w, 's> AvianQuery<'a, 'w, 's> {
    pub fn new(spatial: &'a SpatialQuery<'w, 's>, filter: SpatialQueryFilter) -> Self {
        Self { spatial, filter }
    }

    fn cast_collider(
        &self,
        collider: &Collider,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        let config = ShapeCastConfig {
            max_distance,
            ..default()
        };

        self.spatial
            .cast_shape(collider, origin, Quat::IDENTITY, direction, &config, &self.filter)
            .map(|hit| QueryHit {
                entity: hit.entity,
                point: hit.point1,
                normal: hit.normal1,
                distance: hit.distance,
            })
    }
}

impl PhysicsQuery for AvianQuery<'_, '_, '_> {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<QueryHit> {
        self.spatial
            .cast_ray(origin, direction, max_distance, true, &self.filter)
            .map(|hit| QueryHit {
                entity: hit.entity,
                point: origin + direction.as_vec3() * hit.distance,
                normal: hit.normal,
                distance: hit.distance,
            })
    }

    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        self.cast_collider(&Collider::sphere(radius), origin, direction, max_distance)
    }

    fn cast_capsule(
        &self,
        shape: CapsuleShape,
        center: Vec3,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit> {
        let collider = Collider::capsule(shape.radius, shape.segment_length());
        self.cast_collider(&collider, center, direction, max_distance)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        self.spatial.shape_intersections(
            &Collider::sphere(radius),
            center,
            Quat::IDENTITY,
            &self.filter,
        )
    }
}
