use bevy::prelude::*;

/// A single collision query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit {
    /// Collider that was hit
    pub entity: Entity,
    /// Contact point in world space
    pub point: Vec3,
    /// Surface normal at the contact point
    pub normal: Vec3,
    /// Distance travelled along the cast direction
    pub distance: f32,
}

/// Vertical capsule matching the character collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    pub radius: f32,
    /// Total height including both hemispheres
    pub height: f32,
}

impl CapsuleShape {
    pub fn new(radius: f32, height: f32) -> Self {
        Self { radius, height }
    }

    /// Length of the inner segment between the hemisphere centers.
    pub fn segment_length(&self) -> f32 {
        (self.height - self.radius * 2.0).max(0.0)
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    /// Same capsule with the radius scaled, keeping the segment length.
    pub fn shrunk(&self, scale: f32) -> Self {
        let radius = self.radius * scale;
        Self {
            radius,
            height: self.segment_length() + radius * 2.0,
        }
    }
}

/// Synchronous collision queries against the physics world.
///
/// The controller and the camera only ever talk to physics through this
/// trait, so they run against avian in the game and against analytic
/// geometry in tests.
pub trait PhysicsQuery {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<QueryHit>;

    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit>;

    /// Casts a vertical capsule centered at `center`.
    fn cast_capsule(
        &self,
        shape: CapsuleShape,
        center: Vec3,
        direction: Dir3,
        max_distance: f32,
    ) -> Option<QueryHit>;

    /// Entities whose colliders intersect the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity>;

    /// First hit on the segment between two points.
    fn linecast(&self, from: Vec3, to: Vec3) -> Option<QueryHit> {
        let offset = to - from;
        let direction = Dir3::new(offset).ok()?;
        self.cast_ray(from, direction, offset.length())
    }
}
