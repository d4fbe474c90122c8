use bevy::prelude::*;

use super::rig::{CameraConfig, CameraRig};
use super::targets::TargetSet;
use super::viewport::ViewProjection;
use crate::physics::PhysicsQuery;

/// Candidates must sit at least this far toward the requested side of the
/// current target
pub const SWITCH_SIDE_DOT: f32 = 0.3;

/// Current lock, held by the camera entity.
///
/// The handle is an [`Entity`], whose generation makes a despawned target
/// detectable: it is simply absent from the next [`TargetSet`].
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockOnState {
    pub lock_target: Option<Entity>,
}

/// Outcome of [`LockOnState::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    Locked(Entity),
    /// The camera should return to free look from the character's heading
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDirection {
    Left,
    Right,
}

impl LockOnState {
    pub fn is_locked_on(&self) -> bool {
        self.lock_target.is_some()
    }

    /// Locks onto a new target, or releases when given the current target or
    /// nothing at all.
    pub fn toggle(&mut self, candidate: Option<Entity>) -> LockTransition {
        match candidate {
            Some(target) if self.lock_target != Some(target) => {
                self.lock_target = Some(target);
                LockTransition::Locked(target)
            }
            _ => {
                self.lock_target = None;
                LockTransition::Released
            }
        }
    }

    /// Drops the lock if its target no longer validates. Returns true when
    /// the lock was lost.
    pub fn revalidate(&mut self, scene: &LockOnScene<'_, impl PhysicsQuery>, config: &CameraConfig) -> bool {
        match self.lock_target {
            Some(target) if !scene.is_valid(target, config) => {
                debug!("lock on {target} lost");
                self.lock_target = None;
                true
            }
            _ => false,
        }
    }

    /// Revalidates the lock and, when it is lost, puts the rig back behind
    /// the character before it ticks this frame.
    pub fn revalidate_with_rig(
        &mut self,
        scene: &LockOnScene<'_, impl PhysicsQuery>,
        rig: &mut CameraRig,
        heading_yaw_deg: f32,
        config: &CameraConfig,
    ) -> bool {
        let lost = self.revalidate(scene, config);
        if lost {
            rig.reset_to_heading(heading_yaw_deg, config);
        }
        lost
    }

    /// Handles a lock button press. Always releases while locked; otherwise
    /// acquires the best candidate, or releases if there is none.
    pub fn press_lock(
        &mut self,
        scene: &LockOnScene<'_, impl PhysicsQuery>,
        rig: &mut CameraRig,
        heading_yaw_deg: f32,
        config: &CameraConfig,
    ) -> LockTransition {
        let candidate = match self.lock_target {
            Some(current) => Some(current),
            None => scene.find_target(config),
        };
        let transition = self.toggle(candidate);
        rig.apply_lock_transition(transition, heading_yaw_deg, config);
        transition
    }
}

/// Everything target selection looks at, captured for one query.
pub struct LockOnScene<'a, Q: PhysicsQuery> {
    /// Collision world for overlap and sight-line checks
    pub physics: &'a Q,
    pub targets: &'a TargetSet,
    pub viewport: &'a ViewProjection,
    /// The character's own entity, never a candidate
    pub character: Option<Entity>,
    pub character_position: Vec3,
    /// Horizontal facing of the character
    pub character_forward: Vec3,
    pub camera_right: Vec3,
}

impl<Q: PhysicsQuery> LockOnScene<'_, Q> {
    /// Live targets inside the lock radius, excluding the character.
    fn candidates(&self, config: &CameraConfig) -> impl Iterator<Item = Entity> + '_ {
        let radius = config.lock_on_radius;
        self.physics
            .overlap_sphere(self.character_position, radius)
            .into_iter()
            .filter(move |&entity| {
                Some(entity) != self.character
                    && self
                        .targets
                        .get(entity)
                        .is_some_and(|t| t.position.distance(self.character_position) <= radius)
            })
    }

    /// Whether the sight line from the camera to `point` is clear of anything
    /// but lock-on targets.
    fn sight_line_clear(&self, point: Vec3) -> bool {
        self.physics
            .linecast(self.viewport.position(), point)
            .is_none_or(|hit| self.targets.contains(hit.entity))
    }

    /// Picks the target closest to the character's facing.
    ///
    /// Candidates outside the view angle or hidden behind world geometry are
    /// skipped. Other targets in the way don't hide a candidate, so the
    /// camera can lock through a crowd.
    pub fn find_target(&self, config: &CameraConfig) -> Option<Entity> {
        let mut best: Option<(Entity, f32)> = None;

        for entity in self.candidates(config) {
            let Some(entry) = self.targets.get(entity) else {
                continue;
            };

            let to_target = entry.lock_point - self.character_position;
            if to_target.length_squared() < 1.0e-6 {
                continue;
            }
            let angle = self.character_forward.angle_between(to_target).to_degrees();
            if angle > config.lock_on_view_angle {
                continue;
            }
            if !self.sight_line_clear(entry.lock_point) {
                continue;
            }

            if best.is_none_or(|(_, best_angle)| angle < best_angle) {
                best = Some((entity, angle));
            }
        }

        best.map(|(entity, _)| entity)
    }

    /// Picks the next target to one side of `current`, preferring the one
    /// closest to the center of the screen.
    pub fn switch_target(
        &self,
        current: Entity,
        direction: SwitchDirection,
        config: &CameraConfig,
    ) -> Option<Entity> {
        let current_position = self.targets.get(current)?.position;
        let side = match direction {
            SwitchDirection::Left => -self.camera_right,
            SwitchDirection::Right => self.camera_right,
        };

        let mut best: Option<(Entity, f32)> = None;

        for entity in self.candidates(config) {
            if entity == current {
                continue;
            }
            let Some(entry) = self.targets.get(entity) else {
                continue;
            };

            let offset = (entry.position - current_position).normalize_or_zero();
            if offset.dot(side) < SWITCH_SIDE_DOT {
                continue;
            }
            if !self.is_valid(entity, config) {
                continue;
            }
            let Some(screen) = self.viewport.world_to_viewport(entry.lock_point) else {
                continue;
            };

            let score = (screen.x - 0.5).abs();
            if best.is_none_or(|(_, best_score)| score < best_score) {
                best = Some((entity, score));
            }
        }

        best.map(|(entity, _)| entity)
    }

    /// A target stays lockable while it is alive, within the lock radius,
    /// visible from the camera and on screen.
    pub fn is_valid(&self, target: Entity, config: &CameraConfig) -> bool {
        let Some(entry) = self.targets.get(target) else {
            return false;
        };

        entry.position.distance(self.character_position) <= config.lock_on_radius
            && self.sight_line_clear(entry.lock_point)
            && self.viewport.is_on_screen(entry.lock_point)
    }
}
