use bevy::prelude::*;

/// World to normalized viewport projection for one camera.
///
/// Viewport coordinates run from (0, 0) at the bottom-left to (1, 1) at the
/// top-right; the third component is the view depth, positive in front of
/// the camera.
///
/// `Camera::world_to_viewport` needs a live render target and drops points
/// behind the camera, so selection projects through a captured matrix instead.
#[derive(Debug, Clone, Copy)]
pub struct ViewProjection {
    clip_from_world: Mat4,
    position: Vec3,
}

impl ViewProjection {
    pub fn new(clip_from_view: Mat4, camera_transform: &GlobalTransform) -> Self {
        let world_from_view = Mat4::from(camera_transform.affine());
        Self {
            clip_from_world: clip_from_view * world_from_view.inverse(),
            position: camera_transform.translation(),
        }
    }

    pub fn from_camera(camera: &Camera, camera_transform: &GlobalTransform) -> Self {
        Self::new(camera.clip_from_view(), camera_transform)
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Projects a world point. `None` when the projection is degenerate
    /// (a camera whose projection has not been computed yet).
    pub fn world_to_viewport(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.clip_from_world * point.extend(1.0);
        if clip.w.abs() < 1.0e-6 {
            return None;
        }

        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5, clip.w))
    }

    /// Strictly inside the viewport and in front of the camera.
    pub fn is_on_screen(&self, point: Vec3) -> bool {
        self.world_to_viewport(point).is_some_and(|v| {
            v.z > 0.0 && v.x > 0.0 && v.x < 1.0 && v.y > 0.0 && v.y < 1.0
        })
    }
}
