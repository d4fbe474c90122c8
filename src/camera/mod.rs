mod lock_on;
mod plugin;
mod rig;
mod targets;
mod viewport;

pub use lock_on::*;
pub use plugin::{spawn_camera, CameraPlugin};
pub use rig::*;
pub use targets::*;
pub use viewport::ViewProjection;
