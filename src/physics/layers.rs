use avian3d::prelude::*;

/// Collision layers.
///
/// Ground probes and the camera boom only see `World`; lock-on sight lines
/// see `World` and `Target`, so other targets never hide a candidate.
#[derive(PhysicsLayer, Default, Clone, Copy, Debug)]
pub enum GameLayer {
    #[default]
    Default,
    /// The controlled character
    Player,
    /// Static level geometry: floors, ramps, walls, cover
    World,
    /// Lock-on targets
    Target,
    /// Sensors the character passes through
    Trigger,
}
