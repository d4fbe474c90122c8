use avian3d::prelude::*;
use bevy::prelude::*;

/// Rate of the fixed tick that runs ground sensing and locomotion
pub const PHYSICS_HZ: f64 = 60.0;

/// Plugin that sets up Avian3d and the fixed physics tick
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default().with_length_unit(1.0));

        app.insert_resource(Time::<Fixed>::from_hz(PHYSICS_HZ));

        // Engine gravity; airborne bodies get the controller's extra pull on top
        app.insert_resource(Gravity(Vec3::NEG_Y * 9.81));
    }
}
