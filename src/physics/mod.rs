pub mod ground;
mod layers;
mod plugin;
pub mod query;
pub mod spatial;

pub use ground::*;
pub use layers::GameLayer;
pub use plugin::{PhysicsPlugin, PHYSICS_HZ};
pub use query::{CapsuleShape, PhysicsQuery, QueryHit};
pub use spatial::AvianQuery;
