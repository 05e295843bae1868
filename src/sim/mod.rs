//! Physics boundary module
//!
//! Gameplay treats physics as an external collaborator behind `PhysicsWorld`.
//! `World` is the deterministic reference implementation:
//! - Fixed timestep only
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod contact;
pub mod world;

pub use body::{Body, BodyId, BodyKind};
pub use collision::{CollisionResult, aabb_collision, aabb_contains, aabb_overlap};
pub use contact::{ContactEvent, ContactPhase, ContactTracker};
pub use world::{CONTACT_SKIN, PhysicsWorld, World, WorldTuning};
