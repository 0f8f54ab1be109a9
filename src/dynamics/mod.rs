//! Simulation dynamics: per-blob forces, obstacle motion, pointer drag and integration.

pub mod drag;
pub mod forces;
pub mod friction;
pub mod integrator;
pub mod obstacles;

pub use drag::{pick_drag_target, DragNode, DragTarget, PointerState};
pub use forces::{
    BendingForce, BlobForce, CollisionForce, ForceContext, ForceRegistry, GravityForce,
    PressureForce, SelfRepulsionForce, SpringNetworkForce, ViscosityForce,
};
pub use friction::RimFrictionForce;
pub use integrator::Integrator;
pub use obstacles::{step_obstacles, ObstacleStepReport};
