//! Collision detection: the obstacle signed distance field and obstacle/obstacle contacts.

pub mod contact;
pub mod sdf;

pub use contact::{apply_contact_forces, find_contacts, resolve_overlaps, ObstacleContact};
pub use sdf::{combine, ObstacleProbe, SignedDistanceField};
