//! Utility helpers: geometry on top of `glam`, the generational arena, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, Handle};
pub use math::*;
