//! Timing and ordering primitives shared by the controllers.

pub mod clock;
pub mod debounce;
pub mod sequence;
