//! DTO modules that bridge the controllers with front-ends.

pub mod orders;
