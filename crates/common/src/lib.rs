//! Shared types for the prism scene core: object identity, id sentinels and
//! small math helpers used by intersection code.

pub mod math;
pub mod types;

pub use math::{Aabb, Interval};
pub use types::{INVALID_ID, ObjectId, is_valid_id};
