// [libs/core/models/src/lib.rs]
//! Shared types for the podcache fleet.
//!
//! This crate has no I/O of its own: it holds the plain data that the
//! pod, worker, and coordination-store crates all need to agree on, so
//! that a change to the wire shape of a pod descriptor or to the rules
//! for a valid logical path happens in exactly one place.

pub mod descriptor;
pub mod path;

pub use descriptor::PodDescriptor;
pub use path::is_safe_logical_path;

pub mod prelude {
    pub use crate::descriptor::PodDescriptor;
    pub use crate::path::is_safe_logical_path;
}
