//! Core types for Aperture.
//!
//! Type-safe wrappers for the domain concepts shared between crates.

pub mod email;
pub mod id;
pub mod money;
pub mod slug;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::minor_units;
pub use slug::slugify;
