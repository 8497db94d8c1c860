//! fsi-core: shared vocabulary for the fluid–structure model builder.
//!
//! Contains:
//! - order (discretization order levels and their labels)
//! - element (supported element kinds)
//! - domain (physical domains and boundary-patch roles)
//! - error (shared error types)

pub mod domain;
pub mod element;
pub mod error;
pub mod order;

// Re-exports: nice ergonomics for downstream crates
pub use domain::{Domain, PatchRole};
pub use element::ElementKind;
pub use error::{CoreError, CoreResult};
pub use order::OrderLevel;
