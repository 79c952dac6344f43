//! Role discovery over planning state spaces.
//!
//! A *role* is a binary relation between objects. Primitive roles are the
//! binary predicates observed in states; derived roles are built from them
//! with intersection, composition and transitive closure.
//!
//! Processing happens in three phases:
//! 1. [`StateRelations::global`] unions every predicate over all states.
//! 2. [`RoleCatalog::discover`] closes the global relations under the three
//!    operators until no new non-empty relation appears, naming each accepted
//!    relation after the operator that produced it.
//! 3. [`derive_all`] evaluates every definition against the relations of each
//!    individual state.
//!
//! ```text
//!   facts ──► StateRelations ──global()──► RoleCatalog::discover
//!                  │                              │
//!                  └──────────► derive_all ◄──────┘ ──► write_derived
//! ```
pub mod catalog;
pub mod error;
pub mod evaluate;
pub mod relation;
pub mod universe;

pub use catalog::{ClosureOptions, ClosureStatus, RoleCatalog, RoleDefinition, RoleId, RoleOp};
pub use error::{Error, RoleResult};
pub use evaluate::{DerivedRelation, RoleEvaluator, StateRelations, derive_all, write_derived};
pub use relation::Relation;
pub use universe::{Object, ObjectUniverse};
