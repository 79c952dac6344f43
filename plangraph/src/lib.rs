//! Explicit state-space graphs for planning domains.
//!
//! The crate explores the reachable part of a transition system supplied by a
//! [`model::TransitionModel`], deduplicates states by a content-addressed
//! [`identity::StateId`], labels every state with its shortest distance to a
//! goal and reads/writes the line-oriented fact vocabulary consumed by
//! external solvers. Most consumers start from [`explorer::StateSpaceExplorer`]
//! and [`facts::FactWriter`].

pub mod config;
pub mod distance;
pub mod explorer;
pub mod facts;
pub mod graph;
pub mod identity;
pub mod magic;
pub mod model;
pub mod utils;

pub use utils::error::{Error, PgResult};
