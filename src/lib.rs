//! Context extraction and state transition diagrams for rule-based (BNGL) models.
//!
//! The pipeline has three stages:
//!  - [`extraction`] decomposes every action of every rule into its reaction center
//!    and context, as counted multisets of atomic patterns.
//!  - [`diagram`] aggregates these per rule into a state transition diagram for every
//!    molecule type: nodes are activity signatures, edges are rule-labelled transitions.
//!  - [`similarity`] compares the declarations and diagrams of two models.
//!
//! Rules are consumed through the [`model::RuleView`] trait, so any rule representation
//! with reactants, products, actions, a site mapping and rates can be analysed.

#[cfg(test)]
mod test_utils;

pub mod counter;
pub mod diagram;
pub mod error;
pub mod extraction;
pub mod model;
pub mod similarity;

pub use error::{BnglError, Result};
