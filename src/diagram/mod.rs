//! Per-molecule state transition diagrams (STDs).
//!
//! A diagram node is an *activity signature*: for every component occurrence of a molecule
//! type, whether it is active (bonded, or in a non-default state). Each rule that changes
//! a molecule contributes one edge from the signature before the rule to the signature
//! after it, labelled with the rule and its (resolved) rates.
//!
//! Construction runs as a [`Computation`] that consumes one rule per step:
//!
//! ```rust
//! use bngl_std::diagram::{DiagramConfig, DiagramState, StateTransitionBuilder};
//! use bngl_std::model::{Model, MoleculeType, Rule};
//! use computation_process::Algorithm;
//!
//! let model = Model {
//!     molecules: vec![MoleculeType::parse("A(x~0~P)").unwrap()],
//!     rules: vec![Rule::parse(Some("R1"), "A(x~0) -> A(x~P)", &["k1"]).unwrap()],
//!     parameters: Default::default(),
//! };
//! let config = DiagramConfig::from(&model);
//! let state = DiagramState::new(&model.rules, config.differentiate_dimers);
//! let diagrams = StateTransitionBuilder::run(config, state).unwrap();
//! assert_eq!(diagrams.diagrams["A"].edges.len(), 1);
//! ```

mod aggregate_step;
mod diagram_config;


pub use aggregate_step::{AggregateRuleStep, DiagramState, aggregate_rule};
pub use diagram_config::DiagramConfig;

use crate::error::BnglError;
use crate::extraction::AtomicPattern;
use crate::model::Model;
use cancel_this::Cancellable;
use computation_process::{Algorithm, Computation};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Builds [`StateTransitionDiagrams`] from a queue of rule transformations.
pub type StateTransitionBuilder =
    Computation<DiagramConfig, DiagramState, StateTransitionDiagrams, AggregateRuleStep>;

/// An activity signature: `(slot label, active)` pairs sorted by label.
///
/// Repeated component names are expanded into `name`, `name-2`, `name-3`, ... slots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node(pub Vec<(String, bool)>);

impl Node {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Activity of the given slot, if the node has it.
    pub fn is_active(&self, label: &str) -> Option<bool> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, a)| *a)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, (label, active)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", label, if *active { 1 } else { 0 })?;
        }
        write!(f, ")")
    }
}

/// A transition between two activity signatures of the same molecule type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub source: Node,
    pub destination: Node,
    /// Label of the rule that produced the transition.
    pub label: String,
    /// Comma-separated rate values (or symbolic names if unresolved).
    pub rate: String,
}

/// A pair of nodes connected in one or both directions, with the labels of all
/// edges between them. See [`StateTransitionDiagram::merged_edges`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedEdge {
    pub source: Node,
    pub destination: Node,
    pub labels: Vec<String>,
    pub bidirectional: bool,
}

/// The state transition diagram of a single molecule type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateTransitionDiagram {
    pub nodes: IndexSet<Node>,
    /// Distinct edges in first-seen order.
    pub edges: IndexSet<Edge>,
}

impl StateTransitionDiagram {
    /// Add an edge together with its endpoints. Returns false if the edge was already present.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        self.nodes.insert(edge.source.clone());
        self.nodes.insert(edge.destination.clone());
        self.edges.insert(edge)
    }

    /// Group edges by their (unordered) endpoint pair, in first-seen order.
    ///
    /// The first edge of each pair decides the reported direction. The pair is
    /// `bidirectional` when edges in both directions exist.
    pub fn merged_edges(&self) -> Vec<MergedEdge> {
        let mut merged: IndexMap<(&Node, &Node), MergedEdge> = IndexMap::new();
        for edge in &self.edges {
            let reversed = (&edge.destination, &edge.source);
            if let Some(existing) = merged.get_mut(&reversed) {
                if edge.source != edge.destination {
                    existing.bidirectional = true;
                }
                existing.labels.push(edge.label.clone());
                continue;
            }
            merged
                .entry((&edge.source, &edge.destination))
                .or_insert_with(|| MergedEdge {
                    source: edge.source.clone(),
                    destination: edge.destination.clone(),
                    labels: Vec::new(),
                    bidirectional: false,
                })
                .labels
                .push(edge.label.clone());
        }
        merged.into_values().collect()
    }
}

/// A rule that could not be aggregated. Other rules are not affected.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleFailure {
    pub rule_index: usize,
    pub label: String,
    pub error: BnglError,
}

/// State transition diagrams of all molecule types changed by a rule set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateTransitionDiagrams {
    /// Keyed by the declared molecule type name.
    pub diagrams: BTreeMap<String, StateTransitionDiagram>,
    pub failures: Vec<RuleFailure>,
    /// Labels of rules that modify more than one site at once.
    pub double_modification_rules: Vec<String>,
    /// Concrete bonds observed for each wildcard pattern (`A(s!+)`) of the rule set.
    pub wildcard_resolutions: BTreeMap<String, Vec<AtomicPattern>>,
}

impl StateTransitionDiagrams {
    pub fn diagram(&self, molecule: &str) -> Option<&StateTransitionDiagram> {
        self.diagrams.get(molecule)
    }
}

/// Extract and aggregate all rules of a model.
pub fn build_state_transition_diagrams(
    model: &Model,
    config: &DiagramConfig,
) -> Cancellable<StateTransitionDiagrams> {
    let state = DiagramState::new(&model.rules, config.differentiate_dimers);
    StateTransitionBuilder::run(config.clone(), state)
}
