use crate::model::{Model, MoleculeType};
use std::collections::BTreeMap;

/// A configuration object for state transition diagram construction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagramConfig {
    /// Declared molecule types. Every node of a molecule's diagram has one entry per
    /// component occurrence declared here.
    pub molecules: Vec<MoleculeType>,
    /// Parameter table used to resolve rate references into edge rate labels.
    pub parameters: BTreeMap<String, String>,
    /// Skip rules whose label carries the reverse marker (default: false), so that
    /// reversible rules do not contribute a mirrored edge for each direction.
    pub exclude_reverse: bool,
    /// Keep the two ends of a homotypic bond (A-A dimers) as separate atomic
    /// patterns (default: true).
    pub differentiate_dimers: bool,
}

impl From<&Model> for DiagramConfig {
    fn from(value: &Model) -> Self {
        DiagramConfig::new(value.molecules.clone(), value.parameters.clone())
    }
}

impl From<Model> for DiagramConfig {
    fn from(value: Model) -> Self {
        DiagramConfig::new(value.molecules, value.parameters)
    }
}

impl DiagramConfig {
    /// Create a new [`DiagramConfig`] that keeps reverse rules and differentiates dimers.
    pub fn new(molecules: Vec<MoleculeType>, parameters: BTreeMap<String, String>) -> Self {
        DiagramConfig {
            molecules,
            parameters,
            exclude_reverse: false,
            differentiate_dimers: true,
        }
    }

    pub fn with_exclude_reverse(mut self, exclude_reverse: bool) -> Self {
        self.exclude_reverse = exclude_reverse;
        self
    }

    pub fn with_differentiate_dimers(mut self, differentiate_dimers: bool) -> Self {
        self.differentiate_dimers = differentiate_dimers;
        self
    }
}
