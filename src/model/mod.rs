//! A minimal rule-object model for BNGL reaction rules.
//!
//! Parsing full BNGL or BNG-XML documents is the job of an external importer. This module
//! only provides the shapes the analysis consumes: molecule type declarations, species
//! patterns with site identifiers, and reaction rules with their atomic actions. The engine
//! itself reads rules through the [`RuleView`] trait, so a different rule representation
//! can be plugged in without touching the analysis.

mod rule;
mod species;

pub use rule::{Action, ActionKind, REVERSE_MARKER, Rule, RuleView};
pub use species::{Bond, Component, DEFAULT_STATE, Molecule, Species};

use crate::error::{BnglError, Result};
use std::collections::BTreeMap;

/// Declaration of one component slot of a molecule type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentType {
    pub name: String,
    /// Allowed discrete states. Empty for pure binding sites.
    pub states: Vec<String>,
}

/// Declaration of a molecule type, e.g. `A(x~0~P,y,y)`.
///
/// Component names can repeat (symmetric binding sites); every occurrence is a separate slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoleculeType {
    pub name: String,
    pub components: Vec<ComponentType>,
}

impl MoleculeType {
    /// Parse a molecule type declaration (`A(x~0~P,y,y)`).
    pub fn parse(text: &str) -> Result<MoleculeType> {
        let text = text.trim();
        let (name, body) = match text.split_once('(') {
            None => (text, ""),
            Some((name, rest)) => match rest.strip_suffix(')') {
                Some(body) => (name, body),
                None => return Err(BnglError::malformed(text, "missing closing parenthesis")),
            },
        };
        if name.is_empty() || body.contains(['(', ')', '!']) {
            return Err(BnglError::malformed(text, "invalid molecule type declaration"));
        }

        let mut components = Vec::new();
        for component in body.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let mut parts = component.split('~');
            let name = parts.next().unwrap_or_default();
            let states: Vec<String> = parts.map(str::to_string).collect();
            if name.is_empty() || states.iter().any(String::is_empty) {
                return Err(BnglError::malformed(
                    text,
                    format!("invalid component declaration `{}`", component),
                ));
            }
            components.push(ComponentType {
                name: name.to_string(),
                states,
            });
        }

        Ok(MoleculeType {
            name: name.to_string(),
            components,
        })
    }

    /// Distinct component names in declaration order, with their number of occurrences.
    pub fn component_occurrences(&self) -> Vec<(&str, usize)> {
        let mut result: Vec<(&str, usize)> = Vec::new();
        for component in &self.components {
            match result.iter_mut().find(|(name, _)| *name == component.name) {
                Some((_, count)) => *count += 1,
                None => result.push((component.name.as_str(), 1)),
            }
        }
        result
    }

    /// Slot labels for all component occurrences: repeated names get `-2`, `-3`, ... suffixes.
    pub fn slot_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        for (name, count) in self.component_occurrences() {
            labels.extend((0..count).map(|i| slot_label(name, i)));
        }
        labels.sort();
        labels
    }

    /// Find the declared component with the given name.
    pub fn component(&self, name: &str) -> Option<&ComponentType> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Label of the `index`-th (0-based) occurrence of a component name.
pub fn slot_label(name: &str, index: usize) -> String {
    if index == 0 {
        name.to_string()
    } else {
        format!("{}-{}", name, index + 1)
    }
}

/// A parsed model namespace: molecule declarations, reaction rules and the parameter table.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Model {
    pub molecules: Vec<MoleculeType>,
    pub rules: Vec<Rule>,
    /// Parameter name to its (textual) value.
    pub parameters: BTreeMap<String, String>,
}

impl Model {
    /// Find a molecule type by name. Molecule names are compared case-insensitively.
    pub fn molecule_type(&self, name: &str) -> Option<&MoleculeType> {
        find_molecule_type(&self.molecules, name)
    }
}

/// Case-insensitive molecule type lookup.
pub fn find_molecule_type<'a>(molecules: &'a [MoleculeType], name: &str) -> Option<&'a MoleculeType> {
    molecules.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Resolve a rate reference against a parameter table, falling back to the symbolic name.
pub fn resolve_rate(parameters: &BTreeMap<String, String>, rate: &str) -> String {
    parameters
        .get(rate)
        .cloned()
        .unwrap_or_else(|| rate.to_string())
}

#[cfg(test)]
mod tests {
    use crate::model::{MoleculeType, resolve_rate};
    use std::collections::BTreeMap;

    #[test]
    fn molecule_type_with_repeated_sites() {
        let egfr = MoleculeType::parse("EGFR(l,d,Y~0~P,Y~0~P)").unwrap();
        assert_eq!(egfr.components.len(), 4);
        assert_eq!(egfr.component_occurrences(), vec![("l", 1), ("d", 1), ("Y", 2)]);
        assert_eq!(egfr.slot_labels(), vec!["Y", "Y-2", "d", "l"]);
        assert_eq!(egfr.component("Y").unwrap().states, vec!["0", "P"]);
    }

    #[test]
    fn malformed_declaration() {
        assert!(MoleculeType::parse("A(x~0").is_err());
        assert!(MoleculeType::parse("A(x~)").is_err());
        assert!(MoleculeType::parse("(x)").is_err());
    }

    #[test]
    fn rate_resolution_falls_back_to_name() {
        let parameters = BTreeMap::from([("kf".to_string(), "0.5".to_string())]);
        assert_eq!(resolve_rate(&parameters, "kf"), "0.5");
        assert_eq!(resolve_rate(&parameters, "kr"), "kr");
    }
}
