//! Structural and process similarity between two rule-based models.
//!
//! *Structural* similarity compares declarations: shared molecule types and, among those,
//! shared stateful components. *Process* similarity compares behaviour: for every molecule
//! type present in both models, which activity signatures the state transition diagrams
//! of the two models actually visit.

#[cfg(test)]
mod tests;

use crate::diagram::{DiagramConfig, Node, StateTransitionDiagrams, build_state_transition_diagrams};
use crate::model::{Model, MoleculeType, find_molecule_type};
use cancel_this::Cancellable;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// Overlap of two sets of molecule declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureSimilarity {
    pub overlap: usize,
    pub total: usize,
}

impl StructureSimilarity {
    /// `overlap / total`, or `None` if there is nothing to compare.
    pub fn score(&self) -> Option<f64> {
        ratio(self.overlap, self.total)
    }
}

/// Process similarity of a single molecule type shared by two models.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessScore {
    /// Number of distinct signatures observed in the first model.
    pub file1: usize,
    /// Number of distinct signatures observed in the second model.
    pub file2: usize,
    /// Number of possible signatures over the shared components (`2^n`).
    pub total_space: f64,
    /// Signatures observed only in the first model.
    pub only_in_first: BTreeSet<Node>,
    /// Signatures observed only in the second model.
    pub only_in_second: BTreeSet<Node>,
    /// Fraction of the first model's signatures also observed in the second one.
    /// `None` if the first model has no signatures ("no comparable data").
    pub score: Option<f64>,
    /// Fraction of the second model's signatures also observed in the first one.
    pub score2: Option<f64>,
}

/// Count shared molecule types and, among shared molecule types, shared components that
/// declare at least one state. Names are compared case-insensitively.
pub fn evaluate_structure_similarity(
    first: &[MoleculeType],
    second: &[MoleculeType],
) -> StructureSimilarity {
    let first_names = lowercase_names(first.iter().map(|m| m.name.as_str()));
    let second_names = lowercase_names(second.iter().map(|m| m.name.as_str()));

    let mut overlap = first_names.intersection(&second_names).count();
    let mut total = first_names.union(&second_names).count();

    for molecule in first {
        let Some(other) = find_molecule_type(second, &molecule.name) else {
            continue;
        };
        let first_components = stateful_components(molecule);
        let second_components = stateful_components(other);
        overlap += first_components.intersection(&second_components).count();
        total += first_components.union(&second_components).count();
    }

    StructureSimilarity { overlap, total }
}

/// Build the state transition diagrams of both models and compare them.
///
/// Both models are aggregated with the same `exclude_reverse` and `differentiate_dimers`
/// settings; rule failures of either model are logged and otherwise ignored.
pub fn evaluate_process_similarity(
    first: &Model,
    second: &Model,
    exclude_reverse: bool,
    differentiate_dimers: bool,
) -> Cancellable<BTreeMap<String, ProcessScore>> {
    let configure = |model: &Model| {
        DiagramConfig::from(model)
            .with_exclude_reverse(exclude_reverse)
            .with_differentiate_dimers(differentiate_dimers)
    };
    let first_diagrams = build_state_transition_diagrams(first, &configure(first))?;
    let second_diagrams = build_state_transition_diagrams(second, &configure(second))?;
    Ok(compare_diagrams(
        (first.molecules.as_slice(), &first_diagrams),
        (second.molecules.as_slice(), &second_diagrams),
    ))
}

/// Compare already built diagrams. The result is keyed by the first model's
/// molecule type names and covers every molecule type declared in both models.
///
/// Slot labels are compared case-insensitively, so the reported signatures use
/// lowercase labels.
pub fn compare_diagrams(
    first: (&[MoleculeType], &StateTransitionDiagrams),
    second: (&[MoleculeType], &StateTransitionDiagrams),
) -> BTreeMap<String, ProcessScore> {
    let (first_molecules, first_diagrams) = first;
    let (second_molecules, second_diagrams) = second;

    let mut result = BTreeMap::new();
    for molecule in first_molecules {
        let Some(other) = find_molecule_type(second_molecules, &molecule.name) else {
            continue;
        };
        let first_labels = lowercase_names(molecule.slot_labels().iter().map(String::as_str));
        let other_labels = lowercase_names(other.slot_labels().iter().map(String::as_str));
        let shared: BTreeSet<String> = first_labels.intersection(&other_labels).cloned().collect();

        let first_signatures = signatures(first_diagrams, &molecule.name, &shared);
        let second_signatures = signatures(second_diagrams, &other.name, &shared);
        let only_in_first: BTreeSet<Node> = first_signatures
            .difference(&second_signatures)
            .cloned()
            .collect();
        let only_in_second: BTreeSet<Node> = second_signatures
            .difference(&first_signatures)
            .cloned()
            .collect();

        let score = ProcessScore {
            file1: first_signatures.len(),
            file2: second_signatures.len(),
            total_space: 2f64.powi(shared.len() as i32),
            score: coverage(only_in_first.len(), first_signatures.len()),
            score2: coverage(only_in_second.len(), second_signatures.len()),
            only_in_first,
            only_in_second,
        };
        match (score.score, score.score2) {
            (Some(s1), Some(s2)) => debug!(
                "Molecule `{}`: {} vs. {} signatures, score {:.3}/{:.3}.",
                molecule.name, score.file1, score.file2, s1, s2
            ),
            _ => debug!("Molecule `{}`: no comparable data.", molecule.name),
        }
        result.insert(molecule.name.clone(), score);
    }

    info!("Compared {} shared molecule types.", result.len());
    result
}

/// Distinct node signatures of a molecule's diagram restricted to the `shared` slots
/// (given in lowercase).
fn signatures(
    diagrams: &StateTransitionDiagrams,
    molecule: &str,
    shared: &BTreeSet<String>,
) -> BTreeSet<Node> {
    diagrams
        .diagram(molecule)
        .map(|d| d.nodes.iter().map(|n| lowercase_node(n, shared)).collect())
        .unwrap_or_default()
}

fn lowercase_node(node: &Node, shared: &BTreeSet<String>) -> Node {
    let mut slots: Vec<(String, bool)> = node
        .0
        .iter()
        .map(|(label, active)| (label.to_lowercase(), *active))
        .filter(|(label, _)| shared.contains(label))
        .collect();
    slots.sort();
    Node(slots)
}

/// `1 - unique / total`, guarded against empty sides.
fn coverage(unique: usize, total: usize) -> Option<f64> {
    ratio(unique, total).map(|r| 1.0 - r)
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

fn lowercase_names<'a>(names: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    names.map(str::to_lowercase).collect()
}

fn stateful_components(molecule: &MoleculeType) -> BTreeSet<String> {
    molecule
        .components
        .iter()
        .filter(|c| !c.states.is_empty())
        .map(|c| c.name.to_lowercase())
        .collect()
}
