use crate::counter::Counter;
use crate::diagram::{DiagramConfig, Edge, Node, RuleFailure, StateTransitionDiagrams};
use crate::error::{BnglError, Result};
use crate::extraction::{AtomicPattern, RuleTransformations, extract_rule, solve_wildcards};
use crate::model::{MoleculeType, RuleView, find_molecule_type, resolve_rate, slot_label};
use computation_process::Incomplete::Suspended;
use computation_process::{Completable, ComputationStep};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Internal state of [`crate::diagram::StateTransitionBuilder`]: the rules that still need
/// to be aggregated and the diagrams built so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagramState {
    pending: VecDeque<std::result::Result<RuleTransformations, RuleFailure>>,
    output: StateTransitionDiagrams,
}

/// Step implementation that aggregates a single rule per call.
pub struct AggregateRuleStep;

impl DiagramState {
    /// Extract every rule independently. Rules that fail to extract are queued as
    /// failures and reported in the output without stopping the other rules.
    ///
    /// Wildcard bonds are resolved up front against the patterns of all extracted rules.
    pub fn new<R: RuleView>(rules: &[R], differentiate_dimers: bool) -> DiagramState {
        let pending: VecDeque<_> = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                extract_rule(index, rule, differentiate_dimers).map_err(|error| RuleFailure {
                    rule_index: index,
                    label: rule.display_label(),
                    error,
                })
            })
            .collect();

        let mut atomic_patterns = BTreeMap::new();
        for rule in pending.iter().flatten() {
            atomic_patterns.extend(rule.atomic_patterns.clone());
        }
        let output = StateTransitionDiagrams {
            wildcard_resolutions: solve_wildcards(&atomic_patterns),
            ..Default::default()
        };
        DiagramState { pending, output }
    }

    /// Number of rules not yet aggregated.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ComputationStep<DiagramConfig, DiagramState, StateTransitionDiagrams> for AggregateRuleStep {
    fn step(
        context: &DiagramConfig,
        state: &mut DiagramState,
    ) -> Completable<StateTransitionDiagrams> {
        let Some(next) = state.pending.pop_front() else {
            info!(
                "Built diagrams for {} molecule types ({} failed rules).",
                state.output.diagrams.len(),
                state.output.failures.len()
            );
            return Ok(state.output.clone());
        };

        let rule = match next {
            Ok(rule) => rule,
            Err(failure) => {
                warn!("Skipping rule `{}`: {}", failure.label, failure.error);
                state.output.failures.push(failure);
                return Err(Suspended);
            }
        };

        if context.exclude_reverse && rule.reverse {
            debug!("Skipping reverse rule `{}`.", rule.label);
            return Err(Suspended);
        }

        match aggregate_rule(context, &rule) {
            Ok(edges) => {
                debug!(
                    "Rule `{}` contributes {} edges; {} rules remaining.",
                    rule.label,
                    edges.len(),
                    state.pending.len()
                );
                for (molecule, edge) in edges {
                    state
                        .output
                        .diagrams
                        .entry(molecule)
                        .or_default()
                        .add_edge(edge);
                }
                if rule.double_modification {
                    state.output.double_modification_rules.push(rule.label);
                }
            }
            Err(error) => {
                warn!("Skipping rule `{}`: {}", rule.label, error);
                state.output.failures.push(RuleFailure {
                    rule_index: rule.index,
                    label: rule.label,
                    error,
                });
            }
        }
        Err(Suspended)
    }
}

/// Per-molecule counts of active component occurrences, keyed by declared molecule name.
type ActivityCounters = BTreeMap<String, Counter<String>>;

/// Aggregate all actions of one rule into one edge per molecule type the rule changes.
///
/// The first action seeds the source counters with its reaction center and provides the
/// context of the whole rule. Reaction centers of later actions are collected separately:
/// they are already part of the first action's context, which is folded into both the
/// source and the destination, so they are subtracted from the destination afterwards
/// to count each transition exactly once. Product centers of all actions accumulate
/// into the destination.
///
/// A site touched by several actions is credited by the first of them only: later actions
/// contribute just their fresh centers and fresh products (see
/// [`crate::extraction::ActionTransformation::fresh_center`]).
///
/// Molecules that only appear in the context get no edge. Either all edges of the rule
/// are returned, or an error describing the first undeclared molecule or component.
pub fn aggregate_rule(
    config: &DiagramConfig,
    rule: &RuleTransformations,
) -> Result<Vec<(String, Edge)>> {
    let mut source = ActivityCounters::new();
    let mut destination = ActivityCounters::new();
    let mut deferred_source = ActivityCounters::new();
    let mut changed: BTreeSet<String> = BTreeSet::new();
    let mut rule_context: Option<&Counter<AtomicPattern>> = None;

    for (i, action) in rule.actions.iter().enumerate() {
        if i == 0 {
            credit(config, rule, &mut source, &action.center)?;
            rule_context = Some(&action.context);
        } else {
            credit(config, rule, &mut deferred_source, &action.fresh_center)?;
        }
        credit(config, rule, &mut destination, &action.fresh_product)?;

        for pattern in action.center.keys().chain(action.product.keys()) {
            changed.insert(declared(config, rule, &pattern.subject.molecule)?.name.clone());
        }
    }

    if let Some(rule_context) = rule_context {
        credit(config, rule, &mut source, rule_context)?;
        credit(config, rule, &mut destination, rule_context)?;
    }
    for (molecule, counter) in &deferred_source {
        if let Some(target) = destination.get_mut(molecule) {
            target.subtract(counter);
        }
    }

    let rate = rule
        .rates
        .iter()
        .map(|r| resolve_rate(&config.parameters, r))
        .collect::<Vec<_>>()
        .join(",");

    let mut edges = Vec::new();
    for molecule in changed {
        let molecule_type = declared(config, rule, &molecule)?;
        let edge = Edge {
            source: activity_node(molecule_type, source.get(&molecule)),
            destination: activity_node(molecule_type, destination.get(&molecule)),
            label: rule.label.clone(),
            rate: rate.clone(),
        };
        edges.push((molecule, edge));
    }
    Ok(edges)
}

/// Build the activity signature of a molecule type: the `i`-th occurrence of a component
/// name is active iff more than `i` occurrences of it are counted as active.
pub fn activity_node(molecule: &MoleculeType, counts: Option<&Counter<String>>) -> Node {
    let mut slots = Vec::with_capacity(molecule.components.len());
    for (name, occurrences) in molecule.component_occurrences() {
        let active = counts.map(|c| c.get(name)).unwrap_or(0);
        slots.extend((0..occurrences).map(|i| (slot_label(name, i), active > i)));
    }
    slots.sort();
    Node(slots)
}

fn declared<'a>(
    config: &'a DiagramConfig,
    rule: &RuleTransformations,
    molecule: &str,
) -> Result<&'a MoleculeType> {
    find_molecule_type(&config.molecules, molecule).ok_or_else(|| BnglError::UnknownMolecule {
        rule: rule.label.clone(),
        molecule: molecule.to_string(),
    })
}

/// Count the active patterns of `patterns` against their subject component.
fn credit(
    config: &DiagramConfig,
    rule: &RuleTransformations,
    counters: &mut ActivityCounters,
    patterns: &Counter<AtomicPattern>,
) -> Result<()> {
    for (pattern, count) in patterns.iter() {
        let subject = &pattern.subject;
        let molecule = declared(config, rule, &subject.molecule)?;
        if molecule.component(&subject.component).is_none() {
            return Err(BnglError::UnknownComponent {
                rule: rule.label.clone(),
                molecule: molecule.name.clone(),
                component: subject.component.clone(),
            });
        }
        if pattern.is_active() {
            counters
                .entry(molecule.name.clone())
                .or_default()
                .add_n(subject.component.clone(), count);
        }
    }
    Ok(())
}
