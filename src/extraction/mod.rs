//! Decomposition of reaction rules into atomic transformations.
//!
//! For every action of a rule, the reactant species are split into the *reaction center*
//! (the sites the action touches) and the *context* (everything that must be present but
//! stays unchanged). The product side is decomposed the same way using the rule's site
//! mapping, but only its reaction center is kept: the product context is implied by the
//! reactant context and the transformation itself.
//!
//! The resulting [`RuleTransformations`] are the input of the state transition
//! diagram builder in [`crate::diagram`].

mod atomic_pattern;
mod wildcards;

#[cfg(test)]
mod tests;

pub use atomic_pattern::{AtomicPattern, PatternSite, SpeciesPatterns};
pub use wildcards::solve_wildcards;

use crate::counter::Counter;
use crate::error::{BnglError, Result};
use crate::model::{Action, ActionKind, RuleView, Species};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// The atomic decomposition of a single action of a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionTransformation {
    pub kind: ActionKind,
    /// `{action index}-{action kind}`, e.g. `1-StateChange`.
    pub name: String,
    /// `{reactants} -> {products}, {name}`.
    pub label: String,
    /// Reactant-side reaction center.
    pub center: Counter<AtomicPattern>,
    /// Reactant-side context.
    pub context: Counter<AtomicPattern>,
    /// Product-side reaction center.
    pub product: Counter<AtomicPattern>,
    /// Reactant-side reaction center restricted to the sites that no earlier action of the
    /// same rule touched.
    pub fresh_center: Counter<AtomicPattern>,
    /// Product-side reaction center restricted to the images of the same sites.
    pub fresh_product: Counter<AtomicPattern>,
}

/// All action decompositions of one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleTransformations {
    /// Position of the rule in the model.
    pub index: usize,
    /// Rule label (or the reaction text if the rule is unlabelled).
    pub label: String,
    pub reverse: bool,
    /// Rate parameter references of the rule.
    pub rates: Vec<String>,
    pub actions: Vec<ActionTransformation>,
    /// Set when more than one non-compartment action has a reaction center.
    pub double_modification: bool,
    pub atomic_patterns: BTreeMap<String, AtomicPattern>,
}

/// Decomposition of a whole rule set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transformations {
    pub rules: Vec<RuleTransformations>,
    /// Every atomic pattern seen in any rule, keyed by its BNGL text.
    pub atomic_patterns: BTreeMap<String, AtomicPattern>,
    /// Wildcard patterns (`A(s!+)`) resolved to the concrete bonds seen elsewhere.
    pub wildcard_resolutions: BTreeMap<String, Vec<AtomicPattern>>,
}

impl Transformations {
    /// Labels of rules that modify more than one site at once.
    pub fn double_modification_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.double_modification)
            .map(|r| r.label.as_str())
            .collect()
    }
}

/// Decompose every rule of a rule set. Fails on the first malformed rule.
pub fn extract_transformations<R: RuleView>(
    rules: &[R],
    differentiate_dimers: bool,
) -> Result<Transformations> {
    let mut result = Transformations::default();
    for (index, rule) in rules.iter().enumerate() {
        let transformations = extract_rule(index, rule, differentiate_dimers)?;
        result
            .atomic_patterns
            .extend(transformations.atomic_patterns.clone());
        result.rules.push(transformations);
    }
    result.wildcard_resolutions = solve_wildcards(&result.atomic_patterns);
    info!(
        "Extracted {} rules ({} atomic patterns, {} resolved wildcards).",
        result.rules.len(),
        result.atomic_patterns.len(),
        result.wildcard_resolutions.len()
    );
    Ok(result)
}

/// Decompose a single rule into per-action reaction centers and contexts.
pub fn extract_rule<R: RuleView>(
    index: usize,
    rule: &R,
    differentiate_dimers: bool,
) -> Result<RuleTransformations> {
    let label = rule.display_label();
    let reaction_text = rule.reaction_text();
    let mut atomic_patterns = BTreeMap::new();
    let mut actions = Vec::new();
    let mut touched: BTreeSet<&str> = BTreeSet::new();

    for (a_index, action) in rule.actions().iter().enumerate() {
        for site in action.sites() {
            if !contains_site(rule.reactants(), site) {
                return Err(BnglError::UnmappedSite {
                    rule: label.clone(),
                    site: site.to_string(),
                });
            }
        }

        let reactant_side = decompose(
            rule.reactants(),
            action.kind,
            &action.site1,
            action.site2.as_deref(),
            differentiate_dimers,
        )?;

        let mut product_sites = action.sites().filter_map(|s| rule.map_site(s));
        let product_side = match product_sites.next() {
            Some(site1) => decompose(
                rule.products(),
                action.kind,
                site1,
                product_sites.next(),
                differentiate_dimers,
            )?,
            None => SpeciesPatterns::default(),
        };

        let fresh: BTreeSet<&str> = center_components(rule.reactants(), action)
            .into_iter()
            .filter(|site| touched.insert(*site))
            .collect();
        let fresh_products: BTreeSet<&str> = fresh.iter().filter_map(|s| rule.map_site(s)).collect();
        let fresh_center = decompose_center(rule.reactants(), &fresh, differentiate_dimers)?;
        let fresh_product = decompose_center(rule.products(), &fresh_products, differentiate_dimers)?;

        let name = format!("{}-{}", a_index + 1, action.kind);
        atomic_patterns.extend(reactant_side.atomic_patterns);
        atomic_patterns.extend(product_side.atomic_patterns);
        actions.push(ActionTransformation {
            kind: action.kind,
            label: format!("{}, {}", reaction_text, name),
            name,
            center: reactant_side.center,
            context: reactant_side.context,
            product: product_side.center,
            fresh_center,
            fresh_product,
        });
    }

    let modifying = actions
        .iter()
        .filter(|a| a.kind != ActionKind::ChangeCompartment && !a.center.is_empty())
        .count();
    let double_modification = modifying > 1;
    if double_modification {
        debug!("Rule `{}` modifies {} sites at once.", label, modifying);
    }

    Ok(RuleTransformations {
        index,
        reverse: rule.is_reverse(),
        rates: rule.rates().to_vec(),
        label,
        actions,
        double_modification,
        atomic_patterns,
    })
}

fn decompose(
    species: &[Species],
    action: ActionKind,
    site1: &str,
    site2: Option<&str>,
    differentiate_dimers: bool,
) -> Result<SpeciesPatterns> {
    let mut result = SpeciesPatterns::default();
    for s in species {
        result.merge(s.extract_atomic_patterns(action, site1, site2, differentiate_dimers)?);
    }
    Ok(result)
}

/// Reactant component ids in the reaction center of `action`.
fn center_components<'a>(species: &'a [Species], action: &'a Action) -> Vec<&'a str> {
    if action.kind != ActionKind::ChangeCompartment {
        return action.sites().collect();
    }
    species
        .iter()
        .flat_map(|s| s.molecules.iter())
        .filter(|m| m.id == action.site1)
        .flat_map(|m| m.components.iter().map(|c| c.id.as_str()))
        .collect()
}

/// Patterns of the components whose id is in `sites`.
fn decompose_center(
    species: &[Species],
    sites: &BTreeSet<&str>,
    differentiate_dimers: bool,
) -> Result<Counter<AtomicPattern>> {
    let mut result = Counter::new();
    if sites.is_empty() {
        return Ok(result);
    }
    for s in species {
        let patterns = s.decompose_by(|_, c| sites.contains(c.id.as_str()), differentiate_dimers)?;
        result.extend_from(&patterns.center);
    }
    Ok(result)
}

fn contains_site(species: &[Species], site: &str) -> bool {
    species.iter().any(|s| {
        s.molecules
            .iter()
            .any(|m| m.id == site || m.components.iter().any(|c| c.id == site))
    })
}
