use crate::error::{BnglError, Result};
use crate::model::species::split_top_level;
use crate::model::{Bond, Molecule, Species};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Label fragment used by BioNetGen to name the reverse direction of a reversible rule.
pub const REVERSE_MARKER: &str = "_reverse_";

/// The kind of atomic transformation performed by an [`Action`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    AddBond,
    DeleteBond,
    StateChange,
    ChangeCompartment,
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::AddBond => "AddBond",
            ActionKind::DeleteBond => "DeleteBond",
            ActionKind::StateChange => "StateChange",
            ActionKind::ChangeCompartment => "ChangeCompartment",
        };
        write!(f, "{}", name)
    }
}

/// One atomic transformation of a rule, operating on one or two reactant sites.
///
/// Sites are component ids, except for [`ActionKind::ChangeCompartment`], where `site1`
/// is a molecule id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub kind: ActionKind,
    pub site1: String,
    pub site2: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind, site1: &str, site2: Option<&str>) -> Action {
        Action {
            kind,
            site1: site1.to_string(),
            site2: site2.map(str::to_string),
        }
    }

    pub fn sites(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.site1.as_str()).chain(self.site2.as_deref())
    }
}

/// The capabilities the analysis needs from a parsed reaction rule.
pub trait RuleView {
    /// The rule name, if the model supplied one.
    fn label(&self) -> Option<&str>;
    fn reactants(&self) -> &[Species];
    fn products(&self) -> &[Species];
    /// Atomic actions in declared order.
    fn actions(&self) -> &[Action];
    /// Translate a reactant site id to the corresponding product site id.
    fn map_site(&self, site: &str) -> Option<&str>;
    /// Rate parameter references.
    fn rates(&self) -> &[String];

    /// `reactants -> products`, used when the rule has no label.
    fn reaction_text(&self) -> String {
        format!(
            "{} -> {}",
            join_species(self.reactants()),
            join_species(self.products())
        )
    }

    /// The rule label, or the reaction text for unlabelled rules.
    fn display_label(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => self.reaction_text(),
        }
    }

    /// True if this rule is the reverse direction of a reversible rule.
    fn is_reverse(&self) -> bool {
        self.label().is_some_and(|l| l.contains(REVERSE_MARKER))
    }
}

fn join_species(species: &[Species]) -> String {
    if species.is_empty() {
        return "0".to_string();
    }
    species
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// A reaction rule with explicit actions and reactant-to-product site mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    pub label: Option<String>,
    pub reactants: Vec<Species>,
    pub products: Vec<Species>,
    pub actions: Vec<Action>,
    /// Reactant site id (component or molecule) to product site id.
    pub mapping: BTreeMap<String, String>,
    pub rates: Vec<String>,
}

impl RuleView for Rule {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn reactants(&self) -> &[Species] {
        &self.reactants
    }

    fn products(&self) -> &[Species] {
        &self.products
    }

    fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn map_site(&self, site: &str) -> Option<&str> {
        self.mapping.get(site).map(String::as_str)
    }

    fn rates(&self) -> &[String] {
        &self.rates
    }
}

impl Rule {
    /// Parse a unidirectional rule (`A(x~0) -> A(x~P)`), inferring the site mapping and
    /// the atomic actions from the reactant and product patterns.
    ///
    /// Reactant sites are named `R{s}_M{m}_C{c}`, product sites `P{s}_M{m}_C{c}`.
    pub fn parse(label: Option<&str>, text: &str, rates: &[&str]) -> Result<Rule> {
        let Some((reactants, products)) = text.split_once("->") else {
            return Err(BnglError::malformed(text, "missing `->` in rule"));
        };
        if reactants.ends_with('<') {
            return Err(BnglError::malformed(
                text,
                "reversible rules must be parsed with `Rule::parse_reaction`",
            ));
        }
        Rule::from_sides(
            label.map(str::to_string),
            reactants,
            products,
            rates.iter().map(|r| r.to_string()).collect(),
        )
    }

    /// Parse a uni- or bidirectional reaction. A reversible reaction (`<->`) produces the
    /// forward rule and a reverse rule labelled `_reverse_{label}`; the first rate belongs
    /// to the forward direction and the second to the reverse one.
    pub fn parse_reaction(label: Option<&str>, text: &str, rates: &[&str]) -> Result<Vec<Rule>> {
        let Some((reactants, products)) = text.split_once("<->") else {
            return Ok(vec![Rule::parse(label, text, rates)?]);
        };
        let forward_rates = rates.iter().take(1).map(|r| r.to_string()).collect();
        let reverse_rates = rates.iter().skip(1).take(1).map(|r| r.to_string()).collect();
        let forward = Rule::from_sides(label.map(str::to_string), reactants, products, forward_rates)?;
        let reverse = Rule::from_sides(
            Some(format!("{}{}", REVERSE_MARKER, label.unwrap_or_default())),
            products,
            reactants,
            reverse_rates,
        )?;
        Ok(vec![forward, reverse])
    }

    fn from_sides(
        label: Option<String>,
        reactants: &str,
        products: &str,
        rates: Vec<String>,
    ) -> Result<Rule> {
        let reactants = parse_side(reactants, "R")?;
        let products = parse_side(products, "P")?;
        let mapping = infer_mapping(&reactants, &products);
        let mut rule = Rule {
            label,
            reactants,
            products,
            actions: Vec::new(),
            mapping,
            rates,
        };
        rule.actions = infer_actions(&rule);
        Ok(rule)
    }
}

fn parse_side(text: &str, prefix: &str) -> Result<Vec<Species>> {
    let text = text.trim();
    if text == "0" || text.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(text, '+')
        .into_iter()
        .enumerate()
        .map(|(i, s)| Species::parse(s, &format!("{}{}", prefix, i + 1)))
        .collect()
}

fn molecules(species: &[Species]) -> impl Iterator<Item = &Molecule> {
    species.iter().flat_map(|s| s.molecules.iter())
}

/// The n-th occurrence of a molecule name on the reactant side maps to the n-th occurrence
/// on the product side. Components map by name and occurrence within the molecule.
fn infer_mapping(reactants: &[Species], products: &[Species]) -> BTreeMap<String, String> {
    let mut mapping = BTreeMap::new();
    let mut used: BTreeSet<&str> = BTreeSet::new();
    for reactant in molecules(reactants) {
        let target = molecules(products).find(|m| m.name == reactant.name && !used.contains(m.id.as_str()));
        let Some(target) = target else {
            continue;
        };
        used.insert(target.id.as_str());
        mapping.insert(reactant.id.clone(), target.id.clone());

        let mut used_components: BTreeSet<&str> = BTreeSet::new();
        for component in &reactant.components {
            let product_component = target
                .components
                .iter()
                .find(|c| c.name == component.name && !used_components.contains(c.id.as_str()));
            if let Some(product_component) = product_component {
                used_components.insert(product_component.id.as_str());
                mapping.insert(component.id.clone(), product_component.id.clone());
            }
        }
    }
    mapping
}

/// Find the species that owns a component or molecule site.
fn owning_species<'a>(species: &'a [Species], site: &str) -> Option<&'a Species> {
    species.iter().find(|s| {
        s.molecules
            .iter()
            .any(|m| m.id == site || m.components.iter().any(|c| c.id == site))
    })
}

/// The sites a numbered-bond component is bound to within its own species.
fn bond_partners<'a>(species: &'a [Species], site: &str) -> Vec<&'a str> {
    let Some(owner) = owning_species(species, site) else {
        return Vec::new();
    };
    let Some((_, component)) = owner.find_site(site) else {
        return Vec::new();
    };
    component
        .bonds
        .iter()
        .filter_map(|b| match b {
            Bond::Numbered(label) => owner.bond_partner(*label, site).map(|(_, c)| c.id.as_str()),
            Bond::Wildcard => None,
        })
        .collect()
}

fn infer_actions(rule: &Rule) -> Vec<Action> {
    let reverse: BTreeMap<&str, &str> = rule
        .mapping
        .iter()
        .map(|(r, p)| (p.as_str(), r.as_str()))
        .collect();

    let mut actions = Vec::new();
    let mut seen_bonds: BTreeSet<(String, String)> = BTreeSet::new();
    let mut bond_key = |a: &str, b: &str| {
        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        seen_bonds.insert(key)
    };

    for molecule in molecules(&rule.reactants) {
        let Some(product_molecule_id) = rule.map_site(&molecule.id) else {
            continue;
        };
        let product_molecule = molecules(&rule.products).find(|m| m.id == product_molecule_id);

        for component in &molecule.components {
            let Some(product_site) = rule.map_site(&component.id) else {
                continue;
            };
            let product_component = product_molecule
                .and_then(|m| m.components.iter().find(|c| c.id == product_site));
            let Some(product_component) = product_component else {
                continue;
            };

            if let (Some(before), Some(after)) = (&component.state, &product_component.state) {
                if before != after {
                    actions.push(Action::new(ActionKind::StateChange, &component.id, None));
                }
            }

            let before: Vec<&str> = bond_partners(&rule.reactants, &component.id);
            let after: Vec<&str> = bond_partners(&rule.products, product_site)
                .into_iter()
                .filter_map(|p| reverse.get(p).copied())
                .collect();

            for partner in before.iter().filter(|p| !after.contains(*p)) {
                if bond_key(&component.id, partner) {
                    actions.push(Action::new(
                        ActionKind::DeleteBond,
                        &component.id,
                        Some(*partner),
                    ));
                }
            }
            for partner in after.iter().filter(|p| !before.contains(*p)) {
                if bond_key(&component.id, partner) {
                    actions.push(Action::new(ActionKind::AddBond, &component.id, Some(*partner)));
                }
            }
        }

        if let Some(product_molecule) = product_molecule {
            if product_molecule.compartment != molecule.compartment {
                actions.push(Action::new(ActionKind::ChangeCompartment, &molecule.id, None));
            }
        }
    }
    actions
}
