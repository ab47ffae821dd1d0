use crate::counter::Counter;
use crate::error::{BnglError, Result};
use crate::model::{ActionKind, Bond, Component, DEFAULT_STATE, Molecule, Species};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// One component of an [`AtomicPattern`], stripped of all other components of its molecule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternSite {
    pub molecule: String,
    pub component: String,
    pub state: Option<String>,
    pub bond: Option<Bond>,
}

impl PatternSite {
    fn new(molecule: &Molecule, component: &Component, bond: Option<Bond>) -> PatternSite {
        PatternSite {
            molecule: molecule.name.clone(),
            component: component.name.clone(),
            state: component.state.clone(),
            bond,
        }
    }

    pub fn is_active(&self) -> bool {
        self.bond.is_some() || self.state.as_deref().is_some_and(|s| s != DEFAULT_STATE)
    }
}

impl Display for PatternSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}", self.molecule, self.component)?;
        if let Some(state) = &self.state {
            write!(f, "~{}", state)?;
        }
        if let Some(bond) = &self.bond {
            write!(f, "{}", bond)?;
        }
        write!(f, ")")
    }
}

/// The minimal single-component representation of a state or binding condition.
///
/// The `subject` is the component the pattern was extracted from; activity is credited
/// to the subject only. Bonded subjects also record their binding `partner`, so
/// `A(y!1).B(z!1)` and `B(z!1).A(y!1)` are the two ends of the same bond.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomicPattern {
    pub subject: PatternSite,
    pub partner: Option<PatternSite>,
}

impl AtomicPattern {
    pub fn is_active(&self) -> bool {
        self.subject.is_active()
    }

    /// True for `!+` patterns, i.e. bonds to an unknown partner.
    pub fn is_wildcard(&self) -> bool {
        self.subject.bond == Some(Bond::Wildcard)
    }

    /// True if the pattern spans two molecules.
    pub fn is_complex(&self) -> bool {
        self.partner.is_some()
    }
}

impl Display for AtomicPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subject)?;
        if let Some(partner) = &self.partner {
            write!(f, ".{}", partner)?;
        }
        Ok(())
    }
}

/// The atomic decomposition of one species with respect to one action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeciesPatterns {
    /// Every pattern seen, keyed by its BNGL text.
    pub atomic_patterns: BTreeMap<String, AtomicPattern>,
    /// Patterns of the components directly touched by the action.
    pub center: Counter<AtomicPattern>,
    /// Patterns of every other component present in the species.
    pub context: Counter<AtomicPattern>,
}

impl SpeciesPatterns {
    pub fn merge(&mut self, other: SpeciesPatterns) {
        self.atomic_patterns.extend(other.atomic_patterns);
        self.center.extend_from(&other.center);
        self.context.extend_from(&other.context);
    }
}

impl Species {
    /// Decompose this species into atomic patterns, splitting them into reaction center
    /// (components whose id is `site1` or `site2`) and context (everything else).
    ///
    /// For [`ActionKind::ChangeCompartment`], `site1` names a molecule and all of its
    /// components belong to the center.
    ///
    /// Every component instance yields exactly one pattern. If `differentiate_dimers` is
    /// false, the two ends of a bond between molecules of the same type collapse into a
    /// single pattern.
    pub fn extract_atomic_patterns(
        &self,
        action: ActionKind,
        site1: &str,
        site2: Option<&str>,
        differentiate_dimers: bool,
    ) -> Result<SpeciesPatterns> {
        self.decompose_by(
            |molecule, component| {
                (action == ActionKind::ChangeCompartment && molecule.id == site1)
                    || component.id == site1
                    || site2.is_some_and(|s| component.id == s)
            },
            differentiate_dimers,
        )
    }

    /// Like [`Species::extract_atomic_patterns`], but the reaction center is given by an
    /// arbitrary predicate over component instances.
    pub(crate) fn decompose_by(
        &self,
        in_center: impl Fn(&Molecule, &Component) -> bool,
        differentiate_dimers: bool,
    ) -> Result<SpeciesPatterns> {
        let mut result = SpeciesPatterns::default();
        let mut visited: BTreeSet<&str> = BTreeSet::new();

        for molecule in &self.molecules {
            for component in &molecule.components {
                visited.insert(component.id.as_str());
                let centered = in_center(molecule, component);

                let pattern = match component.bonds.first() {
                    None => AtomicPattern {
                        subject: PatternSite::new(molecule, component, None),
                        partner: None,
                    },
                    Some(Bond::Wildcard) => AtomicPattern {
                        subject: PatternSite::new(molecule, component, Some(Bond::Wildcard)),
                        partner: None,
                    },
                    Some(Bond::Numbered(label)) => {
                        let Some((partner_molecule, partner)) =
                            self.bond_partner(*label, &component.id)
                        else {
                            return Err(BnglError::malformed(
                                &self.to_string(),
                                format!("bond !{} of `{}` has no partner", label, component),
                            ));
                        };
                        let homotypic = partner_molecule.name == molecule.name;
                        if homotypic && !differentiate_dimers && visited.contains(partner.id.as_str()) {
                            continue;
                        }
                        AtomicPattern {
                            subject: PatternSite::new(molecule, component, Some(Bond::Numbered(1))),
                            partner: Some(PatternSite::new(
                                partner_molecule,
                                partner,
                                Some(Bond::Numbered(1)),
                            )),
                        }
                    }
                };

                result
                    .atomic_patterns
                    .insert(pattern.to_string(), pattern.clone());
                if centered {
                    result.center.add(pattern);
                } else {
                    result.context.add(pattern);
                }
            }
        }

        Ok(result)
    }
}
