use crate::error::{BnglError, Result};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The canonical "default" state label. A component in this state is not considered active.
pub const DEFAULT_STATE: &str = "0";

/// A bond marker attached to a component instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bond {
    /// A concrete bond label (`!1`) shared by exactly two components of one species.
    Numbered(u32),
    /// A bond to an unspecified partner (`!+`).
    Wildcard,
}

impl Display for Bond {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Bond::Numbered(label) => write!(f, "!{}", label),
            Bond::Wildcard => write!(f, "!+"),
        }
    }
}

/// A component (site) instance on a molecule instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    /// Site identifier, unique within a rule (e.g. `R1_M2_C1`).
    pub id: String,
    pub name: String,
    pub state: Option<String>,
    pub bonds: Vec<Bond>,
}

impl Component {
    /// A component is active if it is bonded or its state differs from [`DEFAULT_STATE`].
    pub fn is_active(&self) -> bool {
        !self.bonds.is_empty() || self.state.as_deref().is_some_and(|s| s != DEFAULT_STATE)
    }

    /// The component text without bond markers (`x~P`).
    pub fn state_text(&self) -> String {
        match &self.state {
            Some(state) => format!("{}~{}", self.name, state),
            None => self.name.clone(),
        }
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.state_text())?;
        for bond in &self.bonds {
            write!(f, "{}", bond)?;
        }
        Ok(())
    }
}

/// A molecule instance inside a species pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Molecule {
    pub id: String,
    pub name: String,
    pub compartment: Option<String>,
    pub components: Vec<Component>,
}

impl Display for Molecule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", component)?;
        }
        write!(f, ")")?;
        if let Some(compartment) = &self.compartment {
            write!(f, "@{}", compartment)?;
        }
        Ok(())
    }
}

/// A species pattern: a complex of molecules connected by bonds (`A(x~0,y!1).B(z!1)`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Species {
    pub molecules: Vec<Molecule>,
}

impl Display for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, molecule) in self.molecules.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", molecule)?;
        }
        Ok(())
    }
}

impl FromStr for Species {
    type Err = BnglError;

    fn from_str(s: &str) -> Result<Species> {
        Species::parse(s, "S1")
    }
}

impl Species {
    /// Parse BNGL species text. Molecule ids are `{prefix}_M{i}` and component ids
    /// `{prefix}_M{i}_C{j}` (both 1-based).
    pub fn parse(text: &str, prefix: &str) -> Result<Species> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BnglError::malformed(text, "empty species"));
        }

        let mut molecules = Vec::new();
        for (m_index, molecule_text) in split_top_level(text, '.').into_iter().enumerate() {
            let molecule_id = format!("{}_M{}", prefix, m_index + 1);
            molecules.push(parse_molecule(text, molecule_text.trim(), molecule_id)?);
        }

        let species = Species { molecules };
        species.check_bonds(text)?;
        Ok(species)
    }

    /// Find the molecule and component with the given site id.
    pub fn find_site(&self, site: &str) -> Option<(&Molecule, &Component)> {
        self.molecules.iter().find_map(|m| {
            m.components
                .iter()
                .find(|c| c.id == site)
                .map(|c| (m, c))
        })
    }

    /// Find the partner of a numbered bond, skipping the component `from`.
    pub fn bond_partner(&self, label: u32, from: &str) -> Option<(&Molecule, &Component)> {
        self.molecules.iter().find_map(|m| {
            m.components
                .iter()
                .find(|c| c.id != from && c.bonds.contains(&Bond::Numbered(label)))
                .map(|c| (m, c))
        })
    }

    fn check_bonds(&self, text: &str) -> Result<()> {
        let mut labels: Vec<u32> = self
            .molecules
            .iter()
            .flat_map(|m| m.components.iter())
            .flat_map(|c| c.bonds.iter())
            .filter_map(|b| match b {
                Bond::Numbered(label) => Some(*label),
                Bond::Wildcard => None,
            })
            .collect();
        labels.sort();
        for chunk in labels.chunk_by(|a, b| a == b) {
            if chunk.len() != 2 {
                return Err(BnglError::malformed(
                    text,
                    format!("bond !{} must connect exactly two components", chunk[0]),
                ));
            }
        }
        Ok(())
    }
}

/// Split on `separator`, ignoring separators nested inside parentheses.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                result.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => (),
        }
    }
    result.push(&text[start..]);
    result
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_molecule(species: &str, text: &str, id: String) -> Result<Molecule> {
    let (body, compartment) = match text.split_once('@') {
        Some((body, compartment)) if is_identifier(compartment) => {
            (body, Some(compartment.to_string()))
        }
        Some(_) => return Err(BnglError::malformed(species, "invalid compartment")),
        None => (text, None),
    };

    let (name, components_text) = match body.split_once('(') {
        None => (body, ""),
        Some((name, rest)) => {
            let Some(inner) = rest.strip_suffix(')') else {
                return Err(BnglError::malformed(
                    species,
                    format!("missing closing parenthesis in `{}`", body),
                ));
            };
            (name, inner)
        }
    };

    if !is_identifier(name) {
        return Err(BnglError::malformed(
            species,
            format!("invalid molecule name `{}`", name),
        ));
    }
    if components_text.contains('(') || components_text.contains(')') {
        return Err(BnglError::malformed(
            species,
            format!("unbalanced parentheses in `{}`", body),
        ));
    }

    let mut components = Vec::new();
    if !components_text.trim().is_empty() {
        for (c_index, component_text) in components_text.split(',').enumerate() {
            let component_id = format!("{}_C{}", id, c_index + 1);
            components.push(parse_component(species, component_text.trim(), component_id)?);
        }
    }

    Ok(Molecule {
        id,
        name: name.to_string(),
        compartment,
        components,
    })
}

fn parse_component(species: &str, text: &str, id: String) -> Result<Component> {
    let name_end = text.find(['~', '!']).unwrap_or(text.len());
    let name = &text[..name_end];
    if !is_identifier(name) {
        return Err(BnglError::malformed(
            species,
            format!("invalid component `{}`", text),
        ));
    }

    let mut state = None;
    let mut bonds = Vec::new();
    let mut rest = &text[name_end..];
    while !rest.is_empty() {
        let marker = rest.as_bytes()[0];
        let value_end = rest[1..].find(['~', '!']).map(|i| i + 1).unwrap_or(rest.len());
        let value = &rest[1..value_end];
        match marker {
            b'~' if state.is_none() && is_identifier(value) => {
                state = Some(value.to_string());
            }
            b'!' if value == "+" => bonds.push(Bond::Wildcard),
            b'!' => match value.parse::<u32>() {
                Ok(label) => bonds.push(Bond::Numbered(label)),
                Err(_) => {
                    return Err(BnglError::malformed(
                        species,
                        format!("invalid bond label in `{}`", text),
                    ));
                }
            },
            _ => {
                return Err(BnglError::malformed(
                    species,
                    format!("invalid state in `{}`", text),
                ));
            }
        }
        rest = &rest[value_end..];
    }

    Ok(Component {
        id,
        name: name.to_string(),
        state,
        bonds,
    })
}

#[cfg(test)]
mod tests {
    use crate::error::BnglError;
    use crate::model::{Bond, Species};

    #[test]
    fn parse_and_render_complex() {
        let species: Species = "A(x~0,y!1).B(z!1)".parse().unwrap();
        assert_eq!(species.molecules.len(), 2);
        assert_eq!(species.molecules[0].components[1].bonds, vec![Bond::Numbered(1)]);
        assert_eq!(species.molecules[1].components[0].id, "S1_M2_C1");
        assert_eq!(species.to_string(), "A(x~0,y!1).B(z!1)");
    }

    #[test]
    fn activity_definition() {
        let species: Species = "A(a~0,b~P,c,d!+,e~0!1).B(f!1)".parse().unwrap();
        let active: Vec<bool> = species.molecules[0]
            .components
            .iter()
            .map(|c| c.is_active())
            .collect();
        assert_eq!(active, vec![false, true, false, true, true]);
    }

    #[test]
    fn compartments_and_bare_molecules() {
        let species: Species = "Trash@cyt".parse().unwrap();
        assert_eq!(species.molecules[0].name, "Trash");
        assert_eq!(species.molecules[0].compartment.as_deref(), Some("cyt"));
        assert!(species.molecules[0].components.is_empty());
    }

    #[test]
    fn malformed_species_are_reported() {
        for text in ["A(x~0", "A(x!a)", "A(x!1)", "(x)", "A(x~)", "A(x).B(y))"] {
            let error = text.parse::<Species>().unwrap_err();
            let BnglError::MalformedComponent { species, .. } = &error else {
                panic!("Unexpected error for `{}`: {:?}", text, error);
            };
            assert_eq!(species, text);
        }
    }
}
