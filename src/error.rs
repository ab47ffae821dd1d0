use thiserror::Error;

/// Errors reported while reading rule objects or building state transition diagrams.
///
/// Every variant carries enough context (species text, rule label, molecule name)
/// to locate the offending record in the source model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BnglError {
    #[error("malformed component in species `{species}`: {reason}")]
    MalformedComponent { species: String, reason: String },
    #[error("rule `{rule}` references undeclared molecule type `{molecule}`")]
    UnknownMolecule { rule: String, molecule: String },
    #[error("rule `{rule}` references undeclared component `{molecule}({component})`")]
    UnknownComponent {
        rule: String,
        molecule: String,
        component: String,
    },
    #[error("rule `{rule}` has an action on site `{site}` which does not exist")]
    UnmappedSite { rule: String, site: String },
}

pub type Result<T> = std::result::Result<T, BnglError>;

impl BnglError {
    pub(crate) fn malformed(species: &str, reason: impl Into<String>) -> BnglError {
        BnglError::MalformedComponent {
            species: species.to_string(),
            reason: reason.into(),
        }
    }
}
