use crate::diagram::Node;
use crate::model::{Model, MoleculeType, Rule};
use std::collections::BTreeMap;

/// Initialize env_logger for tests. Safe to call multiple times.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Build a model from molecule declarations and `(label, reaction, rates)` triples.
///
/// Reversible reactions (`<->`) expand into a forward and a `_reverse_` rule.
pub fn mk_model(molecules: &[&str], rules: &[(&str, &str, &[&str])]) -> Model {
    let molecules = molecules
        .iter()
        .map(|m| MoleculeType::parse(m).expect("Invalid molecule declaration"))
        .collect();
    let rules = rules
        .iter()
        .flat_map(|(label, text, rates)| {
            Rule::parse_reaction(Some(*label), text, rates).expect("Invalid rule")
        })
        .collect();
    Model {
        molecules,
        rules,
        parameters: BTreeMap::new(),
    }
}

/// Build a node from `(label, active)` pairs given in any order.
pub fn mk_node(slots: &[(&str, bool)]) -> Node {
    let mut slots: Vec<(String, bool)> = slots.iter().map(|(l, a)| (l.to_string(), *a)).collect();
    slots.sort();
    Node(slots)
}

/// A small receptor signalling model: ligand binding, receptor dimerization,
/// phosphorylation and adaptor recruitment.
pub fn mk_receptor_model() -> Model {
    let mut model = mk_model(
        &["L(r)", "R(l,d,Y~0~P)", "Sh(y,pY~0~P)"],
        &[
            ("ligand_binding", "L(r) + R(l) <-> L(r!1).R(l!1)", &["kon", "koff"]),
            ("dimerization", "R(l!+,d) + R(l!+,d) <-> R(l!+,d!1).R(l!+,d!1)", &["kd", "kdr"]),
            ("phosphorylation", "R(d!+,Y~0) -> R(d!+,Y~P)", &["kp"]),
            ("recruitment", "R(Y~P) + Sh(y) <-> R(Y~P!1).Sh(y!1)", &["ks", "ksr"]),
            ("adaptor_phosphorylation", "R(Y~P!1).Sh(y!1,pY~0) -> R(Y~P!1).Sh(y!1,pY~P)", &["ksp"]),
        ],
    );
    model.parameters = BTreeMap::from([
        ("kon".to_string(), "1e-3".to_string()),
        ("koff".to_string(), "0.1".to_string()),
        ("kp".to_string(), "0.5".to_string()),
    ]);
    model
}
