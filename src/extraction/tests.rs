use crate::counter::Counter;
use crate::error::BnglError;
use crate::extraction::{AtomicPattern, extract_rule, extract_transformations};
use crate::model::{Action, ActionKind, Bond, Component, Molecule, Rule, Species};
use crate::test_utils::init_logger;

fn texts(counter: &Counter<AtomicPattern>) -> Vec<(String, usize)> {
    counter.iter().map(|(p, c)| (p.to_string(), c)).collect()
}

#[test]
fn state_change_with_bonded_context() {
    init_logger();
    let rule = Rule::parse(
        Some("R1"),
        "A(x~0,y!1).B(z!1) -> A(x~P,y!1).B(z!1)",
        &["k1"],
    )
    .unwrap();
    let result = extract_transformations(&[rule], true).unwrap();
    assert_eq!(result.rules.len(), 1);

    let rule = &result.rules[0];
    assert_eq!(rule.label, "R1");
    assert!(!rule.double_modification);
    assert_eq!(rule.actions.len(), 1);

    let action = &rule.actions[0];
    assert_eq!(action.name, "1-StateChange");
    assert_eq!(
        action.label,
        "A(x~0,y!1).B(z!1) -> A(x~P,y!1).B(z!1), 1-StateChange"
    );
    assert_eq!(texts(&action.center), vec![("A(x~0)".to_string(), 1)]);
    assert_eq!(texts(&action.product), vec![("A(x~P)".to_string(), 1)]);

    let mut context = texts(&action.context);
    context.sort();
    assert_eq!(
        context,
        vec![
            ("A(y!1).B(z!1)".to_string(), 1),
            ("B(z!1).A(y!1)".to_string(), 1)
        ]
    );
    assert!(action.context.keys().all(|p| p.is_active()));
    assert!(result.atomic_patterns.contains_key("A(x~P)"));
}

#[test]
fn bond_formation_centers() {
    let rule = Rule::parse(None, "A(x) + B(y) -> A(x!1).B(y!1)", &["kon"]).unwrap();
    let result = extract_rule(0, &rule, true).unwrap();
    let action = &result.actions[0];
    assert_eq!(action.kind, ActionKind::AddBond);
    assert_eq!(action.center.total(), 2);
    assert!(action.center.keys().all(|p| !p.is_active()));
    assert_eq!(action.product.total(), 2);
    assert!(action.product.keys().all(|p| p.is_active() && p.is_complex()));
    assert!(action.context.is_empty());
    assert_eq!(result.label, "A(x) + B(y) -> A(x!1).B(y!1)");
}

#[test]
fn double_modification_is_flagged() {
    let rules = vec![
        Rule::parse(Some("single"), "A(x~0) -> A(x~P)", &["k"]).unwrap(),
        Rule::parse(Some("double"), "A(x!1,y~0).B(z!1) -> A(x,y~P) + B(z)", &["k"]).unwrap(),
    ];
    let result = extract_transformations(&rules, true).unwrap();
    assert!(!result.rules[0].double_modification);
    assert!(result.rules[1].double_modification);
    assert_eq!(result.double_modification_rules(), vec!["double"]);

    let names: Vec<&str> = result.rules[1]
        .actions
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["1-DeleteBond", "2-StateChange"]);
}

#[test]
fn sites_shared_by_actions_are_fresh_only_once() {
    let rule = Rule::parse(Some("R1"), "A(x~0!1).B(y!1) -> A(x~P) + B(y)", &["k"]).unwrap();
    let result = extract_rule(0, &rule, true).unwrap();
    let (first, second) = (&result.actions[0], &result.actions[1]);
    assert_eq!(first.kind, ActionKind::StateChange);
    assert_eq!(first.fresh_center, first.center);
    assert_eq!(first.fresh_product, first.product);

    // `A(x)` already belongs to the first action.
    assert_eq!(second.kind, ActionKind::DeleteBond);
    assert_eq!(texts(&second.fresh_center), vec![("B(y!1).A(x~0!1)".to_string(), 1)]);
    assert_eq!(texts(&second.fresh_product), vec![("B(y)".to_string(), 1)]);
    assert_eq!(second.center.total(), 2);
}

#[test]
fn compartment_changes_do_not_count_as_modifications() {
    let rule = Rule::parse(None, "A(x~0)@cyt -> A(x~P)@nuc", &["k"]).unwrap();
    let result = extract_rule(0, &rule, true).unwrap();
    let kinds: Vec<ActionKind> = result.actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ActionKind::StateChange, ActionKind::ChangeCompartment]);
    assert!(!result.actions[1].center.is_empty());
    assert!(!result.double_modification);
}

#[test]
fn unresolved_wildcard_is_left_out() {
    let rule = Rule::parse(None, "A(s!+,x~0) -> A(s!+,x~P)", &["k"]).unwrap();
    let result = extract_transformations(&[rule], true).unwrap();
    assert!(result.atomic_patterns.contains_key("A(s!+)"));
    assert!(result.atomic_patterns["A(s!+)"].is_wildcard());
    assert!(result.wildcard_resolutions.is_empty());
}

#[test]
fn wildcard_resolves_to_observed_bonds() {
    let rules = vec![
        Rule::parse(None, "A(s!+,x~0) -> A(s!+,x~P)", &["k"]).unwrap(),
        Rule::parse(None, "A(s) + B(t) -> A(s!1).B(t!1)", &["k"]).unwrap(),
    ];
    let result = extract_transformations(&rules, true).unwrap();
    let resolved: Vec<String> = result.wildcard_resolutions["A(s!+)"]
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(resolved, vec!["A(s!1).B(t!1)"]);
}

#[test]
fn wildcard_matches_molecule_name_only() {
    let rules = vec![
        Rule::parse(None, "A(s!+,x~0) -> A(s!+,x~P)", &["k"]).unwrap(),
        Rule::parse(None, "a(t) + B(u) -> a(t!1).B(u!1)", &["k"]).unwrap(),
    ];
    let result = extract_transformations(&rules, true).unwrap();
    let resolved: Vec<String> = result.wildcard_resolutions["A(s!+)"]
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(resolved, vec!["a(t!1).B(u!1)"]);
}

#[test]
fn homotypic_bonds_collapse_without_dimer_differentiation() {
    let rule = Rule::parse(None, "A(s!1).A(s!1) -> A(s) + A(s)", &["k"]).unwrap();
    assert_eq!(rule.actions[0].kind, ActionKind::DeleteBond);

    let distinct = extract_rule(0, &rule, true).unwrap();
    let collapsed = extract_rule(0, &rule, false).unwrap();
    let pattern = &distinct.atomic_patterns["A(s!1).A(s!1)"];
    assert_eq!(distinct.actions[0].center.get(pattern), 2);
    assert_eq!(collapsed.actions[0].center.get(pattern), 1);
}

#[test]
fn action_on_missing_site_is_reported() {
    let mut rule = Rule::parse(Some("broken"), "A(x~0) -> A(x~P)", &["k"]).unwrap();
    rule.actions = vec![Action::new(ActionKind::StateChange, "R1_M1_C7", None)];
    let error = extract_rule(0, &rule, true).unwrap_err();
    assert_eq!(
        error,
        BnglError::UnmappedSite {
            rule: "broken".to_string(),
            site: "R1_M1_C7".to_string(),
        }
    );
}

#[test]
fn dangling_bond_is_malformed() {
    let species = Species {
        molecules: vec![Molecule {
            id: "S1_M1".to_string(),
            name: "A".to_string(),
            compartment: None,
            components: vec![Component {
                id: "S1_M1_C1".to_string(),
                name: "x".to_string(),
                state: None,
                bonds: vec![Bond::Numbered(3)],
            }],
        }],
    };
    let error = species
        .extract_atomic_patterns(ActionKind::DeleteBond, "S1_M1_C1", None, true)
        .unwrap_err();
    let BnglError::MalformedComponent { species, .. } = &error else {
        panic!("Unexpected error: {:?}", error);
    };
    assert_eq!(species, "A(x!3)");
}
