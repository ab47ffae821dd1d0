use crate::diagram::{DiagramConfig, build_state_transition_diagrams};
use crate::model::MoleculeType;
use crate::similarity::{compare_diagrams, evaluate_process_similarity, evaluate_structure_similarity};
use crate::test_utils::{init_logger, mk_model, mk_node, mk_receptor_model};
use cancel_this::Cancellable;
use std::collections::BTreeSet;

fn molecules(declarations: &[&str]) -> Vec<MoleculeType> {
    declarations
        .iter()
        .map(|d| MoleculeType::parse(d).unwrap())
        .collect()
}

#[test]
fn structure_counts_molecules_and_stateful_components() {
    let first = molecules(&["A(x~0~P,y)", "B(z)"]);
    let second = molecules(&["a(x~0~P,w~0~1)", "C(q)"]);
    let similarity = evaluate_structure_similarity(&first, &second);
    // {a} of {a, b, c} molecules, {x} of {x, w} stateful components of `A`.
    assert_eq!(similarity.overlap, 2);
    assert_eq!(similarity.total, 5);
    assert_eq!(similarity.score(), Some(0.4));
}

#[test]
fn structure_of_empty_declarations_is_undefined() {
    let similarity = evaluate_structure_similarity(&[], &[]);
    assert_eq!(similarity.total, 0);
    assert_eq!(similarity.score(), None);
}

#[test]
fn identical_models_score_one() -> Cancellable<()> {
    init_logger();
    let model = mk_model(&["A(x~0~P)"], &[("R1", "A(x~0) -> A(x~P)", &["k1"])]);
    let scores = evaluate_process_similarity(&model, &model.clone(), false, true)?;

    let a = &scores["A"];
    assert_eq!((a.file1, a.file2), (2, 2));
    assert_eq!(a.total_space, 2.0);
    assert_eq!(a.score, Some(1.0));
    assert_eq!(a.score2, Some(1.0));
    assert!(a.only_in_first.is_empty());
    assert!(a.only_in_second.is_empty());
    Ok(())
}

#[test]
fn unvisited_molecule_has_no_comparable_data() -> Cancellable<()> {
    let model = mk_model(&["A(x~0~P)", "B(y~0~P)"], &[("R1", "A(x~0) -> A(x~P)", &["k1"])]);
    let scores = evaluate_process_similarity(&model, &model, false, true)?;
    let b = &scores["B"];
    assert_eq!((b.file1, b.file2), (0, 0));
    assert_eq!(b.score, None);
    assert_eq!(b.score2, None);
    Ok(())
}

#[test]
fn differences_are_reported_per_side() -> Cancellable<()> {
    init_logger();
    let first = mk_model(&["A(x~0~P,y~0~P)"], &[("px", "A(x~0) -> A(x~P)", &["k"])]);
    let second = mk_model(
        &["A(x~0~P,y~0~P)"],
        &[
            ("px", "A(x~0) -> A(x~P)", &["k"]),
            ("py", "A(y~0) -> A(y~P)", &["k"]),
        ],
    );
    let scores = evaluate_process_similarity(&first, &second, false, true)?;
    let a = &scores["A"];
    assert_eq!((a.file1, a.file2), (2, 3));
    assert_eq!(a.total_space, 4.0);
    assert!(a.only_in_first.is_empty());
    assert_eq!(
        a.only_in_second,
        BTreeSet::from([mk_node(&[("x", false), ("y", true)])])
    );
    assert_eq!(a.score, Some(1.0));
    let score2 = a.score2.unwrap();
    assert!((score2 - 2.0 / 3.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn signatures_are_restricted_to_shared_components() -> Cancellable<()> {
    let first = mk_model(&["A(x~0~P,y~0~P)"], &[("px", "A(x~0) -> A(x~P)", &["k"])]);
    let second = mk_model(&["A(x~0~P)"], &[("px", "A(x~0) -> A(x~P)", &["k"])]);
    let config = DiagramConfig::from(&first);
    let first_diagrams = build_state_transition_diagrams(&first, &config)?;
    let second_diagrams = build_state_transition_diagrams(&second, &DiagramConfig::from(&second))?;

    let scores = compare_diagrams(
        (first.molecules.as_slice(), &first_diagrams),
        (second.molecules.as_slice(), &second_diagrams),
    );
    let a = &scores["A"];
    assert_eq!(a.total_space, 2.0);
    assert_eq!(a.score, Some(1.0));
    assert_eq!(a.score2, Some(1.0));
    Ok(())
}

#[test]
fn component_names_are_case_insensitive() -> Cancellable<()> {
    let first = mk_model(&["A(X~0~P)"], &[("R1", "A(X~0) -> A(X~P)", &["k"])]);
    let second = mk_model(&["a(x~0~P)"], &[("R1", "a(x~0) -> a(x~P)", &["k"])]);
    let scores = evaluate_process_similarity(&first, &second, false, true)?;
    let a = &scores["A"];
    assert_eq!(a.total_space, 2.0);
    assert_eq!((a.file1, a.file2), (2, 2));
    assert_eq!(a.score, Some(1.0));
    assert_eq!(a.score2, Some(1.0));
    assert!(a.only_in_first.is_empty() && a.only_in_second.is_empty());
    Ok(())
}

#[test]
fn only_shared_molecules_are_scored() -> Cancellable<()> {
    let first = mk_model(&["A(x~0~P)", "B(y~0~P)"], &[("R1", "A(x~0) -> A(x~P)", &["k"])]);
    let second = mk_model(&["a(x~0~P)"], &[("R1", "a(x~0) -> a(x~P)", &["k"])]);
    let scores = evaluate_process_similarity(&first, &second, false, true)?;
    assert_eq!(scores.keys().collect::<Vec<_>>(), vec!["A"]);
    assert_eq!(scores["A"].score, Some(1.0));
    Ok(())
}

#[test]
fn receptor_model_against_itself() -> Cancellable<()> {
    init_logger();
    let model = mk_receptor_model();
    for exclude_reverse in [false, true] {
        let scores = evaluate_process_similarity(&model, &model, exclude_reverse, false)?;
        assert_eq!(scores.len(), 3);
        for score in scores.values() {
            assert_eq!(score.score, Some(1.0));
            assert_eq!(score.score2, Some(1.0));
        }
    }
    Ok(())
}
