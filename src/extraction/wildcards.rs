use crate::extraction::AtomicPattern;
use log::debug;
use std::collections::BTreeMap;

/// Resolve wildcard bonds (`A(s!+)`) to the concrete bonds observed elsewhere in the same
/// rule set: every two-molecule pattern whose subject molecule has the same name, compared
/// case-insensitively. The bonded component of the candidate is not compared.
///
/// Wildcards without any matching bond are left out of the result. This is a best-effort
/// heuristic, not an error.
pub fn solve_wildcards(
    atomic_patterns: &BTreeMap<String, AtomicPattern>,
) -> BTreeMap<String, Vec<AtomicPattern>> {
    let mut result = BTreeMap::new();
    for (text, wildcard) in atomic_patterns.iter().filter(|(_, p)| p.is_wildcard()) {
        let candidates: Vec<AtomicPattern> = atomic_patterns
            .values()
            .filter(|p| p.is_complex())
            .filter(|p| {
                p.subject
                    .molecule
                    .eq_ignore_ascii_case(&wildcard.subject.molecule)
            })
            .cloned()
            .collect();
        if candidates.is_empty() {
            debug!("Wildcard `{}` has no concrete binding partner.", text);
        } else {
            result.insert(text.clone(), candidates);
        }
    }
    result
}
