//! Needed/redundant binding partitioning.
//!
//! After a validation run, the consumption map says which named
//! secrets of which input bindings were actually used. Partitioning
//! reshapes the original collection into two disjoint groups: bindings
//! (or binding fragments) some service needed, and bindings (or
//! fragments) nothing needed. Callers surface the redundant group as a
//! warning and hand the needed group to the trust-store verifier.

use super::binding::SecretBinding;
use super::validator::ConsumptionMap;

/// Splits the original bindings into needed and redundant groups.
///
/// A binding whose every secret was consumed is copied whole into the
/// needed group; a binding with no consumed secrets is copied whole
/// into the redundant group; a binding with a proper subset consumed
/// is split into two records with the same scope, one holding the
/// consumed entries and one holding the rest. Pure and total: an empty
/// consumption map makes everything redundant, and empty input yields
/// empty output regardless of the map.
#[must_use]
pub fn partition_bindings(
    bindings: &[SecretBinding],
    consumption: &ConsumptionMap,
) -> (Vec<SecretBinding>, Vec<SecretBinding>) {
    let mut needed: Vec<SecretBinding> = Vec::new();
    let mut redundant: Vec<SecretBinding> = Vec::new();

    if bindings.is_empty() {
        return (needed, redundant);
    }
    if consumption.is_empty() {
        redundant.extend_from_slice(bindings);
        return (needed, redundant);
    }

    for (index, binding) in bindings.iter().enumerate() {
        match consumption.consumed(index) {
            None => redundant.push(binding.clone()),
            Some(consumed) if consumed.len() == binding.secrets.len() => {
                needed.push(binding.clone());
            },
            Some(consumed) => {
                let mut needed_part = binding.with_empty_secrets();
                let mut redundant_part = binding.with_empty_secrets();
                for secret in &binding.secrets {
                    if consumed.contains(&secret.name) {
                        needed_part.secrets.push(secret.clone());
                    } else {
                        redundant_part.secrets.push(secret.clone());
                    }
                }
                needed.push(needed_part);
                redundant.push(redundant_part);
            },
        }
    }

    (needed, redundant)
}
