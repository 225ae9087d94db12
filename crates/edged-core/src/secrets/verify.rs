//! Trust-store existence verification.
//!
//! Binding validation proves that every declared secret has a
//! reference; verification proves the referenced secrets actually
//! exist in the secret manager. The remote check is injected through
//! [`SecretExistsCheck`] so the engine stays testable without a live
//! trust store.
//!
//! Two modes serve two callers: [`verify_bindings`] accumulates a
//! problem report covering every reference ("show the user everything
//! that's wrong"), while [`verify_bindings_strict`] stops at the first
//! failure ("abort a deployment the instant something is provably
//! broken"). Both deduplicate by parsed reference first, so a secret
//! referenced by five services is checked once.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::TrustStoreConfig;

use super::binding::SecretBinding;
use super::error::{BindingError, SecretStoreError};
use super::vault_name::{VaultSecretRef, parse_vault_secret_name};

/// Checks whether a secret exists in the external secret manager.
pub trait SecretExistsCheck {
    /// Returns whether the secret `name`, owned by `user` (or by the
    /// organization when `user` is `None`) exists under `org` in the
    /// trust store at `address`.
    ///
    /// # Errors
    ///
    /// Returns a transport or authorization error from the underlying
    /// client.
    fn exists(
        &self,
        address: &str,
        org: &str,
        user: Option<&str>,
        name: &str,
    ) -> Result<bool, SecretStoreError>;
}

fn check_config(config: &TrustStoreConfig) -> Result<(), BindingError> {
    if config.address.is_empty() {
        return Err(BindingError::MissingTrustStoreAddress);
    }
    if config.org.is_empty() {
        return Err(BindingError::MissingSecretOrg);
    }
    Ok(())
}

/// Verifies every secret referenced by the bindings, accumulating
/// problems instead of stopping.
///
/// Returns a map from reference text to a human-readable problem
/// message; an empty map means every referenced secret exists.
/// Transport failures and parse failures are recorded in the map, not
/// propagated.
///
/// # Errors
///
/// Fails with a configuration error before any remote call when the
/// trust store address or secret organization is missing.
pub fn verify_bindings(
    check: &dyn SecretExistsCheck,
    bindings: &[SecretBinding],
    config: &TrustStoreConfig,
) -> Result<BTreeMap<String, String>, BindingError> {
    if bindings.is_empty() {
        return Ok(BTreeMap::new());
    }
    check_config(config)?;

    let mut problems = BTreeMap::new();
    let mut checked: BTreeSet<VaultSecretRef> = BTreeSet::new();
    let mut failed_raw: BTreeSet<String> = BTreeSet::new();

    for binding in bindings {
        for secret in &binding.secrets {
            let parsed = match parse_vault_secret_name(&secret.reference) {
                Ok(parsed) => parsed,
                Err(err) => {
                    if failed_raw.insert(secret.reference.clone()) {
                        problems.insert(secret.reference.clone(), err.to_string());
                    }
                    continue;
                },
            };
            if !checked.insert(parsed.clone()) {
                continue;
            }

            match check.exists(&config.address, &config.org, parsed.user.as_deref(), &parsed.name)
            {
                Ok(true) => {},
                Ok(false) => {
                    problems.insert(
                        secret.reference.clone(),
                        format!(
                            "secret '{}' does not exist in the secret manager",
                            secret.reference
                        ),
                    );
                },
                Err(err) => {
                    tracing::warn!(
                        reference = %secret.reference,
                        error = %err,
                        "secret manager existence check failed"
                    );
                    problems.insert(
                        secret.reference.clone(),
                        format!(
                            "error checking secret '{}' in the secret manager: {err}",
                            secret.reference
                        ),
                    );
                },
            }
        }
    }

    Ok(problems)
}

/// Verifies every secret referenced by the bindings, stopping at the
/// first problem.
///
/// # Errors
///
/// Fails with a configuration error before any remote call when the
/// trust store is not configured; with the parse error for the first
/// malformed reference; with [`BindingError::SecretCheck`] on the
/// first transport failure; and with [`BindingError::SecretNotFound`]
/// for the first reference whose secret does not exist.
pub fn verify_bindings_strict(
    check: &dyn SecretExistsCheck,
    bindings: &[SecretBinding],
    config: &TrustStoreConfig,
) -> Result<(), BindingError> {
    if bindings.is_empty() {
        return Ok(());
    }
    check_config(config)?;

    let mut checked: BTreeSet<VaultSecretRef> = BTreeSet::new();

    for binding in bindings {
        for secret in &binding.secrets {
            let parsed = parse_vault_secret_name(&secret.reference)?;
            if !checked.insert(parsed.clone()) {
                continue;
            }

            let exists = check
                .exists(&config.address, &config.org, parsed.user.as_deref(), &parsed.name)
                .map_err(|source| BindingError::SecretCheck {
                    reference: secret.reference.clone(),
                    source,
                })?;
            if !exists {
                return Err(BindingError::SecretNotFound {
                    reference: secret.reference.clone(),
                });
            }
        }
    }

    Ok(())
}
