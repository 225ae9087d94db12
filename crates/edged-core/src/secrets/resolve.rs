//! Multi-service binding resolution.
//!
//! Drives the dependency resolver and the single-service validator
//! over one top-level service reference: pick the architecture set,
//! resolve the full service graph per architecture, validate every
//! service in each graph, and accumulate consumption across all of
//! them. A deployment policy or pattern validator calls this once per
//! listed service version and merges the resulting maps before
//! partitioning.
//!
//! Per-architecture resolutions are independent and issued
//! sequentially; a failure from any one of them aborts the overall
//! result, so there is never a partial silent success.

use std::collections::BTreeMap;

use crate::service::{ResolvedService, ServiceResolver, ServiceSpec};

use super::binding::SecretBinding;
use super::error::BindingError;
use super::validator::{ConsumptionMap, validate_single_service};

/// Validates an already-resolved service graph and reports what the
/// bindings covered.
///
/// The caller must supply all, and only, the transitive dependencies
/// of `top`; the graph is taken at face value.
///
/// # Errors
///
/// Fails fast on the first service in the graph whose bindings are
/// incomplete or malformed, with that service's identity embedded in
/// the error.
pub fn validate_service_graph(
    bindings: &[SecretBinding],
    top: &ResolvedService,
    dependencies: &BTreeMap<String, ResolvedService>,
) -> Result<ConsumptionMap, BindingError> {
    let mut consumption = ConsumptionMap::new();

    let outcome = validate_single_service(bindings, top)?;
    if let Some(index) = outcome.binding {
        consumption.record(index, outcome.consumed);
    }

    for dependency in dependencies.values() {
        let outcome = validate_single_service(bindings, dependency)?;
        if let Some(index) = outcome.binding {
            consumption.record(index, outcome.consumed);
        }
    }

    Ok(consumption)
}

/// Resolves one top-level service reference and validates its whole
/// graph against the bindings, for every architecture in scope.
///
/// The architecture set is chosen from `spec.arch`:
///
/// - a concrete arch validates exactly that arch;
/// - empty or `*` with `check_all_arches` validates every architecture
///   variant the exchange lists for the reference;
/// - empty or `*` otherwise validates only `node_arch`, the
///   architecture of the node this agent runs on.
///
/// # Errors
///
/// A resolver failure aborts the whole call with the reference being
/// resolved wrapped in [`BindingError::Resolution`]; validator
/// failures abort with the failing service's identity.
pub fn resolve_consumption(
    resolver: &dyn ServiceResolver,
    bindings: &[SecretBinding],
    spec: &ServiceSpec,
    node_arch: &str,
    check_all_arches: bool,
) -> Result<ConsumptionMap, BindingError> {
    let resolution_error = |source| BindingError::Resolution {
        org: spec.org.clone(),
        url: spec.url.clone(),
        version: spec.version_range.clone(),
        source,
    };

    let arches: Vec<String> = if spec.arch.is_empty() || spec.arch == "*" {
        if check_all_arches {
            let variants = resolver
                .list_variants(&spec.url, &spec.org, &spec.version_range)
                .map_err(resolution_error)?;
            let mut arches: Vec<String> = Vec::new();
            for variant in variants {
                if !arches.contains(&variant.arch) {
                    arches.push(variant.arch);
                }
            }
            if arches.is_empty() {
                tracing::warn!(
                    org = %spec.org,
                    url = %spec.url,
                    version = %spec.version_range,
                    "no architecture variants found for wildcard service reference"
                );
            }
            arches
        } else {
            vec![node_arch.to_string()]
        }
    } else {
        vec![spec.arch.clone()]
    };

    let mut consumption = ConsumptionMap::new();
    for arch in arches {
        tracing::debug!(
            org = %spec.org,
            url = %spec.url,
            version = %spec.version_range,
            %arch,
            "resolving service graph for secret binding validation"
        );
        let graph = resolver
            .resolve(&spec.url, &spec.org, &spec.version_range, &arch)
            .map_err(resolution_error)?;
        consumption.merge(validate_service_graph(bindings, &graph.top, &graph.dependencies)?);
    }

    Ok(consumption)
}
