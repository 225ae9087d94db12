//! Single-service binding validation.
//!
//! Matching a service against the caller-supplied binding collection
//! answers two questions: is every secret the service declares covered
//! by a binding, and which binding entries (and which named secrets
//! within them) were actually used. The second answer accumulates into
//! a [`ConsumptionMap`] across a whole service graph and later drives
//! the needed/redundant partitioning.

use std::collections::{BTreeMap, BTreeSet};

use crate::service::ResolvedService;
use crate::version::VersionRange;

use super::binding::SecretBinding;
use super::error::BindingError;
use super::vault_name::parse_vault_secret_name;

/// Which secrets of which input bindings were consumed during one
/// validation run.
///
/// Keys are positions in the original ordered binding collection; two
/// structurally identical bindings at different positions are tracked
/// independently. Built fresh per validation call, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumptionMap(BTreeMap<usize, BTreeSet<String>>);

impl ConsumptionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records consumed secret names under a binding index. Recording
    /// an empty name set leaves the map unchanged.
    pub fn record<I>(&mut self, index: usize, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut names = names.into_iter().peekable();
        if names.peek().is_none() {
            return;
        }
        self.0.entry(index).or_default().extend(names);
    }

    /// Unions another map into this one.
    pub fn merge(&mut self, other: Self) {
        for (index, names) in other.0 {
            self.0.entry(index).or_default().extend(names);
        }
    }

    /// Returns the consumed names recorded under an index.
    #[must_use]
    pub fn consumed(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.0.get(&index)
    }

    /// Returns true if nothing was consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(binding index, consumed names)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<String>)> {
        self.0.iter().map(|(index, names)| (*index, names))
    }
}

/// Outcome of validating one resolved service against the binding
/// collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceBindingOutcome {
    /// Index of the binding that matched the service's scope, if any.
    pub binding: Option<usize>,
    /// Declared secret names that the matched binding covered.
    pub consumed: BTreeSet<String>,
}

/// Finds the binding applicable to the given concrete service scope.
///
/// The first binding in input order whose `(org, url)` match, whose
/// arch is empty, `*`, or equal, and whose version range is empty or
/// contains the concrete version wins. Callers are expected to supply
/// at most one applicable binding per scope; later matches are not an
/// error, they simply go unused.
///
/// # Errors
///
/// Returns [`BindingError::MalformedVersionRange`] when a candidate
/// binding carries an unparseable range, identifying the service being
/// matched.
pub fn find_binding_for_service(
    bindings: &[SecretBinding],
    org: &str,
    url: &str,
    version: &str,
    arch: &str,
) -> Result<Option<usize>, BindingError> {
    for (index, binding) in bindings.iter().enumerate() {
        if binding.service_url != url || binding.service_org != org {
            continue;
        }
        if !binding.service_arch.is_empty()
            && binding.service_arch != "*"
            && binding.service_arch != arch
        {
            continue;
        }
        if !binding.service_version_range.is_empty() && binding.service_version_range != version {
            let range = VersionRange::parse(&binding.service_version_range).map_err(|source| {
                BindingError::MalformedVersionRange {
                    range: binding.service_version_range.clone(),
                    service: format!("{org}/{url} {version} {arch}"),
                    source,
                }
            })?;
            let in_range =
                range
                    .includes(version)
                    .map_err(|source| BindingError::VersionCheck {
                        version: version.to_string(),
                        range: binding.service_version_range.clone(),
                        service: format!("{org}/{url} {version} {arch}"),
                        source,
                    })?;
            if !in_range {
                continue;
            }
        }
        return Ok(Some(index));
    }

    Ok(None)
}

/// Validates one resolved service against the binding collection.
///
/// Confirms that every secret the service declares is covered by the
/// matched binding and that each covering reference parses, and
/// reports which binding (by index) and which of its named secrets
/// were consumed. Names present in the binding but not declared by the
/// service are not consumed; they remain available to be flagged
/// redundant later.
///
/// # Errors
///
/// - [`BindingError::ClusterBindingUnsupported`] when a binding with
///   secrets matches a cluster service.
/// - [`BindingError::MissingBindings`] listing every declared secret
///   without a covering entry.
/// - [`BindingError::ReferenceForService`] when a covering reference
///   fails to parse.
/// - Range and deployment errors from scope matching and descriptor
///   parsing.
pub fn validate_single_service(
    bindings: &[SecretBinding],
    service: &ResolvedService,
) -> Result<ServiceBindingOutcome, BindingError> {
    let index = find_binding_for_service(
        bindings,
        &service.org,
        &service.url,
        &service.version,
        &service.arch,
    )?;

    // Cluster services declare no secrets; a binding with secrets
    // aimed at one is a caller mistake, not a no-op.
    if service.service_type == crate::service::ServiceType::Cluster {
        if let Some(i) = index {
            if !bindings[i].secrets.is_empty() {
                return Err(BindingError::ClusterBindingUnsupported {
                    service: service.service_id(),
                });
            }
        }
        return Ok(ServiceBindingOutcome {
            binding: index,
            consumed: BTreeSet::new(),
        });
    }

    let declared = service.declared_secrets()?;

    let mut consumed = BTreeSet::new();
    let mut missing = BTreeSet::new();
    for name in &declared {
        let covered = index
            .map(|i| bindings[i].secrets.iter().any(|s| &s.name == name))
            .unwrap_or(false);
        if covered {
            consumed.insert(name.clone());
        } else {
            missing.insert(name.clone());
        }
    }

    if !missing.is_empty() {
        return Err(BindingError::MissingBindings {
            service: service.service_id(),
            secrets: missing.into_iter().collect(),
        });
    }

    // Every declared secret is covered; the covering references must
    // also be well formed.
    if let Some(i) = index {
        for secret in &bindings[i].secrets {
            if consumed.contains(&secret.name) {
                parse_vault_secret_name(&secret.reference).map_err(|source| {
                    BindingError::ReferenceForService {
                        service: service.service_id(),
                        source: Box::new(source),
                    }
                })?;
            }
        }
    }

    Ok(ServiceBindingOutcome {
        binding: index,
        consumed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::binding::BoundSecret;
    use crate::service::{ComponentConfig, DeploymentConfig, SecretSpec, ServiceType};

    fn service_with_secrets(secrets: &[&str]) -> ResolvedService {
        let mut component = ComponentConfig::default();
        for name in secrets {
            component
                .secrets
                .insert((*name).to_string(), SecretSpec::default());
        }
        let mut config = DeploymentConfig::default();
        config.services.insert("mysvc".to_string(), component);

        ResolvedService {
            org: "myorg".to_string(),
            url: "mysvc".to_string(),
            version: "1.0.1".to_string(),
            arch: "amd64".to_string(),
            service_type: ServiceType::Device,
            deployment: Some(serde_json::to_string(&config).unwrap()),
        }
    }

    fn binding(org: &str, url: &str, arch: &str, range: &str, secrets: &[(&str, &str)]) -> SecretBinding {
        SecretBinding {
            service_org: org.to_string(),
            service_url: url.to_string(),
            service_arch: arch.to_string(),
            service_version_range: range.to_string(),
            secrets: secrets
                .iter()
                .map(|(name, reference)| BoundSecret::new(*name, *reference))
                .collect(),
        }
    }

    #[test]
    fn test_consumption_map_record_and_merge() {
        let mut map = ConsumptionMap::new();
        map.record(0, ["top_sn1".to_string(), "top_sn2".to_string()]);
        map.record(1, ["dep_sn1".to_string(), "dep_sn2".to_string()]);

        map.record(0, ["top_sn1".to_string(), "top_sn3".to_string()]);
        assert_eq!(map.consumed(0).unwrap().len(), 3);
        assert!(map.consumed(0).unwrap().contains("top_sn3"));

        // Recording nothing changes nothing.
        map.record(0, Vec::new());
        assert_eq!(map.consumed(0).unwrap().len(), 3);
        map.record(7, Vec::new());
        assert!(map.consumed(7).is_none());

        let mut other = ConsumptionMap::new();
        other.record(1, ["dep_sn3".to_string()]);
        other.record(5, ["extra_sn1".to_string(), "extra_sn2".to_string()]);
        map.merge(other);
        assert_eq!(map.consumed(1).unwrap().len(), 3);
        assert_eq!(map.consumed(5).unwrap().len(), 2);
    }

    #[test]
    fn test_first_matching_binding_wins() {
        let bindings = vec![
            binding("other", "mysvc", "", "", &[("s1", "ref1")]),
            binding("myorg", "mysvc", "", "", &[("s1", "ref1")]),
            binding("myorg", "mysvc", "amd64", "", &[("s1", "ref2")]),
        ];
        let index = find_binding_for_service(&bindings, "myorg", "mysvc", "1.0.1", "amd64").unwrap();
        assert_eq!(index, Some(1));
    }

    #[test]
    fn test_scope_matching_wildcards() {
        let bindings = vec![binding("myorg", "mysvc", "*", "[1.0.0,2.0.0)", &[("s1", "ref1")])];
        assert_eq!(
            find_binding_for_service(&bindings, "myorg", "mysvc", "1.5.0", "arm64").unwrap(),
            Some(0)
        );
        assert_eq!(
            find_binding_for_service(&bindings, "myorg", "mysvc", "2.0.0", "arm64").unwrap(),
            None
        );

        let bindings = vec![binding("myorg", "mysvc", "amd64", "", &[("s1", "ref1")])];
        assert_eq!(
            find_binding_for_service(&bindings, "myorg", "mysvc", "1.0.0", "arm64").unwrap(),
            None
        );
    }

    #[test]
    fn test_exact_version_matches_without_range_parse() {
        // A range field holding the exact concrete version matches even
        // though it is not a valid range expression by itself.
        let bindings = vec![binding("myorg", "mysvc", "", "1.0.1", &[("s1", "ref1")])];
        assert_eq!(
            find_binding_for_service(&bindings, "myorg", "mysvc", "1.0.1", "amd64").unwrap(),
            Some(0)
        );
    }

    #[test]
    fn test_malformed_range_identifies_service() {
        let bindings = vec![binding("myorg", "mysvc", "", "[1.0.0", &[("s1", "ref1")])];
        let err =
            find_binding_for_service(&bindings, "myorg", "mysvc", "1.0.1", "amd64").unwrap_err();
        match err {
            BindingError::MalformedVersionRange { range, service, .. } => {
                assert_eq!(range, "[1.0.0");
                assert!(service.contains("myorg/mysvc"));
            },
            other => panic!("expected MalformedVersionRange, got: {other:?}"),
        }
    }

    #[test]
    fn test_full_coverage_consumes_declared_names() {
        let service = service_with_secrets(&["s1", "s2"]);
        let bindings = vec![binding(
            "myorg",
            "mysvc",
            "",
            "",
            &[("s1", "ref1"), ("s2", "user/fred/ref2"), ("s3", "unused")],
        )];
        let outcome = validate_single_service(&bindings, &service).unwrap();
        assert_eq!(outcome.binding, Some(0));
        assert_eq!(
            outcome.consumed.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["s1", "s2"]
        );
    }

    #[test]
    fn test_all_missing_names_reported_together() {
        let service = service_with_secrets(&["s1", "s2", "s3"]);
        let bindings = vec![binding("myorg", "mysvc", "", "", &[("s2", "ref2")])];
        let err = validate_single_service(&bindings, &service).unwrap_err();
        match err {
            BindingError::MissingBindings { service, secrets } => {
                assert_eq!(secrets, vec!["s1".to_string(), "s3".to_string()]);
                assert!(service.contains("myorg/mysvc_1.0.1_amd64"));
            },
            other => panic!("expected MissingBindings, got: {other:?}"),
        }
    }

    #[test]
    fn test_no_binding_at_all_reports_every_name() {
        let service = service_with_secrets(&["s1", "s2"]);
        let err = validate_single_service(&[], &service).unwrap_err();
        match err {
            BindingError::MissingBindings { secrets, .. } => {
                assert_eq!(secrets.len(), 2);
            },
            other => panic!("expected MissingBindings, got: {other:?}"),
        }
    }

    #[test]
    fn test_bad_reference_aborts_with_service_identity() {
        let service = service_with_secrets(&["s1"]);
        let bindings = vec![binding(
            "myorg",
            "mysvc",
            "",
            "",
            &[("s1", "openhorizon/myorg/mysecret")],
        )];
        let err = validate_single_service(&bindings, &service).unwrap_err();
        match err {
            BindingError::ReferenceForService { service, source } => {
                assert!(service.contains("myorg/mysvc"));
                assert!(matches!(
                    *source,
                    BindingError::InvalidReferenceFormat { .. }
                ));
            },
            other => panic!("expected ReferenceForService, got: {other:?}"),
        }
    }

    #[test]
    fn test_unused_binding_reference_is_not_parsed() {
        // An entry the service never declares is left alone for the
        // partitioner, malformed reference and all.
        let service = service_with_secrets(&["s1"]);
        let bindings = vec![binding(
            "myorg",
            "mysvc",
            "",
            "",
            &[("s1", "ref1"), ("s9", "openhorizon/bad/ref")],
        )];
        let outcome = validate_single_service(&bindings, &service).unwrap();
        assert_eq!(outcome.consumed.len(), 1);
    }

    #[test]
    fn test_cluster_service_without_binding_is_fine() {
        let mut service = service_with_secrets(&[]);
        service.service_type = ServiceType::Cluster;
        let outcome = validate_single_service(&[], &service).unwrap();
        assert_eq!(outcome.binding, None);
        assert!(outcome.consumed.is_empty());
    }

    #[test]
    fn test_cluster_service_with_binding_is_rejected() {
        let mut service = service_with_secrets(&[]);
        service.service_type = ServiceType::Cluster;
        let bindings = vec![binding("myorg", "mysvc", "", "", &[("s1", "ref1")])];
        let err = validate_single_service(&bindings, &service).unwrap_err();
        assert!(matches!(err, BindingError::ClusterBindingUnsupported { .. }));
    }

    #[test]
    fn test_service_without_secrets_consumes_nothing() {
        let service = service_with_secrets(&[]);
        let bindings = vec![binding("myorg", "mysvc", "", "", &[("s1", "ref1")])];
        let outcome = validate_single_service(&bindings, &service).unwrap();
        assert_eq!(outcome.binding, Some(0));
        assert!(outcome.consumed.is_empty());
    }
}
