//! Dependency resolver seam.
//!
//! Resolving a service reference means fetching the matching concrete
//! definition from the exchange along with every definition it
//! transitively requires. The engine never talks to the exchange
//! directly; callers inject a [`ServiceResolver`] so the validation
//! pipeline stays unit-testable without a live registry.
//!
//! Resolvers own their transport policy. Timeouts, retries and
//! authentication happen behind this trait; a failure surfaces as an
//! opaque [`ResolverError`] which the engine wraps with the service
//! reference being resolved.

use std::collections::BTreeMap;

use super::ResolvedService;

/// Opaque transport-level failure reported by a resolver.
pub type ResolverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A top-level service definition together with every transitively
/// required definition, keyed by fully qualified service id.
#[derive(Debug, Clone, Default)]
pub struct ResolvedServiceGraph {
    /// The resolved top-level definition.
    pub top: ResolvedService,
    /// Fully qualified id of the top-level definition.
    pub top_id: String,
    /// Every transitive dependency, keyed by fully qualified id.
    pub dependencies: BTreeMap<String, ResolvedService>,
}

/// Fetches service definitions from the exchange.
pub trait ServiceResolver {
    /// Resolves the highest version of `org/url` within `version_range`
    /// for `arch`, plus all of its transitive dependencies.
    ///
    /// # Errors
    ///
    /// Returns a transport or lookup error from the underlying
    /// exchange client.
    fn resolve(
        &self,
        url: &str,
        org: &str,
        version_range: &str,
        arch: &str,
    ) -> Result<ResolvedServiceGraph, ResolverError>;

    /// Lists the published definition of `org/url` at `version_range`
    /// for every architecture it is available on.
    ///
    /// # Errors
    ///
    /// Returns a transport or lookup error from the underlying
    /// exchange client.
    fn list_variants(
        &self,
        url: &str,
        org: &str,
        version_range: &str,
    ) -> Result<Vec<ResolvedService>, ResolverError>;
}
