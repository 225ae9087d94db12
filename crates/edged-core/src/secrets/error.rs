//! Secret binding validation errors.

use thiserror::Error;

use crate::service::ResolverError;
use crate::version::VersionError;

/// Opaque failure reported by a secret manager client.
pub type SecretStoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the secret binding validation pipeline.
///
/// Validation errors are collected as completely as possible within a
/// single service (every missing secret name for one service is
/// reported together) but propagation across services is fail-fast:
/// the first service in the graph that fails aborts the whole call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindingError {
    /// A binding supplied an empty secret reference.
    #[error(
        "the binding secret name must not be an empty string. The valid formats are \
         '<secretname>' for an organization level secret and 'user/<username>/<secretname>' \
         for a user level secret"
    )]
    EmptyReference,

    /// A secret reference does not match either accepted form.
    #[error(
        "Invalid format for the binding secret name '{reference}'. The valid formats are \
         '<secretname>' for an organization level secret and 'user/<username>/<secretname>' \
         for a user level secret"
    )]
    InvalidReferenceFormat {
        /// The offending reference text.
        reference: String,
    },

    /// A reference used by a specific service failed to parse.
    #[error("invalid secret reference in the binding used by service {service}")]
    ReferenceForService {
        /// Fully qualified id of the service whose binding is bad.
        service: String,
        /// The underlying parse failure.
        #[source]
        source: Box<BindingError>,
    },

    /// A binding's version range does not parse.
    #[error("wrong version range '{range}' specified in secret binding for service {service}")]
    MalformedVersionRange {
        /// The offending range expression.
        range: String,
        /// Identity of the service being matched.
        service: String,
        /// The underlying parse failure.
        #[source]
        source: VersionError,
    },

    /// A concrete service version could not be checked against a range.
    #[error("error checking version {version} against range '{range}' for service {service}")]
    VersionCheck {
        /// The concrete version under test.
        version: String,
        /// The range it was checked against.
        range: String,
        /// Identity of the service being matched.
        service: String,
        /// The underlying comparison failure.
        #[source]
        source: VersionError,
    },

    /// One or more secrets declared by a service have no binding.
    #[error(
        "no secret binding found for the following secrets required by service {service}: {secrets:?}"
    )]
    MissingBindings {
        /// Fully qualified id of the under-bound service.
        service: String,
        /// Every declared secret name without a binding.
        secrets: Vec<String>,
    },

    /// A binding was supplied for a cluster service.
    #[error("secret binding for a cluster service is not supported (service {service})")]
    ClusterBindingUnsupported {
        /// Fully qualified id of the cluster service.
        service: String,
    },

    /// A service's deployment descriptor is not valid JSON.
    #[error("invalid deployment descriptor for service {service}")]
    MalformedDeployment {
        /// Fully qualified id of the service.
        service: String,
        /// The underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The dependency resolver could not fetch a service.
    #[error("error retrieving service {org}/{url} version {version} from the exchange")]
    Resolution {
        /// Organization of the service being resolved.
        org: String,
        /// URL of the service being resolved.
        url: String,
        /// Version or version range being resolved.
        version: String,
        /// The underlying transport failure.
        #[source]
        source: ResolverError,
    },

    /// The trust store address is not configured.
    #[error("the trust store address cannot be an empty string when checking secret bindings")]
    MissingTrustStoreAddress,

    /// The secret organization is not configured.
    #[error("the secret organization must be provided when checking secret bindings")]
    MissingSecretOrg,

    /// The existence check for a secret failed.
    #[error("error checking secret '{reference}' in the secret manager")]
    SecretCheck {
        /// The reference that was being checked.
        reference: String,
        /// The underlying client failure.
        #[source]
        source: SecretStoreError,
    },

    /// A referenced secret does not exist in the secret manager.
    #[error("secret '{reference}' does not exist in the secret manager")]
    SecretNotFound {
        /// The reference that was checked.
        reference: String,
    },
}
