//! Service definitions as resolved from the exchange.
//!
//! A service definition pairs the metadata the exchange stores for a
//! service (org, url, version, arch, type) with its deployment
//! descriptor: an embedded JSON document mapping each runnable
//! component to its configuration, including the secrets the component
//! declares. The secret binding engine only cares about the declared
//! secret names; everything else in the descriptor passes through
//! untouched.

mod resolver;

pub use resolver::{ResolvedServiceGraph, ResolverError, ServiceResolver};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::secrets::BindingError;

/// The kind of node a service can be deployed to.
///
/// Cluster services run as operator-managed workloads and declare no
/// secrets by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Runs on device nodes.
    #[default]
    Device,
    /// Runs on cluster nodes only.
    Cluster,
    /// Runs on either node kind.
    Both,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Device => "device",
            Self::Cluster => "cluster",
            Self::Both => "both",
        };
        write!(f, "{s}")
    }
}

/// A reference to a service to be resolved: where to find it and which
/// versions and architecture are acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Service URL (the exchange's service identifier).
    pub url: String,
    /// Owning organization.
    pub org: String,
    /// Acceptable version range expression, or a single version.
    pub version_range: String,
    /// Target architecture; empty or `*` means any.
    pub arch: String,
}

impl fmt::Display for ServiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} version {} arch {}",
            self.org, self.url, self.version_range, self.arch
        )
    }
}

/// A concrete service definition fetched from the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedService {
    /// Owning organization.
    pub org: String,
    /// Service URL.
    pub url: String,
    /// Concrete version.
    pub version: String,
    /// Architecture this definition was published for.
    pub arch: String,
    /// What kind of node the service targets.
    #[serde(default, rename = "serviceType")]
    pub service_type: ServiceType,
    /// The embedded JSON deployment descriptor, if any.
    #[serde(default)]
    pub deployment: Option<String>,
}

impl ResolvedService {
    /// Renders the fully qualified exchange id for this definition,
    /// `org/url_version_arch`, with the url's scheme removed and
    /// characters the exchange disallows replaced by dashes.
    #[must_use]
    pub fn service_id(&self) -> String {
        format!(
            "{}/{}_{}_{}",
            self.org,
            sanitize_id_segment(&self.url),
            self.version,
            self.arch
        )
    }

    /// Returns the distinct secret names declared by this service's
    /// runnable components.
    ///
    /// Cluster services and services without a deployment descriptor
    /// declare no secrets.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::MalformedDeployment`] if the descriptor
    /// is not valid JSON.
    pub fn declared_secrets(&self) -> Result<BTreeSet<String>, BindingError> {
        if self.service_type == ServiceType::Cluster {
            return Ok(BTreeSet::new());
        }

        let Some(deployment) = self.deployment.as_deref() else {
            return Ok(BTreeSet::new());
        };
        if deployment.is_empty() {
            return Ok(BTreeSet::new());
        }

        let config = DeploymentConfig::from_json(deployment).map_err(|source| {
            BindingError::MalformedDeployment {
                service: self.service_id(),
                source,
            }
        })?;
        Ok(config.declared_secrets())
    }
}

/// Strips a leading `<scheme>://` and replaces characters the exchange
/// does not allow in ids with a dash.
fn sanitize_id_segment(url: &str) -> String {
    let rest = match url.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) =>
        {
            rest
        },
        _ => url,
    };
    rest.chars()
        .map(|c| {
            if matches!(c, '$' | '!' | '*' | ',' | ';' | '/' | '?' | '@' | '&' | '~' | '=' | '%') {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// A parsed deployment descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Runnable components keyed by component name.
    #[serde(default)]
    pub services: BTreeMap<String, ComponentConfig>,
}

impl DeploymentConfig {
    /// Parses a deployment descriptor from its embedded JSON form.
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error if the document is
    /// not valid JSON or does not match the descriptor schema.
    pub fn from_json(deployment: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(deployment)
    }

    /// Returns the distinct secret names declared across all
    /// components.
    #[must_use]
    pub fn declared_secrets(&self) -> BTreeSet<String> {
        self.services
            .values()
            .flat_map(|component| component.secrets.keys().cloned())
            .collect()
    }
}

/// One runnable component within a deployment descriptor.
///
/// Only the fields the binding engine reads are modeled; unknown
/// fields are ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Container image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Secrets the component declares, keyed by secret name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, SecretSpec>,
}

/// Metadata attached to a declared secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretSpec {
    /// Free-form description of what the secret is for.
    #[serde(default)]
    pub description: String,
}
