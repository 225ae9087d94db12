//! Secret binding data model.
//!
//! A [`SecretBinding`] is a caller-supplied rule scoped to one service:
//! it names the service (org, url, optional arch, optional version
//! range) and maps each secret name the service declares to a
//! reference into the external secret manager. Bindings ride along on
//! deployment policies and patterns, so their JSON shape is fixed by
//! the exchange: `serviceArch` and `serviceVersionRange` are omitted
//! when empty, and each entry of `secrets` is a single-entry
//! `{"<name>": "<reference>"}` object.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// One secret-name to secret-manager-reference pair inside a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundSecret {
    /// The name the service's deployment descriptor uses.
    pub name: String,
    /// Free-form reference into the secret manager.
    pub reference: String,
}

impl BoundSecret {
    /// Creates a bound secret.
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }
}

impl fmt::Display for BoundSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reference)
    }
}

// The wire form is a single-entry map.
impl Serialize for BoundSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.reference)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for BoundSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut iter = entries.into_iter();
        let (name, reference) = iter
            .next()
            .ok_or_else(|| de::Error::custom("bound secret must contain one name/reference pair"))?;
        if iter.next().is_some() {
            return Err(de::Error::custom(
                "bound secret must contain exactly one name/reference pair",
            ));
        }
        Ok(Self { name, reference })
    }
}

/// A caller-supplied rule binding one service's declared secrets to
/// secret manager references.
///
/// Identity within a validation run is positional: the same logical
/// binding may legitimately appear more than once in the input, and
/// the engine tracks each occurrence by its index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBinding {
    /// Organization of the service the binding applies to.
    #[serde(rename = "serviceOrgid")]
    pub service_org: String,

    /// URL of the service the binding applies to.
    #[serde(rename = "serviceUrl")]
    pub service_url: String,

    /// Target architecture; empty or `*` applies to all architectures.
    #[serde(
        rename = "serviceArch",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub service_arch: String,

    /// Version range such as `[0.0.0,INFINITY)`; empty applies to all
    /// versions.
    #[serde(
        rename = "serviceVersionRange",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub service_version_range: String,

    /// The secret-name to reference pairs.
    pub secrets: Vec<BoundSecret>,
}

impl fmt::Display for SecretBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ServiceUrl: {}, ServiceOrgid: {}, ServiceArch: {}, ServiceVersionRange: {}, Secrets: [",
            self.service_url, self.service_org, self.service_arch, self.service_version_range
        )?;
        for (i, secret) in self.secrets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{secret}")?;
        }
        write!(f, "]")
    }
}

impl SecretBinding {
    /// Returns a copy of this binding with an empty secrets list,
    /// keeping the service scope. Used when splitting a binding into
    /// needed and redundant halves.
    #[must_use]
    pub fn with_empty_secrets(&self) -> Self {
        Self {
            service_org: self.service_org.clone(),
            service_url: self.service_url.clone(),
            service_arch: self.service_arch.clone(),
            service_version_range: self.service_version_range.clone(),
            secrets: Vec::new(),
        }
    }
}
